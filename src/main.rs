use bq_daily_ingest::clients::Clients;
use bq_daily_ingest::config::Config;
use bq_daily_ingest::events::Combined;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    bq_daily_ingest::set_up_logging();

    info!(
        "Initializing {} version {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::load_from_env()?;
    info!("Resolving secrets from {}", config.secret_backend);
    let clients = Clients::from_config(&config).await?;

    run(service_fn(|request: LambdaEvent<Combined>| {
        bq_daily_ingest::function_handler(&clients, request)
    }))
    .await
}
