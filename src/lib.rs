use chrono::{NaiveDate, Utc};
use lambda_runtime::{Error, LambdaEvent};
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::clients::Clients;
use crate::error::JobError;
use crate::events::{Combined, JobMessage};
use crate::job::Job;

pub mod clients;
pub mod config;
pub mod error;
pub mod events;
pub mod gcp;
pub mod job;
pub mod process;
pub mod secrets;
pub mod sources;
pub mod store;

/// Returned to the platform when every job in the event completed.
pub const SUCCESS: &str = "ok";

pub fn set_up_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();
}

// lambda handler
pub async fn function_handler(
    clients: &Clients,
    evt: LambdaEvent<Combined>,
) -> Result<String, Error> {
    info!("Handling lambda invocation");
    debug!("Handling event payload: {:?}", evt.payload);

    let today = Utc::now().date_naive();
    for message in evt.payload.into_messages()? {
        handle_message(clients, &message, today).await?;
    }

    Ok(SUCCESS.to_string())
}

/// Validates one message and runs the job it names. `today` anchors the
/// default target date.
pub async fn handle_message(
    clients: &Clients,
    message: &JobMessage,
    today: NaiveDate,
) -> Result<(), JobError> {
    let job = Job::from_message(message, today)?;
    process::run(clients, &job).await
}
