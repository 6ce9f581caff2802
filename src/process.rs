use chrono::NaiveDate;
use tracing::info;

use crate::clients::Clients;
use crate::error::JobError;
use crate::job::{Job, Source};
use crate::sources::FacebookCredentials;
use crate::store::schema::{ad_insight_schema, exchange_rate_schema, AD_INSIGHT_CLUSTERING};
use crate::store::{ensure_dataset_table, insert_rows, TableRef};

pub const CURRENCY_API_KEY_SECRET: &str = "CURRENCYLAYER_API_KEY";
pub const FACEBOOK_APP_ID_SECRET: &str = "FACEBOOK_APP_ID";
pub const FACEBOOK_APP_SECRET_SECRET: &str = "FACEBOOK_APP_SECRET";
pub const FACEBOOK_ACCESS_TOKEN_SECRET: &str = "FACEBOOK_ACCESS_TOKEN";

/// Runs one job: credentials, fetch, provision, insert, strictly in that order.
pub async fn run(clients: &Clients, job: &Job) -> Result<(), JobError> {
    info!(
        "Running {} job for {} on {}",
        job.job_type(),
        job.destination,
        job.date
    );
    match &job.source {
        Source::Currency {
            from_currency,
            to_currency,
        } => currency(clients, &job.destination, job.date, from_currency, to_currency).await,
        Source::Facebook { account_id } => {
            facebook(clients, &job.destination, job.date, account_id).await
        }
    }
}

pub async fn currency(
    clients: &Clients,
    destination: &TableRef,
    date: NaiveDate,
    from_currency: &str,
    to_currency: &str,
) -> Result<(), JobError> {
    let api_key = clients
        .secrets
        .get_secret(&destination.project_id, CURRENCY_API_KEY_SECRET)
        .await?;

    let record = clients
        .currency
        .historical_rate(&api_key, from_currency, to_currency, date)
        .await?;

    let store = clients.store.as_ref();
    ensure_dataset_table(store, destination, &exchange_rate_schema(), None).await?;
    insert_rows(store, destination, &[record]).await
}

pub async fn facebook(
    clients: &Clients,
    destination: &TableRef,
    date: NaiveDate,
    account_id: &str,
) -> Result<(), JobError> {
    let project_id = &destination.project_id;
    let credentials = FacebookCredentials {
        app_id: clients
            .secrets
            .get_secret(project_id, FACEBOOK_APP_ID_SECRET)
            .await?,
        app_secret: clients
            .secrets
            .get_secret(project_id, FACEBOOK_APP_SECRET_SECRET)
            .await?,
        access_token: clients
            .secrets
            .get_secret(project_id, FACEBOOK_ACCESS_TOKEN_SECRET)
            .await?,
    };

    let records = clients
        .facebook
        .ad_insights(&credentials, account_id, date)
        .await?;

    let store = clients.store.as_ref();
    ensure_dataset_table(
        store,
        destination,
        &ad_insight_schema(),
        Some(AD_INSIGHT_CLUSTERING),
    )
    .await?;
    insert_rows(store, destination, &records).await
}
