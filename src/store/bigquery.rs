use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{AnalyticalStore, Dataset, DatasetRef, InsertReport, Table, TableRef};
use crate::error::JobError;
use crate::gcp::{self, GcpAuth};

/// BigQuery v2 REST client.
pub struct BigQueryClient {
    http: reqwest::Client,
    base_url: String,
    auth: GcpAuth,
}

#[derive(Serialize)]
struct InsertAllRequest<'a> {
    kind: &'static str,
    rows: Vec<InsertRow<'a>>,
}

#[derive(Serialize)]
struct InsertRow<'a> {
    json: &'a Value,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct InsertAllResponse {
    #[serde(default)]
    insert_errors: Vec<RowErrors>,
}

#[derive(Deserialize)]
struct RowErrors {
    #[serde(default)]
    index: u64,
    #[serde(default)]
    errors: Vec<RowError>,
}

#[derive(Deserialize)]
struct RowError {
    #[serde(default)]
    reason: String,
    #[serde(default)]
    message: String,
}

impl BigQueryClient {
    pub fn new(http: reqwest::Client, base_url: &str, auth: GcpAuth) -> Self {
        BigQueryClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    fn datasets_url(&self, project_id: &str) -> String {
        format!("{}/projects/{}/datasets", self.base_url, project_id)
    }

    fn tables_url(&self, project_id: &str, dataset_id: &str) -> String {
        format!("{}/{}/tables", self.datasets_url(project_id), dataset_id)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, JobError> {
        let request = self
            .auth
            .authorize(&self.http, request)
            .await
            .map_err(|e| JobError::StoreUnavailable(format!("failed to obtain access token - {}", e)))?;
        request
            .send()
            .await
            .map_err(|e| JobError::StoreUnavailable(e.to_string()))
    }

    async fn fetch<T: DeserializeOwned>(&self, url: String) -> Result<Option<T>, JobError> {
        debug!("GET {}", url);
        let response = self.send(self.http.get(&url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => read_body(response).await.map(Some),
            _ => Err(JobError::StoreUnavailable(gcp::describe_failure(response).await)),
        }
    }

    async fn create<T: Serialize + DeserializeOwned>(
        &self,
        url: String,
        entity: &T,
    ) -> Result<T, JobError> {
        debug!("POST {}", url);
        let response = self.send(self.http.post(&url).json(entity)).await?;
        match response.status() {
            StatusCode::CONFLICT => Err(JobError::StoreConflict(
                gcp::describe_failure(response).await,
            )),
            status if status.is_success() => read_body(response).await,
            _ => Err(JobError::StoreUnavailable(gcp::describe_failure(response).await)),
        }
    }
}

async fn read_body<T: DeserializeOwned>(response: Response) -> Result<T, JobError> {
    response
        .json::<T>()
        .await
        .map_err(|e| JobError::StoreUnavailable(format!("unexpected response body - {}", e)))
}

#[async_trait]
impl AnalyticalStore for BigQueryClient {
    async fn get_dataset(&self, dataset: &DatasetRef) -> Result<Option<Dataset>, JobError> {
        self.fetch(format!(
            "{}/{}",
            self.datasets_url(&dataset.project_id),
            dataset.dataset_id
        ))
        .await
    }

    async fn create_dataset(&self, dataset: &Dataset) -> Result<Dataset, JobError> {
        let url = self.datasets_url(&dataset.dataset_reference.project_id);
        self.create(url, dataset).await
    }

    async fn get_table(&self, table: &TableRef) -> Result<Option<Table>, JobError> {
        self.fetch(format!(
            "{}/{}",
            self.tables_url(&table.project_id, &table.dataset_id),
            table.table_id
        ))
        .await
    }

    async fn create_table(&self, table: &Table) -> Result<Table, JobError> {
        let reference = &table.table_reference;
        let url = self.tables_url(&reference.project_id, &reference.dataset_id);
        self.create(url, table).await
    }

    async fn insert_rows(
        &self,
        table: &TableRef,
        rows: Vec<Value>,
    ) -> Result<InsertReport, JobError> {
        let url = format!(
            "{}/{}/insertAll",
            self.tables_url(&table.project_id, &table.dataset_id),
            table.table_id
        );
        let body = InsertAllRequest {
            kind: "bigquery#tableDataInsertAllRequest",
            rows: rows.iter().map(|json| InsertRow { json }).collect(),
        };
        debug!("POST {} ({} rows)", url, rows.len());

        let response = self.send(self.http.post(&url).json(&body)).await?;
        if !response.status().is_success() {
            return Err(JobError::StoreUnavailable(
                gcp::describe_failure(response).await,
            ));
        }

        let report: InsertAllResponse = read_body(response).await?;
        for row in &report.insert_errors {
            for error in &row.errors {
                debug!(
                    "row {} rejected by {}: {} {}",
                    row.index, table, error.reason, error.message
                );
            }
        }
        Ok(InsertReport {
            rejected_rows: report.insert_errors.len(),
        })
    }
}
