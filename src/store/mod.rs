use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::JobError;

pub mod bigquery;
pub mod insert;
pub mod provision;
pub mod schema;

pub use bigquery::BigQueryClient;
pub use insert::insert_rows;
pub use provision::{ensure_dataset_table, Provisioned};
pub use schema::{Clustering, TableSchema, TimePartitioning};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRef {
    pub project_id: String,
    pub dataset_id: String,
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.project_id, self.dataset_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRef {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

impl TableRef {
    pub fn new(
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
        table_id: impl Into<String>,
    ) -> Self {
        TableRef {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            table_id: table_id.into(),
        }
    }

    pub fn dataset(&self) -> DatasetRef {
        DatasetRef {
            project_id: self.project_id.clone(),
            dataset_id: self.dataset_id.clone(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub dataset_reference: DatasetRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Dataset {
    pub fn new(reference: DatasetRef, location: &str) -> Self {
        Dataset {
            dataset_reference: reference,
            location: Some(location.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub table_reference: TableRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<TableSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_partitioning: Option<TimePartitioning>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clustering: Option<Clustering>,
}

impl Table {
    pub fn new(reference: TableRef, schema: TableSchema) -> Self {
        Table {
            table_reference: reference,
            schema: Some(schema),
            time_partitioning: None,
            clustering: None,
        }
    }

    pub fn partitioned_by_day(mut self, field: &str) -> Self {
        self.time_partitioning = Some(TimePartitioning::day(field));
        self
    }

    pub fn clustered_by(mut self, fields: &[&str]) -> Self {
        self.clustering = Some(Clustering {
            fields: fields.iter().map(|f| f.to_string()).collect(),
        });
        self
    }
}

/// Outcome of a batch insert. Rows the store refused are counted, not raised.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InsertReport {
    pub rejected_rows: usize,
}

/// The dataset/table operations the pipelines need from an analytical store.
///
/// A missing dataset or table is reported as `Ok(None)`. Creating an entity
/// that already exists is reported as [`JobError::StoreConflict`].
#[async_trait]
pub trait AnalyticalStore: Send + Sync {
    async fn get_dataset(&self, dataset: &DatasetRef) -> Result<Option<Dataset>, JobError>;
    async fn create_dataset(&self, dataset: &Dataset) -> Result<Dataset, JobError>;
    async fn get_table(&self, table: &TableRef) -> Result<Option<Table>, JobError>;
    async fn create_table(&self, table: &Table) -> Result<Table, JobError>;
    async fn insert_rows(&self, table: &TableRef, rows: Vec<Value>)
        -> Result<InsertReport, JobError>;
}
