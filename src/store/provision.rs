//! Idempotent provisioning of destination datasets and tables.
//!
//! Tables are created once with the caller's schema, partitioned by day on
//! the `date` column and optionally clustered. Existing entities are never
//! altered: there is no schema migration and no drift detection.

use tracing::{info, warn};

use super::schema::TableSchema;
use super::{AnalyticalStore, Dataset, Table, TableRef};
use crate::error::JobError;

/// Storage region of every dataset this function creates.
pub const DATASET_LOCATION: &str = "EU";
pub const PARTITION_FIELD: &str = "date";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Provisioned {
    pub dataset_created: bool,
    pub table_created: bool,
}

/// Makes sure the dataset and the table behind `table` exist.
///
/// An entity created concurrently by another invocation (the create call
/// reports a conflict) counts as existing.
pub async fn ensure_dataset_table(
    store: &dyn AnalyticalStore,
    table: &TableRef,
    schema: &TableSchema,
    clustering_fields: Option<&[&str]>,
) -> Result<Provisioned, JobError> {
    let dataset_ref = table.dataset();

    let dataset_created = match store.get_dataset(&dataset_ref).await? {
        Some(_) => false,
        None => {
            let dataset = Dataset::new(dataset_ref.clone(), DATASET_LOCATION);
            match store.create_dataset(&dataset).await {
                Ok(created) => {
                    info!(
                        "Created dataset {} in {}",
                        created.dataset_reference, DATASET_LOCATION
                    );
                    true
                }
                Err(JobError::StoreConflict(reason)) => {
                    warn!("Dataset {} already exists: {}", dataset_ref, reason);
                    false
                }
                Err(e) => return Err(e),
            }
        }
    };

    let table_created = match store.get_table(table).await? {
        Some(_) => false,
        None => {
            let mut definition =
                Table::new(table.clone(), schema.clone()).partitioned_by_day(PARTITION_FIELD);
            if let Some(fields) = clustering_fields {
                definition = definition.clustered_by(fields);
            }
            match store.create_table(&definition).await {
                Ok(created) => {
                    info!("Created table {}", created.table_reference);
                    true
                }
                Err(JobError::StoreConflict(reason)) => {
                    warn!("Table {} already exists: {}", table, reason);
                    false
                }
                Err(e) => return Err(e),
            }
        }
    };

    Ok(Provisioned {
        dataset_created,
        table_created,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::store::schema::{exchange_rate_schema, PartitioningType};
    use crate::store::{DatasetRef, InsertReport};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;

    /// Records creations; optionally pretends every create races another writer.
    #[derive(Default)]
    struct RecordingStore {
        datasets: Mutex<Vec<Dataset>>,
        tables: Mutex<Vec<Table>>,
        always_conflict: bool,
        fail_lookups: bool,
    }

    #[async_trait]
    impl AnalyticalStore for RecordingStore {
        async fn get_dataset(&self, dataset: &DatasetRef) -> Result<Option<Dataset>, JobError> {
            if self.fail_lookups {
                return Err(JobError::StoreUnavailable("403 Forbidden".to_string()));
            }
            let datasets = self.datasets.lock().unwrap();
            Ok(datasets
                .iter()
                .find(|d| &d.dataset_reference == dataset)
                .cloned())
        }

        async fn create_dataset(&self, dataset: &Dataset) -> Result<Dataset, JobError> {
            if self.always_conflict {
                return Err(JobError::StoreConflict("Already Exists".to_string()));
            }
            self.datasets.lock().unwrap().push(dataset.clone());
            Ok(dataset.clone())
        }

        async fn get_table(&self, table: &TableRef) -> Result<Option<Table>, JobError> {
            let tables = self.tables.lock().unwrap();
            Ok(tables.iter().find(|t| &t.table_reference == table).cloned())
        }

        async fn create_table(&self, table: &Table) -> Result<Table, JobError> {
            if self.always_conflict {
                return Err(JobError::StoreConflict("Already Exists".to_string()));
            }
            self.tables.lock().unwrap().push(table.clone());
            Ok(table.clone())
        }

        async fn insert_rows(&self, _: &TableRef, _: Vec<Value>) -> Result<InsertReport, JobError> {
            Ok(InsertReport::default())
        }
    }

    #[tokio::test]
    async fn test_creates_once() {
        let store = RecordingStore::default();
        let table = TableRef::new("p", "d", "rates");
        let schema = exchange_rate_schema();

        let first = ensure_dataset_table(&store, &table, &schema, None).await.unwrap();
        assert_eq!(
            first,
            Provisioned {
                dataset_created: true,
                table_created: true
            }
        );

        let second = ensure_dataset_table(&store, &table, &schema, None).await.unwrap();
        assert_eq!(second, Provisioned::default());

        assert_eq!(store.datasets.lock().unwrap().len(), 1);
        assert_eq!(store.tables.lock().unwrap().len(), 1);
        assert_eq!(
            store.datasets.lock().unwrap()[0].location.as_deref(),
            Some("EU")
        );
    }

    #[tokio::test]
    async fn test_table_definition() {
        let store = RecordingStore::default();
        let table = TableRef::new("p", "d", "fb");
        let schema = exchange_rate_schema();

        ensure_dataset_table(&store, &table, &schema, Some(&["campaign_id", "campaign_name"][..]))
            .await
            .unwrap();

        let tables = store.tables.lock().unwrap();
        let created = &tables[0];
        assert_eq!(created.schema.as_ref(), Some(&schema));
        let partitioning = created.time_partitioning.as_ref().unwrap();
        assert_eq!(partitioning.partitioning_type, PartitioningType::Day);
        assert_eq!(partitioning.field.as_deref(), Some("date"));
        assert_eq!(
            created.clustering.as_ref().unwrap().fields,
            vec!["campaign_id", "campaign_name"]
        );
    }

    #[tokio::test]
    async fn test_no_clustering_unless_asked() {
        let store = RecordingStore::default();
        let table = TableRef::new("p", "d", "rates");
        ensure_dataset_table(&store, &table, &exchange_rate_schema(), None)
            .await
            .unwrap();
        assert!(store.tables.lock().unwrap()[0].clustering.is_none());
    }

    #[tokio::test]
    async fn test_conflict_counts_as_existing() {
        let store = RecordingStore {
            always_conflict: true,
            ..Default::default()
        };
        let table = TableRef::new("p", "d", "rates");
        let result = ensure_dataset_table(&store, &table, &exchange_rate_schema(), None)
            .await
            .unwrap();
        assert_eq!(result, Provisioned::default());
    }

    #[tokio::test]
    async fn test_lookup_failure_propagates() {
        let store = RecordingStore {
            fail_lookups: true,
            ..Default::default()
        };
        let table = TableRef::new("p", "d", "rates");
        let err = ensure_dataset_table(&store, &table, &exchange_rate_schema(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::StoreUnavailable(_)));
        assert!(store.tables.lock().unwrap().is_empty());
    }
}
