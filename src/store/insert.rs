use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

use super::{AnalyticalStore, TableRef};
use crate::error::JobError;

/// Appends `records` to an existing table as a single batch.
///
/// Rows the store rejects individually are logged, not raised. Re-running a
/// job appends the same rows again.
pub async fn insert_rows<T: Serialize>(
    store: &dyn AnalyticalStore,
    table: &TableRef,
    records: &[T],
) -> Result<(), JobError> {
    let rows = records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| JobError::StoreUnavailable(format!("failed to encode rows - {}", e)))?;

    let number_of_rows = rows.len();
    if number_of_rows == 0 {
        info!("No rows to insert into {}", table);
        return Ok(());
    }

    let handle = store
        .get_table(table)
        .await?
        .ok_or_else(|| JobError::StoreUnavailable(format!("table {} not found", table)))?;

    let start_time = Instant::now();
    let report = store.insert_rows(&handle.table_reference, rows).await?;
    if report.rejected_rows > 0 {
        warn!(
            "{} of {} rows were rejected by {}",
            report.rejected_rows, number_of_rows, table
        );
    }

    info!(
        "Success uploaded {} rows to table {} in {}ms",
        number_of_rows,
        handle.table_reference.table_id,
        start_time.elapsed().as_millis()
    );
    Ok(())
}
