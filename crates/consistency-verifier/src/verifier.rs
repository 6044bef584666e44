//! Table-by-table comparison of two stores.

use crate::error::VerifyError;
use crate::report::{TableResult, VerificationReport};
use async_trait::async_trait;
use replay_core::{quote_identifier, CompareMode, ResultSet, SqlStatement};
use store_client::{Connector, StoreClient, StoreError};
use tracing::{debug, info, warn};

/// Read access to a store's tables.
#[async_trait]
pub trait TableReader: Send {
    /// Base tables of the current database.
    async fn tables(&mut self) -> Result<Vec<String>, StoreError>;

    async fn read(&mut self, statement: &SqlStatement) -> Result<ResultSet, StoreError>;
}

#[async_trait]
impl<C: Connector> TableReader for StoreClient<C> {
    async fn tables(&mut self) -> Result<Vec<String>, StoreError> {
        StoreClient::tables(self).await
    }

    async fn read(&mut self, statement: &SqlStatement) -> Result<ResultSet, StoreError> {
        self.query(statement).await
    }
}

/// Compare every base table of `target` with the same table in `source`.
///
/// Each table is read in full with `SELECT *` from both stores and compared
/// under `mode`. Differences are recorded and verification continues; only
/// failing to list the target's tables aborts the run.
pub async fn verify<S, T>(
    source: &mut S,
    target: &mut T,
    mode: CompareMode,
) -> Result<VerificationReport, VerifyError>
where
    S: TableReader + ?Sized,
    T: TableReader + ?Sized,
{
    let tables = target.tables().await.map_err(VerifyError::ListTables)?;
    info!("Verifying {} table(s) ({mode} comparison)", tables.len());

    let mut report = VerificationReport::new(mode);
    for table in tables {
        let statement = SqlStatement::raw(format!("SELECT * FROM {}", quote_identifier(&table)));
        let from_source = source.read(&statement).await;
        let from_target = target.read(&statement).await;

        let result = compare_table(&table, from_source, from_target, mode);
        if result.equal {
            debug!("{result}");
        } else {
            warn!("{result}");
        }
        report.tables.push(result);
    }

    info!("{}", report.summary());
    Ok(report)
}

fn compare_table(
    table: &str,
    source: Result<ResultSet, StoreError>,
    target: Result<ResultSet, StoreError>,
    mode: CompareMode,
) -> TableResult {
    match (source, target) {
        (Ok(source), Ok(target)) => match source.first_difference(&target, mode) {
            None => TableResult::matched(table),
            Some(diff) => TableResult::mismatched(table, format!("source vs target: {diff}")),
        },
        (Err(source), Err(target)) => match (source.code(), target.code()) {
            (Some(a), Some(b)) if a == b => TableResult {
                table: table.to_string(),
                equal: true,
                diagnostic: Some(format!("both stores failed with error {a}")),
            },
            _ => TableResult::mismatched(
                table,
                format!("source failed: {source}; target failed: {target}"),
            ),
        },
        (Err(source), Ok(_)) => TableResult::mismatched(table, format!("source failed: {source}")),
        (Ok(_), Err(target)) => TableResult::mismatched(table, format!("target failed: {target}")),
    }
}
