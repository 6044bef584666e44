use async_trait::async_trait;
use replay_core::SqlStatement;
use store_client::{Connector, StoreClient, StoreError};

/// Where translated statements are applied.
#[async_trait]
pub trait StatementSink: Send {
    /// Apply one statement, returning the number of affected rows.
    async fn apply(&mut self, statement: &SqlStatement) -> Result<u64, StoreError>;
}

#[async_trait]
impl<C: Connector> StatementSink for StoreClient<C> {
    async fn apply(&mut self, statement: &SqlStatement) -> Result<u64, StoreError> {
        self.execute(statement).await
    }
}

#[async_trait]
impl<K: StatementSink + ?Sized> StatementSink for &mut K {
    async fn apply(&mut self, statement: &SqlStatement) -> Result<u64, StoreError> {
        (**self).apply(statement).await
    }
}
