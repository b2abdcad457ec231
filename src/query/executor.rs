use async_trait::async_trait;

use crate::query::types::{Query, QueryResult};

/// Executes one query on behalf of the dispatcher.
///
/// Business failures come back inside the [`QueryResult`]. A panic inside
/// `execute` is contained by the dispatcher and reported as
/// [`QueryError::Unknown`](crate::query::QueryError::Unknown) for that query.
#[async_trait]
pub trait RemoteExecutor: Send + Sync + 'static {
    async fn execute(&self, query: &Query, depth: u32) -> QueryResult;
}
