//! Query-level error taxonomy.
//!
//! Every variant is an ordinary outcome carried inside a
//! [`QueryResult`](crate::query::QueryResult); none of them escape the
//! dispatcher as control flow.

use thiserror::Error;

use crate::query::types::{QueryId, QueryKind};

/// Errors a single query can resolve to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// GET or DELETE on a key that is not in the store
    #[error("Key not found for {kind}: '{key}'")]
    KeyNotFound { kind: QueryKind, key: String },

    /// The supervisor had no live link when the query arrived
    #[error("No active connection for executing query ID {query_id}")]
    NoActiveConnection { query_id: QueryId },

    /// Internal fault inside the command processor
    #[error("Processing error: {0}")]
    Processing(String),

    /// The query's task failed outside the normal result path
    #[error("Unexpected failure during dispatch: {0}")]
    Unknown(String),
}

impl QueryError {
    /// Stable error code for logs and reports
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::KeyNotFound { .. } => "key_not_found",
            QueryError::NoActiveConnection { .. } => "no_active_connection",
            QueryError::Processing(_) => "processing_error",
            QueryError::Unknown(_) => "unknown_error",
        }
    }
}
