use std::fmt;
use std::time::Duration;

use crate::query::error::QueryError;

/// Caller-assigned query identifier. Unique within a batch only.
pub type QueryId = u64;

/// The three operations the key-value server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Get,
    Set,
    Delete,
}

impl QueryKind {
    /// Upper-case wire name, as used in query files and store messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Get => "GET",
            QueryKind::Set => "SET",
            QueryKind::Delete => "DELETE",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(QueryKind::Get),
            "SET" => Some(QueryKind::Set),
            "DELETE" => Some(QueryKind::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single parsed query. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub id: QueryId,
    pub kind: QueryKind,
    pub key: String,
    /// Only meaningful for [`QueryKind::Set`].
    pub value: Option<String>,
}

impl Query {
    pub fn get(id: QueryId, key: impl Into<String>) -> Self {
        Self {
            id,
            kind: QueryKind::Get,
            key: key.into(),
            value: None,
        }
    }

    pub fn set(id: QueryId, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id,
            kind: QueryKind::Set,
            key: key.into(),
            value: Some(value.into()),
        }
    }

    pub fn delete(id: QueryId, key: impl Into<String>) -> Self {
        Self {
            id,
            kind: QueryKind::Delete,
            key: key.into(),
            value: None,
        }
    }
}

/// Outcome of one query, produced exactly once per submitted query.
///
/// `elapsed` is only populated for successful outcomes; failures carry
/// [`Duration::ZERO`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub query_id: QueryId,
    pub outcome: Result<String, QueryError>,
    pub elapsed: Duration,
}

impl QueryResult {
    pub fn success(query_id: QueryId, data: impl Into<String>) -> Self {
        Self {
            query_id,
            outcome: Ok(data.into()),
            elapsed: Duration::ZERO,
        }
    }

    pub fn failure(query_id: QueryId, error: QueryError) -> Self {
        Self {
            query_id,
            outcome: Err(error),
            elapsed: Duration::ZERO,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn data(&self) -> Option<&str> {
        self.outcome.as_deref().ok()
    }

    pub fn error(&self) -> Option<&QueryError> {
        self.outcome.as_ref().err()
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(data) => write!(f, "Query ID {} executed successfully: {}", self.query_id, data),
            Err(err) => write!(f, "Query ID {} failed: {}", self.query_id, err),
        }
    }
}

/// Aggregate counts over a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Sum of per-query execution time across successful queries.
    pub total_elapsed: Duration,
}

impl BatchSummary {
    pub fn from_results(results: &[QueryResult]) -> Self {
        results.iter().fold(Self::default(), |mut acc, result| {
            acc.total += 1;
            if result.is_success() {
                acc.succeeded += 1;
                acc.total_elapsed += result.elapsed;
            } else {
                acc.failed += 1;
            }
            acc
        })
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} queries: {} succeeded, {} failed ({} ms total execution time)",
            self.total,
            self.succeeded,
            self.failed,
            self.total_elapsed.as_millis()
        )
    }
}
