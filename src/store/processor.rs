use std::sync::Arc;

use crate::query::{Query, QueryError, QueryKind, QueryResult};
use crate::store::state::Store;

/// Server-side command processor.
///
/// Executes one query against the [`Store`] under its lock and turns the
/// store outcome into a [`QueryResult`]. Never retries and never panics on a
/// business error; every failure is returned as data.
#[derive(Debug, Clone, Default)]
pub struct CommandProcessor {
    store: Arc<Store>,
}

impl CommandProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Process `query`, descending `depth` levels first.
    ///
    /// Descent is a plain loop: each level does nothing but step down, and
    /// only the depth-0 step takes the store lock. The result is identical
    /// for every depth.
    pub fn process(&self, query: &Query, depth: u32) -> QueryResult {
        let mut level = depth;
        while level > 0 {
            level = std::hint::black_box(level - 1);
        }
        self.apply(query)
    }

    fn apply(&self, query: &Query) -> QueryResult {
        if query.key.is_empty() {
            return QueryResult::failure(
                query.id,
                QueryError::Processing(format!("query ID {} has an empty key", query.id)),
            );
        }

        let mut store = self.store.lock();

        let outcome = match query.kind {
            QueryKind::Get => store
                .get(&query.key)
                .map(str::to_string)
                .ok_or_else(|| QueryError::KeyNotFound {
                    kind: QueryKind::Get,
                    key: query.key.clone(),
                }),
            QueryKind::Set => {
                let value = query.value.clone().unwrap_or_default();
                store.set(&query.key, value);
                Ok(format!("SET successful for key '{}'", query.key))
            }
            QueryKind::Delete => match store.remove(&query.key) {
                Some(_) => Ok(format!("DELETE successful for key '{}'", query.key)),
                None => Err(QueryError::KeyNotFound {
                    kind: QueryKind::Delete,
                    key: query.key.clone(),
                }),
            },
        };
        drop(store);

        tracing::trace!(
            query_id = query.id,
            kind = %query.kind,
            key = %query.key,
            ok = outcome.is_ok(),
            "Command processed"
        );

        QueryResult {
            query_id: query.id,
            outcome,
            elapsed: std::time::Duration::ZERO,
        }
    }
}
