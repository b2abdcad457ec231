use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinError;

use crate::query::error::QueryError;
use crate::query::executor::RemoteExecutor;
use crate::query::types::{Query, QueryResult};

/// Fans a batch of queries out to concurrent tasks and gathers the results
/// in input order.
///
/// One task is spawned per query; a semaphore caps how many run at once.
/// A task that panics yields an [`QueryError::Unknown`] result for its own
/// query only.
#[derive(Clone)]
pub struct QueryDispatcher {
    executor: Arc<dyn RemoteExecutor>,
    permits: Arc<Semaphore>,
    max_in_flight: usize,
}

impl QueryDispatcher {
    pub fn new(executor: Arc<dyn RemoteExecutor>, max_in_flight: usize) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            executor,
            permits: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Execute `queries` concurrently. `results[i]` answers `queries[i]`.
    ///
    /// Elapsed time is recorded for successful queries only.
    pub async fn run(&self, queries: &[Query], depth: u32) -> Vec<QueryResult> {
        if queries.is_empty() {
            return Vec::new();
        }

        tracing::debug!(
            batch_size = queries.len(),
            max_in_flight = self.max_in_flight,
            depth,
            "Dispatching batch"
        );

        let tasks: Vec<_> = queries
            .iter()
            .cloned()
            .map(|query| {
                let executor = self.executor.clone();
                let permits = self.permits.clone();
                tokio::spawn(async move {
                    // Never closed; a failed acquire runs unthrottled.
                    let _permit = permits.acquire_owned().await.ok();

                    let started = Instant::now();
                    let mut result = executor.execute(&query, depth).await;
                    result.query_id = query.id;
                    result.elapsed = if result.is_success() {
                        started.elapsed()
                    } else {
                        Duration::ZERO
                    };
                    result
                })
            })
            .collect();

        let mut results = Vec::with_capacity(tasks.len());
        for (query, task) in queries.iter().zip(tasks) {
            let result = match task.await {
                Ok(result) => result,
                Err(err) => {
                    let reason = describe_join_error(err);
                    tracing::warn!(query_id = query.id, %reason, "Query task failed");
                    QueryResult::failure(query.id, QueryError::Unknown(reason))
                }
            };
            tracing::debug!(
                query_id = result.query_id,
                ok = result.is_success(),
                elapsed_us = result.elapsed.as_micros() as u64,
                "Query finished"
            );
            results.push(result);
        }

        results
    }
}

fn describe_join_error(err: JoinError) -> String {
    if err.is_cancelled() {
        return "task was cancelled".to_string();
    }
    match err.try_into_panic() {
        Ok(payload) => format!("task panicked: {}", panic_message(payload.as_ref())),
        Err(err) => err.to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
