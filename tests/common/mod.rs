//! Shared test utilities.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use kvlink::config::{Config, Endpoint};
use kvlink::connection::{ConnectionSupervisor, FaultPlan, LatencyModel, SimulatedConnector};
use kvlink::store::CommandProcessor;
use tempfile::TempDir;

pub const PRIMARY: (&str, u16) = ("10.1.0.1", 6000);
pub const BACKUP: (&str, u16) = ("10.1.0.2", 6001);

/// Config with millisecond backoff so retry tests stay fast.
pub fn test_config(retries: u32) -> Config {
    let mut config = Config::new(
        Endpoint::new(PRIMARY.0, PRIMARY.1),
        Endpoint::new(BACKUP.0, BACKUP.1),
    );
    config.connection_retries = retries;
    config.retry_backoff_base_ms = 1;
    config.retry_backoff_max_ms = 8;
    config
}

/// Supervisor with zero simulated latency and its connector for attempt
/// counting.
pub fn fast_supervisor(
    retries: u32,
    plan: FaultPlan,
) -> (Arc<ConnectionSupervisor>, Arc<SimulatedConnector>) {
    let connector = Arc::new(SimulatedConnector::new(plan).with_latency(LatencyModel::zero()));
    let supervisor = ConnectionSupervisor::new(
        test_config(retries),
        CommandProcessor::new(),
        connector.clone(),
    )
    .with_query_latency(LatencyModel::zero());
    (Arc::new(supervisor), connector)
}

/// Write `content` to a file named `name` inside a fresh temp dir.
pub fn temp_file(name: &str, content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write temp file");
    (temp_dir, path)
}
