mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use kvlink::config::Config;
use kvlink::connection::ConnectionSupervisor;
use kvlink::logging::init_tracing;
use kvlink::query::{load_queries, BatchSummary, ConsoleSink, QueryDispatcher, ResultSink};
use kvlink::store::CommandProcessor;

use crate::cli::{replicate, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_from(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    let parsed = load_queries(&cli.queries)?;
    if !parsed.skipped.is_empty() {
        tracing::warn!(
            skipped = parsed.skipped.len(),
            "Some query lines were malformed and skipped"
        );
    }
    let batch = replicate(&parsed.queries, cli.repeat);

    let supervisor = Arc::new(ConnectionSupervisor::simulated(
        config.clone(),
        CommandProcessor::new(),
        cli.fault_plan(),
    ));

    if let Err(err) = supervisor.establish().await {
        tracing::error!(code = err.code(), error = %err, "Running without a connection");
    }
    tracing::info!(
        mode = %supervisor.state(),
        server = %supervisor.current_server_address(),
        "Connection status"
    );

    let dispatcher = QueryDispatcher::new(supervisor.clone(), config.max_in_flight);
    let results = dispatcher.run(&batch, cli.depth).await;

    if !cli.quiet {
        let mut sink = ConsoleSink;
        sink.emit_all(&results);
    }
    println!("{}", BatchSummary::from_results(&results));
    println!(
        "Connection: {} ({})",
        supervisor.state(),
        supervisor.current_server_address()
    );

    Ok(())
}
