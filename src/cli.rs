use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use kvlink::connection::{FailureKind, FaultPlan, ServerFaults};
use kvlink::query::Query;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (`.toml`, or flat `key = value` lines).
    /// Defaults to the per-user config path.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Query file, one `id,OP,key[,value]` per line.
    #[arg(long)]
    pub queries: PathBuf,

    /// Descent depth passed to the command processor.
    #[arg(long, default_value_t = 0)]
    pub depth: u32,

    /// Run the query file this many times in one batch. Ids are offset per
    /// round so they stay unique.
    #[arg(long, default_value_t = 1)]
    pub repeat: usize,

    /// Fail the first N connect attempts to the primary server.
    #[arg(long, default_value_t = 0)]
    pub primary_faults: u32,

    /// Classification of injected primary failures.
    #[arg(long, value_enum, default_value_t = FaultKindArg::Transient)]
    pub primary_fault_kind: FaultKindArg,

    /// Fail the first N connect attempts to the backup server.
    #[arg(long, default_value_t = 0)]
    pub backup_faults: u32,

    /// Only print the summary, not each query result.
    #[arg(long)]
    pub quiet: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKindArg {
    Transient,
    Permanent,
}

impl From<FaultKindArg> for FailureKind {
    fn from(kind: FaultKindArg) -> Self {
        match kind {
            FaultKindArg::Transient => FailureKind::Transient,
            FaultKindArg::Permanent => FailureKind::Permanent,
        }
    }
}

impl Cli {
    pub fn fault_plan(&self) -> FaultPlan {
        FaultPlan::none()
            .with_primary(ServerFaults {
                failures: self.primary_faults,
                kind: self.primary_fault_kind.into(),
            })
            .with_backup(ServerFaults {
                failures: self.backup_faults,
                kind: FailureKind::Permanent,
            })
    }
}

/// Repeat `queries` `rounds` times, offsetting ids by round.
pub fn replicate(queries: &[Query], rounds: usize) -> Vec<Query> {
    let stride = queries.iter().map(|q| q.id).max().map_or(0, |max| max.saturating_add(1));

    (0..rounds.max(1) as u64)
        .flat_map(|round| {
            queries.iter().map(move |query| Query {
                id: query.id.saturating_add(round.saturating_mul(stride)),
                ..query.clone()
            })
        })
        .collect()
}
