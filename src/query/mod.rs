//! Query model, parsing, concurrent dispatch and result output.

mod dispatcher;
mod error;
mod executor;
mod parser;
mod sink;
mod types;

pub use dispatcher::QueryDispatcher;
pub use error::QueryError;
pub use executor::RemoteExecutor;
pub use parser::{load_queries, parse_queries, ParsedQueries, QueryFileError, SkippedLine};
pub use sink::{ConsoleSink, MemorySink, ResultSink};
pub use types::{BatchSummary, Query, QueryId, QueryKind, QueryResult};
