use std::io::Write;

use crate::query::types::QueryResult;

/// Destination for printable query results.
pub trait ResultSink {
    fn emit(&mut self, result: &QueryResult);

    fn emit_all(&mut self, results: &[QueryResult]) {
        for result in results {
            self.emit(result);
        }
    }
}

/// Successes to stdout, failures to stderr.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ResultSink for ConsoleSink {
    fn emit(&mut self, result: &QueryResult) {
        // A closed pipe should not take the process down mid-batch.
        if result.is_success() {
            let _ = writeln!(std::io::stdout().lock(), "{}", result);
        } else {
            let _ = writeln!(std::io::stderr().lock(), "{}", result);
        }
    }
}

/// Collects rendered lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl ResultSink for MemorySink {
    fn emit(&mut self, result: &QueryResult) {
        self.lines.push(result.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryError;

    #[test]
    fn memory_sink_renders_in_order() {
        let mut sink = MemorySink::new();
        sink.emit_all(&[
            QueryResult::success(1, "v"),
            QueryResult::failure(2, QueryError::Unknown("boom".to_string())),
        ]);
        assert_eq!(
            sink.into_lines(),
            vec![
                "Query ID 1 executed successfully: v".to_string(),
                "Query ID 2 failed: Unexpected failure during dispatch: boom".to_string(),
            ]
        );
    }
}
