//! Query file parsing.
//!
//! One query per line: `id,OP,key[,value]`. `OP` is GET, SET or DELETE in
//! any case. Everything after the third comma is the value, commas
//! included. Blank lines and `#` comments are ignored. Malformed lines are
//! skipped with a warning; only an unreadable file is fatal.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::query::types::{Query, QueryId, QueryKind};

#[derive(Debug, Error)]
pub enum QueryFileError {
    #[error("Could not open query file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A line that was dropped during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQueries {
    pub queries: Vec<Query>,
    pub skipped: Vec<SkippedLine>,
}

pub fn load_queries(path: &Path) -> Result<ParsedQueries, QueryFileError> {
    let content = fs::read_to_string(path).map_err(|e| QueryFileError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let parsed = parse_queries(&content);
    tracing::debug!(
        path = %path.display(),
        queries = parsed.queries.len(),
        skipped = parsed.skipped.len(),
        "Query file parsed"
    );
    Ok(parsed)
}

pub fn parse_queries(content: &str) -> ParsedQueries {
    let mut parsed = ParsedQueries::default();

    for (index, raw) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_line(line) {
            Ok(query) => parsed.queries.push(query),
            Err(reason) => {
                tracing::warn!(line = line_number, %reason, "Skipping malformed query line");
                parsed.skipped.push(SkippedLine {
                    line: line_number,
                    reason,
                });
            }
        }
    }

    parsed
}

fn parse_line(line: &str) -> Result<Query, String> {
    let mut fields = line.splitn(4, ',');

    let id_field = fields.next().unwrap_or_default().trim();
    if id_field.is_empty() {
        return Err("Missing ID".to_string());
    }
    let id = id_field
        .parse::<QueryId>()
        .map_err(|_| format!("Invalid ID '{}'", id_field))?;

    let op_field = fields.next().ok_or("Missing operation")?.trim();
    let kind =
        QueryKind::parse(op_field).ok_or_else(|| format!("Unknown operation '{}'", op_field))?;

    let key = fields.next().ok_or("Missing key")?.trim();
    if key.is_empty() {
        return Err("Empty key".to_string());
    }

    let value = fields.next().map(|v| v.trim().to_string());
    if kind == QueryKind::Set && value.is_none() {
        return Err("SET requires a value".to_string());
    }

    Ok(Query {
        id,
        kind,
        key: key.to_string(),
        value: if kind == QueryKind::Set { value } else { None },
    })
}
