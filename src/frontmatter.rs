//! Front-matter extraction.
//!
//! A content file may start with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! title: Hello world
//! date: 2023-01-01
//! tags: [rust, notes]
//! ---
//! Body text...
//! ```
//!
//! The block is parsed into a JSON-shaped record so it can be passed through
//! to the dashboard unchanged. A file without a block yields an empty record
//! (the aggregator then skips it for lacking a title). A block that is not
//! closed, is not valid YAML, or is not a mapping is an error.

use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Parsed front-matter fields, keyed by field name.
pub type FrontMatter = Map<String, Value>;

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("front-matter block is never closed")]
    Unterminated,
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("front-matter must be a mapping of fields")]
    NotAMapping,
    #[error("unsupported front-matter value: {0}")]
    Value(#[from] serde_json::Error),
}

/// Source of front-matter records, one per file path.
///
/// Reads may run in parallel across files, hence `Sync`.
pub trait FrontMatterReader: Sync {
    fn read(&self, path: &Path) -> Result<FrontMatter, FrontMatterError>;
}

/// Reads files from disk and parses their front-matter block.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl FrontMatterReader for FsReader {
    fn read(&self, path: &Path) -> Result<FrontMatter, FrontMatterError> {
        let source = fs::read_to_string(path)?;
        parse(&source)
    }
}

const FENCE: &str = "---";

/// Parse the front-matter block at the head of `source`.
pub fn parse(source: &str) -> Result<FrontMatter, FrontMatterError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut lines = source.lines();

    match lines.next() {
        Some(first) if first.trim_end() == FENCE => {}
        _ => return Ok(FrontMatter::new()),
    }

    let mut block = Vec::new();
    let mut closed = false;
    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == FENCE || trimmed == "..." {
            closed = true;
            break;
        }
        block.push(line);
    }
    if !closed {
        return Err(FrontMatterError::Unterminated);
    }

    let yaml: serde_yaml::Value = serde_yaml::from_str(&block.join("\n"))?;
    match yaml {
        serde_yaml::Value::Null => Ok(FrontMatter::new()),
        serde_yaml::Value::Mapping(_) => match serde_json::to_value(&yaml)? {
            Value::Object(map) => Ok(map),
            _ => Err(FrontMatterError::NotAMapping),
        },
        _ => Err(FrontMatterError::NotAMapping),
    }
}
