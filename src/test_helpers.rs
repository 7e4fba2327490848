//! Shared test utilities for the frontdesk test suite.
//!
//! Provides page builders, an in-memory front-matter reader, and fixture
//! writers for filesystem-backed tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let page = page_with("Hello", json!({"tags": ["rust"]}));
//! assert_eq!(page.fm_file_name, "hello.md");
//!
//! let tmp = workspace(BLOG_CONFIG);
//! write_page(&tmp.path().join("blog"), "a.md", "title: A");
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::frontmatter::{FrontMatter, FrontMatterError, FrontMatterReader};
use crate::types::Page;
use serde_json::Value;

// =========================================================================
// Page builders
// =========================================================================

/// A page in the "Blog" folder whose file name is derived from the title.
///
/// `extra` must be a JSON object; its keys become pass-through front-matter.
pub fn page_with(title: &str, extra: Value) -> Page {
    let stem = title.to_lowercase().replace(' ', "-");
    let file_name = format!("{stem}.md");
    let extra = match extra {
        Value::Object(map) => map,
        other => panic!("page_with expects a JSON object, got {other}"),
    };
    Page {
        title: title.to_string(),
        slug: None,
        date: String::new(),
        draft: None,
        description: String::new(),
        fm_group: "Blog".to_string(),
        fm_modified: 0,
        fm_file_path: PathBuf::from("/workspace/blog").join(&file_name),
        fm_file_name: file_name,
        preview: String::new(),
        extra,
    }
}

/// Titles of `pages`, in order.
pub fn titles<'a>(pages: &[&'a Page]) -> Vec<&'a str> {
    pages.iter().map(|p| p.title.as_str()).collect()
}

/// Find a page by title, panicking with the available titles if missing.
pub fn find_page<'a>(pages: &'a [Page], title: &str) -> &'a Page {
    pages.iter().find(|p| p.title == title).unwrap_or_else(|| {
        let available: Vec<&str> = pages.iter().map(|p| p.title.as_str()).collect();
        panic!("page '{title}' not found. Available: {available:?}")
    })
}

// =========================================================================
// In-memory reader
// =========================================================================

/// Front-matter keyed by path. Unknown paths read as empty front-matter;
/// paths registered with [`MemoryReader::failing`] fail to parse.
#[derive(Default)]
pub struct MemoryReader {
    entries: HashMap<PathBuf, Option<FrontMatter>>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, front_matter: Value) -> Self {
        let map = match front_matter {
            Value::Object(map) => map,
            other => panic!("front-matter must be a JSON object, got {other}"),
        };
        self.entries.insert(PathBuf::from(path), Some(map));
        self
    }

    pub fn failing(mut self, path: &str) -> Self {
        self.entries.insert(PathBuf::from(path), None);
        self
    }
}

impl FrontMatterReader for MemoryReader {
    fn read(&self, path: &Path) -> Result<FrontMatter, FrontMatterError> {
        match self.entries.get(path) {
            Some(Some(map)) => Ok(map.clone()),
            Some(None) => Err(FrontMatterError::Unterminated),
            None => Ok(FrontMatter::new()),
        }
    }
}

// =========================================================================
// Filesystem fixtures
// =========================================================================

/// A `frontdesk.toml` with one "Blog" folder at `blog/`.
pub const BLOG_CONFIG: &str = r#"
[[folders]]
title = "Blog"
path = "blog"
"#;

/// Temp workspace with `config` written as its `frontdesk.toml`.
pub fn workspace(config: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(crate::config::CONFIG_FILE), config).unwrap();
    tmp
}

/// Write a markdown file with a YAML front-matter block, creating `dir`.
pub fn write_page(dir: &Path, name: &str, front_matter: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, format!("---\n{front_matter}\n---\n\nBody text.\n")).unwrap();
    path
}
