//! Content folder listing and page aggregation.
//!
//! Turns the configured content folders into the flat [`Page`] collection a
//! dashboard renders. Two steps, kept separate so the second can run on any
//! listing (tests feed it in-memory folders):
//!
//! ```text
//! list_folders   frontdesk.toml folders  →  Vec<ContentFolder>   (walk + mtime)
//! aggregate      Vec<ContentFolder>      →  Vec<Page>            (front-matter → Page)
//! ```
//!
//! ## Listing
//!
//! Each folder is walked recursively. Hidden entries (`.git`, `.obsidian`, ...)
//! and `node_modules` are skipped. Files are ordered newest first, ties broken
//! by path, so the listing reads like a "last modified" view.
//!
//! ## Aggregation
//!
//! - Only `.md` and `.mdx` files are considered.
//! - Front-matter is read for all files in parallel; the pass waits for every
//!   read before building pages, so a partial collection is never returned.
//! - A file whose front-matter cannot be read is reported through the
//!   [`Notifier`] and skipped. One bad file never aborts the pass.
//! - A file without a `title` is skipped silently.
//! - A file listed under two overlapping folders appears once, under the
//!   first folder that lists it.
//! - Output order is folder order, then listing order. No sorting happens here.

use crate::config::DashboardConfig;
use crate::frontmatter::{FrontMatter, FrontMatterReader};
use crate::message::Notification;
use crate::types::{ContentFolder, FileEntry, FolderSetting, Page, RESERVED_FIELDS};
use rayon::prelude::*;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Content folder is not a directory: {0}")]
    NotADirectory(PathBuf),
}

const CONTENT_EXTENSIONS: &[&str] = &[".md", ".mdx"];

/// Whether a file name has a markdown or MDX extension.
pub fn is_content_file(file_name: &str) -> bool {
    CONTENT_EXTENSIONS.iter().any(|ext| file_name.ends_with(ext))
}

/// Receives user-visible notifications raised during a pass.
pub trait Notifier {
    fn notify(&mut self, notification: Notification);
}

impl Notifier for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}

/// Turns an asset path on disk into a URI a dashboard can render.
pub trait AssetResolver {
    fn asset_uri(&self, path: &Path) -> Option<String>;
}

/// Resolves assets to `file://` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileUriResolver;

impl AssetResolver for FileUriResolver {
    fn asset_uri(&self, path: &Path) -> Option<String> {
        url::Url::from_file_path(path).ok().map(String::from)
    }
}

/// Field names and paths the aggregator needs from configuration.
#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions<'a> {
    pub date_field: &'a str,
    pub description_field: &'a str,
    pub static_folder: &'a str,
    /// Previews are only resolved when a workspace root is known.
    pub workspace_root: Option<&'a Path>,
}

impl<'a> AggregateOptions<'a> {
    pub fn from_config(config: &'a DashboardConfig, workspace_root: Option<&'a Path>) -> Self {
        Self {
            date_field: config.date_field(),
            description_field: config.description_field(),
            static_folder: &config.static_folder,
            workspace_root,
        }
    }
}

/// List, read, and aggregate every configured folder of the workspace.
pub fn scan_workspace(
    root: &Path,
    config: &DashboardConfig,
    reader: &dyn FrontMatterReader,
    assets: &dyn AssetResolver,
    notifier: &mut dyn Notifier,
) -> Result<Vec<Page>, ScanError> {
    let folders = list_folders(root, &config.folders)?;
    let options = AggregateOptions::from_config(config, Some(root));
    Ok(aggregate(&folders, &options, reader, assets, notifier))
}

// ============================================================================
// Listing
// ============================================================================

/// List the files of each configured folder.
///
/// A folder that does not exist yet yields an empty listing; a path that
/// exists but is not a directory is an error.
pub fn list_folders(root: &Path, folders: &[FolderSetting]) -> Result<Vec<ContentFolder>, ScanError> {
    let mut listed = Vec::with_capacity(folders.len());
    for folder in folders {
        let path = root.join(&folder.path);
        let files = if !path.exists() {
            tracing::warn!(folder = %folder.title, path = %path.display(), "content folder does not exist");
            Vec::new()
        } else if !path.is_dir() {
            return Err(ScanError::NotADirectory(path));
        } else {
            collect_entries(&path)
        };
        listed.push(ContentFolder {
            title: folder.title.clone(),
            files,
        });
    }
    Ok(listed)
}

fn collect_entries(dir: &Path) -> Vec<FileEntry> {
    let mut entries: Vec<FileEntry> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| FileEntry {
            file_name: e.file_name().to_string_lossy().into_owned(),
            mtime: modified_millis(&e),
            file_path: e.into_path(),
        })
        .collect();

    entries.sort_by(|a, b| b.mtime.cmp(&a.mtime).then_with(|| a.file_path.cmp(&b.file_path)));
    entries
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name == "node_modules"
}

fn modified_millis(entry: &DirEntry) -> u64 {
    entry
        .metadata()
        .ok()
        .and_then(|m| m.modified().ok())
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ============================================================================
// Aggregation
// ============================================================================

/// Build pages from folder listings.
pub fn aggregate(
    folders: &[ContentFolder],
    options: &AggregateOptions<'_>,
    reader: &dyn FrontMatterReader,
    assets: &dyn AssetResolver,
    notifier: &mut dyn Notifier,
) -> Vec<Page> {
    let mut seen = HashSet::new();
    let candidates: Vec<(&ContentFolder, &FileEntry)> = folders
        .iter()
        .flat_map(|folder| folder.files.iter().map(move |entry| (folder, entry)))
        .filter(|(_, entry)| is_content_file(&entry.file_name))
        .filter(|(_, entry)| seen.insert(entry.file_path.as_path()))
        .collect();

    let parsed: Vec<_> = candidates
        .par_iter()
        .map(|(_, entry)| reader.read(&entry.file_path))
        .collect();

    let mut pages = Vec::with_capacity(candidates.len());
    let mut skipped = 0usize;
    for (&(folder, entry), result) in candidates.iter().zip(parsed) {
        match result {
            Ok(front_matter) => match build_page(folder, entry, front_matter, options, assets) {
                Some(page) => pages.push(page),
                None => skipped += 1,
            },
            Err(e) => {
                tracing::warn!(path = %entry.file_path.display(), error = %e, "skipping file");
                notifier.notify(Notification::error(format!(
                    "File error: {} - {}",
                    entry.file_path.display(),
                    e
                )));
            }
        }
    }

    tracing::debug!(
        files = candidates.len(),
        pages = pages.len(),
        untitled = skipped,
        "aggregation pass complete"
    );
    pages
}

/// Build one page, or `None` when the front-matter has no usable title.
fn build_page(
    folder: &ContentFolder,
    entry: &FileEntry,
    mut front_matter: FrontMatter,
    options: &AggregateOptions<'_>,
    assets: &dyn AssetResolver,
) -> Option<Page> {
    let title = title_text(front_matter.get("title"))?;
    let slug = text(front_matter.get("slug"));
    let date = text(front_matter.get(options.date_field)).unwrap_or_default();
    let draft = front_matter.get("draft").and_then(Value::as_bool);
    let description = text(front_matter.get(options.description_field)).unwrap_or_default();
    let raw_preview = text(front_matter.get("preview"));

    // slug, draft and preview keep their raw value when it did not fit
    let captured = |field: &str| match field {
        "slug" => slug.is_some(),
        "draft" => draft.is_some(),
        "preview" => raw_preview.is_some(),
        _ => true,
    };
    for field in RESERVED_FIELDS {
        if captured(*field) {
            front_matter.remove(*field);
        }
    }

    let preview = raw_preview
        .and_then(|p| resolve_preview(&p, options, assets))
        .unwrap_or_default();

    Some(Page {
        title,
        slug,
        date,
        draft,
        description,
        fm_group: folder.title.clone(),
        fm_modified: entry.mtime,
        fm_file_path: entry.file_path.clone(),
        fm_file_name: entry.file_name.clone(),
        preview,
        extra: front_matter,
    })
}

/// `workspace_root / static_folder / preview`, as a renderable URI.
fn resolve_preview(
    preview: &str,
    options: &AggregateOptions<'_>,
    assets: &dyn AssetResolver,
) -> Option<String> {
    let root = options.workspace_root?;
    let path = root
        .join(options.static_folder.trim_start_matches('/'))
        .join(preview.trim_start_matches('/'));
    assets.asset_uri(&path)
}

/// A title counts only when it is truthy: `false`, `0` and `""` do not.
fn title_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => text(Some(other)),
    }
}

/// Scalar front-matter value as non-empty text.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
