//! Workspace configuration module.
//!
//! Handles loading, validating, and updating `frontdesk.toml`. The file lives
//! in the workspace root and is sparse: stock defaults are serialized from
//! [`DashboardConfig::default`] and user values are merged on top.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! static_folder = ""             # Prefix for preview asset paths
//! date_field = "date"            # Front-matter field shown as the page date
//! description_field = "description"
//! open_on_start = false          # Open the dashboard when the editor starts
//! tags = []                      # Tag filter choices
//! categories = []                # Category filter choices
//!
//! [[folders]]
//! title = "Blog"
//! path = "content/blog"
//!
//! [[custom_sorting]]
//! name = "weight"                # Front-matter field to sort on
//! order = "asc"                  # asc | desc
//! type = "string"                # string | date
//!
//! [[scripts]]
//! title = "Generate social image"
//! script = "scripts/social.js"
//! command = "node"
//!
//! [dashboard]
//! view = "contents"              # contents | media
//!
//! [dashboard.contents]
//! default_sorting = "Last modified (desc)"
//!
//! [processing]
//! max_processes = 4              # Parallel front-matter readers (omit for auto)
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! ## Updating Settings
//!
//! The dashboard never edits settings in place. It sends an `updateSetting`
//! request naming one dotted key; [`update_setting`] applies it to the raw file,
//! validates the merged result, and only then writes the file back.

use crate::sorting::{self, SortingOption};
use crate::types::{
    CustomScript, DashboardState, FolderSetting, Settings, VersionInfo, ViewState, ViewType,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file in the workspace root.
pub const CONFIG_FILE: &str = "frontdesk.toml";

pub const DEFAULT_DATE_FIELD: &str = "date";
pub const DEFAULT_DESCRIPTION_FIELD: &str = "description";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Invalid setting '{name}': {reason}")]
    Setting { name: String, reason: String },
}

/// Workspace configuration loaded from `frontdesk.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Folder (relative to the workspace root) that preview paths resolve in.
    pub static_folder: String,
    /// Front-matter field holding the page date. Empty means `date`.
    pub date_field: String,
    /// Front-matter field holding the page description. Empty means `description`.
    pub description_field: String,
    pub open_on_start: bool,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub folders: Vec<FolderSetting>,
    pub custom_sorting: Vec<SortingOption>,
    pub scripts: Vec<CustomScript>,
    pub dashboard: DashboardStateConfig,
    pub processing: ProcessingConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            static_folder: String::new(),
            date_field: DEFAULT_DATE_FIELD.to_string(),
            description_field: DEFAULT_DESCRIPTION_FIELD.to_string(),
            open_on_start: false,
            tags: Vec::new(),
            categories: Vec::new(),
            folders: Vec::new(),
            custom_sorting: Vec::new(),
            scripts: Vec::new(),
            dashboard: DashboardStateConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

/// Persisted dashboard view state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardStateConfig {
    pub view: Option<ViewType>,
    pub contents: ViewStateConfig,
    pub media: ViewStateConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewStateConfig {
    /// Last sort picked in this view.
    pub sorting: Option<SortingOption>,
    /// Sort id to start with when nothing was picked.
    pub default_sorting: Option<String>,
}

impl From<&ViewStateConfig> for ViewState {
    fn from(config: &ViewStateConfig) -> Self {
        ViewState {
            sorting: config.sorting.clone(),
            default_sorting: config.default_sorting.clone(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel front-matter readers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

impl DashboardConfig {
    /// Validate config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for folder in &self.folders {
            if folder.title.trim().is_empty() || folder.path.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "folders entries need a non-empty title and path".into(),
                ));
            }
        }
        let mut ids = HashSet::new();
        for option in sorting::all_options(&self.custom_sorting) {
            if option.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "custom_sorting entries need a non-empty name".into(),
                ));
            }
            if !ids.insert(option.id.clone()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate sort id '{}'",
                    option.id
                )));
            }
        }
        for script in &self.scripts {
            if script.title.trim().is_empty() || script.script.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "scripts entries need a non-empty title and script".into(),
                ));
            }
        }
        Ok(())
    }

    /// Date field name, falling back to `date` when blank.
    pub fn date_field(&self) -> &str {
        non_blank(&self.date_field, DEFAULT_DATE_FIELD)
    }

    /// Description field name, falling back to `description` when blank.
    pub fn description_field(&self) -> &str {
        non_blank(&self.description_field, DEFAULT_DESCRIPTION_FIELD)
    }

    /// Absolute path of a configured folder.
    pub fn folder_path(&self, root: &Path, folder: &FolderSetting) -> PathBuf {
        root.join(&folder.path)
    }

    /// Build the settings snapshot pushed to a dashboard.
    pub fn to_settings(&self, initialized: bool, version_info: VersionInfo) -> Settings {
        Settings {
            folders: self.folders.clone(),
            initialized,
            tags: self.tags.clone(),
            categories: self.categories.clone(),
            open_on_start: self.open_on_start,
            version_info,
            custom_sorting: self.custom_sorting.clone(),
            scripts: self.scripts.clone(),
            dashboard_state: DashboardState {
                view: self.dashboard.view,
                contents: (&self.dashboard.contents).into(),
                media: (&self.dashboard.media).into(),
            },
        }
    }
}

fn non_blank<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(DashboardConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Whether the workspace has been initialized with a config file.
pub fn is_initialized(root: &Path) -> bool {
    root.join(CONFIG_FILE).is_file()
}

/// Load `frontdesk.toml` from the workspace root as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<DashboardConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: DashboardConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config for the workspace at `root`, using defaults when no file exists.
pub fn load_config(root: &Path) -> Result<DashboardConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Write the stock config file if the workspace has none.
///
/// Returns `true` when a file was written.
pub fn initialize(root: &Path) -> Result<bool, ConfigError> {
    let path = root.join(CONFIG_FILE);
    if path.exists() {
        return Ok(false);
    }
    fs::write(path, stock_config_toml())?;
    Ok(true)
}

// =============================================================================
// Setting updates
// =============================================================================

/// Persist one setting and return the resulting config.
///
/// `name` is a dotted key path (`open_on_start`, `dashboard.contents.sorting`).
/// camelCase segments are accepted and converted (`openOnStart`). A JSON
/// `null` removes the key so the stock default applies again. Nothing is
/// written if the result does not validate.
pub fn update_setting(
    root: &Path,
    name: &str,
    value: &Value,
) -> Result<DashboardConfig, ConfigError> {
    let segments: Vec<String> = name
        .split('.')
        .map(|s| to_snake_case(s.trim()))
        .collect();
    if segments.iter().any(String::is_empty) {
        return Err(ConfigError::Setting {
            name: name.to_string(),
            reason: "empty key segment".into(),
        });
    }

    let mut raw = match load_raw_config(root)? {
        Some(toml::Value::Table(table)) => table,
        _ => toml::Table::new(),
    };

    if value.is_null() {
        remove_path(&mut raw, &segments);
    } else {
        let toml_value = toml::Value::try_from(value).map_err(|e| ConfigError::Setting {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        set_path(&mut raw, &segments, toml_value).map_err(|reason| ConfigError::Setting {
            name: name.to_string(),
            reason,
        })?;
    }

    let raw = toml::Value::Table(raw);
    let config = resolve_config(stock_defaults_value(), Some(raw.clone()))?;
    fs::write(root.join(CONFIG_FILE), toml::to_string_pretty(&raw)?)?;
    Ok(config)
}

fn set_path(table: &mut toml::Table, path: &[String], value: toml::Value) -> Result<(), String> {
    let (last, parents) = path.split_last().ok_or("empty key")?;
    let mut current = table;
    for key in parents {
        let entry = current
            .entry(key.clone())
            .or_insert(toml::Value::Table(toml::Table::new()));
        current = entry
            .as_table_mut()
            .ok_or_else(|| format!("'{key}' is not a table"))?;
    }
    current.insert(last.clone(), value);
    Ok(())
}

fn remove_path(table: &mut toml::Table, path: &[String]) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = table;
    for key in parents {
        match current.get_mut(key).and_then(toml::Value::as_table_mut) {
            Some(next) => current = next,
            None => return,
        }
    }
    current.remove(last);
}

fn to_snake_case(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len() + 4);
    for c in segment.chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Returns a fully-commented stock `frontdesk.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command and the `initializeProject` request.
pub fn stock_config_toml() -> &'static str {
    r##"# frontdesk configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Folder (relative to the workspace root) that `preview` front-matter paths
# are resolved in, e.g. "static" for Hugo or "public" for Next.js.
static_folder = ""

# Front-matter field shown as the page date.
date_field = "date"

# Front-matter field shown as the page description.
description_field = "description"

# Open the dashboard when the editor starts.
open_on_start = false

# Choices offered in the tag and category filters.
tags = []
categories = []

# ---------------------------------------------------------------------------
# Content folders
# ---------------------------------------------------------------------------
# Every markdown (.md / .mdx) file under these folders is listed.
# [[folders]]
# title = "Blog"
# path = "content/blog"

# ---------------------------------------------------------------------------
# Custom sorting
# ---------------------------------------------------------------------------
# Offered after the built-in options. `name` is the front-matter field.
# `id` defaults to "<name>-<order>", `title` defaults to `name`.
# [[custom_sorting]]
# name = "weight"
# title = "Weight"
# order = "asc"      # asc | desc
# type = "string"    # string | date

# ---------------------------------------------------------------------------
# Custom scripts
# ---------------------------------------------------------------------------
# Run from a page's action menu as `[command] <script> <file path>`.
# [[scripts]]
# title = "Generate social image"
# script = "scripts/social.js"
# command = "node"
# type = "content"   # content | media
# bulk = false

# ---------------------------------------------------------------------------
# Dashboard state
# ---------------------------------------------------------------------------
[dashboard]
# view = "contents"  # contents | media

[dashboard.contents]
# default_sorting = "Last modified (desc)"

[dashboard.media]
# default_sorting = "By filename (asc)"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel front-matter readers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
