//! Shared types that cross the host/dashboard bridge.
//!
//! Every type here is serialized to JSON on the wire (camelCase field names,
//! matching what a dashboard front-end expects) and most of them are also
//! produced from `frontdesk.toml` through [`crate::config`].

use crate::sorting::SortingOption;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// One discovered content file.
///
/// Built by [`crate::scan::aggregate`]. The named fields are always present
/// (possibly empty); every other front-matter key is carried in `extra`
/// unchanged. A `slug`, `draft` or `preview` value that does not fit its
/// named field stays in `extra` as written. Pages are immutable snapshots: a
/// new aggregation pass produces a whole new collection rather than patching
/// this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WirePage")]
pub struct Page {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Value of the configured date field, empty when absent.
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<bool>,
    /// Value of the configured description field, empty when absent.
    #[serde(default)]
    pub description: String,
    /// Display title of the content folder the file was found in.
    pub fm_group: String,
    /// Modification time, milliseconds since the Unix epoch.
    pub fm_modified: u64,
    pub fm_file_path: PathBuf,
    pub fm_file_name: String,
    /// Renderable URI of the preview asset, empty when not resolvable.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub preview: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Decoding form of [`Page`]: `slug`, `draft` and `preview` may hold any
/// front-matter value.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePage {
    title: String,
    #[serde(default)]
    slug: Option<Value>,
    #[serde(default)]
    date: String,
    #[serde(default)]
    draft: Option<Value>,
    #[serde(default)]
    description: String,
    fm_group: String,
    fm_modified: u64,
    fm_file_path: PathBuf,
    fm_file_name: String,
    #[serde(default)]
    preview: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<WirePage> for Page {
    fn from(wire: WirePage) -> Self {
        let mut extra = wire.extra;
        let mut keep = |name: &str, value: Option<Value>| {
            if let Some(value) = value.filter(|v| !v.is_null()) {
                extra.insert(name.to_string(), value);
            }
        };
        let (slug, raw_slug) = match wire.slug {
            Some(Value::String(s)) => (Some(s), None),
            other => (None, other),
        };
        keep("slug", raw_slug);
        let (draft, raw_draft) = match wire.draft {
            Some(Value::Bool(b)) => (Some(b), None),
            other => (None, other),
        };
        keep("draft", raw_draft);
        let (preview, raw_preview) = match wire.preview {
            Some(Value::String(s)) => (s, None),
            other => (String::new(), other),
        };
        keep("preview", raw_preview);

        Page {
            title: wire.title,
            slug,
            date: wire.date,
            draft,
            description: wire.description,
            fm_group: wire.fm_group,
            fm_modified: wire.fm_modified,
            fm_file_path: wire.fm_file_path,
            fm_file_name: wire.fm_file_name,
            preview,
            extra,
        }
    }
}

/// Field names the aggregator sets itself. A `slug`, `draft` or `preview`
/// value it could not capture is left in `extra`; the rest never live there.
pub const RESERVED_FIELDS: &[&str] = &[
    "title",
    "slug",
    "date",
    "draft",
    "description",
    "preview",
    "fmGroup",
    "fmModified",
    "fmFilePath",
    "fmFileName",
];

impl Page {
    /// Look up a field by its wire name, covering both derived fields and
    /// pass-through front-matter. Empty derived strings count as absent.
    pub fn field(&self, name: &str) -> Option<Value> {
        let non_empty = |s: &str| (!s.is_empty()).then(|| Value::String(s.to_string()));
        match name {
            "title" => non_empty(&self.title),
            "slug" => self
                .slug
                .as_deref()
                .and_then(non_empty)
                .or_else(|| self.raw("slug")),
            "date" => non_empty(&self.date),
            "draft" => self.draft.map(Value::Bool).or_else(|| self.raw("draft")),
            "description" => non_empty(&self.description),
            "preview" => non_empty(&self.preview).or_else(|| self.raw("preview")),
            "fmGroup" => non_empty(&self.fm_group),
            "fmModified" => Some(Value::from(self.fm_modified)),
            "fmFilePath" => Some(Value::String(
                self.fm_file_path.to_string_lossy().into_owned(),
            )),
            "fmFileName" => non_empty(&self.fm_file_name),
            other => self.raw(other),
        }
    }

    fn raw(&self, name: &str) -> Option<Value> {
        self.extra.get(name).filter(|v| !v.is_null()).cloned()
    }

    /// Tags declared in the page's `tags` front-matter field.
    pub fn tags(&self) -> Vec<&str> {
        string_list(self.extra.get("tags"))
    }

    /// Categories declared in the page's `categories` front-matter field.
    pub fn categories(&self) -> Vec<&str> {
        string_list(self.extra.get("categories"))
    }

    pub fn is_draft(&self) -> bool {
        self.draft.unwrap_or(false)
    }
}

/// A taxonomy field may be a list of strings or a single string.
fn string_list(value: Option<&Value>) -> Vec<&str> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.as_str()],
        _ => Vec::new(),
    }
}

/// Which half of the dashboard is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    #[default]
    Contents,
    Media,
}

impl ViewType {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewType::Contents => "contents",
            ViewType::Media => "media",
        }
    }
}

impl std::str::FromStr for ViewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contents" => Ok(ViewType::Contents),
            "media" => Ok(ViewType::Media),
            other => Err(format!("unknown view '{other}' (expected contents or media)")),
        }
    }
}

/// A configured content folder: where to look and what to call it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FolderSetting {
    pub title: String,
    /// Relative to the workspace root, or absolute.
    pub path: String,
}

/// A file found in a content folder listing.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub file_name: String,
    pub file_path: PathBuf,
    /// Milliseconds since the Unix epoch.
    pub mtime: u64,
}

/// One folder's listing, the unit the aggregator walks.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentFolder {
    pub title: String,
    pub files: Vec<FileEntry>,
}

/// What a custom script acts on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptType {
    #[default]
    Content,
    Media,
}

/// A user-defined script that can be run against a content file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomScript {
    pub title: String,
    /// Script path, relative to the workspace root.
    pub script: String,
    /// Interpreter to run the script with (`node`, `python3`, ...). When
    /// absent the script is executed directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub script_type: Option<ScriptType>,
    /// Bulk scripts run over many files and are not offered per page.
    #[serde(default)]
    pub bulk: bool,
}

impl CustomScript {
    /// Whether this script can be offered on a single content page.
    pub fn applies_to_content(&self) -> bool {
        matches!(self.script_type, None | Some(ScriptType::Content)) && !self.bulk
    }
}

/// Scripts usable from a single page's action menu.
pub fn content_scripts(scripts: &[CustomScript]) -> Vec<&CustomScript> {
    scripts.iter().filter(|s| s.applies_to_content()).collect()
}

/// Persisted sort state for one view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Last sort the user picked in this view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorting: Option<SortingOption>,
    /// Id of the sort to use when nothing was picked yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sorting: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    /// View to open the dashboard on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<ViewType>,
    #[serde(default)]
    pub contents: ViewState,
    #[serde(default)]
    pub media: ViewState,
}

impl DashboardState {
    pub fn for_view(&self, view: ViewType) -> &ViewState {
        match view {
            ViewType::Contents => &self.contents,
            ViewType::Media => &self.media,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub installed_version: String,
    /// Short git hash for development builds, absent on release builds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
}

/// Settings snapshot pushed from the host to the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub folders: Vec<FolderSetting>,
    /// True once the workspace has a `frontdesk.toml`.
    pub initialized: bool,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub open_on_start: bool,
    pub version_info: VersionInfo,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_sorting: Vec<SortingOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scripts: Vec<CustomScript>,
    #[serde(default)]
    pub dashboard_state: DashboardState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::page_with;
    use serde_json::json;

    #[test]
    fn page_serializes_with_wire_names_and_extra_fields() {
        let page = page_with("Hello", json!({"author": "Ann"}));
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["title"], "Hello");
        assert_eq!(value["fmFileName"], "hello.md");
        assert_eq!(value["author"], "Ann");
        assert!(value.get("preview").is_none());
    }

    #[test]
    fn page_round_trips_extra_fields_through_flatten() {
        let page = page_with("Hello", json!({"tags": ["rust"], "weight": 3}));
        let json = serde_json::to_string(&page).unwrap();
        let back: Page = serde_json::from_str(&json).unwrap();
        assert_eq!(back, page);
    }

    #[test]
    fn uncaptured_reserved_values_survive_the_wire() {
        let page = page_with("Hello", json!({"draft": "yes", "slug": ["a", "b"]}));
        let json = serde_json::to_string(&page).unwrap();
        let back: Page = serde_json::from_str(&json).unwrap();
        assert_eq!(back, page);
        assert_eq!(back.draft, None);
        assert_eq!(back.field("draft"), Some(json!("yes")));
        assert_eq!(back.field("slug"), Some(json!(["a", "b"])));
    }

    #[test]
    fn field_covers_derived_and_extra() {
        let page = page_with("Hello", json!({"priority": 2}));
        assert_eq!(page.field("title"), Some(json!("Hello")));
        assert_eq!(page.field("priority"), Some(json!(2)));
        assert_eq!(page.field("date"), None);
        assert_eq!(page.field("missing"), None);
    }

    #[test]
    fn tags_accept_list_or_single_string() {
        let listed = page_with("A", json!({"tags": ["a", "b"]}));
        assert_eq!(listed.tags(), vec!["a", "b"]);

        let single = page_with("B", json!({"categories": "news"}));
        assert_eq!(single.categories(), vec!["news"]);
        assert!(single.tags().is_empty());
    }

    #[test]
    fn view_type_parses_from_str() {
        assert_eq!("media".parse::<ViewType>(), Ok(ViewType::Media));
        assert!("grid".parse::<ViewType>().is_err());
    }

    #[test]
    fn content_scripts_excludes_bulk_and_media() {
        let script = |title: &str, script_type, bulk| CustomScript {
            title: title.to_string(),
            script: format!("scripts/{title}.js"),
            command: None,
            script_type,
            bulk,
        };
        let scripts = vec![
            script("plain", None, false),
            script("content", Some(ScriptType::Content), false),
            script("bulk", None, true),
            script("media", Some(ScriptType::Media), false),
        ];
        let titles: Vec<&str> = content_scripts(&scripts)
            .iter()
            .map(|s| s.title.as_str())
            .collect();
        assert_eq!(titles, vec!["plain", "content"]);
    }
}
