//! Sort options, sort resolution, and grouping.
//!
//! ## Options
//!
//! Four built-in options are always available. Custom options come from the
//! `custom_sorting` list in `frontdesk.toml`; each names the front-matter field
//! it sorts on. Custom entries are normalized before use:
//!
//! - missing `id` → `"<name>-<order>"` (e.g. `Priority-asc`)
//! - missing `title` → `name`
//!
//! ## Resolution
//!
//! [`resolve`] picks the single option to apply by evaluating an ordered list
//! of rules. Each rule either decides or passes; the first decision wins:
//!
//! 1. the option the user just picked
//! 2. the option persisted for the current view
//! 3. the view's configured default sort id, looked up among all options
//!
//! The decision is then looked up by id among all options. If there was no
//! decision, or its id is no longer offered (a custom sort was removed from the
//! config), the first built-in option is used.
//!
//! ## Comparison
//!
//! `date` options compare as timestamps, `string` options compare as
//! case-sensitive text. Pages missing the field (or with a date that does not
//! parse) sort before pages that have it; `desc` reverses the whole ordering.

use crate::types::{DashboardState, Page, ViewType};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortType {
    Date,
    String,
}

/// A sort definition, built-in or user-configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortingOption {
    #[serde(default)]
    pub id: String,
    /// Field to sort on for custom options; display label for built-ins.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub order: SortOrder,
    #[serde(rename = "type")]
    pub sort_type: SortType,
}

pub const LAST_MODIFIED_ASC: &str = "Last modified (asc)";
pub const LAST_MODIFIED_DESC: &str = "Last modified (desc)";
pub const FILE_NAME_ASC: &str = "By filename (asc)";
pub const FILE_NAME_DESC: &str = "By filename (desc)";

impl SortingOption {
    fn builtin(id: &str, order: SortOrder, sort_type: SortType) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            title: None,
            order,
            sort_type,
        }
    }

    /// Label to show in a sort menu.
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.name)
    }

    /// Page field this option compares.
    pub fn field(&self) -> &str {
        match self.id.as_str() {
            LAST_MODIFIED_ASC | LAST_MODIFIED_DESC => "fmModified",
            FILE_NAME_ASC | FILE_NAME_DESC => "fmFileName",
            _ => &self.name,
        }
    }

    /// Fill in a custom option's synthesized `id` and fallback `title`.
    pub fn normalized(&self) -> Self {
        let id = if self.id.is_empty() {
            format!("{}-{}", self.name, self.order)
        } else {
            self.id.clone()
        };
        Self {
            id,
            title: Some(self.label().to_string()),
            ..self.clone()
        }
    }
}

/// The four options available regardless of configuration.
pub fn builtin_options() -> Vec<SortingOption> {
    vec![
        SortingOption::builtin(LAST_MODIFIED_ASC, SortOrder::Asc, SortType::Date),
        SortingOption::builtin(LAST_MODIFIED_DESC, SortOrder::Desc, SortType::Date),
        SortingOption::builtin(FILE_NAME_ASC, SortOrder::Asc, SortType::String),
        SortingOption::builtin(FILE_NAME_DESC, SortOrder::Desc, SortType::String),
    ]
}

/// Built-in options followed by the normalized custom options.
pub fn all_options(custom: &[SortingOption]) -> Vec<SortingOption> {
    let mut options = builtin_options();
    options.extend(custom.iter().map(SortingOption::normalized));
    options
}

// ============================================================================
// Resolution
// ============================================================================

/// Inputs the resolution rules look at.
pub struct SortContext<'a> {
    pub requested: Option<&'a SortingOption>,
    pub view: ViewType,
    pub state: &'a DashboardState,
    pub options: &'a [SortingOption],
}

type Rule = fn(&SortContext<'_>) -> Option<SortingOption>;

const RULES: &[(&str, Rule)] = &[
    ("requested", requested_rule),
    ("persisted", persisted_rule),
    ("configured default", default_rule),
];

fn requested_rule(ctx: &SortContext<'_>) -> Option<SortingOption> {
    ctx.requested.filter(|o| !o.id.is_empty()).cloned()
}

fn persisted_rule(ctx: &SortContext<'_>) -> Option<SortingOption> {
    ctx.state
        .for_view(ctx.view)
        .sorting
        .as_ref()
        .filter(|o| !o.id.is_empty())
        .cloned()
}

fn default_rule(ctx: &SortContext<'_>) -> Option<SortingOption> {
    let id = ctx.state.for_view(ctx.view).default_sorting.as_deref()?;
    ctx.options.iter().find(|o| o.id == id).cloned()
}

/// Resolve the effective sort option for `view`.
///
/// `options` should come from [`all_options`]. The result always has an id
/// present in `options` or is the first built-in option.
pub fn resolve(
    requested: Option<&SortingOption>,
    view: ViewType,
    state: &DashboardState,
    options: &[SortingOption],
) -> SortingOption {
    let ctx = SortContext {
        requested,
        view,
        state,
        options,
    };
    let decision = RULES.iter().find_map(|(rule, apply)| {
        let decided = apply(&ctx);
        if let Some(option) = &decided {
            tracing::trace!(rule, id = %option.id, "sort resolved");
        }
        decided
    });

    decision
        .and_then(|d| options.iter().find(|o| o.id == d.id).cloned())
        .unwrap_or_else(first_builtin)
}

fn first_builtin() -> SortingOption {
    SortingOption::builtin(LAST_MODIFIED_ASC, SortOrder::Asc, SortType::Date)
}

// ============================================================================
// Comparison
// ============================================================================

/// Compare two pages under `option`.
pub fn compare_pages(a: &Page, b: &Page, option: &SortingOption) -> Ordering {
    let field = option.field();
    let ordering = match option.sort_type {
        SortType::Date => date_key(a, field).cmp(&date_key(b, field)),
        SortType::String => string_key(a, field).cmp(&string_key(b, field)),
    };
    match option.order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

/// Stable sort of `pages` under `option`.
pub fn sort_pages(pages: &mut [&Page], option: &SortingOption) {
    pages.sort_by(|a, b| compare_pages(a, b, option));
}

fn date_key(page: &Page, field: &str) -> Option<i64> {
    match page.field(field)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => parse_timestamp(&s),
        _ => None,
    }
}

fn string_key(page: &Page, field: &str) -> Option<String> {
    match page.field(field)? {
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Parse a front-matter date into milliseconds since the Unix epoch.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]`, `YYYY-MM-DDTHH:MM[:SS]` (taken
/// as UTC) and plain `YYYY-MM-DD`.
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }
    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

// ============================================================================
// Grouping
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupOption {
    #[default]
    None,
    Year,
    Draft,
}

impl std::str::FromStr for GroupOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(GroupOption::None),
            "year" => Ok(GroupOption::Year),
            "draft" => Ok(GroupOption::Draft),
            other => Err(format!("unknown grouping '{other}' (expected none, year or draft)")),
        }
    }
}

/// Group label for `page`, or `None` when it belongs in the "No date" group.
fn group_label(page: &Page, grouping: GroupOption) -> Option<String> {
    match grouping {
        GroupOption::None => Some(String::new()),
        GroupOption::Year => parse_timestamp(&page.date)
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.year().to_string()),
        GroupOption::Draft if page.is_draft() => Some("Draft".to_string()),
        GroupOption::Draft => Some("Published".to_string()),
    }
}

/// A labelled run of pages.
#[derive(Debug, Clone, PartialEq)]
pub struct PageGroup<'a> {
    /// Empty when grouping is off.
    pub label: String,
    pub pages: Vec<&'a Page>,
}

pub const NO_DATE_GROUP: &str = "No date";

/// Split already-sorted pages into groups, keeping their order.
///
/// Groups appear in order of first occurrence, except that pages without a
/// parseable date always form a trailing "No date" group.
pub fn group_pages<'a>(pages: &[&'a Page], grouping: GroupOption) -> Vec<PageGroup<'a>> {
    if grouping == GroupOption::None {
        return vec![PageGroup {
            label: String::new(),
            pages: pages.to_vec(),
        }];
    }

    let mut groups: Vec<PageGroup<'a>> = Vec::new();
    let mut undated = Vec::new();
    for &page in pages {
        let Some(label) = group_label(page, grouping) else {
            undated.push(page);
            continue;
        };
        match groups.iter_mut().find(|g| g.label == label) {
            Some(group) => group.pages.push(page),
            None => groups.push(PageGroup {
                label,
                pages: vec![page],
            }),
        }
    }
    if !undated.is_empty() {
        groups.push(PageGroup {
            label: NO_DATE_GROUP.to_string(),
            pages: undated,
        });
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{page_with, titles};
    use crate::types::ViewState;
    use serde_json::json;

    fn custom(name: &str, order: SortOrder, sort_type: SortType) -> SortingOption {
        SortingOption {
            id: String::new(),
            name: name.to_string(),
            title: None,
            order,
            sort_type,
        }
    }

    fn state_with(contents: ViewState, media: ViewState) -> DashboardState {
        DashboardState {
            view: None,
            contents,
            media,
        }
    }

    // =========================================================================
    // Options
    // =========================================================================

    #[test]
    fn custom_option_gets_synthesized_id_and_title() {
        let normalized = custom("Priority", SortOrder::Asc, SortType::String).normalized();
        assert_eq!(normalized.id, "Priority-asc");
        assert_eq!(normalized.title.as_deref(), Some("Priority"));
    }

    #[test]
    fn explicit_custom_id_and_title_are_kept() {
        let mut option = custom("weight", SortOrder::Desc, SortType::String);
        option.id = "heavy-first".to_string();
        option.title = Some("Heaviest first".to_string());
        let normalized = option.normalized();
        assert_eq!(normalized.id, "heavy-first");
        assert_eq!(normalized.label(), "Heaviest first");
    }

    #[test]
    fn empty_title_falls_back_to_name() {
        let mut option = custom("weight", SortOrder::Asc, SortType::String);
        option.title = Some(String::new());
        assert_eq!(option.label(), "weight");
        assert_eq!(option.normalized().title.as_deref(), Some("weight"));
    }

    #[test]
    fn all_options_puts_builtins_first() {
        let options = all_options(&[custom("Priority", SortOrder::Desc, SortType::String)]);
        assert_eq!(options.len(), 5);
        assert_eq!(options[0].id, LAST_MODIFIED_ASC);
        assert_eq!(options[4].id, "Priority-desc");
    }

    #[test]
    fn builtin_fields() {
        let options = builtin_options();
        assert_eq!(options[0].field(), "fmModified");
        assert_eq!(options[3].field(), "fmFileName");
        assert_eq!(
            custom("weight", SortOrder::Asc, SortType::String).field(),
            "weight"
        );
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    #[test]
    fn requested_option_wins_over_everything() {
        let options = all_options(&[]);
        let state = state_with(
            ViewState {
                sorting: Some(options[1].clone()),
                default_sorting: Some(FILE_NAME_ASC.to_string()),
            },
            ViewState::default(),
        );
        let resolved = resolve(Some(&options[3]), ViewType::Contents, &state, &options);
        assert_eq!(resolved, options[3]);
    }

    #[test]
    fn requested_by_id_resolves_to_full_option() {
        let options = all_options(&[]);
        let requested = SortingOption {
            id: FILE_NAME_DESC.to_string(),
            name: String::new(),
            title: None,
            order: SortOrder::Asc,
            sort_type: SortType::Date,
        };
        let resolved = resolve(
            Some(&requested),
            ViewType::Contents,
            &DashboardState::default(),
            &options,
        );
        assert_eq!(resolved.order, SortOrder::Desc);
        assert_eq!(resolved.sort_type, SortType::String);
    }

    #[test]
    fn persisted_option_used_when_nothing_requested() {
        let options = all_options(&[]);
        let state = state_with(
            ViewState {
                sorting: Some(options[2].clone()),
                default_sorting: Some(LAST_MODIFIED_DESC.to_string()),
            },
            ViewState::default(),
        );
        let resolved = resolve(None, ViewType::Contents, &state, &options);
        assert_eq!(resolved.id, FILE_NAME_ASC);
    }

    #[test]
    fn persisted_state_is_per_view() {
        let options = all_options(&[]);
        let state = state_with(
            ViewState {
                sorting: Some(options[2].clone()),
                default_sorting: None,
            },
            ViewState {
                sorting: Some(options[1].clone()),
                default_sorting: None,
            },
        );
        assert_eq!(
            resolve(None, ViewType::Media, &state, &options).id,
            LAST_MODIFIED_DESC
        );
    }

    #[test]
    fn configured_default_used_when_nothing_persisted() {
        let options = all_options(&[custom("Priority", SortOrder::Asc, SortType::String)]);
        let state = state_with(
            ViewState::default(),
            ViewState {
                sorting: None,
                default_sorting: Some("Priority-asc".to_string()),
            },
        );
        let resolved = resolve(None, ViewType::Media, &state, &options);
        assert_eq!(resolved.id, "Priority-asc");
        assert_eq!(resolved.field(), "Priority");
    }

    #[test]
    fn unknown_default_falls_back_to_first_builtin() {
        let options = all_options(&[]);
        let state = state_with(
            ViewState {
                sorting: None,
                default_sorting: Some("gone".to_string()),
            },
            ViewState::default(),
        );
        assert_eq!(
            resolve(None, ViewType::Contents, &state, &options).id,
            LAST_MODIFIED_ASC
        );
    }

    #[test]
    fn nothing_configured_resolves_last_modified_asc() {
        let options = all_options(&[]);
        let resolved = resolve(None, ViewType::Contents, &DashboardState::default(), &options);
        assert_eq!(resolved.id, LAST_MODIFIED_ASC);
        assert_eq!(resolved.order, SortOrder::Asc);
        assert_eq!(resolved.sort_type, SortType::Date);
    }

    #[test]
    fn removed_custom_selection_falls_back_to_first_builtin() {
        let options = all_options(&[]);
        let stale = custom("Priority", SortOrder::Asc, SortType::String).normalized();
        let state = state_with(
            ViewState {
                sorting: Some(stale),
                default_sorting: None,
            },
            ViewState::default(),
        );
        assert_eq!(
            resolve(None, ViewType::Contents, &state, &options).id,
            LAST_MODIFIED_ASC
        );
    }

    #[test]
    fn empty_requested_id_is_not_a_decision() {
        let options = all_options(&[]);
        let empty = custom("", SortOrder::Desc, SortType::String);
        let state = state_with(
            ViewState {
                sorting: Some(options[3].clone()),
                default_sorting: None,
            },
            ViewState::default(),
        );
        assert_eq!(
            resolve(Some(&empty), ViewType::Contents, &state, &options).id,
            FILE_NAME_DESC
        );
    }

    // =========================================================================
    // Comparison
    // =========================================================================

    #[test]
    fn last_modified_sorts_by_mtime() {
        let mut old = page_with("Old", json!({}));
        old.fm_modified = 1_000;
        let mut new = page_with("New", json!({}));
        new.fm_modified = 2_000;

        let options = builtin_options();
        let mut pages = vec![&new, &old];
        sort_pages(&mut pages, &options[0]);
        assert_eq!(titles(&pages), vec!["Old", "New"]);
        sort_pages(&mut pages, &options[1]);
        assert_eq!(titles(&pages), vec!["New", "Old"]);
    }

    #[test]
    fn string_sort_is_case_sensitive() {
        let upper = page_with("Zed", json!({"label": "Banana"}));
        let lower = page_with("Ann", json!({"label": "apple"}));
        let option = custom("label", SortOrder::Asc, SortType::String).normalized();

        let mut pages = vec![&lower, &upper];
        sort_pages(&mut pages, &option);
        // 'B' (0x42) sorts before 'a' (0x61)
        assert_eq!(titles(&pages), vec!["Zed", "Ann"]);
    }

    #[test]
    fn date_sort_compares_timestamps_not_text() {
        let a = page_with("A", json!({"published": "2023-02-01"}));
        let b = page_with("B", json!({"published": "2023-01-15T10:00:00Z"}));
        let c = page_with("C", json!({"published": "2022-12-31 23:59:00"}));
        let option = custom("published", SortOrder::Asc, SortType::Date).normalized();

        let mut pages = vec![&a, &b, &c];
        sort_pages(&mut pages, &option);
        assert_eq!(titles(&pages), vec!["C", "B", "A"]);
    }

    #[test]
    fn missing_field_sorts_first_ascending_and_last_descending() {
        let has = page_with("Has", json!({"weight": "1"}));
        let missing = page_with("Missing", json!({}));
        let asc = custom("weight", SortOrder::Asc, SortType::String).normalized();
        let desc = custom("weight", SortOrder::Desc, SortType::String).normalized();

        let mut pages = vec![&has, &missing];
        sort_pages(&mut pages, &asc);
        assert_eq!(titles(&pages), vec!["Missing", "Has"]);
        sort_pages(&mut pages, &desc);
        assert_eq!(titles(&pages), vec!["Has", "Missing"]);
    }

    #[test]
    fn unparseable_date_counts_as_missing() {
        let good = page_with("Good", json!({"published": "2023-01-01"}));
        let bad = page_with("Bad", json!({"published": "someday"}));
        let option = custom("published", SortOrder::Asc, SortType::Date).normalized();

        let mut pages = vec![&good, &bad];
        sort_pages(&mut pages, &option);
        assert_eq!(titles(&pages), vec!["Bad", "Good"]);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let a = page_with("A", json!({"rank": "1"}));
        let b = page_with("B", json!({"rank": "1"}));
        let c = page_with("C", json!({"rank": "1"}));
        let option = custom("rank", SortOrder::Desc, SortType::String).normalized();

        let mut pages = vec![&a, &b, &c];
        sort_pages(&mut pages, &option);
        assert_eq!(titles(&pages), vec!["A", "B", "C"]);
    }

    #[test]
    fn parse_timestamp_formats() {
        assert_eq!(parse_timestamp("1970-01-02"), Some(86_400_000));
        assert_eq!(parse_timestamp("1970-01-01T00:00:01Z"), Some(1_000));
        assert_eq!(parse_timestamp("1970-01-01 00:01"), Some(60_000));
        assert_eq!(parse_timestamp("not a date"), None);
    }

    // =========================================================================
    // Grouping
    // =========================================================================

    #[test]
    fn no_grouping_is_one_unlabelled_group() {
        let a = page_with("A", json!({}));
        let groups = group_pages(&[&a], GroupOption::None);
        assert_eq!(groups.len(), 1);
        assert!(groups[0].label.is_empty());
    }

    #[test]
    fn year_grouping_keeps_order_and_trails_undated() {
        let mut a = page_with("A", json!({}));
        a.date = "2024-03-01".to_string();
        let b = page_with("B", json!({}));
        let mut c = page_with("C", json!({}));
        c.date = "2023-06-01".to_string();
        let mut d = page_with("D", json!({}));
        d.date = "2024-01-01".to_string();

        let groups = group_pages(&[&a, &b, &c, &d], GroupOption::Year);
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["2024", "2023", NO_DATE_GROUP]);
        assert_eq!(titles(&groups[0].pages), vec!["A", "D"]);
        assert_eq!(titles(&groups[2].pages), vec!["B"]);
    }

    #[test]
    fn draft_grouping_splits_by_status() {
        let mut draft = page_with("Draft", json!({}));
        draft.draft = Some(true);
        let published = page_with("Live", json!({}));

        let groups = group_pages(&[&published, &draft], GroupOption::Draft);
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Published", "Draft"]);
    }
}
