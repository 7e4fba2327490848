//! Tag, category, folder and free-text filtering.
//!
//! Each axis holds at most one active value; `None` means unfiltered. The
//! predicate is pure: [`matches`] depends only on the page and the selection.

use crate::types::Page;
use serde::{Deserialize, Serialize};

/// Active filter values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Restricts pages to one content folder (matched against `fmGroup`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

impl FilterSelection {
    pub fn is_empty(&self) -> bool {
        self.tag.is_none() && self.category.is_none() && self.folder.is_none()
    }
}

/// Whether `page` passes every active axis of `selection`.
pub fn matches(page: &Page, selection: &FilterSelection) -> bool {
    let tag_ok = selection
        .tag
        .as_deref()
        .is_none_or(|tag| page.tags().contains(&tag));
    let category_ok = selection
        .category
        .as_deref()
        .is_none_or(|category| page.categories().contains(&category));
    let folder_ok = selection
        .folder
        .as_deref()
        .is_none_or(|folder| page.fm_group == folder);
    tag_ok && category_ok && folder_ok
}

/// Case-insensitive substring search over title, description and slug.
pub fn matches_search(page: &Page, term: &str) -> bool {
    let needle = term.to_lowercase();
    [
        Some(page.title.as_str()),
        Some(page.description.as_str()),
        page.slug.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|haystack| haystack.to_lowercase().contains(&needle))
}

/// Filter selection plus search text for one dashboard session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    selection: FilterSelection,
    search: Option<String>,
}

impl FilterState {
    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn set_tag(&mut self, tag: Option<String>) {
        self.selection.tag = tag;
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.selection.category = category;
    }

    pub fn set_folder(&mut self, folder: Option<String>) {
        self.selection.folder = folder;
    }

    /// Reset tag, category and folder at once. Search text is untouched.
    pub fn clear(&mut self) {
        self.selection = FilterSelection::default();
    }

    /// Set the search text; blank input clears it.
    pub fn set_search(&mut self, term: &str) {
        let term = term.trim();
        self.search = (!term.is_empty()).then(|| term.to_string());
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// A dashboard disables sort switching while this is true.
    pub fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    pub fn matches(&self, page: &Page) -> bool {
        matches(page, &self.selection)
            && self
                .search
                .as_deref()
                .is_none_or(|term| matches_search(page, term))
    }
}
