//! Dashboard session state.
//!
//! A [`ViewStateStore`] is owned by one dashboard session and passed by
//! reference to whatever needs it. It holds the current view, the filter and
//! sort selections, and the latest settings and pages pushed by the host.
//! Everything the dashboard renders is derived from that state on demand:
//!
//! ```text
//! pages ─▶ FilterState::matches ─▶ sort_pages(effective_sort) ─▶ group_pages
//! ```
//!
//! The store never changes settings itself. [`ViewStateStore::update_setting`]
//! and [`ViewStateStore::select_sort`] only build the request for the host;
//! the change becomes visible once the host pushes the new settings back.
//!
//! Pushes carry a host revision. A settings or pages push whose revision is
//! not newer than the last one applied on that channel is dropped, so a slow
//! response can never overwrite fresher data. After a [`reset`], settings and
//! pages answering a request sent before it are dropped too.
//!
//! [`reset`]: ViewStateStore::reset

use crate::filter::FilterState;
use crate::message::{MessageError, Notification, Push, PushEnvelope, Request, RequestEnvelope};
use crate::sorting::{self, GroupOption, PageGroup, SortingOption};
use crate::types::{DashboardState, Page, Settings, ViewType};
use serde_json::Value;

/// What [`ViewStateStore::apply`] did with a push.
#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    Applied,
    /// Older than data already applied; ignored.
    Stale,
    /// Notifications are not state; they are handed back for display.
    Notification(Notification),
}

#[derive(Debug, Default)]
pub struct ViewStateStore {
    view: ViewType,
    /// Set once the user picks a view; until then the persisted view applies.
    view_chosen: bool,
    filters: FilterState,
    sort_selection: Option<SortingOption>,
    grouping: GroupOption,
    settings: Option<Settings>,
    pages: Vec<Page>,
    settings_revision: Option<u64>,
    pages_revision: Option<u64>,
    next_request: u64,
    /// First request id of the current session.
    session_start: u64,
}

impl ViewStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to the state of a freshly opened dashboard. Request ids keep
    /// counting up; answers to requests sent before the reset are ignored.
    pub fn reset(&mut self) {
        let next_request = self.next_request;
        *self = Self {
            next_request,
            session_start: next_request + 1,
            ..Self::default()
        };
    }

    // ------------------------------------------------------------------
    // Outbound
    // ------------------------------------------------------------------

    /// Wrap a request with the next request id.
    pub fn request(&mut self, message: Request) -> RequestEnvelope {
        self.next_request += 1;
        RequestEnvelope {
            id: self.next_request,
            message,
        }
    }

    /// Ask the host to persist a setting. Local state is untouched.
    pub fn update_setting(&mut self, name: impl Into<String>, value: Value) -> RequestEnvelope {
        self.request(Request::UpdateSetting {
            name: name.into(),
            value,
        })
    }

    /// Apply a sort to the current view and ask the host to remember it.
    pub fn select_sort(&mut self, option: SortingOption) -> Result<RequestEnvelope, MessageError> {
        let value = serde_json::to_value(&option)?;
        let name = format!("dashboard.{}.sorting", self.view.as_str());
        self.set_sort(Some(option));
        Ok(self.update_setting(name, value))
    }

    /// Apply a sort for this session only, without persisting it.
    pub fn set_sort(&mut self, option: Option<SortingOption>) {
        self.sort_selection = option;
    }

    // ------------------------------------------------------------------
    // Inbound
    // ------------------------------------------------------------------

    /// Apply a push from the host.
    pub fn apply(&mut self, envelope: PushEnvelope) -> PushOutcome {
        let revision = envelope.revision;
        let before_reset = envelope.request.is_some_and(|r| r < self.session_start);
        if before_reset && !matches!(envelope.message, Push::Notification(_)) {
            tracing::debug!(
                request = ?envelope.request,
                session_start = self.session_start,
                "dropping push answering a request from before reset"
            );
            return PushOutcome::Stale;
        }
        let applied = match envelope.message {
            Push::Settings(settings) => self.ingest_settings(revision, *settings),
            Push::Pages(pages) => self.ingest_pages(revision, pages),
            Push::Notification(note) => return PushOutcome::Notification(note),
        };
        if applied {
            PushOutcome::Applied
        } else {
            PushOutcome::Stale
        }
    }

    /// Replace the settings snapshot. Returns `false` if the push is stale.
    pub fn ingest_settings(&mut self, revision: u64, settings: Settings) -> bool {
        if !is_newer(self.settings_revision, revision) {
            tracing::debug!(revision, last = ?self.settings_revision, "dropping stale settings push");
            return false;
        }
        if !self.view_chosen {
            if let Some(view) = settings.dashboard_state.view {
                self.view = view;
            }
        }
        self.settings_revision = Some(revision);
        self.settings = Some(settings);
        true
    }

    /// Replace the page collection. Returns `false` if the push is stale.
    pub fn ingest_pages(&mut self, revision: u64, pages: Vec<Page>) -> bool {
        if !is_newer(self.pages_revision, revision) {
            tracing::debug!(revision, last = ?self.pages_revision, "dropping stale pages push");
            return false;
        }
        self.pages_revision = Some(revision);
        self.pages = pages;
        true
    }

    // ------------------------------------------------------------------
    // Selections
    // ------------------------------------------------------------------

    pub fn view(&self) -> ViewType {
        self.view
    }

    /// Switch view. The sort selection is dropped so the new view resolves
    /// its own; filters are kept.
    pub fn set_view(&mut self, view: ViewType) {
        self.view = view;
        self.view_chosen = true;
        self.sort_selection = None;
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterState {
        &mut self.filters
    }

    pub fn sort_selection(&self) -> Option<&SortingOption> {
        self.sort_selection.as_ref()
    }

    /// Sort switching is disabled while a search is active.
    pub fn sort_enabled(&self) -> bool {
        !self.filters.is_searching()
    }

    pub fn grouping(&self) -> GroupOption {
        self.grouping
    }

    pub fn set_grouping(&mut self, grouping: GroupOption) {
        self.grouping = grouping;
    }

    // ------------------------------------------------------------------
    // Derived
    // ------------------------------------------------------------------

    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn sort_options(&self) -> Vec<SortingOption> {
        let custom = self
            .settings
            .as_ref()
            .map(|s| s.custom_sorting.as_slice())
            .unwrap_or_default();
        sorting::all_options(custom)
    }

    /// The sort that applies right now in the current view.
    pub fn effective_sort(&self) -> SortingOption {
        let fallback = DashboardState::default();
        let state = self
            .settings
            .as_ref()
            .map_or(&fallback, |s| &s.dashboard_state);
        sorting::resolve(
            self.sort_selection.as_ref(),
            self.view,
            state,
            &self.sort_options(),
        )
    }

    /// Pages passing the active filters, sorted by the effective sort.
    pub fn visible_pages(&self) -> Vec<&Page> {
        let mut pages: Vec<&Page> = self
            .pages
            .iter()
            .filter(|p| self.filters.matches(p))
            .collect();
        sorting::sort_pages(&mut pages, &self.effective_sort());
        pages
    }

    pub fn grouped_pages(&self) -> Vec<PageGroup<'_>> {
        sorting::group_pages(&self.visible_pages(), self.grouping)
    }

    /// Tag filter choices: configured tags first, then any other tag found on
    /// a page, alphabetically.
    pub fn tag_options(&self) -> Vec<String> {
        let configured = self.settings.as_ref().map(|s| s.tags.as_slice());
        taxonomy_options(configured.unwrap_or_default(), &self.pages, Page::tags)
    }

    /// Category filter choices, built like [`Self::tag_options`].
    pub fn category_options(&self) -> Vec<String> {
        let configured = self.settings.as_ref().map(|s| s.categories.as_slice());
        taxonomy_options(configured.unwrap_or_default(), &self.pages, Page::categories)
    }

    /// Folder filter choices, in configured order.
    pub fn folder_options(&self) -> Vec<String> {
        self.settings
            .iter()
            .flat_map(|s| s.folders.iter().map(|f| f.title.clone()))
            .collect()
    }
}

fn is_newer(last: Option<u64>, revision: u64) -> bool {
    last.is_none_or(|last| revision > last)
}

fn taxonomy_options<'a>(
    configured: &[String],
    pages: &'a [Page],
    values: fn(&'a Page) -> Vec<&'a str>,
) -> Vec<String> {
    let mut found: Vec<&str> = pages
        .iter()
        .flat_map(values)
        .filter(|v| !configured.iter().any(|c| c == v))
        .collect();
    found.sort_unstable();
    found.dedup();

    configured
        .iter()
        .cloned()
        .chain(found.into_iter().map(String::from))
        .collect()
}
