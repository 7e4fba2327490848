//! # Frontdesk
//!
//! The core of a content dashboard for markdown/MDX sites. A workspace lists
//! its content folders in `frontdesk.toml`; frontdesk reads the front-matter of
//! every file in them and serves the resulting pages to a dashboard, which
//! filters, sorts and groups them for display.
//!
//! # Architecture: Host and Dashboard
//!
//! The two sides only talk through typed messages:
//!
//! ```text
//!              requests (getData, updateSetting, ...)
//! Dashboard  ─────────────────────────────────────────▶  Host
//! (store)    ◀─────────────────────────────────────────  (host, scan, config)
//!              pushes (settings, pages, notification)
//! ```
//!
//! - The **host** owns the file system and `frontdesk.toml`. It answers each
//!   request by re-reading the workspace and pushing fresh snapshots.
//! - The **dashboard** owns one [`store::ViewStateStore`] per session. It
//!   never writes settings itself; it asks the host and waits for the push.
//!
//! The binary runs the host side over stdin/stdout (`frontdesk serve`) and
//! also offers one-shot commands that run both sides in-process.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Walks content folders and aggregates front-matter into pages |
//! | [`frontmatter`] | YAML front-matter block extraction |
//! | [`sorting`] | Sort options, sort resolution, comparison and grouping |
//! | [`filter`] | Tag, category, folder and search filtering |
//! | [`store`] | Dashboard session state and push ingestion |
//! | [`message`] | Request and push enums and their JSON codec |
//! | [`host`] | Request dispatcher over the workspace |
//! | [`bridge`] | JSON-lines transport loop |
//! | [`config`] | `frontdesk.toml` loading, validation and setting updates |
//! | [`types`] | Shared types that cross the bridge (`Page`, `Settings`, ...) |
//! | [`output`] | CLI listing formatting |
//! | [`version`] | Build version info |
//!
//! # Design Decisions
//!
//! ## Snapshots, Not Patches
//!
//! Every settings or pages push replaces the previous one wholesale. There is
//! no diffing on either side, so the dashboard can never drift from what the
//! host last saw on disk. Pushes carry a revision, and the store drops any push
//! older than the one it already holds.
//!
//! ## Closed Message Types
//!
//! Both directions are Rust enums. The host matches requests exhaustively and
//! rejects unknown commands by name instead of ignoring them.
//!
//! ## Resolution Rules Over Fallback Chains
//!
//! The active sort is picked by an ordered list of rules (user pick, persisted
//! pick, configured default), with a fixed built-in fallback. See
//! [`sorting::resolve`].

pub mod bridge;
pub mod config;
pub mod filter;
pub mod frontmatter;
pub mod host;
pub mod message;
pub mod output;
pub mod scan;
pub mod sorting;
pub mod store;
pub mod types;
pub mod version;

#[cfg(test)]
pub(crate) mod test_helpers;
