//! CLI output formatting for page listings.
//!
//! # Information-First Display
//!
//! Each page is shown by its title and position in the current ordering; the
//! file it came from is secondary context on an indented `Source:` line.
//!
//! ```text
//! Sorted by Last modified (desc)
//!
//! 2024 (2 pages)
//! 001 Hello world [draft]
//!     Source: blog/hello.md
//!     Date: 2024-03-01
//!     Description: A first look at...
//! 002 Release notes
//!     Source: blog/release.md
//!
//! 3 pages
//! ```
//!
//! Group headers only appear when a grouping is active. Positions restart in
//! each group.
//!
//! `format_*` functions return lines and do no I/O; `print_*` wrappers write
//! them to stdout.

use crate::message::{Notification, NotificationLevel};
use crate::sorting::{PageGroup, SortingOption};
use crate::types::Page;
use std::path::Path;

const DESCRIPTION_WIDTH: usize = 60;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "page" } else { "pages" }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// Path relative to the workspace root when possible.
fn display_source(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn page_lines(index: usize, page: &Page, root: &Path) -> Vec<String> {
    let mut header = format!("{} {}", format_index(index), page.title);
    if page.is_draft() {
        header.push_str(" [draft]");
    }
    let mut lines = vec![
        header,
        format!("{}Source: {}", indent(1), display_source(&page.fm_file_path, root)),
    ];
    if !page.date.is_empty() {
        lines.push(format!("{}Date: {}", indent(1), page.date));
    }
    if !page.description.is_empty() {
        lines.push(format!(
            "{}Description: {}",
            indent(1),
            truncate_desc(&page.description, DESCRIPTION_WIDTH)
        ));
    }
    lines
}

/// Format grouped pages under the sort that ordered them.
pub fn format_listing(groups: &[PageGroup<'_>], sort: &SortingOption, root: &Path) -> Vec<String> {
    let mut lines = vec![format!("Sorted by {}", sort.label())];
    let mut total = 0;

    for group in groups {
        if group.pages.is_empty() {
            continue;
        }
        lines.push(String::new());
        if !group.label.is_empty() {
            let n = group.pages.len();
            lines.push(format!("{} ({} {})", group.label, n, plural(n)));
        }
        for (i, page) in group.pages.iter().enumerate() {
            lines.extend(page_lines(i + 1, page, root));
        }
        total += group.pages.len();
    }

    lines.push(String::new());
    lines.push(format!("{} {}", total, plural(total)));
    lines
}

pub fn print_listing(groups: &[PageGroup<'_>], sort: &SortingOption, root: &Path) {
    for line in format_listing(groups, sort, root) {
        println!("{}", line);
    }
}

/// One-line rendering of a host notification.
pub fn format_notification(note: &Notification) -> String {
    let level = match note.level {
        NotificationLevel::Info => "info",
        NotificationLevel::Warning => "warning",
        NotificationLevel::Error => "error",
    };
    format!("{}: {}", level, note.message)
}
