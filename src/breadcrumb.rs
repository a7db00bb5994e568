//! Breadcrumb chain derived from the current prefix, plus the crumb click
//! and terminal-segment selection handlers.

use crate::listing::ListRequest;
use crate::nav::{NavigationManager, NavigationPort};

pub const SEPARATOR: char = '/';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub label: String,
    pub value: String,
}

impl Crumb {
    pub fn new(label: &str, value: &str) -> Self {
        Self { label: label.to_string(), value: value.to_string() }
    }

    pub fn is_root(&self) -> bool {
        self.value.is_empty()
    }

    pub fn display_label(&self) -> &str {
        if self.is_root() {
            "Root"
        } else {
            &self.label
        }
    }
}

/// Root crumb followed by one crumb per non-empty segment. Each value is the
/// joined prefix up to that segment with a trailing separator.
pub fn crumbs(prefix: &str) -> Vec<Crumb> {
    let mut chain = vec![Crumb::new("", "")];
    let mut value = String::new();

    for segment in prefix.split(SEPARATOR).filter(|s| !s.is_empty()) {
        value.push_str(segment);
        value.push(SEPARATOR);
        chain.push(Crumb::new(segment, &value));
    }
    chain
}

/// Everything up to and including the separator before the last segment.
pub fn parent(prefix: &str) -> &str {
    let trimmed = prefix.strip_suffix(SEPARATOR).unwrap_or(prefix);
    match trimmed.rfind(SEPARATOR) {
        Some(i) => &prefix[..=i],
        None => "",
    }
}

/// Non-empty input always ends with a separator.
pub fn normalize_segment(input: &str) -> String {
    if input.is_empty() || input.ends_with(SEPARATOR) {
        input.to_string()
    } else {
        format!("{}{}", input, SEPARATOR)
    }
}

/// Handle a click on the crumb carrying `value`.
///
/// A different prefix navigates there. Clicking the current (non-root)
/// prefix switches its last segment into edit mode and asks for hints at
/// the parent.
pub fn click<P: NavigationPort>(nav: &mut NavigationManager<P>, value: &str) -> Option<ListRequest> {
    if value != nav.prefix() {
        return nav.navigate(value);
    }

    let stripped = value.strip_suffix(SEPARATOR)?;
    if stripped.is_empty() {
        return None;
    }
    tracing::debug!(prefix = %stripped, "editing terminal crumb");
    Some(nav.begin_edit(stripped))
}

/// Replace the terminal segment with `input` and navigate to the result.
pub fn select_segment<P: NavigationPort>(
    nav: &mut NavigationManager<P>,
    input: &str,
) -> Option<ListRequest> {
    let target = format!("{}{}", parent(nav.prefix()), normalize_segment(input.trim()));
    nav.navigate(&target)
}
