//! Decoding of composite listing rows.
//!
//! The datasource encodes every row of a formatted listing as
//! `<name>,type=<kind>,key=<key>`. The name is matched greedily, so it may
//! itself contain commas; the kind never does.

use once_cell::sync::Lazy;
use regex::Regex;

static ROW_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(.*),type=([^,]*),key=(.*)$").expect("row pattern is a valid regex")
});

/// Icon shown in the delete column.
pub const DELETE_ICON: &str = "🗑 ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Folder,
    File,
    /// The row did not match the composite pattern.
    Error,
}

impl EntryKind {
    /// Wire name, as used in `type=` and in `DELETE <kind>`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Folder => "folder",
            EntryKind::File => "file",
            EntryKind::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "folder" => Some(EntryKind::Folder),
            "file" => Some(EntryKind::File),
            _ => None,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            EntryKind::Folder => "🗀 ",
            EntryKind::File => "🖹 ",
            EntryKind::Error => "⚠ ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub display_name: String,
    pub kind: EntryKind,
    pub key: String,
}

impl ObjectEntry {
    pub fn folder(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self { display_name: name.into(), kind: EntryKind::Folder, key: key.into() }
    }

    pub fn file(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self { display_name: name.into(), kind: EntryKind::File, key: key.into() }
    }

    /// Decode one raw row. Never fails: rows that don't match come back as
    /// [`EntryKind::Error`] entries carrying the raw text.
    pub fn decode(raw: &str) -> Self {
        if let Some(caps) = ROW_PATTERN.captures(raw) {
            if let Some(kind) = EntryKind::parse(&caps[2]) {
                return Self {
                    display_name: caps[1].to_string(),
                    kind,
                    key: caps[3].to_string(),
                };
            }
        }

        Self {
            display_name: raw.to_string(),
            kind: EntryKind::Error,
            key: String::new(),
        }
    }

    /// Inverse of [`ObjectEntry::decode`] for well-formed entries.
    pub fn encode(&self) -> String {
        match self.kind {
            EntryKind::Error => self.display_name.clone(),
            kind => format!("{},type={},key={}", self.display_name, kind.as_str(), self.key),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    pub fn is_error(&self) -> bool {
        self.kind == EntryKind::Error
    }

    /// Icon followed by the display name.
    pub fn label(&self) -> String {
        format!("{}{}", self.kind.icon(), self.display_name)
    }
}
