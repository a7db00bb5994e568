//! Scoped requests sent to the query backend and the columnar frames it
//! answers with.

use std::fmt;
use std::str::FromStr;

use crate::error::ExplorerError;
use crate::listing::EntryKind;

pub const NAME_FIELD: &str = "Name";
pub const SIZE_FIELD: &str = "Size";
pub const DELETE_FIELD: &str = "Delete";
pub const LAST_MODIFIED_FIELD: &str = "Last Modified";
pub const ACCESS_KEY_ID_FIELD: &str = "AccessKeyId";
pub const SECRET_ACCESS_KEY_FIELD: &str = "SecretAccessKey";
pub const SESSION_TOKEN_FIELD: &str = "SessionToken";
pub const EXPIRATION_FIELD: &str = "Expiration";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Formatted listings encode each name as `<name>,type=<kind>,key=<key>`.
    List { formatted: bool },
    Delete(EntryKind),
    CredentialRequest,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::List { formatted: true } => write!(f, "LIST FORMATTED"),
            Operation::List { formatted: false } => write!(f, "LIST"),
            Operation::Delete(kind) => write!(f, "DELETE {}", kind.as_str()),
            Operation::CredentialRequest => write!(f, "UPLOAD"),
        }
    }
}

impl FromStr for Operation {
    type Err = ExplorerError;

    fn from_str(query: &str) -> Result<Self, Self::Err> {
        let unsupported = || ExplorerError::UnsupportedOperation { query: query.to_string() };
        let mut words = query.split_whitespace();

        let operation = match words.next() {
            Some("LIST") => Operation::List {
                formatted: words.next() == Some("FORMATTED"),
            },
            Some("DELETE") => {
                let kind = words.next().and_then(EntryKind::parse).ok_or_else(unsupported)?;
                Operation::Delete(kind)
            }
            Some("UPLOAD") => Operation::CredentialRequest,
            _ => return Err(unsupported()),
        };
        Ok(operation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub path: String,
    pub query: String,
}

impl QueryRequest {
    pub fn new(path: impl Into<String>, operation: Operation) -> Self {
        Self { path: path.into(), query: operation.to_string() }
    }

    pub fn list(prefix: &str) -> Self {
        Self::new(prefix, Operation::List { formatted: true })
    }

    pub fn delete(kind: EntryKind, key: &str) -> Self {
        Self::new(key, Operation::Delete(kind))
    }

    pub fn credentials() -> Self {
        Self::new("", Operation::CredentialRequest)
    }

    pub fn operation(&self) -> Result<Operation, ExplorerError> {
        self.query.parse()
    }
}

/// One named column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub values: Vec<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameMeta {
    /// Immediate child folder names of the listed prefix.
    pub folders: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub fields: Vec<Field>,
    pub meta: FrameMeta,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        self.fields.push(Field {
            name: name.to_string(),
            values: values.into_iter().map(|v| v.map(Into::into)).collect(),
        });
        self
    }

    pub fn with_folders(mut self, folders: Vec<String>) -> Self {
        self.meta.folders = folders;
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// First value of the named column.
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.field(name)?.values.first()?.as_deref()
    }

    /// Number of rows, taken from the first column.
    pub fn len(&self) -> usize {
        self.fields.first().map(|f| f.values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
