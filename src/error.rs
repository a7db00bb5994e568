// Typed failures for the explorer core
// Everything else flows through anyhow with context attached at the boundary

use thiserror::Error;

/// Failures callers may want to match on.
#[derive(Debug, Error)]
pub enum ExplorerError {
    /// The listing frame carried no name column to decode.
    #[error("Listing for '{prefix}' has no name column")]
    MalformedListing { prefix: String },

    /// The credential broker answered without one of the required columns.
    #[error("Credential response is missing column {column}")]
    MissingCredentialColumn { column: String },

    /// The broker sent an expiry we could not read.
    #[error("Credential expiry '{value}' is not an RFC 3339 timestamp")]
    InvalidExpiry { value: String },

    /// The query text did not name a known operation.
    #[error("Unsupported query operation: {query}")]
    UnsupportedOperation { query: String },

    /// Rows that failed to decode carry no key to delete.
    #[error("Cannot delete unparseable entry '{name}'")]
    UndeletableEntry { name: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}
