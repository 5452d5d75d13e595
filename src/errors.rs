use thiserror::Error;

use crate::member::MemberId;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum RosterError {
    /// Represents a mutation that named an id missing from the store.
    #[error("no member with id {id}")]
    NotFound { id: MemberId },

    /// Represents an add or edit payload rejected before it reached the
    /// store.
    #[error("invalid input: {field}")]
    InvalidInput { field: &'static str },

    /// Represents a facet value outside the configured facet set.
    #[error("unknown facet {value:?}")]
    UnknownFacet { value: String },

    /// Represents a tag outside the configured tag vocabulary.
    #[error("unknown tag {value:?}")]
    UnknownTag { value: String },
}

/// Enumerates errors returned by the record source subsystem. All of
/// these are recovered by falling back to the sample roster; none is
/// surfaced to the end user.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Represents a transport failure while reaching the source.
    #[error("source unavailable")]
    Unavailable {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Represents a payload the source returned that could not be parsed.
    #[error("malformed source payload")]
    Malformed { source: serde_json::Error },

    /// Represents a successful response carrying no records.
    #[error("source returned no records")]
    Empty,
}
