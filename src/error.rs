//! Unified error taxonomy for the pagination and filter engines.
//!
//! One enum, one set of kinds — mirrors the shape of Nova's
//! `error-handling` crate (a single `thiserror` enum plus a `kind()`
//! accessor) rather than per-component error types, so callers building
//! a transport-level mapping have one place to look.

use std::fmt;

use thiserror::Error;

/// Coarse classification of a [`RelayError`], stable across message
/// wording changes. Transport adapters map this to their own status
/// vocabulary; this crate never assumes HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayErrorKind {
    InvalidCursor,
    InvalidPagination,
    MissingOrderBy,
    NodeSnapshotError,
    ComplexityLimit,
    TransformError,
    FinderError,
    InternalInvariant,
}

impl fmt::Display for RelayErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelayErrorKind::InvalidCursor => "InvalidCursor",
            RelayErrorKind::InvalidPagination => "InvalidPagination",
            RelayErrorKind::MissingOrderBy => "MissingOrderBy",
            RelayErrorKind::NodeSnapshotError => "NodeSnapshotError",
            RelayErrorKind::ComplexityLimit => "ComplexityLimit",
            RelayErrorKind::TransformError => "TransformError",
            RelayErrorKind::FinderError => "FinderError",
            RelayErrorKind::InternalInvariant => "InternalInvariant",
        };
        f.write_str(s)
    }
}

/// Errors surfaced by the pagination and filter engines.
///
/// Propagation policy: errors are never retried internally and always
/// abort the in-flight call — no partial `ApplyCursorsResponse` is ever
/// returned alongside an error. Messages intentionally omit raw cursor
/// bytes and ciphertext; only cursor *kind* and request context are
/// included.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("invalid pagination request: {0}")]
    InvalidPagination(String),

    #[error("keyset pagination requires a non-empty OrderBy")]
    MissingOrderBy,

    #[error("failed to build node snapshot: {0}")]
    NodeSnapshotError(String),

    #[error("complexity limit exceeded: {0}")]
    ComplexityLimit(String),

    #[error("transform failed at {path}: {source}")]
    TransformError {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("finder error: {0}")]
    FinderError(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl RelayError {
    pub fn kind(&self) -> RelayErrorKind {
        match self {
            RelayError::InvalidCursor(_) => RelayErrorKind::InvalidCursor,
            RelayError::InvalidPagination(_) => RelayErrorKind::InvalidPagination,
            RelayError::MissingOrderBy => RelayErrorKind::MissingOrderBy,
            RelayError::NodeSnapshotError(_) => RelayErrorKind::NodeSnapshotError,
            RelayError::ComplexityLimit(_) => RelayErrorKind::ComplexityLimit,
            RelayError::TransformError { .. } => RelayErrorKind::TransformError,
            RelayError::FinderError(_) => RelayErrorKind::FinderError,
            RelayError::InternalInvariant(_) => RelayErrorKind::InternalInvariant,
        }
    }

    pub fn transform(path: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        RelayError::TransformError {
            path: path.into(),
            source: Box::new(source),
        }
    }

    pub fn finder(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        RelayError::FinderError(Box::new(source))
    }
}

pub type RelayResult<T> = Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(RelayError::MissingOrderBy.kind(), RelayErrorKind::MissingOrderBy);
        assert_eq!(
            RelayError::InvalidCursor("bad".into()).kind(),
            RelayErrorKind::InvalidCursor
        );
    }

    #[test]
    fn messages_do_not_leak_raw_material() {
        let err = RelayError::InvalidCursor("missing key ID".into());
        assert!(!err.to_string().contains("ciphertext"));
    }
}
