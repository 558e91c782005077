//! The query error taxonomy and the provider SDK boundary errors.
use std::fmt;

use thiserror::Error;

/// Classification of a failed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryErrorKind {
    /// The provider does not know the requested resource, or refuses to
    /// reveal whether it exists (400/403/404 at the HTTP boundary).
    NotFound,
    /// The requested scope is not one the adapter serves.
    NoScope,
    /// The provider rejected the credentials (401 / unauthenticated).
    Auth,
    /// Everything else: transform failures, malformed payloads,
    /// non-retryable server errors, unexpected cancellation.
    Other,
}

impl fmt::Display for QueryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryErrorKind::NotFound => "NOTFOUND",
            QueryErrorKind::NoScope => "NOSCOPE",
            QueryErrorKind::Auth => "AUTH",
            QueryErrorKind::Other => "OTHER",
        };
        f.write_str(s)
    }
}

/// Error returned by every adapter query surface.
///
/// The optional fields tag the error with where it came from; layers fill
/// them in as the error bubbles up, first writer wins.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryError {
    /// Error classification
    pub kind: QueryErrorKind,
    /// Human readable cause
    pub message: String,
    /// Name of the adapter that produced the error
    pub source_name: Option<String>,
    /// Scope the failing query ran in
    pub scope: Option<String>,
    /// Item type the failing query targeted
    pub item_type: Option<String>,
}

impl QueryError {
    /// Construct an error of the given kind.
    pub fn new(kind: QueryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source_name: None,
            scope: None,
            item_type: None,
        }
    }

    /// NOTFOUND error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(QueryErrorKind::NotFound, message)
    }

    /// NOSCOPE error
    pub fn no_scope(message: impl Into<String>) -> Self {
        Self::new(QueryErrorKind::NoScope, message)
    }

    /// AUTH error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(QueryErrorKind::Auth, message)
    }

    /// OTHER error
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(QueryErrorKind::Other, message)
    }

    /// The error emitted when a query is cancelled mid-flight.
    ///
    /// Cancellation is never NOTFOUND; callers must be able to tell an
    /// aborted query from a missing resource.
    pub fn cancelled() -> Self {
        Self::other("query cancelled")
    }

    /// Tag with the producing adapter name unless already tagged.
    #[must_use]
    pub fn with_source(mut self, source_name: impl Into<String>) -> Self {
        self.source_name.get_or_insert_with(|| source_name.into());
        self
    }

    /// Tag with the query scope unless already tagged.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope.get_or_insert_with(|| scope.into());
        self
    }

    /// Tag with the target item type unless already tagged.
    #[must_use]
    pub fn with_item_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type.get_or_insert_with(|| item_type.into());
        self
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        let mut sep = " (";
        for (key, val) in [
            ("source", &self.source_name),
            ("scope", &self.scope),
            ("type", &self.item_type),
        ] {
            if let Some(val) = val {
                write!(f, "{sep}{key}={val}")?;
                sep = ", ";
            }
        }
        if sep == ", " {
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl std::error::Error for QueryError {}

/// Errors surfaced by the minimal provider SDK client traits that manual
/// wrappers consume.
///
/// Concrete SDK clients translate their own failure modes into this set;
/// wrappers map it into [`QueryError`] at the boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SdkError {
    /// The resource does not exist
    #[error("not found: {0}")]
    NotFound(String),
    /// The credentials are valid but may not see the resource
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// The credentials were rejected outright
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    /// Any other SDK failure
    #[error("{0}")]
    Other(String),
}

impl From<SdkError> for QueryError {
    fn from(err: SdkError) -> Self {
        match err {
            // A 403-shaped denial is indistinguishable from absence.
            SdkError::NotFound(_) | SdkError::PermissionDenied(_) => {
                QueryError::not_found(err.to_string())
            }
            SdkError::Unauthenticated(_) => QueryError::auth(err.to_string()),
            SdkError::Other(_) => QueryError::other(err.to_string()),
        }
    }
}
