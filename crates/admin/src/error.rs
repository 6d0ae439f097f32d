//! Error taxonomy for list screens.
//!
//! List operations never fail across their public boundary for expected
//! failures; they record a [`ListError`] in controller state instead. The
//! export and receipt operations also return it.

use std::sync::Arc;

use thiserror::Error;

use crate::commerce::CommerceError;

/// Error recorded by a list controller.
///
/// Cloneable so the controller can both keep it in state and hand it back
/// to the caller.
#[derive(Debug, Clone, Error)]
pub enum ListError {
    /// Caller supplied an invalid query option (e.g. unknown search scope).
    #[error("{0}")]
    Query(String),

    /// Backend call failed.
    #[error(transparent)]
    Fetch(Arc<CommerceError>),

    /// Backend pagination metadata would not terminate a page walk.
    #[error("Pagination error: {0}")]
    Pagination(#[from] PaginationError),
}

impl From<CommerceError> for ListError {
    fn from(err: CommerceError) -> Self {
        Self::Fetch(Arc::new(err))
    }
}

impl ListError {
    /// Whether this is a transport or backend failure.
    #[must_use]
    pub const fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }
}

/// Inconsistent pagination detected while walking every page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    /// Backend answered a request for one page with another.
    #[error("requested page {requested} but received page {received}")]
    PageMismatch {
        /// Page that was requested.
        requested: u32,
        /// Page the backend reported.
        received: u32,
    },

    /// `next` is missing or does not move forward.
    #[error("page {current} of {last} has no forward next page (next: {next:?})")]
    NonAdvancing {
        /// Current page.
        current: u32,
        /// Reported next page.
        next: Option<u32>,
        /// Reported last page.
        last: u32,
    },

    /// Walk exceeded the configured page cap.
    #[error("export exceeded {0} pages")]
    TooManyPages(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_is_plain_message() {
        let err = ListError::Query("Bad search scope: 'sku'".to_string());
        assert_eq!(err.to_string(), "Bad search scope: 'sku'");
        assert!(!err.is_fetch());
    }

    #[test]
    fn test_fetch_error_is_transparent() {
        let err = ListError::from(CommerceError::Timeout(30));
        assert!(err.is_fetch());
        assert_eq!(err.to_string(), "Request timed out after 30 seconds");
    }

    #[test]
    fn test_pagination_error_display() {
        let err = ListError::from(PaginationError::NonAdvancing {
            current: 3,
            next: Some(3),
            last: 9,
        });
        assert_eq!(
            err.to_string(),
            "Pagination error: page 3 of 9 has no forward next page (next: Some(3))"
        );
        assert!(!err.is_fetch());
    }
}
