//! Error-related types for the pagination engine.

use crate::ebook::errors::ContainerError;

/// Alias for `Result<T, PaginateError>`.
pub type PaginateResult<T> = Result<T, PaginateError>;

/// Possible fatal errors while paginating a book.
///
/// Fatal errors abort the run before any output is written. A failed
/// break insertion is *not* fatal: it is logged and the break dropped.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum PaginateError {
    /// Argument combinations that cannot be satisfied.
    #[error("invalid request: {0}")]
    InvalidInput(String),

    /// A malformed page-marker selector.
    #[error("invalid page marker selector `{0}`")]
    InvalidSelector(String),

    /// Line-based pacing was requested with fewer source lines than pages.
    #[error(
        "the number of detected lines in the book ({available}) is smaller than the number \
         of pages to generate ({requested}); consider the `chars` paging mode for this book"
    )]
    NotEnoughLines {
        /// Lines detected in the stripped text.
        available: usize,
        /// Pages requested.
        requested: usize,
    },

    /// The table of contents links to a document absent from the book.
    #[error("table of contents contains link to nonexistent document `{0}`")]
    NonexistentTocTarget(String),

    /// The supplied ToC page map does not align with the table of contents.
    #[error(
        "the chapter page map has {provided} entries but the table of contents has {expected}"
    )]
    TocMapMismatch {
        /// Flattened ToC leaf count.
        expected: usize,
        /// Entries supplied in the map.
        provided: usize,
    },

    /// No element matched the page-marker selector.
    #[error("could not find any valid page markers matching the selector `{0}`")]
    NoPageMarkers(String),

    /// A container-level failure.
    #[error(transparent)]
    Container(#[from] ContainerError),
}
