//! Error-related types for an [`Epub`](super::Epub) container.

use std::error::Error;
use std::io;
use std::path::PathBuf;

/// Alias for `Result<T, ContainerError>`.
pub type ContainerResult<T> = Result<T, ContainerError>;

/// Possible errors while reading or writing an EPUB container.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum ContainerError {
    /// The archive itself is unreadable due to not existing,
    /// an unsupported format, or a malformed state.
    #[error("[UnreadableArchive - `{path:?}`]: {source}")]
    UnreadableArchive {
        /// The root cause of this error.
        source: io::Error,
        /// The path responsible for triggering the error, if applicable.
        path: Option<PathBuf>,
    },

    /// A contained file is missing or cannot be read.
    #[error("[CannotRead - `{name}`]: {source}")]
    CannotRead {
        /// The root cause of this error.
        source: io::Error,
        /// The container-relative name of the affected entry.
        name: String,
    },

    /// A contained file unexpectedly causes an internal parser error.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The container does not reference an `.opf` package file.
    #[error("missing `<rootfile>` referencing an `.opf` file in `META-INF/container.xml`")]
    NoOpfReference,

    /// The `package` element is not found in the `.opf` file.
    #[error("missing `<package>` in the `.opf` file")]
    NoPackageFound,

    /// The `manifest` element is not found in the `.opf` file.
    #[error("missing `<manifest>` in the `.opf` file")]
    NoManifestFound,

    /// The `spine` element is not found in the `.opf` file.
    #[error("missing `<spine>` in the `.opf` file")]
    NoSpineFound,

    /// Neither an NCX nor an EPUB 3 navigation document is present.
    #[error("no navigation files found in EPUB, file probably is not valid")]
    NoNavigationFound,

    /// An I/O error occurred while writing the output container.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Ebook file content unexpectedly causes an internal parser error.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    /// Malformed content within a file, such as improper XML.
    #[error(transparent)]
    Unparsable(#[from] Box<dyn Error + Send + Sync + 'static>),
}
