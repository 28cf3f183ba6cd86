//! EPUB container access.
//!
//! [`Epub`] provides the read-only view the pagination engine consumes:
//! the manifest, the spine, the flattened table of contents, and the
//! location of the navigation documents. The container may be a zipped
//! `.epub` file, any `Read + Seek` source, or an unzipped directory.

pub mod errors;

pub(crate) mod archive;
pub(crate) mod consts;

mod epub;

pub use epub::{Epub, ManifestItem, SpinePlacement, SpineRef, TocLeaf};
