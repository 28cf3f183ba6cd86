#![warn(missing_docs)]
//! # pagemark
//!
//! Print-like pagination for reflowable EPUB 2 and EPUB 3 books.
//!
//! Reading systems can show printed page numbers for a reflowable book
//! when the book carries the standard page navigation artefacts.
//! `pagemark` plans page-break locations inside a book's running text,
//! injects invisible break markers into the content documents, and
//! synthesises the three artefacts that expose them:
//!
//! | Artefact | Format |
//! |----------|--------|
//! | `pageList` in the NCX | EPUB 2 |
//! | `<nav epub:type="page-list">` | EPUB 3 |
//! | `page-map.xml` + OPF references | Adobe reading systems |
//!
//! The engine never re-flows text and knows nothing about font metrics:
//! pages are *approximated* by pacing the book's stripped text by
//! characters, words, or lines, optionally anchored to known page
//! numbers of a printed edition through the table of contents.
//!
//! # Paginating a book
//! ```no_run
//! use pagemark::paginate::write_book;
//! use pagemark::{Epub, Outcome, Pages, PaginationRequest, Paginator};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let epub = Epub::open("novel.epub")?;
//! let request = PaginationRequest::new(Pages::Count(300));
//!
//! if let Outcome::Paginated(book) = Paginator::new(&epub, request).run()? {
//!     write_book(&epub, &book, "novel_paginated.epub".as_ref())?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Anchoring to a printed edition
//! A ToC page map pins ToC entries to printed page numbers; pacing then
//! runs independently between the anchors:
//! ```no_run
//! use pagemark::paginate::TocMapEntry;
//! use pagemark::{Epub, Pages, PaginationRequest, Paginator};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let epub = Epub::open("novel.epub")?;
//! let mut request = PaginationRequest::new(Pages::Count(250));
//! request.toc_map = Some(vec![
//!     TocMapEntry::Ignore,     // cover
//!     TocMapEntry::Arabic(1),  // chapter 1 starts on page 1
//!     TocMapEntry::Arabic(27), // chapter 2 starts on page 27
//! ]);
//! let outcome = Paginator::new(&epub, request).run()?;
//! # Ok(())
//! # }
//! ```

mod dom;
mod parser;
mod util;
mod writer;

pub mod ebook;
pub mod paginate;

pub use self::ebook::{Epub, SpinePlacement};
pub use self::paginate::{
    BreakMode, Outcome, PageMode, Pages, PaginationRequest, Paginator, RomanFrontMatter,
};
