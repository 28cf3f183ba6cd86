//! The pagination engine.
//!
//! A [`Paginator`] borrows an opened [`Epub`](crate::Epub), plans page
//! break locations over the book's stripped text, injects invisible
//! break markers into the content documents, and synthesises the
//! navigation artefacts that expose page numbers to reading systems.
//!
//! ```no_run
//! use pagemark::{Epub, Pages, PaginationRequest, Paginator, Outcome};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let epub = Epub::open("books/novel.epub")?;
//! let request = PaginationRequest::new(Pages::Count(250));
//!
//! match Paginator::new(&epub, request).run()? {
//!     Outcome::Paginated(book) => {
//!         pagemark::paginate::write_book(&epub, &book, "novel_paginated.epub".as_ref())?;
//!     }
//!     outcome => println!("{outcome:?}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod errors;

mod engine;
mod identify;
mod inject;
mod nav;
mod planner;
mod roman;
mod selector;
mod text;

pub use engine::{Outcome, PaginatedBook, Paginator, write_book};

use crate::ebook::SpinePlacement;
use crate::paginate::errors::PaginateError;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The page budget of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pages {
    /// Paginate into exactly this many pages.
    Count(usize),
    /// Derive the page count from a page size in the pacing metric.
    Auto(usize),
    /// Print text statistics and stop; nothing is written.
    Stats,
    /// Rebuild navigation from page markers already present in the book.
    Identify,
}

/// Pacing: how page positions spread over the stripped text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PageMode {
    /// Pages equi-spaced by character count.
    #[default]
    Chars,
    /// Pages equi-spaced by whitespace-separated word count.
    Words,
    /// Pages equi-spaced by line count.
    Lines,
    /// Hard-wrap lines at the given character width first,
    /// then pace by line count.
    WrappedLines(usize),
}

impl FromStr for PageMode {
    type Err = PaginateError;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "chars" => Ok(Self::Chars),
            "words" => Ok(Self::Words),
            "lines" => Ok(Self::Lines),
            _ => mode.parse().map(Self::WrappedLines).map_err(|_| {
                PaginateError::InvalidInput(format!(
                    "paging mode has to be `chars`, `lines`, `words` or a number, not `{mode}`"
                ))
            }),
        }
    }
}

/// Break-snap behaviour when a page break lands inside a word.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BreakMode {
    /// Shift forward to the next whitespace character.
    #[default]
    Next,
    /// Shift backward to the previous whitespace character.
    Prev,
    /// Keep the break inside the word.
    Split,
}

/// Roman-numbered front matter preceding the page anchored at 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RomanFrontMatter {
    /// No Roman pages.
    #[default]
    Off,
    /// Exactly this many Roman pages.
    Count(usize),
    /// Estimate from the average page size, never dropping below the
    /// largest Roman anchor of the ToC page map.
    Auto,
}

impl FromStr for RomanFrontMatter {
    type Err = PaginateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == "auto" {
            return Ok(Self::Auto);
        }
        if let Ok(count) = value.parse() {
            return Ok(Self::Count(count));
        }
        match roman::roman_to_int(value) {
            Some(count) => Ok(Self::Count(count as usize)),
            None => Err(PaginateError::InvalidInput(format!(
                "roman front matter has to be a number, a roman numeral or `auto`, not `{value}`"
            ))),
        }
    }
}

/// One entry of the user-supplied ToC page map, aligned positionally
/// with the flattened table of contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TocMapEntry {
    /// Skip this ToC entry.
    Ignore,
    /// The printed page number at which the entry begins.
    Arabic(usize),
    /// The Roman front-matter page at which the entry begins.
    Roman(usize),
}

impl FromStr for TocMapEntry {
    type Err = PaginateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == "0" {
            return Ok(Self::Ignore);
        }
        if let Ok(page) = value.parse::<usize>() {
            return Ok(Self::Arabic(page));
        }
        match roman::roman_to_int(value) {
            Some(page) => Ok(Self::Roman(page as usize)),
            None => Err(PaginateError::InvalidInput(format!(
                "chapter page map entries have to be numbers, roman numerals or 0, not `{value}`"
            ))),
        }
    }
}

/// What to do when the book already carries a page list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverwritePolicy {
    /// Consult the prompt callback; no callback means decline.
    #[default]
    Ask,
    /// Replace without asking.
    Overwrite,
    /// Treat as a decline.
    Abort,
}

/// Pipeline stages reported through [`Progress`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressStage {
    /// Parsing content documents into the text model.
    Parse,
    /// Mapping planned breaks into the documents.
    Map,
}

/// Observer for long-running stages.
pub trait Progress {
    /// `done` of `total` units completed for `stage`.
    fn on_progress(&self, stage: ProgressStage, done: usize, total: usize);
}

/// Character, line, and word counts of a book's stripped text.
#[derive(Clone, Copy, Debug)]
pub struct BookStats {
    /// Total characters.
    pub characters: usize,
    /// Total lines under the active paging mode, hard-wrap included.
    pub lines: usize,
    /// Total whitespace-separated words.
    pub words: usize,
}

/// A page exposed through the synthesised navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRecord {
    /// Display number: Arabic, or Roman for front matter.
    pub number: String,
    /// Container link: `file` or `file#fragment`.
    pub link: String,
}

/// All the options of a pagination run.
#[derive(Clone, Debug)]
pub struct PaginationRequest {
    /// The page budget.
    pub pages: Pages,
    /// Pacing mode.
    pub page_mode: PageMode,
    /// Break-snap mode.
    pub break_mode: BreakMode,
    /// Page numbers aligned with the flattened table of contents.
    pub toc_map: Option<Vec<TocMapEntry>>,
    /// Roman-numbered front matter.
    pub roman: RomanFrontMatter,
    /// Placement of non-linear spine documents.
    pub nonlinear: SpinePlacement,
    /// Placement of manifest documents absent from the spine.
    pub unlisted: SpinePlacement,
    /// Whether to rewrite the EPUB 2 NCX `pageList`.
    pub write_ncx: bool,
    /// Whether to rewrite the EPUB 3 `page-list` nav.
    pub write_nav: bool,
    /// Whether to emit an Adobe `page-map.xml` and update the OPF.
    pub adobe_page_map: bool,
    /// Report the derived page count instead of paginating
    /// (requires [`Pages::Auto`]).
    pub suggest: bool,
    /// Selector locating existing page markers ([`Pages::Identify`]).
    pub page_selector: Option<String>,
    /// Attribute carrying the page number in identify mode.
    pub page_attribute: Option<String>,
    /// Behaviour when a page list already exists.
    pub overwrite: OverwritePolicy,
}

impl PaginationRequest {
    /// A request with default modes for the given page budget.
    pub fn new(pages: Pages) -> Self {
        Self {
            pages,
            page_mode: PageMode::default(),
            break_mode: BreakMode::default(),
            toc_map: None,
            roman: RomanFrontMatter::default(),
            nonlinear: SpinePlacement::default(),
            unlisted: SpinePlacement::default(),
            write_ncx: true,
            write_nav: true,
            adobe_page_map: false,
            suggest: false,
            page_selector: None,
            page_attribute: None,
            overwrite: OverwritePolicy::default(),
        }
    }
}

/// Derive the output file path for a paginated book: the `.epub`
/// extension is stripped case-insensitively, `suffix` is appended
/// (suppressed when `new_name` is given), and the extension re-appended.
pub fn output_path(
    input: &Path,
    out_dir: Option<&Path>,
    new_name: Option<&str>,
    suffix: &str,
) -> PathBuf {
    crate::util::path::derive_output_path(input, out_dir, new_name, suffix)
}
