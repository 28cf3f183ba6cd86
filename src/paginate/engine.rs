//! The pagination orchestrator.
//!
//! Composes the text model, the break planner, the injector, and the
//! navigation synthesiser over one opened book. Components hand their
//! outputs back here; none reaches into another's state.

use crate::ebook::consts::nav as html;
use crate::ebook::consts::{self, opf};
use crate::ebook::errors::ContainerError;
use crate::ebook::{Epub, ManifestItem};
use crate::paginate::errors::{PaginateError, PaginateResult};
use crate::paginate::nav::{self, Synthesis};
use crate::paginate::planner::{self, PageRange};
use crate::paginate::text::{self, BookText};
use crate::paginate::{
    BookStats, OverwritePolicy, PageRecord, Pages, PaginationRequest, Progress, ProgressStage,
    RomanFrontMatter, TocMapEntry, identify, inject, roman,
};
use crate::parser::xml;
use crate::util::uri;
use crate::writer;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// The result of a pagination run.
#[derive(Debug)]
pub enum Outcome {
    /// Pagination finished; the files are ready for the container writer.
    Paginated(PaginatedBook),
    /// Text statistics, for [`Pages::Stats`].
    Stats(BookStats),
    /// The derived page count of a `suggest` run; nothing was planned.
    Suggestion(usize),
    /// The user declined to overwrite an existing page list;
    /// nothing may be written.
    Cancelled,
}

/// The mutated files of a paginated book.
#[derive(Debug, Default)]
pub struct PaginatedBook {
    /// Replacement and new container files, keyed by container path.
    pub files: BTreeMap<String, Vec<u8>>,
    /// The synthesised page records, in page order.
    pub records: Vec<PageRecord>,
}

/// Write a paginated book as a fresh container at `destination`.
///
/// Files absent from the book's replacement map are copied verbatim
/// from the input container; the `mimetype` entry is stored
/// uncompressed. The input container is never modified.
pub fn write_book(epub: &Epub, book: &PaginatedBook, destination: &Path) -> PaginateResult<()> {
    writer::zip::write_container(epub.archive(), destination, &book.files).map_err(Into::into)
}

/// A ToC-anchored pacing plan.
struct TocPlan {
    ranges: Vec<PageRange>,
    /// Anchor links keyed by break index.
    known: HashMap<usize, String>,
    /// Display offset: 1 normally, 0 when the book opens before page 1.
    page_offset: usize,
    roman_count: usize,
    /// Breaks to produce, front matter and page 0 included.
    total: usize,
}

impl TocPlan {
    fn plain(pages: usize) -> Self {
        Self {
            ranges: Vec::new(),
            known: HashMap::new(),
            page_offset: 1,
            roman_count: 0,
            total: pages,
        }
    }
}

/// Pagination orchestrator.
///
/// Owns the run configuration and borrows the opened book for the
/// duration of one [`run`](Self::run); the element trees it builds
/// never escape the run.
pub struct Paginator<'a> {
    epub: &'a Epub,
    request: PaginationRequest,
    prompt: Option<&'a dyn Fn(&str) -> bool>,
    progress: Option<&'a dyn Progress>,
}

impl<'a> Paginator<'a> {
    /// Create an orchestrator for one run.
    pub fn new(epub: &'a Epub, request: PaginationRequest) -> Self {
        Self {
            epub,
            request,
            prompt: None,
            progress: None,
        }
    }

    /// Install the prompt consulted by [`OverwritePolicy::Ask`].
    /// Without one, `Ask` declines.
    pub fn with_prompt(mut self, prompt: &'a dyn Fn(&str) -> bool) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Install a progress observer.
    pub fn with_progress(mut self, progress: &'a dyn Progress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Execute the run.
    pub fn run(&self) -> PaginateResult<Outcome> {
        self.validate()?;

        // A valid EPUB has at least one kind of navigation
        let ncx = self.epub.ncx();
        let nav_doc = self.epub.nav();
        if ncx.is_none() && nav_doc.is_none() {
            return Err(ContainerError::NoNavigationFound.into());
        }

        let items = self
            .epub
            .documents(self.request.nonlinear, self.request.unlisted);
        let names: Vec<String> = items.iter().map(|item| item.href.clone()).collect();

        let mut parsed = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let dom =
                xml::parse(&self.epub.read_bytes(&item.href)?).map_err(ContainerError::from)?;
            parsed.push(text::build_document(dom));
            self.report(ProgressStage::Parse, index + 1, items.len());
        }
        let mut book = text::assemble(parsed);

        match self.request.pages {
            Pages::Stats => Ok(Outcome::Stats(planner::text_stats(
                &book.stripped,
                self.request.page_mode,
            ))),
            Pages::Identify => {
                let selector = self.request.page_selector.as_deref().unwrap_or_default();
                let identified = identify::identify_page_nodes(
                    &mut book.docs,
                    &names,
                    selector,
                    self.request.page_attribute.as_deref(),
                    nav_doc.is_some(),
                )?;
                self.synthesize(
                    &book,
                    &names,
                    identified.records,
                    identified.changed,
                    ncx,
                    nav_doc,
                )
            }
            Pages::Count(pages) => self.paginate(&mut book, &names, pages, ncx, nav_doc),
            Pages::Auto(page_size) => {
                let pages =
                    planner::auto_page_count(&book.stripped, self.request.page_mode, page_size)?;
                log::info!("derived a page count of {pages} pages");
                if self.request.suggest {
                    return Ok(Outcome::Suggestion(pages));
                }
                if pages < 2 {
                    return Err(PaginateError::InvalidInput(format!(
                        "the derived page count of {pages} leaves nothing to paginate"
                    )));
                }
                self.paginate(&mut book, &names, pages, ncx, nav_doc)
            }
        }
    }

    fn validate(&self) -> PaginateResult<()> {
        if let Pages::Count(pages) = self.request.pages
            && pages < 2
        {
            return Err(PaginateError::InvalidInput(
                "no point in paginating if you don't actually want more than one page".to_owned(),
            ));
        }
        if self.request.suggest && !matches!(self.request.pages, Pages::Auto(_)) {
            return Err(PaginateError::InvalidInput(
                "a page count suggestion requires automatic pagination".to_owned(),
            ));
        }
        if matches!(self.request.pages, Pages::Identify) && self.request.page_selector.is_none() {
            return Err(PaginateError::InvalidInput(
                "identifying existing page markers requires a selector".to_owned(),
            ));
        }
        if self.request.roman != RomanFrontMatter::Off && self.request.toc_map.is_none() {
            return Err(PaginateError::InvalidInput(
                "roman front matter requires a chapter page map".to_owned(),
            ));
        }
        Ok(())
    }

    fn paginate(
        &self,
        book: &mut BookText,
        names: &[String],
        pages: usize,
        ncx: Option<&ManifestItem>,
        nav_doc: Option<&ManifestItem>,
    ) -> PaginateResult<Outcome> {
        log::info!("starting pagination");

        let plan = match &self.request.toc_map {
            Some(map) => self.plan_with_toc(book, names, map, pages)?,
            None => TocPlan::plain(pages),
        };
        let breaks = if self.request.toc_map.is_some() {
            planner::plan_by_ranges(
                &book.stripped,
                &plan.ranges,
                plan.total,
                self.request.break_mode,
                self.request.page_mode,
            )?
        } else {
            planner::plan_breaks(
                &book.stripped,
                plan.total,
                self.request.break_mode,
                self.request.page_mode,
                0,
            )?
        };

        let (records, changed) = self.inject_breaks(book, names, &breaks, &plan, nav_doc.is_some());
        self.synthesize(book, names, records, changed, ncx, nav_doc)
    }

    /// Resolve the ToC page map into pacing ranges and known anchors.
    fn plan_with_toc(
        &self,
        book: &BookText,
        names: &[String],
        map: &[TocMapEntry],
        pages: usize,
    ) -> PaginateResult<TocPlan> {
        let leaves = self.epub.toc_leaves();
        if leaves.len() != map.len() {
            return Err(PaginateError::TocMapMismatch {
                expected: leaves.len(),
                provided: map.len(),
            });
        }

        // Resolve each mapped leaf to a stripped-text offset
        let mut anchors: Vec<(TocMapEntry, String, usize)> = Vec::new();
        for (entry, leaf) in map.iter().zip(leaves) {
            if matches!(entry, TocMapEntry::Ignore) {
                continue;
            }
            let file = uri::path(&leaf.href);
            let Some(doc_index) = names.iter().position(|name| name.as_str() == file) else {
                return Err(PaginateError::NonexistentTocTarget(file.to_owned()));
            };
            let offset = match uri::fragment(&leaf.href) {
                None => book.offsets[doc_index],
                Some(id) => match book.docs[doc_index].ids.get(id) {
                    Some(&local) => book.offsets[doc_index] + local,
                    None => {
                        log::warn!(
                            "could not locate id `{id}` in document `{file}`; skipping this entry"
                        );
                        continue;
                    }
                },
            };
            anchors.push((*entry, leaf.href.clone(), offset));
        }

        let page_one = anchors
            .iter()
            .position(|(entry, ..)| matches!(entry, TocMapEntry::Arabic(1)));
        let roman_count = self.resolve_roman(&anchors, page_one, book, pages)?;

        let mut plan = TocPlan::plain(pages);
        plan.roman_count = roman_count;

        if roman_count > 0 {
            let Some(page_one_index) = page_one else {
                return Err(PaginateError::InvalidInput(
                    "roman front matter requires the chapter page map to anchor page 1".to_owned(),
                ));
            };
            plan.total = pages + roman_count;
            let boundary = anchors[page_one_index].2;

            // The Roman prelude: anchors before page 1 pin front pages
            let mut prev_offset = 0;
            let mut prev_page = 1;
            for (entry, link, offset) in &anchors[..page_one_index] {
                let TocMapEntry::Roman(page) = entry else {
                    continue;
                };
                let page = *page;
                if page == 0 {
                    continue;
                }
                plan.known.insert(page - 1, link.clone());
                if page > prev_page && *offset > prev_offset {
                    plan.ranges.push(PageRange {
                        start: prev_offset,
                        end: *offset,
                        pages: page - prev_page,
                    });
                }
                prev_page = page;
                prev_offset = *offset;
            }
            // Close the prelude at the page-1 boundary
            let remaining_front = (roman_count + 1).saturating_sub(prev_page);
            if remaining_front > 0 && boundary > prev_offset {
                plan.ranges.push(PageRange {
                    start: prev_offset,
                    end: boundary,
                    pages: remaining_front,
                });
            }

            // Content: page 1 starts exactly at its anchor
            plan.known
                .insert(roman_count, anchors[page_one_index].1.clone());
            prev_offset = boundary;
            prev_page = 1;
            for (entry, link, offset) in &anchors[page_one_index + 1..] {
                let TocMapEntry::Arabic(page) = entry else {
                    continue;
                };
                let page = *page;
                if page == 0 {
                    continue;
                }
                plan.known.insert(roman_count + page - 1, link.clone());
                if page > prev_page && *offset > prev_offset {
                    plan.ranges.push(PageRange {
                        start: prev_offset,
                        end: *offset,
                        pages: page - prev_page,
                    });
                }
                prev_page = page;
                prev_offset = *offset;
            }
            return Ok(plan);
        }

        // Books may start before page 1: the opening becomes page 0
        if let Some((first, _, offset)) = anchors.first()
            && matches!(first, TocMapEntry::Arabic(1))
            && *offset != 0
        {
            plan.page_offset = 0;
            plan.total = pages + 1;
        }

        let mut prev_offset = 0;
        let mut prev_page = plan.page_offset;
        for (entry, link, offset) in &anchors {
            // Roman entries act as plain page numbers when no Roman
            // front matter is requested
            let page = match entry {
                TocMapEntry::Arabic(page) | TocMapEntry::Roman(page) => *page,
                TocMapEntry::Ignore => continue,
            };
            if page < plan.page_offset.max(1) {
                continue;
            }
            plan.known.insert(page - plan.page_offset, link.clone());
            if page > prev_page && *offset > prev_offset {
                plan.ranges.push(PageRange {
                    start: prev_offset,
                    end: *offset,
                    pages: page - prev_page,
                });
            }
            prev_page = page;
            prev_offset = *offset;
        }
        Ok(plan)
    }

    fn resolve_roman(
        &self,
        anchors: &[(TocMapEntry, String, usize)],
        page_one: Option<usize>,
        book: &BookText,
        pages: usize,
    ) -> PaginateResult<usize> {
        match self.request.roman {
            RomanFrontMatter::Off => Ok(0),
            RomanFrontMatter::Count(count) => Ok(count),
            RomanFrontMatter::Auto => {
                let largest = anchors
                    .iter()
                    .filter_map(|(entry, ..)| match entry {
                        TocMapEntry::Roman(page) => Some(*page),
                        _ => None,
                    })
                    .max()
                    .unwrap_or(0);
                let Some(page_one) = page_one else {
                    return Err(PaginateError::InvalidInput(
                        "automatic roman front matter requires the chapter page map to anchor \
                         page 1"
                            .to_owned(),
                    ));
                };
                let boundary = anchors[page_one].2;
                if boundary == 0 {
                    return Ok(largest);
                }

                // Estimate how many front pages fit, assuming the average
                // content page; a Roman anchor is the floor
                let front_chars = book.stripped[..boundary].chars().count();
                let content_chars = book.stripped[boundary..].chars().count();
                let average = (content_chars / pages.max(1)).max(1);
                Ok(front_chars.div_ceil(average).max(largest).max(1))
            }
        }
    }

    fn inject_breaks(
        &self,
        book: &mut BookText,
        names: &[String],
        breaks: &[usize],
        plan: &TocPlan,
        epub3: bool,
    ) -> (Vec<PageRecord>, Vec<usize>) {
        let mut records = Vec::with_capacity(breaks.len());
        let mut changed: Vec<usize> = Vec::new();

        for (index, &position) in breaks.iter().enumerate() {
            self.report(ProgressStage::Map, index + 1, breaks.len());

            let doc_index = book
                .offsets
                .iter()
                .position(|&start| start > position)
                .map_or(book.docs.len() - 1, |next| next - 1);
            let local = position - book.offsets[doc_index];
            let display = roman::romanize(index, plan.roman_count, plan.page_offset);

            // A break at the very start of a file links to the file itself
            let link = if local == 0 {
                names[doc_index].clone()
            } else if let Some(anchor) = plan.known.get(&index) {
                anchor.clone()
            } else {
                format!("{}#pg_break_{index}", names[doc_index])
            };
            if local == 0 {
                records.push(PageRecord {
                    number: display,
                    link,
                });
                continue;
            }

            let doc = &mut book.docs[doc_index];
            let span = doc.dom.new_element(html::SPAN);
            doc.dom
                .set_attr(span, consts::ID, format!("pg_break_{index}"));
            // Page breaks carry no text, but they do have a value
            doc.dom.set_attr(span, html::VALUE, display.as_str());
            // EPUB 2 does not support the `epub:` namespace
            if epub3 {
                doc.dom.set_attr(span, html::EPUB_TYPE, html::PAGE_BREAK);
            }

            // Ranges stay valid across insertions: page breaks add no text
            if inject::insert_at(&mut doc.dom, &doc.ranges, local, span) {
                if !changed.contains(&doc_index) {
                    changed.push(doc_index);
                }
                records.push(PageRecord {
                    number: display,
                    link,
                });
            } else {
                log::warn!(
                    "could not find an insertion spot for the page break at offset {position}; \
                     dropping it"
                );
            }
        }
        (records, changed)
    }

    fn synthesize(
        &self,
        book: &BookText,
        names: &[String],
        records: Vec<PageRecord>,
        changed: Vec<usize>,
        ncx: Option<&ManifestItem>,
        nav_doc: Option<&ManifestItem>,
    ) -> PaginateResult<Outcome> {
        let mut files = BTreeMap::new();
        for doc_index in changed {
            files.insert(
                names[doc_index].clone(),
                writer::xml::serialize(&book.docs[doc_index].dom),
            );
        }

        let confirm = |message: &str| match self.request.overwrite {
            OverwritePolicy::Overwrite => true,
            OverwritePolicy::Abort => false,
            OverwritePolicy::Ask => self.prompt.is_some_and(|prompt| prompt(message)),
        };

        if self.request.write_nav
            && let Some(item) = nav_doc
        {
            let bytes = self.epub.read_bytes(&item.href)?;
            match nav::write_nav_page_list(&bytes, &item.href, &records, &confirm)? {
                Synthesis::Replaced(updated) => {
                    files.insert(item.href.clone(), updated);
                }
                Synthesis::Declined => return Ok(Outcome::Cancelled),
            }
        }
        if self.request.write_ncx
            && let Some(item) = ncx
        {
            let bytes = self.epub.read_bytes(&item.href)?;
            match nav::write_ncx_page_list(&bytes, &item.href, &records, &confirm)? {
                Synthesis::Replaced(updated) => {
                    files.insert(item.href.clone(), updated);
                }
                Synthesis::Declined => return Ok(Outcome::Cancelled),
            }
        }

        if self.request.adobe_page_map {
            files.insert(opf::PAGE_MAP_FILE.to_owned(), nav::write_page_map(&records)?);
            let opf_bytes = self.epub.read_bytes(self.epub.opf_path())?;
            if let Some(updated) = nav::add_page_map_refs(&opf_bytes)? {
                files.insert(self.epub.opf_path().to_owned(), updated);
            }
        }

        Ok(Outcome::Paginated(PaginatedBook { files, records }))
    }

    fn report(&self, stage: ProgressStage, done: usize, total: usize) {
        if let Some(progress) = self.progress {
            progress.on_progress(stage, done, total);
        }
    }
}
