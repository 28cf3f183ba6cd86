//! Break-location planning.
//!
//! All planning happens over the stripped text. Offsets are byte
//! offsets, but pacing arithmetic runs over characters, words, or
//! lines, so every planned offset falls on a character boundary.

use crate::paginate::errors::{PaginateError, PaginateResult};
use crate::paginate::{BookStats, BreakMode, PageMode};
use crate::util::str::char_chunks;

/// A contiguous slice `[start, end)` of the stripped text known to
/// contain exactly `pages` page transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PageRange {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) pages: usize,
}

/// Generate page break locations for `pages` pages over `stripped`,
/// shifted by `offset`. The first break always sits at the slice start.
pub(crate) fn plan_breaks(
    stripped: &str,
    pages: usize,
    break_mode: BreakMode,
    page_mode: PageMode,
    offset: usize,
) -> PaginateResult<Vec<usize>> {
    if pages == 0 {
        return Ok(Vec::new());
    }
    match page_mode {
        PageMode::Lines | PageMode::WrappedLines(_) => {
            return plan_by_lines(stripped, pages, page_mode, offset);
        }
        PageMode::Words => return plan_by_words(stripped, pages, offset),
        PageMode::Chars => {}
    }

    let char_offsets: Vec<usize> = stripped.char_indices().map(|(index, _)| index).collect();
    let page_size = char_offsets.len() / pages;
    if page_size == 0 {
        return Err(PaginateError::InvalidInput(format!(
            "the book has {} characters, too few for {pages} pages",
            char_offsets.len()
        )));
    }
    if offset == 0 {
        log::info!("calculated approximate page size of {page_size} characters");
    }

    // The initial locations are simply multiples of the page size
    let mut breaks: Vec<usize> = (0..pages)
        .map(|page| char_offsets[page * page_size])
        .collect();

    // The `split` mode does not care about breaking inside a word.
    // The first break (page one) is pinned at the start and never shifts.
    match break_mode {
        BreakMode::Split => {}
        BreakMode::Next => {
            for index in 1..breaks.len() {
                let position = breaks[index];
                if let Some((delta, _)) = stripped[position..]
                    .char_indices()
                    .take(page_size)
                    .find(|(_, c)| c.is_whitespace())
                {
                    breaks[index] = position + delta;
                }
            }
        }
        BreakMode::Prev => {
            for index in 1..breaks.len() {
                let position = breaks[index];
                if let Some((found, _)) = stripped[..position]
                    .char_indices()
                    .rev()
                    .take(page_size)
                    .find(|(_, c)| c.is_whitespace())
                    // Never move a break onto or before its predecessor
                    && found > breaks[index - 1]
                {
                    breaks[index] = found;
                }
            }
        }
    }

    Ok(apply_offset(breaks, offset))
}

/// Pace the given ranges independently, then the residual page budget
/// over the text after the last range.
pub(crate) fn plan_by_ranges(
    stripped: &str,
    ranges: &[PageRange],
    total_pages: usize,
    break_mode: BreakMode,
    page_mode: PageMode,
) -> PaginateResult<Vec<usize>> {
    let mut breaks = Vec::new();
    let mut processed = 0;

    for range in ranges {
        breaks.extend(plan_breaks(
            &stripped[range.start..range.end],
            range.pages,
            break_mode,
            page_mode,
            range.start,
        )?);
        processed += range.pages;
    }

    let tail_start = ranges.last().map_or(0, |range| range.end);
    let remaining = total_pages.saturating_sub(processed);
    if remaining > 0 {
        breaks.extend(plan_breaks(
            &stripped[tail_start..],
            remaining,
            break_mode,
            page_mode,
            tail_start,
        )?);
    }
    Ok(breaks)
}

fn plan_by_lines(
    stripped: &str,
    pages: usize,
    page_mode: PageMode,
    offset: usize,
) -> PaginateResult<Vec<usize>> {
    let lines = split_lines(stripped, page_mode);
    if lines.len() < pages {
        return Err(PaginateError::NotEnoughLines {
            available: lines.len(),
            requested: pages,
        });
    }

    let mut locations = Vec::with_capacity(lines.len());
    let mut cursor = 0;
    for line in &lines {
        locations.push(cursor);
        cursor += line.len();
    }

    Ok(apply_offset(pace_by_units(&locations, pages), offset))
}

fn plan_by_words(stripped: &str, pages: usize, offset: usize) -> PaginateResult<Vec<usize>> {
    let starts = word_starts(stripped);
    if starts.len() < pages {
        return Err(PaginateError::InvalidInput(format!(
            "the book has {} words, too few for {pages} pages",
            starts.len()
        )));
    }
    Ok(apply_offset(pace_by_units(&starts, pages), offset))
}

/// Equi-space `pages` breaks over unit start offsets.
fn pace_by_units(locations: &[usize], pages: usize) -> Vec<usize> {
    let step = locations.len() as f64 / pages as f64;
    (0..pages)
        .map(|page| {
            let index = (step * page as f64).round() as usize;
            locations[index.min(locations.len() - 1)]
        })
        .collect()
}

/// Byte offsets at which whitespace-separated words begin.
fn word_starts(stripped: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut in_whitespace = true;
    for (index, c) in stripped.char_indices() {
        if c.is_whitespace() {
            in_whitespace = true;
        } else if in_whitespace {
            starts.push(index);
            in_whitespace = false;
        }
    }
    starts
}

/// Line split honouring the paging mode: plain lines, or lines
/// hard-wrapped at a maximum character count first.
fn split_lines(stripped: &str, page_mode: PageMode) -> Vec<&str> {
    let lines: Vec<&str> = stripped.split_inclusive('\n').collect();
    match page_mode {
        PageMode::WrappedLines(width) => lines
            .iter()
            .flat_map(|line| char_chunks(line, width))
            .collect(),
        _ => lines,
    }
}

fn apply_offset(mut breaks: Vec<usize>, offset: usize) -> Vec<usize> {
    if offset != 0 {
        for location in &mut breaks {
            *location += offset;
        }
    }
    breaks
}

/// Derive the page count from a page size in the pacing metric.
pub(crate) fn auto_page_count(
    stripped: &str,
    page_mode: PageMode,
    page_size: usize,
) -> PaginateResult<usize> {
    if page_size == 0 {
        return Err(PaginateError::InvalidInput(
            "automatic pagination requires a page size greater than zero".to_owned(),
        ));
    }
    let metric = match page_mode {
        PageMode::Chars => stripped.chars().count(),
        PageMode::Words => word_starts(stripped).len(),
        PageMode::Lines | PageMode::WrappedLines(_) => split_lines(stripped, page_mode).len(),
    };
    Ok(metric.div_ceil(page_size))
}

/// Character, line, and word statistics of the stripped text.
pub(crate) fn text_stats(stripped: &str, page_mode: PageMode) -> BookStats {
    BookStats {
        characters: stripped.chars().count(),
        lines: split_lines(stripped, page_mode).len(),
        words: word_starts(stripped).len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chars_split_mode() {
        let stripped = "x".repeat(300);
        let breaks =
            plan_breaks(&stripped, 6, BreakMode::Split, PageMode::Chars, 0).unwrap();

        assert_eq!(vec![0, 50, 100, 150, 200, 250], breaks);
    }

    #[test]
    fn test_breaks_are_strictly_increasing() {
        let stripped = "lorem ipsum dolor sit amet ".repeat(40);
        for break_mode in [BreakMode::Split, BreakMode::Next, BreakMode::Prev] {
            let breaks =
                plan_breaks(&stripped, 9, break_mode, PageMode::Chars, 0).unwrap();

            assert_eq!(9, breaks.len());
            assert_eq!(0, breaks[0]);
            assert!(breaks.windows(2).all(|pair| pair[0] < pair[1]));
            assert!(*breaks.last().unwrap() < stripped.len());
        }
    }

    #[test]
    fn test_next_mode_snaps_forward() {
        // 300 characters; the char at offset 50 sits mid-word and the
        // next whitespace is at 57
        let mut stripped = "x".repeat(300);
        stripped.replace_range(57..58, " ");
        let breaks = plan_breaks(&stripped, 6, BreakMode::Next, PageMode::Chars, 0).unwrap();

        assert_eq!(57, breaks[1]);
    }

    #[test]
    fn test_prev_mode_snaps_backward() {
        let mut stripped = "x".repeat(300);
        stripped.replace_range(44..45, " ");
        let breaks = plan_breaks(&stripped, 6, BreakMode::Prev, PageMode::Chars, 0).unwrap();

        assert_eq!(44, breaks[1]);
    }

    #[test]
    fn test_snap_leaves_first_break_pinned() {
        let stripped = format!("word {}", "x".repeat(295));
        let breaks = plan_breaks(&stripped, 6, BreakMode::Next, PageMode::Chars, 0).unwrap();

        assert_eq!(0, breaks[0]);
    }

    #[test]
    fn test_lines_mode() {
        // Twelve lines of four bytes each, four pages
        let stripped = "abc\n".repeat(12);
        let breaks = plan_breaks(&stripped, 4, BreakMode::Split, PageMode::Lines, 0).unwrap();

        assert_eq!(vec![0, 12, 24, 36], breaks);
    }

    #[test]
    fn test_lines_mode_requires_enough_lines() {
        let error =
            plan_breaks("one\ntwo\n", 4, BreakMode::Split, PageMode::Lines, 0).unwrap_err();
        assert!(matches!(
            error,
            PaginateError::NotEnoughLines {
                available: 2,
                requested: 4,
            }
        ));
    }

    #[test]
    fn test_wrapped_lines_mode() {
        // One long line of 120 chars, wrapped at 10 → 12 lines
        let stripped = "y".repeat(120);
        let breaks = plan_breaks(
            &stripped,
            4,
            BreakMode::Split,
            PageMode::WrappedLines(10),
            0,
        )
        .unwrap();

        assert_eq!(vec![0, 30, 60, 90], breaks);
    }

    #[test]
    fn test_words_mode() {
        let stripped = "aa bb cc dd ee ff gg hh"; // word starts every 3 bytes
        let breaks = plan_breaks(stripped, 4, BreakMode::Split, PageMode::Words, 0).unwrap();

        assert_eq!(vec![0, 6, 12, 18], breaks);
    }

    #[test]
    fn test_ranges() {
        let stripped = "z".repeat(300);
        let ranges = [
            PageRange { start: 0, end: 40, pages: 1 },
            PageRange { start: 40, end: 240, pages: 4 },
        ];
        let breaks =
            plan_by_ranges(&stripped, &ranges, 9, BreakMode::Split, PageMode::Chars).unwrap();

        // One page in [0, 40), four in [40, 240), four residual after 240
        assert_eq!(vec![0, 40, 90, 140, 190, 240, 255, 270, 285], breaks);
    }

    #[test]
    fn test_auto_page_count() {
        let stripped = "q".repeat(1001);
        assert_eq!(
            11,
            auto_page_count(&stripped, PageMode::Chars, 100).unwrap()
        );
        assert_eq!(
            2,
            auto_page_count("one two three", PageMode::Words, 2).unwrap()
        );
        assert!(auto_page_count("x", PageMode::Chars, 0).is_err());
    }

    #[test]
    fn test_text_stats() {
        let stats = text_stats("one two\nthree four five\n", PageMode::Chars);

        assert_eq!(24, stats.characters);
        assert_eq!(2, stats.lines);
        assert_eq!(5, stats.words);
    }
}
