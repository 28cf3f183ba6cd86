//! Identify-existing mode: rebuild navigation from page markers the
//! book already carries, without planning or injecting any breaks.

use crate::ebook::consts::{self, nav};
use crate::paginate::PageRecord;
use crate::paginate::errors::{PaginateError, PaginateResult};
use crate::paginate::selector::Selector;
use crate::paginate::text::DocumentText;

#[derive(Debug)]
pub(crate) struct IdentifiedPages {
    pub(crate) records: Vec<PageRecord>,
    /// Indices of documents that received ids or `epub:type` attributes.
    pub(crate) changed: Vec<usize>,
}

/// Walk every document and collect elements matching the selector.
///
/// The page number of a marker comes from the configured attribute, the
/// element text, or a trailing integer in its id; markers without any
/// of those continue the running count. Markers lacking an id receive
/// one, and `epub:type="pagebreak"` is added when an EPUB 3 navigation
/// document is in use.
pub(crate) fn identify_page_nodes(
    docs: &mut [DocumentText],
    names: &[String],
    selector_text: &str,
    attribute: Option<&str>,
    epub3: bool,
) -> PaginateResult<IdentifiedPages> {
    let selector = Selector::parse(selector_text)?;
    log::info!("identifying page markers");

    let mut current_page: usize = 0;
    let mut records = Vec::new();
    let mut changed = Vec::new();

    for (doc_index, doc) in docs.iter_mut().enumerate() {
        let Some(root) = doc.dom.root else {
            continue;
        };
        for element in doc.dom.elements(root) {
            if !selector.matches(&doc.dom, element) {
                continue;
            }
            current_page += 1;

            let derived = match attribute {
                Some(attr) if !attr.is_empty() => {
                    doc.dom.attr(element, attr).and_then(trailing_number)
                }
                _ => trailing_number(doc.dom.text(element)).or_else(|| {
                    doc.dom
                        .attr(element, consts::ID)
                        .and_then(trailing_number)
                }),
            };
            if let Some(number) = derived {
                current_page = number;
            }

            if doc.dom.attr(element, consts::ID).is_none() {
                doc.dom
                    .set_attr(element, consts::ID, format!("pg_{current_page}"));
                mark_changed(&mut changed, doc_index);
            }
            if epub3 && doc.dom.attr(element, nav::EPUB_TYPE).is_none() {
                doc.dom.set_attr(element, nav::EPUB_TYPE, nav::PAGE_BREAK);
                mark_changed(&mut changed, doc_index);
            }

            let id = doc.dom.attr(element, consts::ID).unwrap_or_default();
            records.push(PageRecord {
                number: current_page.to_string(),
                link: format!("{}#{id}", names[doc_index]),
            });
        }
    }

    if records.is_empty() {
        return Err(PaginateError::NoPageMarkers(selector_text.to_owned()));
    }
    log::info!("rebuilding page list from {} page markers", records.len());
    Ok(IdentifiedPages { records, changed })
}

fn mark_changed(changed: &mut Vec<usize>, doc_index: usize) {
    if !changed.contains(&doc_index) {
        changed.push(doc_index);
    }
}

/// The last run of ASCII digits in `value` (with only non-digits after).
fn trailing_number(value: &str) -> Option<usize> {
    let bytes = value.as_bytes();
    let end = bytes.iter().rposition(|b| b.is_ascii_digit())? + 1;
    let start = bytes[..end]
        .iter()
        .rposition(|b| !b.is_ascii_digit())
        .map_or(0, |position| position + 1);
    value[start..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paginate::text::build_document;
    use crate::parser::xml::parse;

    fn docs(sources: &[&str]) -> (Vec<DocumentText>, Vec<String>) {
        let docs: Vec<DocumentText> = sources
            .iter()
            .map(|source| build_document(parse(source.as_bytes()).unwrap()))
            .collect();
        let names = (0..docs.len()).map(|i| format!("c{i}.xhtml")).collect();
        (docs, names)
    }

    #[test]
    fn test_trailing_number() {
        assert_eq!(Some(23), trailing_number("page23"));
        assert_eq!(Some(23), trailing_number("23."));
        assert_eq!(Some(7), trailing_number("pg_7-end"));
        assert_eq!(None, trailing_number("no digits"));
        assert_eq!(None, trailing_number(""));
    }

    #[test]
    fn test_identify_by_id() {
        let (mut docs, names) = docs(&[
            r#"<body><span class="pageno" data-pagebreak="" id="pg_1"/>text
               <span class="pageno" data-pagebreak="" id="pg_2"/>more</body>"#,
            r#"<body><span class="pageno" data-pagebreak="" id="pg_3"/>end</body>"#,
        ]);
        let identified = identify_page_nodes(
            &mut docs,
            &names,
            "span.pageno[data-pagebreak]#pg_*",
            None,
            false,
        )
        .unwrap();

        let links: Vec<&str> = identified
            .records
            .iter()
            .map(|record| record.link.as_str())
            .collect();
        let numbers: Vec<&str> = identified
            .records
            .iter()
            .map(|record| record.number.as_str())
            .collect();

        assert_eq!(
            vec!["c0.xhtml#pg_1", "c0.xhtml#pg_2", "c1.xhtml#pg_3"],
            links
        );
        assert_eq!(vec!["1", "2", "3"], numbers);
        // Markers already carried ids; nothing was modified
        assert!(identified.changed.is_empty());
    }

    #[test]
    fn test_identify_assigns_missing_ids() {
        let (mut docs, names) = docs(&[
            "<body><span class=\"pageno\">12</span><span class=\"pageno\"/></body>",
        ]);
        let identified =
            identify_page_nodes(&mut docs, &names, "span.pageno", None, true).unwrap();

        assert_eq!(
            vec!["c0.xhtml#pg_12", "c0.xhtml#pg_13"],
            identified
                .records
                .iter()
                .map(|record| record.link.as_str())
                .collect::<Vec<_>>()
        );
        assert_eq!(vec![0], identified.changed);
        // The EPUB 3 pagebreak semantics were added to the markers
        let root = docs[0].dom.root.unwrap();
        let first = docs[0].dom.find_descendant(root, "span").unwrap();
        assert_eq!(Some("pagebreak"), docs[0].dom.attr(first, "epub:type"));
    }

    #[test]
    fn test_identify_by_attribute() {
        let (mut docs, names) =
            docs(&[r#"<body><i data-page="p44" id="m1"/><i data-page="p45" id="m2"/></body>"#]);
        let identified =
            identify_page_nodes(&mut docs, &names, "i[data-page]", Some("data-page"), false)
                .unwrap();

        assert_eq!(vec!["44", "45"], identified
            .records
            .iter()
            .map(|record| record.number.as_str())
            .collect::<Vec<_>>());
    }

    #[test]
    fn test_identify_requires_matches() {
        let (mut docs, names) = docs(&["<body><p>no markers</p></body>"]);
        let error =
            identify_page_nodes(&mut docs, &names, "span.pageno", None, false).unwrap_err();

        assert!(matches!(error, PaginateError::NoPageMarkers(_)));
    }
}
