//! Break-marker injection at sub-text-node precision.
//!
//! Given a stripped-text offset, the injector places a new element at
//! the exact character position by splitting the leading or trailing
//! text of the resolved element. Injected nodes carry no text, so every
//! node range and document offset stays valid without recomputation.

use crate::dom::{Document, NodeId};
use crate::ebook::consts::nav;
use crate::paginate::text::{self, NodeRange};

/// Resolve a stripped-text offset to the most specific containing
/// element: the *last* pre-order range covering the offset, with the
/// distances from the range's start and end.
pub(crate) fn resolve(offset: usize, ranges: &[NodeRange]) -> Option<(NodeId, usize, usize)> {
    ranges
        .iter()
        .filter(|range| range.start <= offset && range.end > offset)
        .next_back()
        .map(|range| (range.node, offset - range.start, range.end - offset))
}

/// Insert `new_node` so that it occupies the exact character position
/// `offset` without contributing any text.
///
/// Returns `false` when no insertion spot could be resolved; the caller
/// decides whether that is worth a warning.
pub(crate) fn insert_at(
    doc: &mut Document,
    ranges: &[NodeRange],
    offset: usize,
    new_node: NodeId,
) -> bool {
    let Some((element, from_start, from_end)) = resolve(offset, ranges) else {
        return false;
    };

    // The simple cases: the position falls inside the element's own
    // leading text, or inside its trailing text
    if doc.text(element).len() > from_start {
        return insert_into_text(doc, element, new_node, from_start);
    }
    let trailing_len = doc.tail(element).len();
    if trailing_len > from_end {
        return insert_into_tail(doc, element, new_node, trailing_len - from_end);
    }

    // Otherwise the position is in the trailing text of one of the
    // element's children; scan with a running offset
    let mut running = doc.text(element).len();
    let children: Vec<NodeId> = doc.children(element).to_vec();
    for child in children {
        running += text::node_text(doc, child).len() + doc.tail(child).len();
        if from_start < running {
            let delta = doc.tail(child).len() - (running - from_start);
            return insert_into_tail(doc, child, new_node, delta);
        }
    }
    false
}

/// Split the element's leading text at `split_at`: what precedes stays
/// on the element, what follows becomes the new node's trailing text,
/// and the new node becomes the first child.
fn insert_into_text(doc: &mut Document, parent: NodeId, new_node: NodeId, split_at: usize) -> bool {
    let leading = doc.text(parent);
    if !leading.is_char_boundary(split_at) {
        return false;
    }
    let kept = leading[..split_at].to_owned();
    let remainder = leading[split_at..].to_owned();

    doc.set_text(parent, kept);
    // Only empty page markers are inserted, so no existing trailing
    // text is overridden here
    doc.set_tail(new_node, remainder);
    doc.insert_child(parent, 0, new_node);
    true
}

/// Split the carrier's trailing text at `split_at` and attach the new
/// node as the next sibling, re-attaching the later portion as the new
/// node's trailing text.
fn insert_into_tail(doc: &mut Document, carrier: NodeId, new_node: NodeId, split_at: usize) -> bool {
    // Page breaks must never appear outside `<body>`
    if doc.tag_is(carrier, nav::BODY) {
        doc.append_child(carrier, new_node);
        return true;
    }
    if doc.tag_is(carrier, nav::HTML) {
        return match doc.find_descendant(carrier, nav::BODY) {
            Some(body) => {
                doc.append_child(body, new_node);
                true
            }
            None => false,
        };
    }

    let trailing = doc.tail(carrier);
    if !trailing.is_char_boundary(split_at) {
        return false;
    }
    let kept = trailing[..split_at].to_owned();
    let remainder = trailing[split_at..].to_owned();

    if !doc.insert_after(carrier, new_node) {
        return false;
    }
    doc.set_tail(carrier, kept);
    doc.set_tail(new_node, remainder);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::xml::parse;
    use crate::paginate::text::build_document;
    use crate::writer::xml::serialize;

    fn inject(source: &str, offset: usize) -> (String, String) {
        let mut doc = build_document(parse(source.as_bytes()).unwrap());
        let before = doc.stripped.clone();

        let span = doc.dom.new_element("span");
        doc.dom.set_attr(span, "id", "pg_break_0");
        assert!(
            insert_at(&mut doc.dom, &doc.ranges, offset, span),
            "injection must succeed at offset {offset}"
        );

        // The break contributes no text
        let rebuilt = build_document(doc.dom);
        assert_eq!(before, rebuilt.stripped);
        (
            String::from_utf8(serialize(&rebuilt.dom)).unwrap(),
            rebuilt.stripped,
        )
    }

    #[test]
    fn test_resolve_prefers_deepest_range() {
        let doc = build_document(
            parse(b"<body><div><p>abcdef</p></div></body>").unwrap(),
        );
        let (node, from_start, from_end) = resolve(2, &doc.ranges).unwrap();

        assert!(doc.dom.tag_is(node, "p"));
        assert_eq!((2, 4), (from_start, from_end));
    }

    #[test]
    fn test_insert_into_leading_text() {
        let (xml, _) = inject("<body><p>abcdef</p></body>", 3);
        assert!(xml.contains(r#"<p>abc<span id="pg_break_0"/>def</p>"#));
    }

    #[test]
    fn test_insert_at_element_start() {
        let (xml, _) = inject("<body><p>abcdef</p></body>", 0);
        assert!(xml.contains(r#"<p><span id="pg_break_0"/>abcdef</p>"#));
    }

    #[test]
    fn test_insert_into_trailing_text() {
        // Offsets 3.. fall into `em`'s trailing text
        let (xml, _) = inject("<body><p><em>abc</em>defg</p></body>", 5);
        assert!(xml.contains(r#"<em>abc</em>de<span id="pg_break_0"/>fg"#));
    }

    #[test]
    fn test_insert_between_children() {
        // Offset 3 is the `x` between the two paragraphs, carried by the
        // first paragraph's trailing text
        let (xml, _) = inject("<body><div><p>one</p>x<p>two</p></div></body>", 3);
        assert!(xml.contains(r#"<p>one</p><span id="pg_break_0"/>x<p>two</p>"#));
    }

    #[test]
    fn test_never_outside_body() {
        // Offset 2 is the newline carried by the body's trailing text;
        // the marker must land inside <body> regardless
        let source = "<html><body><p>ab</p></body>\n</html>";
        let (xml, _) = inject(source, 2);
        let closing = xml.find("</body>").unwrap();
        let marker = xml.find("pg_break_0").unwrap();

        assert!(marker < closing, "the marker must stay inside <body>");
    }
}
