//! The book text model.
//!
//! Every content document is linearised into its *stripped text*: the
//! concatenated character data of a whitelisted set of element tags,
//! whitespace preserved verbatim. All page arithmetic runs over the
//! concatenation of these per-document texts, and [`NodeRange`]s map
//! stripped-text offsets back to the exact element that carries them.

use crate::dom::{Document, NodeId};
use crate::ebook::consts;
use std::collections::HashMap;

/// Tags whose directly contained text participates in the stripped text.
///
/// Unlisted containers such as `head`, `style`, and `script` contribute
/// nothing, which keeps invisible markup out of the page arithmetic.
const TEXT_TAGS: &[&str] = &[
    "html", "body", "div", "span", "p", "strong", "em", "a", "b", "i", "h1", "h2", "h3", "h4",
    "h5", "h6", "title", "figure", "section", "sub", "ul", "ol", "li", "abbr", "blockquote",
    "figcaption", "aside", "cite", "code", "pre", "nav", "tr", "table", "tbody", "thead",
    "header", "th", "td", "math", "mrow", "mspace", "msub", "mi", "mn", "mo", "var", "mtable",
    "mtr", "mtd", "mtext", "msup", "mfrac", "msqrt", "munderover", "msubsup", "mpadded",
    "mphantom",
];

fn is_text_tag(doc: &Document, node: NodeId) -> bool {
    doc.name(node).is_some_and(|name| {
        let local = crate::dom::local_name(name);
        TEXT_TAGS.iter().any(|tag| tag.eq_ignore_ascii_case(local))
    })
}

/// The interval `[start, end)` of a document's stripped text occupied by
/// a specific element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NodeRange {
    pub(crate) node: NodeId,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

/// A parsed content document with its text geometry.
pub(crate) struct DocumentText {
    pub(crate) dom: Document,
    /// The document's stripped text.
    pub(crate) stripped: String,
    /// Pre-order element ranges; the resolution order of the injector.
    pub(crate) ranges: Vec<NodeRange>,
    /// `id` attribute to stripped-text offset of the carrying element.
    pub(crate) ids: HashMap<String, usize>,
}

/// The linearised book.
pub(crate) struct BookText {
    pub(crate) docs: Vec<DocumentText>,
    /// Concatenated stripped text of all documents, in pagination order.
    pub(crate) stripped: String,
    /// `offsets[i]` is where document `i` begins;
    /// the final entry is the total length.
    pub(crate) offsets: Vec<usize>,
}

/// The stripped text of a single node.
///
/// A text node counts iff the element directly containing it carries a
/// whitelisted tag: an element's leading text counts when the element
/// itself is whitelisted, and a child's trailing text counts when this
/// node (the parent) is whitelisted. The node's own trailing text is
/// outside its subtree and never included. Comments have no text.
pub(crate) fn node_text(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    collect_text(doc, node, &mut out);
    out
}

fn collect_text(doc: &Document, node: NodeId, out: &mut String) {
    let included = is_text_tag(doc, node);
    if included {
        out.push_str(doc.text(node));
    }
    for &child in doc.children(node) {
        if doc.is_element(child) {
            collect_text(doc, child, out);
        }
        // A child's trailing text belongs to this node
        if included {
            out.push_str(doc.tail(child));
        }
    }
}

/// Build the text geometry of one parsed document.
pub(crate) fn build_document(dom: Document) -> DocumentText {
    let Some(root) = dom.root else {
        return DocumentText {
            dom,
            stripped: String::new(),
            ranges: Vec::new(),
            ids: HashMap::new(),
        };
    };

    let mut texts: HashMap<NodeId, String> = HashMap::new();
    fill_texts(&dom, root, &mut texts);

    let stripped = texts[&root].clone();
    let mut ranges = Vec::new();
    let mut ids = HashMap::new();
    // Monotone cursor guaranteeing identical node texts match the
    // correct occurrence
    let mut base_index = 0;

    for element in dom.elements(root) {
        let text = &texts[&element];
        if text.is_empty() {
            if let Some(id) = dom.attr(element, consts::ID) {
                ids.insert(id.to_owned(), base_index);
            }
            continue;
        }

        let Some(position) = stripped[base_index..].find(text.as_str()) else {
            // Every subtree text is a substring of the document text at or
            // after the cursor; not finding it means the tree changed
            // under us, so the element is skipped
            log::warn!("unlocatable element text; skipping one node range");
            continue;
        };
        let index = base_index + position;
        if let Some(id) = dom.attr(element, consts::ID) {
            ids.insert(id.to_owned(), index);
        }

        let child_text = dom
            .children(element)
            .iter()
            .filter(|&&child| dom.is_element(child))
            .map(|child| &texts[child])
            .find(|text| !text.is_empty());

        // An element whose text is exactly its first text-bearing child's
        // would duplicate that child's range
        if child_text == Some(text) {
            continue;
        }
        ranges.push(NodeRange {
            node: element,
            start: index,
            end: index + text.len(),
        });
        // Only leaves advance the cursor; descendants of text-bearing
        // containers still need to be located relative to it
        if child_text.is_none() {
            base_index = index + text.len();
        }
    }

    DocumentText {
        dom,
        stripped,
        ranges,
        ids,
    }
}

fn fill_texts(doc: &Document, node: NodeId, texts: &mut HashMap<NodeId, String>) {
    for &child in doc.children(node) {
        if doc.is_element(child) {
            fill_texts(doc, child, texts);
        }
    }

    let included = is_text_tag(doc, node);
    let mut out = String::new();
    if included {
        out.push_str(doc.text(node));
    }
    for &child in doc.children(node) {
        if doc.is_element(child)
            && let Some(text) = texts.get(&child)
        {
            out.push_str(text);
        }
        if included {
            out.push_str(doc.tail(child));
        }
    }
    texts.insert(node, out);
}

/// Concatenate per-document texts into the book text.
pub(crate) fn assemble(docs: Vec<DocumentText>) -> BookText {
    let mut offsets = vec![0];
    let mut stripped = String::new();
    for doc in &docs {
        stripped.push_str(&doc.stripped);
        offsets.push(stripped.len());
    }
    BookText {
        docs,
        stripped,
        offsets,
    }
}
