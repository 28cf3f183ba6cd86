//! XML output.
//!
//! Two writing paths exist: [`serialize`] replays a mutated [`Document`]
//! verbatim (text untouched apart from mandatory escaping), while
//! [`XmlWriter`] and [`write_element!`] emit synthesised documents such
//! as the Adobe page map with indentation.

use crate::dom::{Document, NodeId};
use crate::writer::WriterResult;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use std::borrow::Cow;
use std::io::Write;

/// Serialise a document tree back into XML bytes.
///
/// Character data is written exactly as stored; only markup-significant
/// characters are escaped, so the stripped text of the output equals the
/// stripped text of the tree.
pub(crate) fn serialize(doc: &Document) -> Vec<u8> {
    let mut out = String::new();

    for line in &doc.prolog {
        out.push_str(line);
        out.push('\n');
    }
    if let Some(root) = doc.root {
        write_node(doc, root, &mut out);
    }
    out.into_bytes()
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    let Some(name) = doc.name(id) else {
        // Comment node
        out.push_str("<!--");
        out.push_str(doc.comment(id).unwrap_or_default());
        out.push_str("-->");
        return;
    };

    out.push('<');
    out.push_str(name);
    for attribute in doc.attributes(id) {
        out.push(' ');
        out.push_str(&attribute.name);
        out.push_str("=\"");
        out.push_str(&escape_attribute(&attribute.value));
        out.push('"');
    }

    let text = doc.text(id);
    let children = doc.children(id);
    if text.is_empty() && children.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    out.push_str(&escape_text(text));
    for &child in children {
        write_node(doc, child, out);
        out.push_str(&escape_text(doc.tail(child)));
    }
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

pub(crate) fn escape_text(input: &str) -> Cow<'_, str> {
    escape_chars(input, &['&', '<', '>'])
}

pub(crate) fn escape_attribute(input: &str) -> Cow<'_, str> {
    escape_chars(input, &['&', '<', '>', '"'])
}

fn escape_chars<'a>(input: &'a str, escape_set: &[char]) -> Cow<'a, str> {
    /// Only characters contained within `escape_set` are requested.
    fn entity(c: char) -> &'static str {
        match c {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' => "&gt;",
            '"' => "&quot;",
            _ => unreachable!("only characters in the escape set are matched"),
        }
    }

    let mut escaped: Option<String> = None;
    let mut last_pos = 0;

    for (i, matched) in input.match_indices(escape_set) {
        let out = escaped.get_or_insert_with(|| String::with_capacity(input.len() + 16));
        // `matched` is exactly one char because of the `escape_set` pattern.
        let c = matched
            .chars()
            .next()
            .expect("Should not be an empty string");

        // Push everything from the last match up to the current index
        out.push_str(&input[last_pos..i]);
        out.push_str(entity(c));
        last_pos = i + matched.len();
    }

    match escaped {
        None => Cow::Borrowed(input),
        Some(mut s) => {
            s.push_str(&input[last_pos..]);
            Cow::Owned(s)
        }
    }
}

pub(crate) struct XmlWriter<'a, W> {
    writer: quick_xml::Writer<W>,
    start_element: Option<BytesStart<'a>>,
}

impl<'a, W: Write> XmlWriter<'a, W> {
    pub(crate) fn new(writer: W) -> Self {
        Self {
            writer: quick_xml::Writer::new_with_indent(writer, b' ', 2),
            start_element: None,
        }
    }

    pub(crate) fn write_utf8_declaration(&mut self) -> WriterResult<&mut Self> {
        const XML_VERSION: &str = "1.0";
        const XML_ENCODING: &str = "UTF-8";

        self.writer.write_event(Event::Decl(BytesDecl::new(
            XML_VERSION,
            Some(XML_ENCODING),
            None,
        )))?;

        Ok(self)
    }

    /// Start an element: `<tag`
    pub(crate) fn start_element(&mut self, tag: &'a str) -> WriterResult<&mut Self> {
        // For ergonomics, close the previous element.
        self.finish_start_element()?;

        self.start_element = Some(BytesStart::new(tag));
        Ok(self)
    }

    /// Append an attribute to the [started](Self::start_element) element: `<tag name="value"`
    pub(crate) fn add_attribute<'b>(
        &mut self,
        name: &str,
        value: impl Into<Option<&'b str>>,
    ) -> &mut Self {
        if let (Some(element), Some(value)) = (&mut self.start_element, value.into()) {
            element.push_attribute(new_escaped_attribute(name, value));
        }
        self
    }

    /// Finish writing a start element: **`<parent>`**
    pub(crate) fn finish_start_element(&mut self) -> WriterResult<()> {
        if let Some(element) = self.start_element.take() {
            self.writer.write_event(Event::Start(element))?;
        }
        Ok(())
    }

    /// Finish writing a parent element: **`<parent><inner/></parent>`**
    pub(crate) fn finish_end_element(&mut self, tag: &str) -> WriterResult<()> {
        self.finish_start_element()?;

        self.writer.write_event(Event::End(BytesEnd::new(tag)))?;
        Ok(())
    }

    /// Finish writing a self-closing element: **`<elem/>`**
    pub(crate) fn finish_empty_element(&mut self) -> WriterResult<()> {
        if let Some(element) = self.start_element.take() {
            self.writer.write_event(Event::Empty(element))?;
        }
        Ok(())
    }
}

fn new_escaped_attribute<'a>(name: &'a str, value: &'a str) -> Attribute<'a> {
    Attribute {
        key: quick_xml::name::QName(name.as_bytes()),
        value: match escape_attribute(value) {
            Cow::Borrowed(borrowed) => Cow::Borrowed(borrowed.as_bytes()),
            Cow::Owned(owned) => Cow::Owned(owned.into_bytes()),
        },
    }
}

macro_rules! write_element {
    // Empty (self-closing) element
    (writer: $w:expr, tag: $t:expr, $(attributes: $attrs:tt)?) => {
        $crate::writer::xml::write_element!(@helper $w, $t, $($attrs)?)
        .finish_empty_element()
    };
    // Parent element with inner content
    (writer: $w:expr, tag: $t:expr, $(attributes: $attrs:tt)? inner_content: $inner:block) => {{
        let tag = $t;
        $crate::writer::xml::write_element!(@helper $w, tag, $($attrs)?);
        $w.finish_start_element()?;
        $inner
        $w.finish_end_element(tag)
    }};

    //////////////////////////////////
    // HELPERS
    //////////////////////////////////
    (@helper $w:expr, $t:expr,) => {
        $w.start_element($t)?
    };
    (@helper $w:expr, $t:expr, {$($name:expr => $value:expr,)+}) => {{
        let writer = $w.start_element($t)?;
        $(writer.add_attribute($name, $value);)+
        writer
    }};
}
pub(crate) use write_element;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::xml::parse;

    #[test]
    fn test_escape() {
        assert_eq!("a &amp; b", escape_text("a & b"));
        assert_eq!("&lt;p&gt;", escape_text("<p>"));
        assert_eq!("keep \n raw", escape_text("keep \n raw"));
        assert_eq!("&quot;q&quot;", escape_attribute("\"q\""));
        assert!(matches!(escape_text("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_serialize_round_trip() {
        let source = br#"<?xml version="1.0" encoding="utf-8"?>
<html><body class="a">one<span id="s"/>two<p>three</p>
</body></html>"#;
        let doc = parse(source).unwrap();
        let written = serialize(&doc);

        // A second pass over the output must be a fixed point
        let reparsed = parse(&written).unwrap();
        assert_eq!(written, serialize(&reparsed));

        let text = String::from_utf8(written).unwrap();
        assert!(text.contains(r#"<span id="s"/>"#));
        assert!(text.contains("one"));
        assert!(text.contains("\n</body>"));
    }

    #[test]
    fn test_serialize_escapes_entities() {
        let doc = parse(b"<p>a &amp; b</p>").unwrap();
        let written = String::from_utf8(serialize(&doc)).unwrap();

        assert_eq!("<p>a &amp; b</p>", written);
    }

    #[test]
    fn test_write_element_macro() {
        let mut buffer = Vec::new();
        let mut writer = XmlWriter::new(&mut buffer);

        fn emit(writer: &mut XmlWriter<'_, &mut Vec<u8>>) -> WriterResult<()> {
            write_element! {
                writer: writer,
                tag: "outer",
                attributes: {
                    "id" => "o1",
                }
                inner_content: {
                    write_element! {
                        writer: writer,
                        tag: "inner",
                        attributes: {
                            "href" => "a.xhtml",
                            "skipped" => None,
                        }
                    }?;
                }
            }
        }
        emit(&mut writer).unwrap();

        let written = String::from_utf8(buffer).unwrap();
        assert!(written.contains(r#"<outer id="o1">"#));
        assert!(written.contains(r#"<inner href="a.xhtml"/>"#));
        assert!(!written.contains("skipped"));
        assert!(written.ends_with("</outer>"));
    }
}
