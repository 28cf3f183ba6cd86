//! Lenient UTF-8 XML parsing into an owned [`Document`].
//!
//! Content documents inside an EPUB are XHTML, but books in the wild carry
//! unclosed elements, stray end tags, and HTML entities. The reader is
//! therefore configured permissively and the builder recovers from
//! mismatched tags instead of failing the run.

use crate::dom::Document;
use crate::dom::NodeId;
use crate::ebook::errors::FormatError;
use crate::parser::ParserResult;
use quick_xml::Reader;
use quick_xml::escape;
use quick_xml::events::{BytesRef, BytesStart, Event};
use std::str;

/// XML declaration replayed at the top of re-serialised documents.
pub(crate) const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

fn unparsable(error: impl std::error::Error + Send + Sync + 'static) -> FormatError {
    FormatError::Unparsable(Box::new(error))
}

/// Parse document bytes into a [`Document`] tree.
///
/// Text is stored verbatim: no whitespace trimming or normalisation
/// takes place, as all page arithmetic depends on exact offsets.
pub(crate) fn parse(bytes: &[u8]) -> ParserResult<Document> {
    let source = String::from_utf8_lossy(bytes);
    let builder = DocumentBuilder {
        doc: Document::new(),
        stack: Vec::new(),
    };
    builder.parse(&source)
}

struct DocumentBuilder {
    doc: Document,
    stack: Vec<NodeId>,
}

impl DocumentBuilder {
    fn parse(mut self, source: &str) -> ParserResult<Document> {
        let mut reader = Reader::from_str(source);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        loop {
            match reader.read_event().map_err(unparsable)? {
                Event::Start(start) => self.handle_start(&start, false)?,
                Event::Empty(start) => self.handle_start(&start, true)?,
                Event::End(end) => self.handle_end(end.name().as_ref()),
                Event::Text(text) => {
                    let decoded = text.decode().map_err(unparsable)?;
                    self.append_text(&unescape_lenient(&decoded));
                }
                Event::CData(cdata) => {
                    // CDATA is literal; no entity resolution
                    let decoded = cdata.decode().map_err(unparsable)?;
                    self.append_text(&decoded);
                }
                Event::GeneralRef(general_ref) => self.handle_general_ref(&general_ref)?,
                Event::Comment(comment) => {
                    let decoded = comment.decode().map_err(unparsable)?;
                    self.handle_comment(&decoded);
                }
                Event::Decl(_) => self.doc.prolog.push(XML_DECLARATION.to_owned()),
                Event::DocType(doctype) => {
                    let decoded = doctype.decode().map_err(unparsable)?;
                    self.doc.prolog.push(format!("<!DOCTYPE {}>", decoded.trim()));
                }
                Event::Eof => break,
                // Processing instructions carry no text and are dropped
                _ => {}
            }
        }
        Ok(self.doc)
    }

    fn handle_start(&mut self, start: &BytesStart<'_>, self_closing: bool) -> ParserResult<()> {
        let name = str::from_utf8(start.name().as_ref())
            .map_err(unparsable)?
            .to_owned();
        let id = self.doc.new_element(name);

        // Malformed attributes are skipped rather than failing the document
        for attribute in start.attributes().flatten() {
            let Ok(key) = str::from_utf8(attribute.key.as_ref()) else {
                continue;
            };
            let Ok(raw) = str::from_utf8(&attribute.value) else {
                continue;
            };
            let key = key.to_owned();
            let value = unescape_lenient(raw);
            self.doc.set_attr(id, &key, value);
        }

        self.attach(id);
        if !self_closing {
            self.stack.push(id);
        }
        Ok(())
    }

    fn attach(&mut self, id: NodeId) {
        if let Some(&parent) = self.stack.last() {
            self.doc.append_child(parent, id);
        } else if self.doc.root.is_none() {
            self.doc.root = Some(id);
        }
        // Content after the root element is left orphaned and dropped
    }

    fn handle_end(&mut self, name: &[u8]) {
        let matches = |id: NodeId| {
            self.doc.name(id).is_some_and(|candidate| {
                str::from_utf8(name).is_ok_and(|name| candidate.eq_ignore_ascii_case(name))
            })
        };

        match self.stack.last() {
            Some(&top) if matches(top) => {
                self.stack.pop();
            }
            // A mismatched end tag closes the nearest matching ancestor,
            // implicitly closing everything opened after it
            Some(_) => {
                if let Some(position) = self.stack.iter().rposition(|&id| matches(id)) {
                    self.stack.truncate(position);
                }
            }
            None => {}
        }
    }

    /// Text joins the open element's leading text when it has no children
    /// yet, otherwise the trailing text of its last child.
    fn append_text(&mut self, value: &str) {
        if value.is_empty() {
            return;
        }
        let Some(&current) = self.stack.last() else {
            return;
        };
        match self.doc.children(current).last() {
            Some(&child) => self.doc.push_tail(child, value),
            None => self.doc.push_text(current, value),
        }
    }

    fn handle_general_ref(&mut self, general_ref: &BytesRef<'_>) -> ParserResult<()> {
        if general_ref.is_char_ref() {
            match general_ref.resolve_char_ref() {
                Ok(Some(resolved)) => {
                    let mut buffer = [0u8; 4];
                    self.append_text(resolved.encode_utf8(&mut buffer));
                }
                Ok(None) => {}
                // An invalid char ref is kept literally
                Err(_) => {
                    let decoded = general_ref.decode().map_err(unparsable)?;
                    self.append_unsupported(&decoded);
                }
            }
        } else {
            let decoded = general_ref.decode().map_err(unparsable)?;
            match escape::resolve_predefined_entity(&decoded) {
                Some(resolved) => self.append_text(resolved),
                None => self.append_unsupported(&decoded),
            }
        }
        Ok(())
    }

    /// Unsupported custom entity/character reference; kept literally.
    fn append_unsupported(&mut self, reference: &str) {
        let mut literal = String::with_capacity(reference.len() + 2);
        literal.push('&');
        literal.push_str(reference);
        literal.push(';');
        self.append_text(&literal);
    }

    fn handle_comment(&mut self, content: &str) {
        if let Some(&parent) = self.stack.last() {
            let comment = self.doc.new_comment(content);
            self.doc.append_child(parent, comment);
        } else if self.doc.root.is_none() {
            self.doc.prolog.push(format!("<!--{content}-->"));
        }
    }
}

fn unescape_lenient(raw: &str) -> String {
    match escape::unescape(raw) {
        Ok(unescaped) => unescaped.into_owned(),
        Err(_) => raw.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_tail_placement() {
        let doc = parse(b"<body>a<p>b<em>d</em>e</p>c</body>").unwrap();
        let body = doc.root.unwrap();
        let p = doc.find_child(body, "p").unwrap();
        let em = doc.find_child(p, "em").unwrap();

        assert_eq!("a", doc.text(body));
        assert_eq!("b", doc.text(p));
        assert_eq!("c", doc.tail(p));
        assert_eq!("d", doc.text(em));
        assert_eq!("e", doc.tail(em));
    }

    #[test]
    fn test_whitespace_is_verbatim() {
        let doc = parse(b"<p>  two\n  lines  <b>x</b>\t</p>").unwrap();
        let p = doc.root.unwrap();
        let b = doc.find_child(p, "b").unwrap();

        assert_eq!("  two\n  lines  ", doc.text(p));
        assert_eq!("\t", doc.tail(b));
    }

    #[test]
    fn test_entities() {
        let doc = parse("<p>a &amp; b &#228;&#x2014;</p>".as_bytes()).unwrap();
        let p = doc.root.unwrap();

        assert_eq!("a & b \u{e4}\u{2014}", doc.text(p));
    }

    #[test]
    fn test_self_closing_and_attributes() {
        let doc = parse(br#"<div class="a b"><span id="s1"/>after</div>"#).unwrap();
        let div = doc.root.unwrap();
        let span = doc.find_child(div, "span").unwrap();

        assert_eq!(Some("a b"), doc.attr(div, "class"));
        assert_eq!(Some("s1"), doc.attr(span, "id"));
        assert_eq!("after", doc.tail(span));
        assert!(doc.children(span).is_empty());
    }

    #[test]
    fn test_comment_contributes_tail_only() {
        let doc = parse(b"<p>a<!-- note -->b</p>").unwrap();
        let p = doc.root.unwrap();
        let comment = doc.children(p)[0];

        assert!(!doc.is_element(comment));
        assert_eq!("a", doc.text(p));
        assert_eq!("b", doc.tail(comment));
    }

    #[test]
    fn test_prolog_preserved() {
        let source = br#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html>
<html><body/></html>"#;
        let doc = parse(source).unwrap();

        assert_eq!(
            vec![XML_DECLARATION.to_owned(), "<!DOCTYPE html>".to_owned()],
            doc.prolog
        );
    }

    #[test]
    fn test_recovers_from_mismatched_end() {
        let doc = parse(b"<div><p>a</div>").unwrap();
        let div = doc.root.unwrap();
        let p = doc.find_child(div, "p").unwrap();

        assert_eq!("a", doc.text(p));
    }
}
