//! Compact element selectors for locating existing page markers.

use crate::dom::{self, Document, NodeId};
use crate::ebook::consts;
use crate::paginate::errors::{PaginateError, PaginateResult};

const CLASS: &str = "class";

/// A selector of the shape `Tag.class[attr=value]#id`.
///
/// Every part is optional but at least one must be present. The id part
/// supports `*` globs: every fragment between stars must appear in the
/// element id in order, the first as a prefix and the last as a suffix.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Selector {
    tag: Option<String>,
    class: Option<String>,
    attribute: Option<(String, Option<String>)>,
    id: Option<String>,
}

impl Selector {
    pub(crate) fn parse(selector: &str) -> PaginateResult<Self> {
        let invalid = || PaginateError::InvalidSelector(selector.to_owned());
        let mut parsed = Selector::default();
        let mut rest = selector;

        let tag_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        if tag_end > 0 {
            parsed.tag = Some(rest[..tag_end].to_owned());
            rest = &rest[tag_end..];
        }

        if let Some(after) = rest.strip_prefix('.') {
            let end = after.find(['[', '#']).unwrap_or(after.len());
            if end == 0 {
                return Err(invalid());
            }
            parsed.class = Some(after[..end].to_owned());
            rest = &after[end..];
        }

        if let Some(after) = rest.strip_prefix('[') {
            let Some(end) = after.find(']') else {
                return Err(invalid());
            };
            let attribute = match after[..end].split_once('=') {
                Some((name, value)) => (name.trim().to_owned(), Some(value.trim().to_owned())),
                None => (after[..end].trim().to_owned(), None),
            };
            if attribute.0.is_empty() {
                return Err(invalid());
            }
            parsed.attribute = Some(attribute);
            rest = &after[end + 1..];
        }

        if let Some(after) = rest.strip_prefix('#') {
            if after.is_empty() {
                return Err(invalid());
            }
            parsed.id = Some(after.to_owned());
            rest = "";
        }

        if !rest.is_empty() || parsed == Selector::default() {
            return Err(invalid());
        }
        Ok(parsed)
    }

    pub(crate) fn matches(&self, doc: &Document, node: NodeId) -> bool {
        if let Some(tag) = &self.tag
            && !doc
                .name(node)
                .is_some_and(|name| dom::local_name(name).eq_ignore_ascii_case(tag))
        {
            return false;
        }

        if let Some(class) = &self.class {
            let listed = doc
                .attr(node, CLASS)
                .unwrap_or_default()
                .split_whitespace()
                .any(|candidate| candidate.eq_ignore_ascii_case(class));
            if !listed {
                return false;
            }
        }

        if let Some((name, expected)) = &self.attribute {
            match (doc.attr(node, name), expected) {
                (None, _) => return false,
                (Some(_), None) => {}
                (Some(actual), Some(expected)) => {
                    if actual != expected {
                        return false;
                    }
                }
            }
        }

        if let Some(pattern) = &self.id {
            let Some(id) = doc.attr(node, consts::ID) else {
                return false;
            };
            if !match_id_pattern(pattern, id) {
                return false;
            }
        }
        true
    }
}

/// Glob matching for the id part. Without `*` the match is exact.
pub(crate) fn match_id_pattern(pattern: &str, id: &str) -> bool {
    let fragments: Vec<&str> = pattern.split('*').collect();
    if fragments.len() == 1 {
        return pattern == id;
    }
    if !(id.starts_with(fragments[0]) && id.ends_with(fragments[fragments.len() - 1])) {
        return false;
    }

    let mut cursor = 0;
    for fragment in &fragments {
        match id[cursor..].find(fragment) {
            Some(position) => cursor += position + fragment.len(),
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::xml::parse;

    #[test]
    fn test_parse() {
        assert_eq!(
            Selector {
                tag: Some("span".to_owned()),
                class: Some("pageno".to_owned()),
                attribute: Some(("data-pagebreak".to_owned(), None)),
                id: Some("pg_*".to_owned()),
            },
            Selector::parse("span.pageno[data-pagebreak]#pg_*").unwrap()
        );
        assert_eq!(
            Selector {
                attribute: Some(("epub:type".to_owned(), Some("pagebreak".to_owned()))),
                ..Selector::default()
            },
            Selector::parse("[epub:type=pagebreak]").unwrap()
        );
        assert_eq!(
            Selector {
                tag: Some("div".to_owned()),
                ..Selector::default()
            },
            Selector::parse("div").unwrap()
        );
    }

    #[test]
    fn test_parse_rejects() {
        for malformed in ["", ".", "#", "[", "[]", "span[", "span]extra"] {
            assert!(
                Selector::parse(malformed).is_err(),
                "`{malformed}` should not parse"
            );
        }
    }

    #[test]
    fn test_match_id_pattern() {
        // `a*b*c` matches iff the id starts with `a`, ends with `c`,
        // and contains `b` in between
        assert!(match_id_pattern("a*b*c", "abc"));
        assert!(match_id_pattern("a*b*c", "axxbxxc"));
        assert!(!match_id_pattern("a*b*c", "acb"));
        assert!(!match_id_pattern("a*b*c", "xabc"));
        assert!(!match_id_pattern("a*b*c", "abx"));
        assert!(match_id_pattern("pg_*", "pg_12"));
        assert!(!match_id_pattern("pg_*", "x_12"));
        assert!(match_id_pattern("exact", "exact"));
        assert!(!match_id_pattern("exact", "exactly"));
    }

    #[test]
    fn test_matches_element() {
        let doc = parse(
            br#"<div><span class="PageNo num" data-pagebreak="" id="pg_3">3</span><span id="other"/></div>"#,
        )
        .unwrap();
        let root = doc.root.unwrap();
        let marker = doc.children(root)[0];
        let other = doc.children(root)[1];

        let selector = Selector::parse("span.pageno[data-pagebreak]#pg_*").unwrap();
        assert!(selector.matches(&doc, marker));
        assert!(!selector.matches(&doc, other));
        assert!(!selector.matches(&doc, root));

        let by_value = Selector::parse("[data-pagebreak=x]").unwrap();
        assert!(!by_value.matches(&doc, marker));
    }
}
