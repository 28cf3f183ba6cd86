use std::borrow::Cow;

pub(crate) const SEPARATOR: char = '/';
const SEPARATOR_STR: &str = "/";
const CURRENT_DIR: &str = ".";
const PARENT_DIR: &str = "..";
const EMPTY: &str = "";

/// Container paths are `/`-delimited and carry no leading slash,
/// matching zip entry names.
pub(crate) fn parent(href: &str) -> &str {
    href.rfind(SEPARATOR)
        .map_or(EMPTY, |index| &href[..index])
}

/// The path portion of an href, without fragment or query.
pub(crate) fn path(href: &str) -> &str {
    href.find(['#', '?']).map_or(href, |index| &href[..index])
}

/// The fragment portion of an href, if any.
pub(crate) fn fragment(href: &str) -> Option<&str> {
    href.find('#').map(|index| &href[index + 1..])
}

// This given href is assumed to be well-formed.
pub(crate) fn has_scheme(href: &str) -> bool {
    // The scheme must be ASCII
    let ascii = href.as_bytes();

    // Check if a colon exists
    let Some(colon_pos) = ascii.iter().position(|&c| c == b':') else {
        return false;
    };
    if colon_pos == 0 || !ascii[0].is_ascii_alphabetic() {
        return false;
    }

    ascii[1..colon_pos]
        .iter()
        .all(|c| c.is_ascii_alphanumeric() || matches!(*c, b'+' | b'.' | b'-'))
}

pub(crate) fn decode(encoded: &str) -> Cow<'_, str> {
    percent_encoding::percent_decode_str(encoded).decode_utf8_lossy()
}

/// Resolve a relative href against the directory of its referencing file,
/// normalizing `.` and `..` components.
pub(crate) fn resolve(parent_dir: &str, relative: &str) -> String {
    let (main_href, ext) = relative
        .find(['?', '#'])
        .map_or((relative, EMPTY), |position| {
            (&relative[..position], &relative[position..])
        });

    if has_scheme(main_href) {
        return relative.to_owned();
    }
    if let Some(absolute) = main_href.strip_prefix(SEPARATOR) {
        // Already addressed from the container root
        return normalize(absolute).into_owned() + ext;
    }

    let mut joined = String::with_capacity(parent_dir.len() + main_href.len() + 1);
    if !parent_dir.is_empty() {
        joined.push_str(parent_dir);
        joined.push(SEPARATOR);
    }
    joined.push_str(main_href);

    normalize(&joined).into_owned() + ext
}

pub(crate) fn normalize(original: &str) -> Cow<'_, str> {
    // Normalization is not required if the following are not found:
    // "."  => Current dir
    // ".." => Parent dir
    // ""   => Empty component (e.g., double slashes)
    if !original
        .split(SEPARATOR)
        .any(|c| matches!(c, EMPTY | CURRENT_DIR | PARENT_DIR))
    {
        return Cow::Borrowed(original);
    }

    let mut stack = Vec::new();

    for component in original.split(SEPARATOR) {
        match component {
            EMPTY | CURRENT_DIR => {}
            PARENT_DIR => {
                stack.pop();
            }
            _ => stack.push(component),
        }
    }

    Cow::Owned(stack.join(SEPARATOR_STR))
}

/// Relativize a link target against the location of the referencing
/// navigation document by stripping their longest common leading prefix.
///
/// No `..` components are ever produced: when the navigation document sits
/// deeper than the target the result may not resolve. Known limitation,
/// inherent to the scheme.
pub(crate) fn relative_link(from: &str, to: &str) -> String {
    let from_parts: Vec<&str> = from.split(SEPARATOR).collect();
    let to_parts: Vec<&str> = to.split(SEPARATOR).collect();

    let mut common = 0;
    for (a, b) in from_parts.iter().zip(&to_parts) {
        if a == b {
            common += 1;
        } else {
            break;
        }
    }
    to_parts[common..].join(SEPARATOR_STR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_href() {
        #[rustfmt::skip]
        let expected = [
            ("OPS/content/toc", "OPS/content/toc/toc.xhtml"),
            ("OPS/content", "OPS/content/c1.xhtml"),
            ("", "OPS"),
            ("", ""),
        ];

        for (expect_href, href) in expected {
            assert_eq!(expect_href, parent(href));
        }
    }

    #[test]
    fn test_path_and_fragment() {
        assert_eq!("c1.xhtml", path("c1.xhtml#part-2"));
        assert_eq!("c1.xhtml", path("c1.xhtml?q=1#part-2"));
        assert_eq!(Some("part-2"), fragment("c1.xhtml#part-2"));
        assert_eq!(None, fragment("c1.xhtml"));
    }

    #[test]
    fn test_resolve() {
        #[rustfmt::skip]
        let expected = [
            ("OPS/content/toc/toc.xhtml", "OPS/content/toc", "toc.xhtml"),
            ("OPS/content/toc/toc.xhtml", "OPS/content/toc", "./toc.xhtml"),
            ("OPS/content/c1.xhtml", "OPS/content/toc", "../c1.xhtml"),
            ("OPS/c1.xhtml?q=1", "OPS/content/toc", "../../c1.xhtml?q=1"),
            ("c1.xhtml#part-2", "OPS/content/toc", "../../../c1.xhtml#part-2"),
            ("c1.xhtml", "", "c1.xhtml"),
            ("OPS/c3.xhtml", "OPS/content", "/OPS/c3.xhtml"),
            ("https://example.com/c1", "OPS", "https://example.com/c1"),
        ];

        for (expect_href, absolute_dir, relative_href) in expected {
            assert_eq!(expect_href, resolve(absolute_dir, relative_href));
        }
    }

    #[test]
    fn test_relative_link() {
        #[rustfmt::skip]
        let expected = [
            // Same directory: the shared prefix is stripped
            ("c.html", "a/b/nav.xhtml", "a/b/c.html"),
            // Deeper navigation than target: the prefix is still stripped,
            // never replaced by `..` components
            ("c.html", "a/b/nav.xhtml", "a/c.html"),
            ("text/c1.xhtml#pg_break_3", "toc.ncx", "text/c1.xhtml#pg_break_3"),
            ("OEBPS/c1.xhtml", "toc.ncx", "OEBPS/c1.xhtml"),
            ("c1.xhtml", "OEBPS/toc.ncx", "OEBPS/c1.xhtml"),
        ];

        for (expect_href, from, to) in expected {
            assert_eq!(expect_href, relative_link(from, to));
        }
    }

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("https://ab.c"));
        assert!(has_scheme("mailto:a@b.c"));
        assert!(!has_scheme(":abc"));
        assert!(!has_scheme(""));
        assert!(!has_scheme("not a scheme:..."));
    }
}
