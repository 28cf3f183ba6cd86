use crate::util::str::StrExt;
use std::path::{Path, PathBuf};

const EPUB_EXTENSION: &str = ".epub";

/// Derive the output file path for a paginated book.
///
/// The `.epub` extension of the input name is stripped case-insensitively,
/// `suffix` is appended (suppressed when `new_name` is given), and the
/// extension is re-appended. The directory defaults to the input's.
pub(crate) fn derive_output_path(
    input: &Path,
    out_dir: Option<&Path>,
    new_name: Option<&str>,
    suffix: &str,
) -> PathBuf {
    let original = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    // An explicit name makes the suffix unnecessary.
    let suffix = if new_name.is_some() { "" } else { suffix };
    let mut name = new_name.map(str::to_owned).unwrap_or(original);

    // The extension may be omitted, but in case it isn't, cut it off here.
    if name.ends_with_ignore_case(EPUB_EXTENSION) {
        name.truncate(name.len() - EPUB_EXTENSION.len());
    }
    name.push_str(suffix);
    name.push_str(EPUB_EXTENSION);

    let dir = out_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();

    dir.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_output_path() {
        #[rustfmt::skip]
        let expected = [
            ("books/a_paginated.epub", "books/a.epub", None, None, "_paginated"),
            ("books/a_paginated.epub", "books/a.EPUB", None, None, "_paginated"),
            ("books/b.epub", "books/a.epub", None, Some("b"), "_paginated"),
            ("books/b.epub", "books/a.epub", None, Some("b.epub"), "_paginated"),
            ("out/a_paginated.epub", "books/a.epub", Some("out"), None, "_paginated"),
            ("books/a-v2.epub", "books/a.epub", None, None, "-v2"),
        ];

        for (expect, input, out_dir, new_name, suffix) in expected {
            let derived = derive_output_path(
                Path::new(input),
                out_dir.map(Path::new),
                new_name,
                suffix,
            );
            assert_eq!(PathBuf::from(expect), derived);
        }
    }
}
