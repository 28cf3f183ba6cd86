pub(crate) trait StringExt {
    fn trim_in_place(&mut self);
}

impl StringExt for String {
    fn trim_in_place(&mut self) {
        self.truncate(self.trim_end().len());

        let start = self.len() - self.trim_start().len();
        if start > 0 {
            self.drain(..start);
        }
    }
}

pub(crate) trait StrExt {
    fn ends_with_ignore_case(&self, end: &str) -> bool;
}

impl StrExt for str {
    fn ends_with_ignore_case(&self, end: &str) -> bool {
        self.len() >= end.len()
            && self
                .get(self.len() - end.len()..)
                .is_some_and(|tail| tail.eq_ignore_ascii_case(end))
    }
}

/// Split `input` into consecutive chunks of at most `size` characters.
///
/// The final chunk may be shorter. A `size` of zero yields the whole
/// string as a single chunk.
pub(crate) fn char_chunks(input: &str, size: usize) -> Vec<&str> {
    if size == 0 || input.is_empty() {
        return vec![input];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (index, _) in input.char_indices() {
        if count == size {
            chunks.push(&input[start..index]);
            start = index;
            count = 0;
        }
        count += 1;
    }
    chunks.push(&input[start..]);
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_in_place() {
        #[rustfmt::skip]
        let expected = [
            ("a   b   c", "\n \r\t \n  a   b   c \r  \n\n\t"),
            ("", "  \r\n\t  \r \n"),
            ("", ""),
            ("%123", "%123"),
            ("abc", "abc "),
            ("xyz", "\txyz"),
        ];

        for (expected, original) in expected {
            let mut owned = original.to_owned();
            owned.trim_in_place();

            assert_eq!(expected, owned);
        }
    }

    #[test]
    fn test_ends_with_ignore_case() {
        assert!("book.EPUB".ends_with_ignore_case(".epub"));
        assert!("book.epub".ends_with_ignore_case(".epub"));
        assert!(!"book.epub2".ends_with_ignore_case(".epub"));
        assert!(!"pub".ends_with_ignore_case(".epub"));
    }

    #[test]
    fn test_char_chunks() {
        #[rustfmt::skip]
        let expected = [
            (vec!["abc", "def", "g"], "abcdefg", 3),
            (vec!["abcdefg"], "abcdefg", 10),
            (vec!["abcdefg"], "abcdefg", 0),
            (vec![""], "", 3),
            // Chunk boundaries respect multi-byte characters
            (vec!["äö", "üß"], "äöüß", 2),
        ];

        for (expected, input, size) in expected {
            assert_eq!(expected, char_chunks(input, size));
        }
    }
}
