use pagemark::Epub;
use std::path::Path;

/// Unzipped sample book: three chapters of exactly 100 stripped
/// characters each, with both an NCX and an EPUB 3 navigation document.
pub const SAMPLE_DIR: &str = "tests/ebooks/sample_epub";

pub fn open_sample() -> Epub {
    Epub::open(SAMPLE_DIR).unwrap()
}

pub fn fixture_bytes(name: &str) -> Vec<u8> {
    std::fs::read(Path::new(SAMPLE_DIR).join(name)).unwrap()
}
