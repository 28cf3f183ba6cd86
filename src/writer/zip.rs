//! Output container writing.
//!
//! The paginated book is a fresh zip: every entry of the input container
//! is copied in order, entries with replacement content are substituted,
//! and files new to the container are appended. The input is never
//! touched.

use crate::ebook::archive::Archive;
use crate::ebook::errors::ContainerError;
use crate::writer::WriterResult;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// The `mimetype` entry must come first and be stored uncompressed.
const MIMETYPE: &str = "mimetype";

pub(crate) fn write_container(
    archive: &dyn Archive,
    destination: &Path,
    files: &BTreeMap<String, Vec<u8>>,
) -> WriterResult<()> {
    let file = File::create(destination)?;
    let mut writer = zip::ZipWriter::new(file);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let mut names = archive.names()?;
    if let Some(position) = names.iter().position(|name| name == MIMETYPE) {
        let mimetype = names.remove(position);
        names.insert(0, mimetype);
    }

    let mut written = BTreeSet::new();
    for name in names {
        let options = if name == MIMETYPE { stored } else { deflated };
        writer
            .start_file(name.as_str(), options)
            .map_err(from_zip_error)?;

        match files.get(&name) {
            Some(replacement) => writer.write_all(replacement)?,
            None => writer.write_all(&archive.read(&name)?)?,
        }
        written.insert(name);
    }

    // Files with no counterpart in the input container (e.g. `page-map.xml`)
    for (name, bytes) in files {
        if written.contains(name) {
            continue;
        }
        writer
            .start_file(name.as_str(), deflated)
            .map_err(from_zip_error)?;
        writer.write_all(bytes)?;
    }

    writer.finish().map_err(from_zip_error)?;
    Ok(())
}

fn from_zip_error(error: zip::result::ZipError) -> ContainerError {
    ContainerError::Io(match error {
        zip::result::ZipError::Io(error) => error,
        error => std::io::Error::other(error),
    })
}
