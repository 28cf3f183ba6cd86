use crate::ebook::errors::{ContainerError, ContainerResult};
use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

/// Read access to the files of a book container.
///
/// The engine is single-threaded for the duration of a run, so zip
/// access uses a `RefCell` rather than a lock.
pub(crate) trait Archive {
    /// Read the full contents of the named entry.
    fn read(&self, name: &str) -> ContainerResult<Vec<u8>>;

    /// All entry names, in container order.
    fn names(&self) -> ContainerResult<Vec<String>>;
}

/// Open `path` as a zipped `.epub` file or an unzipped book directory.
pub(crate) fn open(path: &Path) -> ContainerResult<Box<dyn Archive>> {
    if path.is_dir() {
        Ok(Box::new(DirectoryArchive::new(path)?))
    } else {
        let file = File::open(path).map_err(|source| ContainerError::UnreadableArchive {
            source,
            path: Some(path.to_path_buf()),
        })?;
        Ok(Box::new(ZipArchive::new(file, Some(path))?))
    }
}

pub(crate) struct ZipArchive<R>(RefCell<zip::ZipArchive<R>>);

impl<R: Read + Seek> ZipArchive<R> {
    /// `reader` (and optional `path` for a more descriptive error message).
    pub(crate) fn new(reader: R, path: Option<&Path>) -> ContainerResult<Self> {
        zip::ZipArchive::new(reader)
            .map(|zip| Self(RefCell::new(zip)))
            .map_err(|error| ContainerError::UnreadableArchive {
                source: io::Error::other(error),
                path: path.map(Path::to_path_buf),
            })
    }
}

impl<R: Read + Seek> Archive for ZipArchive<R> {
    fn read(&self, name: &str) -> ContainerResult<Vec<u8>> {
        let mut zip = self.0.borrow_mut();
        let mut file = zip
            .by_name(name)
            .map_err(|error| ContainerError::CannotRead {
                source: io::Error::other(error),
                name: name.to_owned(),
            })?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|source| ContainerError::CannotRead {
                source,
                name: name.to_owned(),
            })?;
        Ok(bytes)
    }

    fn names(&self) -> ContainerResult<Vec<String>> {
        let zip = self.0.borrow();
        Ok((0..zip.len())
            .filter_map(|index| zip.name_for_index(index))
            // Ignore directory entries
            .filter(|name| !name.ends_with('/'))
            .map(str::to_owned)
            .collect())
    }
}

#[derive(Debug)]
pub(crate) struct DirectoryArchive(PathBuf);

impl DirectoryArchive {
    pub(crate) fn new(dir: &Path) -> ContainerResult<Self> {
        match dir.canonicalize() {
            Ok(dir) if dir.is_dir() => Ok(Self(dir)),
            Ok(_) => Err(ContainerError::UnreadableArchive {
                path: Some(dir.to_path_buf()),
                source: io::Error::from(io::ErrorKind::NotADirectory),
            }),
            Err(source) => Err(ContainerError::UnreadableArchive {
                path: Some(dir.to_path_buf()),
                source,
            }),
        }
    }

    fn entry_path(&self, name: &str) -> ContainerResult<PathBuf> {
        let resolved = self
            .0
            .join(name)
            .canonicalize()
            .map_err(|source| ContainerError::CannotRead {
                source,
                name: name.to_owned(),
            })?;

        // Path traversal mitigation
        if resolved.starts_with(&self.0) && resolved.is_file() {
            Ok(resolved)
        } else {
            Err(ContainerError::CannotRead {
                source: io::Error::new(
                    io::ErrorKind::NotFound,
                    "Provided path is inaccessible or not a file",
                ),
                name: name.to_owned(),
            })
        }
    }
}

impl Archive for DirectoryArchive {
    fn read(&self, name: &str) -> ContainerResult<Vec<u8>> {
        let path = self.entry_path(name)?;
        fs::read(&path).map_err(|source| ContainerError::CannotRead {
            source,
            name: name.to_owned(),
        })
    }

    fn names(&self) -> ContainerResult<Vec<String>> {
        fn unreadable(source: io::Error, path: PathBuf) -> ContainerError {
            ContainerError::UnreadableArchive {
                path: Some(path),
                source,
            }
        }

        fn traverse(
            names: &mut Vec<String>,
            prefix: &Path,
            path: &Path,
        ) -> ContainerResult<()> {
            let read_dir = path
                .read_dir()
                .map_err(|err| unreadable(err, path.to_path_buf()))?;

            for entry in read_dir {
                let entry = entry.map_err(|err| unreadable(err, path.to_path_buf()))?;
                let metadata = entry
                    .metadata()
                    .map_err(|err| unreadable(err, entry.path()))?;

                // Symlinks are not supported
                // (to avoid potential path traversal vulnerabilities)
                if metadata.is_symlink() {
                    continue;
                }

                let path = entry.path();
                if metadata.is_dir() {
                    traverse(names, prefix, &path)?;
                } else if let Ok(relative) = path.strip_prefix(prefix)
                    // Only UTF-8 paths are supported
                    && let Some(utf8_path) = relative.to_str()
                {
                    names.push(utf8_path.replace('\\', "/"));
                }
            }
            Ok(())
        }

        let mut names = Vec::new();
        traverse(&mut names, &self.0, &self.0)?;
        // Directory iteration order is platform-dependent; sort for determinism
        names.sort();
        Ok(names)
    }
}
