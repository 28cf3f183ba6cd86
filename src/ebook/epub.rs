use crate::dom::Document;
use crate::ebook::archive::{self, Archive, ZipArchive};
use crate::ebook::consts::{self, nav, ncx, opf};
use crate::ebook::errors::{ContainerError, ContainerResult};
use crate::parser::xml;
use crate::util::str::StringExt;
use crate::util::uri;
use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Seek};
use std::path::Path;

/// Relative placement of auxiliary documents
/// (non-linear spine items or manifest items absent from the spine)
/// within the pagination order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SpinePlacement {
    /// Place after the linear reading order.
    #[default]
    Append,
    /// Place before the linear reading order.
    Prepend,
    /// Exclude entirely.
    Ignore,
}

/// An entry of the package manifest.
#[derive(Clone, Debug)]
pub struct ManifestItem {
    /// The manifest identifier.
    pub id: String,
    /// Container path of the entry, percent-decoded and
    /// resolved against the package document's directory.
    pub href: String,
    /// The declared media type.
    pub media_type: String,
    /// The space-separated `properties` attribute, if any.
    pub properties: Option<String>,
}

impl ManifestItem {
    pub(crate) fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|properties| properties.split_whitespace().any(|p| p == property))
    }
}

/// An entry of the package spine.
#[derive(Clone, Debug)]
pub struct SpineRef {
    /// The `idref` of the referenced manifest item.
    pub idref: String,
    /// Whether the entry belongs to the default reading order.
    pub linear: bool,
}

/// A flattened table-of-contents entry.
#[derive(Clone, Debug)]
pub struct TocLeaf {
    /// The entry label.
    pub title: String,
    /// Resolved container path, fragment preserved.
    pub href: String,
}

/// A read-only EPUB 2/3 container.
///
/// Opening a book parses `META-INF/container.xml`, the package document,
/// and the table of contents; file contents are read on demand.
pub struct Epub {
    archive: Box<dyn Archive>,
    opf_path: String,
    manifest: Vec<ManifestItem>,
    spine: Vec<SpineRef>,
    toc: Vec<TocLeaf>,
    ncx: Option<usize>,
    nav: Option<usize>,
}

impl fmt::Debug for Epub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Epub")
            .field("opf_path", &self.opf_path)
            .field("manifest", &self.manifest)
            .field("spine", &self.spine)
            .field("toc", &self.toc)
            .finish_non_exhaustive()
    }
}

impl Epub {
    /// Open a zipped `.epub` file or an unzipped book directory.
    pub fn open(path: impl AsRef<Path>) -> ContainerResult<Self> {
        Self::from_archive(archive::open(path.as_ref())?)
    }

    /// Open a zipped book from any `Read + Seek` source.
    pub fn read<R: Read + Seek + 'static>(reader: R) -> ContainerResult<Self> {
        Self::from_archive(Box::new(ZipArchive::new(reader, None)?))
    }

    fn from_archive(archive: Box<dyn Archive>) -> ContainerResult<Self> {
        let opf_path = Self::parse_container(archive.as_ref())?;
        let mut epub = Self {
            archive,
            opf_path,
            manifest: Vec::new(),
            spine: Vec::new(),
            toc: Vec::new(),
            ncx: None,
            nav: None,
        };
        epub.parse_package()?;
        epub.parse_toc()?;
        Ok(epub)
    }

    fn parse_container(archive: &dyn Archive) -> ContainerResult<String> {
        let container = xml::parse(&archive.read(consts::CONTAINER)?)?;
        let root = container.root.ok_or(ContainerError::NoOpfReference)?;

        container
            .elements(root)
            .into_iter()
            .filter(|&e| container.tag_is(e, opf::ROOT_FILE))
            .find_map(|e| container.attr(e, opf::FULL_PATH))
            .map(|full_path| uri::resolve("", &uri::decode(full_path)))
            .ok_or(ContainerError::NoOpfReference)
    }

    fn parse_package(&mut self) -> ContainerResult<()> {
        let doc = xml::parse(&self.archive.read(&self.opf_path)?)?;
        let root = doc.root.ok_or(ContainerError::NoPackageFound)?;
        let package = if doc.tag_is(root, opf::PACKAGE) {
            root
        } else {
            doc.find_descendant(root, opf::PACKAGE)
                .ok_or(ContainerError::NoPackageFound)?
        };
        let opf_dir = uri::parent(&self.opf_path).to_owned();

        let manifest = doc
            .find_child(package, opf::MANIFEST)
            .ok_or(ContainerError::NoManifestFound)?;
        for &item in doc.children(manifest) {
            if !doc.tag_is(item, opf::ITEM) {
                continue;
            }
            // Entries lacking required attributes are skipped, not fatal
            let (Some(id), Some(href)) = (doc.attr(item, consts::ID), doc.attr(item, consts::HREF))
            else {
                continue;
            };
            self.manifest.push(ManifestItem {
                id: id.to_owned(),
                href: uri::resolve(&opf_dir, &uri::decode(href)),
                media_type: doc.attr(item, opf::MEDIA_TYPE).unwrap_or_default().to_owned(),
                properties: doc.attr(item, opf::PROPERTIES).map(str::to_owned),
            });
        }

        let spine = doc
            .find_child(package, opf::SPINE)
            .ok_or(ContainerError::NoSpineFound)?;
        for &itemref in doc.children(spine) {
            if !doc.tag_is(itemref, opf::ITEMREF) {
                continue;
            }
            let Some(idref) = doc.attr(itemref, opf::IDREF) else {
                continue;
            };
            self.spine.push(SpineRef {
                idref: idref.to_owned(),
                linear: doc.attr(itemref, opf::LINEAR) != Some(opf::NO),
            });
        }

        self.nav = self
            .manifest
            .iter()
            .position(|item| item.has_property(opf::NAV_PROPERTY));
        self.ncx = doc
            .attr(spine, opf::TOC)
            .and_then(|ncx_id| self.manifest.iter().position(|item| item.id == ncx_id))
            .or_else(|| {
                self.manifest
                    .iter()
                    .position(|item| item.media_type == opf::NCX_TYPE)
            });
        Ok(())
    }

    /// Flatten the table of contents into pre-order leaves.
    ///
    /// The EPUB 3 navigation document takes precedence; the EPUB 2 NCX
    /// `navMap` is the fallback. A book carrying neither yields an
    /// empty list, which only matters once a ToC page map is supplied.
    fn parse_toc(&mut self) -> ContainerResult<()> {
        if let Some(nav_item) = self.nav {
            let item = &self.manifest[nav_item];
            let doc = xml::parse(&self.archive.read(&item.href)?)?;
            let dir = uri::parent(&item.href).to_owned();

            if let Some(root) = doc.root
                && let Some(toc_nav) = Self::find_nav(&doc, root, nav::TOC)
            {
                for anchor in doc.elements(toc_nav) {
                    if !doc.tag_is(anchor, nav::ANCHOR) {
                        continue;
                    }
                    let Some(href) = doc.attr(anchor, consts::HREF) else {
                        continue;
                    };
                    let mut title = doc.subtree_text(anchor);
                    title.trim_in_place();
                    self.toc.push(TocLeaf {
                        title,
                        href: uri::resolve(&dir, &uri::decode(href)),
                    });
                }
                return Ok(());
            }
        }

        if let Some(ncx_item) = self.ncx {
            let item = &self.manifest[ncx_item];
            let doc = xml::parse(&self.archive.read(&item.href)?)?;
            let dir = uri::parent(&item.href).to_owned();
            let Some(root) = doc.root else {
                return Ok(());
            };
            let Some(nav_map) = doc.find_descendant(root, ncx::NAV_MAP) else {
                return Ok(());
            };

            for nav_point in doc.elements(nav_map) {
                if !doc.tag_is(nav_point, ncx::NAV_POINT) {
                    continue;
                }
                let Some(src) = doc
                    .find_child(nav_point, ncx::CONTENT)
                    .and_then(|content| doc.attr(content, ncx::SRC))
                else {
                    continue;
                };
                let mut title = doc
                    .find_child(nav_point, ncx::NAV_LABEL)
                    .map(|label| doc.subtree_text(label))
                    .unwrap_or_default();
                title.trim_in_place();
                self.toc.push(TocLeaf {
                    title,
                    href: uri::resolve(&dir, &uri::decode(src)),
                });
            }
        }
        Ok(())
    }

    /// Locates a `<nav epub:type="…">` element by type token.
    pub(crate) fn find_nav(doc: &Document, root: usize, epub_type: &str) -> Option<usize> {
        doc.elements(root).into_iter().find(|&e| {
            doc.tag_is(e, nav::NAV)
                && doc
                    .attr(e, nav::EPUB_TYPE)
                    .is_some_and(|value| value.split_whitespace().any(|token| token == epub_type))
        })
    }

    /// The package manifest.
    pub fn manifest(&self) -> &[ManifestItem] {
        &self.manifest
    }

    /// The package spine, in reading order.
    pub fn spine(&self) -> &[SpineRef] {
        &self.spine
    }

    /// The flattened table of contents.
    pub fn toc_leaves(&self) -> &[TocLeaf] {
        &self.toc
    }

    /// The EPUB 2 NCX entry, if present.
    pub fn ncx(&self) -> Option<&ManifestItem> {
        self.ncx.map(|index| &self.manifest[index])
    }

    /// The EPUB 3 navigation document entry, if present.
    pub fn nav(&self) -> Option<&ManifestItem> {
        self.nav.map(|index| &self.manifest[index])
    }

    /// Container path of the package document.
    pub fn opf_path(&self) -> &str {
        &self.opf_path
    }

    /// Read the raw bytes of a contained file by container path.
    pub fn read_bytes(&self, name: &str) -> ContainerResult<Vec<u8>> {
        self.archive.read(name)
    }

    pub(crate) fn archive(&self) -> &dyn Archive {
        self.archive.as_ref()
    }

    /// Content documents in pagination order.
    ///
    /// Linear spine items come first in spine order. Non-linear spine
    /// items and manifest documents absent from the spine are appended,
    /// prepended, or dropped per their placement argument. The EPUB 3
    /// navigation document is never included.
    pub fn documents(
        &self,
        nonlinear: SpinePlacement,
        unlisted: SpinePlacement,
    ) -> Vec<&ManifestItem> {
        let by_id: HashMap<&str, usize> = self
            .manifest
            .iter()
            .enumerate()
            .map(|(index, item)| (item.id.as_str(), index))
            .collect();

        let mut ordered: Vec<usize> = Vec::new();
        let mut auxiliary: Vec<usize> = Vec::new();
        let mut listed = vec![false; self.manifest.len()];

        for spine_ref in &self.spine {
            let Some(&index) = by_id.get(spine_ref.idref.as_str()) else {
                continue;
            };
            if !self.is_content_document(index) {
                continue;
            }
            listed[index] = true;
            if spine_ref.linear {
                ordered.push(index);
            } else {
                auxiliary.push(index);
            }
        }

        match nonlinear {
            SpinePlacement::Append => ordered.extend(auxiliary),
            SpinePlacement::Prepend => ordered.splice(0..0, auxiliary).for_each(drop),
            SpinePlacement::Ignore => {}
        }

        let absent: Vec<usize> = (0..self.manifest.len())
            .filter(|&index| !listed[index] && self.is_content_document(index))
            .collect();
        match unlisted {
            SpinePlacement::Append => ordered.extend(absent),
            SpinePlacement::Prepend => ordered.splice(0..0, absent).for_each(drop),
            SpinePlacement::Ignore => {}
        }

        ordered.into_iter().map(|index| &self.manifest[index]).collect()
    }

    fn is_content_document(&self, index: usize) -> bool {
        let item = &self.manifest[index];
        (item.media_type == opf::XHTML_TYPE || item.media_type == opf::HTML_TYPE)
            && self.nav != Some(index)
    }
}
