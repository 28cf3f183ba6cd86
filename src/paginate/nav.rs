//! Navigation synthesis.
//!
//! The three artefacts share one [`PageRecord`] list: the EPUB 2 NCX
//! `pageList`, the EPUB 3 `page-list` nav, and the optional Adobe
//! `page-map.xml` with its OPF references. Replacing an existing page
//! list requires consent through the injected `confirm` callback.

use crate::dom::Document;
use crate::dom::NodeId;
use crate::ebook::Epub;
use crate::ebook::consts::{self, nav, ncx, opf};
use crate::ebook::errors::{ContainerError, FormatError};
use crate::paginate::PageRecord;
use crate::paginate::errors::PaginateResult;
use crate::util::uri;
use crate::writer::WriterResult;
use crate::writer::xml::{XmlWriter, serialize, write_element};

/// What a synthesis pass produced.
pub(crate) enum Synthesis {
    /// The rewritten document bytes.
    Replaced(Vec<u8>),
    /// The user declined to overwrite an existing page list.
    Declined,
}

fn parse(bytes: &[u8]) -> PaginateResult<(Document, NodeId)> {
    let doc = crate::parser::xml::parse(bytes).map_err(ContainerError::from)?;
    match doc.root {
        Some(root) => Ok((doc, root)),
        None => Err(ContainerError::from(FormatError::Unparsable(
            "document has no root element".into(),
        ))
        .into()),
    }
}

/// Generates a `navLabel` with a child `text` element.
fn make_label(doc: &mut Document, text: &str) -> NodeId {
    let label = doc.new_element(ncx::NAV_LABEL);
    let text_element = doc.new_element(ncx::TEXT);
    doc.set_text(text_element, text);
    doc.append_child(label, text_element);
    label
}

/// Populate an EPUB 2 NCX file with the new list of pages.
pub(crate) fn write_ncx_page_list(
    bytes: &[u8],
    ncx_path: &str,
    records: &[PageRecord],
    confirm: &dyn Fn(&str) -> bool,
) -> PaginateResult<Synthesis> {
    let (mut doc, root) = parse(bytes)?;

    // The NCX file might already have a pageList element
    if let Some(existing) = doc.find_descendant(root, ncx::PAGE_LIST) {
        if !confirm("EPUB NCX already has a pageList element.\nContinue and overwrite it?") {
            return Ok(Synthesis::Declined);
        }
        doc.detach(existing);
    }

    let page_list = doc.new_element(ncx::PAGE_LIST);
    let label = make_label(&mut doc, "Pages");
    doc.append_child(page_list, label);

    for (index, record) in records.iter().enumerate() {
        let target = doc.new_element(ncx::PAGE_TARGET);
        doc.set_attr(target, consts::ID, format!("pageNav_{index}"));
        doc.set_attr(target, ncx::TYPE, ncx::NORMAL);
        doc.set_attr(target, ncx::VALUE, record.number.as_str());

        let label = make_label(&mut doc, &record.number);
        doc.append_child(target, label);

        let content = doc.new_element(ncx::CONTENT);
        // Links are resolved relative to the NCX's own location
        doc.set_attr(content, ncx::SRC, uri::relative_link(ncx_path, &record.link));
        doc.append_child(target, content);

        doc.append_child(page_list, target);
    }
    doc.append_child(root, page_list);

    Ok(Synthesis::Replaced(serialize(&doc)))
}

/// Populate an EPUB 3 navigation document with the new list of pages.
pub(crate) fn write_nav_page_list(
    bytes: &[u8],
    nav_path: &str,
    records: &[PageRecord],
    confirm: &dyn Fn(&str) -> bool,
) -> PaginateResult<Synthesis> {
    let (mut doc, root) = parse(bytes)?;
    let body = if doc.tag_is(root, nav::BODY) {
        root
    } else {
        doc.find_descendant(root, nav::BODY)
            .ok_or_else(|| {
                ContainerError::from(FormatError::Unparsable(
                    "navigation document has no <body>".into(),
                ))
            })?
    };

    // Perhaps the file already has a page-list navigation element
    if let Some(existing) = Epub::find_nav(&doc, body, nav::PAGE_LIST) {
        if !confirm("EPUB3 navigation already has a page-list.\nContinue and overwrite it?") {
            return Ok(Synthesis::Declined);
        }
        doc.detach(existing);
    }

    // The new navigation element for the list, hidden from the reader
    let main_nav = doc.new_element(nav::NAV);
    doc.set_attr(main_nav, nav::EPUB_TYPE, nav::PAGE_LIST);
    doc.set_attr(main_nav, nav::HIDDEN, "");

    let header = doc.new_element(nav::HEADER);
    doc.set_text(header, "List of Pages");
    doc.append_child(main_nav, header);

    let list = doc.new_element(nav::OL);
    for record in records {
        let item = doc.new_element(nav::LI);
        let link = doc.new_element(nav::ANCHOR);
        doc.set_attr(link, consts::HREF, uri::relative_link(nav_path, &record.link));
        doc.set_text(link, record.number.as_str());
        doc.append_child(item, link);
        doc.append_child(list, item);
    }
    doc.append_child(main_nav, list);
    doc.append_child(body, main_nav);

    Ok(Synthesis::Replaced(serialize(&doc)))
}

/// Emit a standalone Adobe `page-map.xml`.
/// Links here are *not* made relative.
pub(crate) fn write_page_map(records: &[PageRecord]) -> WriterResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut writer = XmlWriter::new(&mut buffer);
    writer.write_utf8_declaration()?;

    write_element! {
        writer: writer,
        tag: "page-map",
        attributes: {
            "xmlns" => opf::OPF_NS,
        }
        inner_content: {
            for (index, record) in records.iter().enumerate() {
                let id = format!("pageNav_{index}");
                write_element! {
                    writer: writer,
                    tag: "page",
                    attributes: {
                        consts::ID => id.as_str(),
                        consts::HREF => record.link.as_str(),
                        "name" => record.number.as_str(),
                    }
                }?;
            }
        }
    }?;

    Ok(buffer)
}

/// Reference the page map from the OPF: `spine/@page-map` plus a
/// manifest item. An OPF already mentioning `page-map.xml` is left
/// untouched; the existing reference is assumed sufficient.
pub(crate) fn add_page_map_refs(bytes: &[u8]) -> PaginateResult<Option<Vec<u8>>> {
    if String::from_utf8_lossy(bytes).contains(opf::PAGE_MAP_FILE) {
        return Ok(None);
    }
    let (mut doc, root) = parse(bytes)?;
    let package = if doc.tag_is(root, opf::PACKAGE) {
        root
    } else {
        match doc.find_descendant(root, opf::PACKAGE) {
            Some(package) => package,
            None => return Ok(None),
        }
    };

    match doc.find_child(package, opf::SPINE) {
        Some(spine) => doc.set_attr(spine, opf::PAGE_MAP, opf::PAGE_MAP_ID),
        None => {
            let spine = doc.new_element(opf::SPINE);
            doc.set_attr(spine, opf::PAGE_MAP, opf::PAGE_MAP_ID);
            doc.append_child(package, spine);
        }
    }

    if let Some(manifest) = doc.find_child(package, opf::MANIFEST) {
        let item = doc.new_element(opf::ITEM);
        doc.set_attr(item, consts::HREF, opf::PAGE_MAP_FILE);
        doc.set_attr(item, consts::ID, opf::PAGE_MAP_ID);
        doc.set_attr(item, opf::MEDIA_TYPE, opf::PAGE_MAP_TYPE);
        doc.append_child(manifest, item);
    }

    Ok(Some(serialize(&doc)))
}
