//! EPUB 3 container writer.
//!
//! Serializes a [`DocumentPackage`] into a zip container:
//!
//! ```text
//! mimetype                    (stored, first entry)
//! META-INF/container.xml
//! EPUB/content.opf            package document
//! EPUB/toc.ncx                legacy navigation for older readers
//! EPUB/nav.xhtml              EPUB 3 navigation document
//! EPUB/weather.xhtml
//! EPUB/article_<n>.xhtml
//! EPUB/style/nav.css
//! EPUB/art_img/image_<NNN>.<ext>
//! ```

use crate::assembler::{DocumentPackage, SpineItem, TocLink, TocNode};
use crate::error::PackageError;
use crate::outputs::templates::STYLESHEET_HREF;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::{debug, info, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const MEDIA_TYPE: &str = "application/epub+zip";
const CONTENT_DIR: &str = "EPUB";
const XHTML_TYPE: &str = "application/xhtml+xml";
const NAV_FILE: &str = "nav.xhtml";
const NAV_ID: &str = "nav";
const NCX_FILE: &str = "toc.ncx";
const NCX_ID: &str = "ncx";

type XmlWriter = Writer<Vec<u8>>;

fn stored() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
}

fn deflated() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

fn xml_writer() -> Result<XmlWriter, PackageError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    Ok(writer)
}

fn start(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<(), PackageError> {
    let mut el = BytesStart::new(name);
    for attr in attrs {
        el.push_attribute(*attr);
    }
    w.write_event(Event::Start(el))?;
    Ok(())
}

fn end(w: &mut XmlWriter, name: &str) -> Result<(), PackageError> {
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn empty(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<(), PackageError> {
    let mut el = BytesStart::new(name);
    for attr in attrs {
        el.push_attribute(*attr);
    }
    w.write_event(Event::Empty(el))?;
    Ok(())
}

fn text_element(
    w: &mut XmlWriter,
    name: &str,
    attrs: &[(&str, &str)],
    text: &str,
) -> Result<(), PackageError> {
    start(w, name, attrs)?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    end(w, name)
}

fn container_xml() -> Result<Vec<u8>, PackageError> {
    let mut w = xml_writer()?;
    start(
        &mut w,
        "container",
        &[
            ("version", "1.0"),
            ("xmlns", "urn:oasis:names:tc:opendocument:xmlns:container"),
        ],
    )?;
    start(&mut w, "rootfiles", &[])?;
    let full_path = format!("{CONTENT_DIR}/content.opf");
    empty(
        &mut w,
        "rootfile",
        &[
            ("full-path", full_path.as_str()),
            ("media-type", "application/oebps-package+xml"),
        ],
    )?;
    end(&mut w, "rootfiles")?;
    end(&mut w, "container")?;
    Ok(w.into_inner())
}

fn content_opf(package: &DocumentPackage) -> Result<Vec<u8>, PackageError> {
    let meta = &package.metadata;
    let mut w = xml_writer()?;
    start(
        &mut w,
        "package",
        &[
            ("xmlns", "http://www.idpf.org/2007/opf"),
            ("version", "3.0"),
            ("unique-identifier", "id"),
            ("xml:lang", meta.language.as_str()),
        ],
    )?;

    start(
        &mut w,
        "metadata",
        &[
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:opf", "http://www.idpf.org/2007/opf"),
        ],
    )?;
    text_element(&mut w, "dc:identifier", &[("id", "id")], &meta.identifier)?;
    text_element(&mut w, "dc:title", &[], &meta.title)?;
    text_element(&mut w, "dc:language", &[], &meta.language)?;
    text_element(&mut w, "dc:creator", &[("id", "creator")], &meta.author)?;
    text_element(
        &mut w,
        "meta",
        &[("property", "dcterms:modified")],
        &meta.modified(),
    )?;
    end(&mut w, "metadata")?;

    start(&mut w, "manifest", &[])?;
    empty(
        &mut w,
        "item",
        &[
            ("href", NCX_FILE),
            ("id", NCX_ID),
            ("media-type", "application/x-dtbncx+xml"),
        ],
    )?;
    empty(
        &mut w,
        "item",
        &[
            ("href", NAV_FILE),
            ("id", NAV_ID),
            ("media-type", XHTML_TYPE),
            ("properties", "nav"),
        ],
    )?;
    for chapter in &package.chapters {
        let href = chapter.key.file_name();
        let id = chapter.key.id();
        empty(
            &mut w,
            "item",
            &[
                ("href", href.as_str()),
                ("id", id.as_str()),
                ("media-type", XHTML_TYPE),
            ],
        )?;
    }
    for asset in &package.assets {
        empty(
            &mut w,
            "item",
            &[
                ("href", asset.file_name.as_str()),
                ("id", asset.id.as_str()),
                ("media-type", asset.media_type.as_str()),
            ],
        )?;
    }
    end(&mut w, "manifest")?;

    start(&mut w, "spine", &[("toc", NCX_ID)])?;
    for item in &package.spine {
        let idref = match item {
            SpineItem::Nav => NAV_ID.to_string(),
            SpineItem::Chapter(key) => key.id(),
        };
        empty(&mut w, "itemref", &[("idref", idref.as_str())])?;
    }
    end(&mut w, "spine")?;

    end(&mut w, "package")?;
    Ok(w.into_inner())
}

fn nav_point(
    w: &mut XmlWriter,
    id: &str,
    order: &mut usize,
    label: &str,
    src: &str,
) -> Result<(), PackageError> {
    *order += 1;
    let play_order = order.to_string();
    start(
        w,
        "navPoint",
        &[("id", id), ("playOrder", play_order.as_str())],
    )?;
    start(w, "navLabel", &[])?;
    text_element(w, "text", &[], label)?;
    end(w, "navLabel")?;
    empty(w, "content", &[("src", src)])?;
    Ok(())
}

fn toc_ncx(package: &DocumentPackage) -> Result<Vec<u8>, PackageError> {
    let meta = &package.metadata;
    let mut w = xml_writer()?;
    start(
        &mut w,
        "ncx",
        &[
            ("xmlns", "http://www.daisy.org/z3986/2005/ncx/"),
            ("version", "2005-1"),
        ],
    )?;
    start(&mut w, "head", &[])?;
    empty(
        &mut w,
        "meta",
        &[("content", meta.identifier.as_str()), ("name", "dtb:uid")],
    )?;
    empty(&mut w, "meta", &[("content", "2"), ("name", "dtb:depth")])?;
    end(&mut w, "head")?;
    start(&mut w, "docTitle", &[])?;
    text_element(&mut w, "text", &[], &meta.title)?;
    end(&mut w, "docTitle")?;

    start(&mut w, "navMap", &[])?;
    let mut order = 0;
    for node in &package.toc {
        match node {
            TocNode::Link(link) => {
                nav_point(&mut w, &link.id, &mut order, &link.title, &link.href)?;
                end(&mut w, "navPoint")?;
            }
            // NCX navPoints need a target, so an empty section is left out.
            TocNode::Section { children, .. } if children.is_empty() => {}
            TocNode::Section { title, children } => {
                let section_id = format!("sec_{}", order + 1);
                nav_point(&mut w, &section_id, &mut order, title, &children[0].href)?;
                for child in children {
                    nav_point(&mut w, &child.id, &mut order, &child.title, &child.href)?;
                    end(&mut w, "navPoint")?;
                }
                end(&mut w, "navPoint")?;
            }
        }
    }
    end(&mut w, "navMap")?;
    end(&mut w, "ncx")?;
    Ok(w.into_inner())
}

fn nav_link(w: &mut XmlWriter, link: &TocLink) -> Result<(), PackageError> {
    start(w, "li", &[])?;
    text_element(w, "a", &[("href", link.href.as_str())], &link.title)?;
    end(w, "li")
}

fn nav_xhtml(package: &DocumentPackage) -> Result<Vec<u8>, PackageError> {
    let meta = &package.metadata;
    let mut w = xml_writer()?;
    w.write_event(Event::DocType(BytesText::from_escaped("html")))?;
    start(
        &mut w,
        "html",
        &[
            ("xmlns", "http://www.w3.org/1999/xhtml"),
            ("xmlns:epub", "http://www.idpf.org/2007/ops"),
            ("lang", meta.language.as_str()),
            ("xml:lang", meta.language.as_str()),
        ],
    )?;
    start(&mut w, "head", &[])?;
    text_element(&mut w, "title", &[], &meta.title)?;
    empty(
        &mut w,
        "link",
        &[
            ("href", STYLESHEET_HREF),
            ("rel", "stylesheet"),
            ("type", "text/css"),
        ],
    )?;
    end(&mut w, "head")?;

    start(&mut w, "body", &[])?;
    start(&mut w, "nav", &[("epub:type", "toc"), ("id", "id")])?;
    text_element(&mut w, "h2", &[], &meta.title)?;
    start(&mut w, "ol", &[])?;
    for node in &package.toc {
        match node {
            TocNode::Link(link) => nav_link(&mut w, link)?,
            // A nav heading must be followed by a non-empty list.
            TocNode::Section { children, .. } if children.is_empty() => {}
            TocNode::Section { title, children } => {
                start(&mut w, "li", &[])?;
                text_element(&mut w, "span", &[], title)?;
                start(&mut w, "ol", &[])?;
                for child in children {
                    nav_link(&mut w, child)?;
                }
                end(&mut w, "ol")?;
                end(&mut w, "li")?;
            }
        }
    }
    end(&mut w, "ol")?;
    end(&mut w, "nav")?;
    end(&mut w, "body")?;
    end(&mut w, "html")?;
    Ok(w.into_inner())
}

/// Serialize `package` into EPUB bytes.
#[instrument(level = "info", skip_all, fields(identifier = %package.metadata.identifier))]
pub fn to_bytes(package: &DocumentPackage) -> Result<Vec<u8>, PackageError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    zip.start_file("mimetype", stored())?;
    zip.write_all(MEDIA_TYPE.as_bytes())?;

    zip.start_file("META-INF/container.xml", deflated())?;
    zip.write_all(&container_xml()?)?;

    let documents = [
        ("content.opf", content_opf(package)?),
        (NCX_FILE, toc_ncx(package)?),
        (NAV_FILE, nav_xhtml(package)?),
    ];
    for (name, bytes) in documents {
        zip.start_file(format!("{CONTENT_DIR}/{name}"), deflated())?;
        zip.write_all(&bytes)?;
    }

    for chapter in &package.chapters {
        let name = format!("{CONTENT_DIR}/{}", chapter.key.file_name());
        debug!(%name, "Adding chapter");
        zip.start_file(name, deflated())?;
        zip.write_all(chapter.markup.as_bytes())?;
    }

    for asset in &package.assets {
        // Images are already compressed.
        let options = if asset.media_type.starts_with("image/") {
            stored()
        } else {
            deflated()
        };
        zip.start_file(format!("{CONTENT_DIR}/{}", asset.file_name), options)?;
        zip.write_all(&asset.content)?;
    }

    let bytes = zip.finish()?.into_inner();
    info!(bytes = bytes.len(), "EPUB container built");
    Ok(bytes)
}

/// Serialize `package` and write it to `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_epub(package: &DocumentPackage, path: &Path) -> Result<(), PackageError> {
    let bytes = to_bytes(package)?;
    tokio::fs::write(path, &bytes).await?;
    info!(bytes = bytes.len(), "EPUB written");
    Ok(())
}
