//! OCF container assembly.
//!
//! Entry order is fixed: `mimetype` (stored), `META-INF/container.xml`,
//! `OEBPS/content.xhtml`, `content.opf`, then one `OEBPS/<reference>` entry
//! per asset. Every entry but `mimetype` is deflated, and all of them carry
//! the zip epoch timestamp so equal inputs produce equal archives.

use crate::assets::Asset;
use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use rust_embed::Embed;
use std::io::{Cursor, Write};
use tracing::instrument;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

pub const MIMETYPE: &str = "application/epub+zip";
pub const CONTAINER_PATH: &str = "META-INF/container.xml";
pub const CONTENT_PATH: &str = "OEBPS/content.xhtml";
pub const PACKAGE_PATH: &str = "content.opf";

const CONTAINER_TEMPLATE: &str = "container.xml";

#[derive(Embed)]
#[folder = "../../assets/epub/"]
struct Templates;

/// Build a complete EPUB archive in memory.
#[instrument(skip(content, assets), fields(content_size = content.len(), assets = assets.len()))]
pub fn package(title: &str, content: &str, assets: &[Asset]) -> Result<Vec<u8>> {
    let container = Templates::get(CONTAINER_TEMPLATE)
        .map(|f| f.data)
        .ok_or_raise(|| ErrorKind::Template(CONTAINER_TEMPLATE))?;
    let stored = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(DateTime::default());
    let deflated = stored.compression_method(CompressionMethod::Deflated);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    add(&mut zip, "mimetype", MIMETYPE.as_bytes(), stored)?;
    add(&mut zip, CONTAINER_PATH, &container, deflated)?;
    add(&mut zip, CONTENT_PATH, content.as_bytes(), deflated)?;
    add(&mut zip, PACKAGE_PATH, opf(title, assets).as_bytes(), deflated)?;
    for asset in assets {
        add(&mut zip, &asset.entry_name(), &asset.bytes, deflated)?;
    }
    let archive = zip.finish().or_raise(|| ErrorKind::Archive("central directory".to_string()))?;
    Ok(archive.into_inner())
}

fn add(zip: &mut ZipWriter<Cursor<Vec<u8>>>, name: &str, data: &[u8], options: SimpleFileOptions) -> Result<()> {
    zip.start_file(name, options).or_raise(|| ErrorKind::Archive(name.to_string()))?;
    zip.write_all(data).or_raise(|| ErrorKind::Archive(name.to_string()))?;
    Ok(())
}

/// The OPF 3.0 package document.
///
/// The identifier is `urn:uuid:` followed by the title; readers only use it
/// to tell books apart.
pub fn opf(title: &str, assets: &[Asset]) -> String {
    let items: String = assets
        .iter()
        .enumerate()
        .map(|(i, asset)| {
            format!(
                "\n    <item id=\"asset_{i}\" href=\"{}\" media-type=\"{}\"/>",
                attr(&asset.entry_name()),
                attr(&asset.mime)
            )
        })
        .collect();
    let title = text(title);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package version="3.0" xmlns="http://www.idpf.org/2007/opf">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>{title}</dc:title>
    <dc:language>en</dc:language>
    <dc:identifier>urn:uuid:{title}</dc:identifier>
  </metadata>
  <manifest>
    <item id="content" href="{CONTENT_PATH}" media-type="application/xhtml+xml"/>{items}
  </manifest>
  <spine>
    <itemref idref="content"/>
  </spine>
</package>
"#
    )
}
