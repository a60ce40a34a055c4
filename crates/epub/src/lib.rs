//! Conversion of a single (X)HTML document into an EPUB archive.
//!
//! HTML sources are sanitized first (see [`litepub_sanitize`]); the XHTML
//! document is then parsed leniently, its local assets collected, and the
//! whole thing re-serialized and packaged into an in-memory zip container.

pub mod assets;
pub mod error;
mod package;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use litepub_sanitize::{sanitize_file, to_xhtml};
use litepub_storage::{ContentRoot, is_document, is_html};
use scraper::Html;
use std::path::Path;
use tracing::instrument;

pub use crate::assets::Asset;
pub use crate::package::{CONTAINER_PATH, CONTENT_PATH, MIMETYPE, PACKAGE_PATH, opf, package};

/// A packaged book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Epub {
    /// Stem of the source file name, used as `dc:title`.
    pub title: String,
    pub bytes: Vec<u8>,
}
impl Epub {
    /// Suggested download name.
    pub fn file_name(&self) -> String {
        format!("{}.epub", self.title)
    }
}

/// Run the whole pipeline on one document.
///
/// Assets are only embedded when they resolve to regular files strictly
/// inside `root`.
///
/// # Errors
///
/// Fails when `path` is not a document, sanitizing fails, the document cannot
/// be read, or the archive cannot be written. Unusable assets are skipped
/// rather than failing the conversion.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn convert(path: impl AsRef<Path>, root: &ContentRoot) -> Result<Epub> {
    let path = path.as_ref();
    if !is_document(path) {
        exn::bail!(ErrorKind::Unsupported(path.to_path_buf()));
    }
    let document = match is_html(path) {
        true => sanitize_file(path).or_raise(|| ErrorKind::Sanitize(path.to_path_buf()))?,
        false => path.to_path_buf(),
    };
    let raw = std::fs::read(&document).or_raise(|| ErrorKind::Read(document.clone()))?;
    let html = Html::parse_document(&String::from_utf8_lossy(&raw));
    let base = document.parent().unwrap_or(root.path());
    let assets = assets::collect(&html, base, root);
    let title = document.file_stem().map(|stem| stem.to_string_lossy().into_owned()).unwrap_or_default();
    let bytes = package(&title, &to_xhtml(&html), &assets)?;
    tracing::info!(title, assets = assets.len(), bytes = bytes.len(), "Packaged EPUB");
    Ok(Epub { title, bytes })
}
