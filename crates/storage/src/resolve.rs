//! Request path resolution.
//!
//! Maps an untrusted URL path onto the canonical on-disk file (or directory)
//! that answers it, without ever leaving the content root.

use crate::error::{ErrorKind, Result};
use crate::path::{is_within, request_path};
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Index documents tried, in order, when a request resolves to a directory.
pub const INDEX_CANDIDATES: [&str; 3] = ["index.xhtml", "index.html", "index.htm"];
/// Source extensions tried, in order, for a `.epub` alias request.
pub const EPUB_ALIAS_SOURCES: [&str; 3] = ["html", "htm", "xhtml"];
/// Extensions of files that can be converted into an EPUB.
pub const DOCUMENT_EXTENSIONS: [&str; 3] = ["xhtml", "html", "htm"];
/// Extensions of files that must be sanitized before packaging.
pub const HTML_EXTENSIONS: [&str; 2] = ["html", "htm"];

/// The on-disk answer to a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// The path is invalid, missing, not a document, or escapes the root.
    NotFound,
    /// A directory without any index document; needs a listing.
    Directory(PathBuf),
    /// A regular document file (possibly a directory's index).
    File(PathBuf),
}

/// The confinement boundary for everything that is served.
///
/// Holds the canonical absolute form of the configured directory, computed
/// once on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRoot {
    root: PathBuf,
}
impl ContentRoot {
    /// Open (creating it if needed) the content root directory.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) if the path exists but
    /// is not a directory, or an I/O error if it cannot be created or
    /// canonicalized.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.exists() {
            create_dir_all(root).map_err(|e| ErrorKind::from_io(e, root))?;
            tracing::info!(root = %root.display(), "Created missing content root");
        }
        let root = root.canonicalize().map_err(|e| ErrorKind::from_io(e, root))?;
        if !root.is_dir() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        Ok(Self { root })
    }

    /// Canonical absolute path of the root.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Canonicalize `candidate` (following symlinks) and return it only if
    /// the result is the root itself or one of its descendants.
    ///
    /// Any resolution failure (missing component, permissions, symlink loop)
    /// yields `None`, exactly like an escape attempt does.
    pub fn confine(&self, candidate: impl AsRef<Path>) -> Option<PathBuf> {
        let canonical = candidate.as_ref().canonicalize().ok()?;
        is_within(&self.root, &canonical).then_some(canonical)
    }

    /// Resolve an untrusted request path.
    ///
    /// 1. A `.epub` request is an alias for its sibling source document,
    ///    trying each of [`EPUB_ALIAS_SOURCES`] in order.
    /// 2. A directory resolves to its first existing [`INDEX_CANDIDATES`]
    ///    entry, or to [`Resolved::Directory`] when it has none.
    /// 3. Anything else must be a regular document file.
    #[instrument(level = "debug", skip(self), ret)]
    pub fn resolve(&self, raw: &str) -> Resolved {
        let Ok(relative) = request_path(raw) else {
            return Resolved::NotFound;
        };
        if has_extension(&relative, &["epub"]) {
            return self.resolve_alias(&relative);
        }
        let Some(target) = self.confine(self.root.join(&relative)) else {
            return Resolved::NotFound;
        };
        if target.is_dir() {
            return self.resolve_index(target);
        }
        Self::document(target)
    }

    fn resolve_alias(&self, relative: &Path) -> Resolved {
        EPUB_ALIAS_SOURCES
            .iter()
            .filter_map(|ext| self.confine(self.root.join(relative.with_extension(ext))))
            .find(|source| source.is_file())
            .map_or(Resolved::NotFound, Self::document)
    }

    fn resolve_index(&self, directory: PathBuf) -> Resolved {
        match INDEX_CANDIDATES
            .iter()
            .filter_map(|name| self.confine(directory.join(name)))
            .find(|index| index.is_file())
        {
            Some(index) => Resolved::File(index),
            None => Resolved::Directory(directory),
        }
    }

    fn document(path: PathBuf) -> Resolved {
        match path.is_file() && is_document(&path) {
            true => Resolved::File(path),
            false => Resolved::NotFound,
        }
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|candidate| ext.eq_ignore_ascii_case(candidate)))
}

/// Returns `true` for files that can be packaged (`.xhtml`, `.html`, `.htm`).
pub fn is_document(path: impl AsRef<Path>) -> bool {
    has_extension(path.as_ref(), &DOCUMENT_EXTENSIONS)
}

/// Returns `true` for files that must be sanitized first (`.html`, `.htm`).
pub fn is_html(path: impl AsRef<Path>) -> bool {
    has_extension(path.as_ref(), &HTML_EXTENSIONS)
}
