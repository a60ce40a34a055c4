//! Filesystem side of the conversion pipeline: confining request paths to the
//! content root, deciding whether a derived file is still current, and
//! replacing files atomically.

pub mod error;
mod freshness;
mod path;
mod resolve;
mod write;

pub use crate::freshness::Freshness;
pub use crate::path::request_path;
pub use crate::resolve::{
    ContentRoot, DOCUMENT_EXTENSIONS, EPUB_ALIAS_SOURCES, HTML_EXTENSIONS, INDEX_CANDIDATES, Resolved, is_document,
    is_html,
};
pub use crate::write::{write_atomic, write_private};
