//! Request dispatch: request path in, typed outcome out.
//!
//! `resolve → (listing | auth → convert)`. Everything here is synchronous
//! filesystem and CPU work; the HTTP layer runs it on the blocking pool.

use crate::auth;
use crate::error::{ErrorKind, Result, describe};
use crate::listing;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use exn::ResultExt;
use litepub_config::ContentConfig;
use litepub_epub::{Epub, MIMETYPE};
use litepub_storage::{ContentRoot, Resolved};
use tracing::instrument;

/// The outcome of one request.
#[derive(Debug)]
pub enum Reply {
    Epub(Epub),
    Listing(String),
    NotFound,
    Unauthorized { realm: String },
    Failed(String),
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Epub(epub) => {
                // Quotes would end the quoted-string early.
                let name = epub.file_name().replace(['"', '\\'], "_");
                (
                    StatusCode::OK,
                    [
                        (header::CONTENT_TYPE, MIMETYPE.to_string()),
                        (header::CONTENT_LENGTH, epub.bytes.len().to_string()),
                        (header::CONTENT_DISPOSITION, format!("inline; filename=\"{name}\"")),
                    ],
                    epub.bytes,
                )
                    .into_response()
            },
            Reply::Listing(page) => Html(page).into_response(),
            Reply::NotFound => (StatusCode::NOT_FOUND, "Not Found").into_response(),
            Reply::Unauthorized { realm } => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, auth::challenge(&realm))],
                "Unauthorized",
            )
                .into_response(),
            Reply::Failed(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Internal Server Error: {message}")).into_response()
            },
        }
    }
}

/// Immutable per-server state shared by every request.
#[derive(Debug)]
pub struct Dispatcher {
    root: ContentRoot,
    listing: bool,
    realm: String,
}
impl Dispatcher {
    /// Open (creating if needed) and canonicalize the content root.
    pub fn new(config: &ContentConfig) -> Result<Self> {
        let root = ContentRoot::open(&config.root).or_raise(|| ErrorKind::ContentRoot(config.root.clone()))?;
        tracing::info!(root = %root.path().display(), listing = config.listing, "Serving content");
        Ok(Self { root, listing: config.listing, realm: config.realm.clone() })
    }

    pub fn root(&self) -> &ContentRoot {
        &self.root
    }

    /// Answer a request for `raw_path` carrying the given `Authorization`
    /// header value.
    #[instrument(level = "debug", skip(self, authorization))]
    pub fn dispatch(&self, raw_path: &str, authorization: Option<&str>) -> Reply {
        match self.root.resolve(raw_path) {
            Resolved::NotFound => Reply::NotFound,
            Resolved::Directory(_) if !self.listing => Reply::NotFound,
            Resolved::Directory(directory) => match listing::render(&directory, raw_path) {
                Ok(page) => Reply::Listing(page),
                Err(err) => {
                    tracing::error!("{err:?}");
                    Reply::Failed(describe(err.frame()))
                },
            },
            Resolved::File(path) => {
                let directory = path.parent().unwrap_or(self.root.path());
                if !auth::authorize(directory, authorization) {
                    tracing::info!(path = %path.display(), "Rejected request without valid credentials");
                    return Reply::Unauthorized { realm: self.realm.clone() };
                }
                match litepub_epub::convert(&path, &self.root).or_raise(|| ErrorKind::Conversion(path.clone())) {
                    Ok(epub) => Reply::Epub(epub),
                    Err(err) => {
                        tracing::error!("{err:?}");
                        Reply::Failed(describe(err.frame()))
                    },
                }
            },
        }
    }
}
