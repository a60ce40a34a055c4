//! Discovery of local assets referenced by a document.

use litepub_storage::ContentRoot;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use tracing::instrument;

static SRC_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("[src]").unwrap());

/// Reference prefixes that are never embedded.
pub const REMOTE_PREFIXES: [&str; 3] = ["data:", "http://", "https://"];
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// A file to be stored in the archive as `OEBPS/<reference>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// The `src` value exactly as written in the document.
    pub reference: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}
impl Asset {
    /// Archive entry for this asset: `OEBPS/` plus the reference with empty
    /// and `.` segments dropped, which is where the reference lands when
    /// resolved from `OEBPS/content.xhtml`.
    pub fn entry_name(&self) -> String {
        entry_name(&self.reference)
    }
}

fn entry_name(reference: &str) -> String {
    let segments: Vec<&str> = reference.split('/').filter(|s| !s.is_empty() && *s != ".").collect();
    format!("OEBPS/{}", segments.join("/"))
}

/// Collect every embeddable asset referenced through a `src` attribute, in
/// document order and at most once per archive entry.
///
/// References are resolved against `base` (the directory of the document).
/// Remote and inline references are ignored; local ones are skipped unless
/// they name a regular file strictly inside the content root. Nothing in the
/// document is rewritten: the original relative reference already points at
/// the right archive entry.
#[instrument(level = "debug", skip(document, root), fields(base = %base.display()))]
pub fn collect(document: &Html, base: &Path, root: &ContentRoot) -> Vec<Asset> {
    let mut seen = HashSet::new();
    let mut assets = Vec::new();
    for element in document.select(&SRC_SELECTOR) {
        let Some(reference) = element.value().attr("src") else {
            continue;
        };
        if reference.is_empty() || REMOTE_PREFIXES.iter().any(|prefix| reference.starts_with(prefix)) {
            continue;
        }
        let entry = entry_name(reference);
        if seen.contains(&entry) {
            continue;
        }
        let Some(path) = root.confine(base.join(reference)).filter(|path| path != root.path() && path.is_file())
        else {
            tracing::debug!(reference, "Skipping asset that is missing or outside the content root");
            continue;
        };
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(reference, error = %e, "Skipping unreadable asset");
                continue;
            },
        };
        let mime = mime_guess::from_path(&path).first_raw().unwrap_or(FALLBACK_MIME).to_string();
        seen.insert(entry);
        assets.push(Asset { reference: reference.to_string(), mime, bytes });
    }
    assets
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn setup() -> (tempfile::TempDir, ContentRoot) {
        let temp_dir = tempfile::tempdir().unwrap();
        let base = temp_dir.path().join("content");
        fs::create_dir_all(base.join("posts/images")).unwrap();
        fs::write(base.join("posts/images/a.png"), b"PNG").unwrap();
        fs::write(base.join("posts/images/b.jpg"), b"JPG").unwrap();
        fs::write(base.join("posts/clip.weird"), b"???").unwrap();
        fs::write(base.join("shared.gif"), b"GIF").unwrap();
        fs::write(temp_dir.path().join("outside.png"), b"NOPE").unwrap();
        let root = ContentRoot::open(&base).unwrap();
        (temp_dir, root)
    }

    #[test]
    fn test_collects_local_assets_in_order() {
        let (_dir, root) = setup();
        let document = Html::parse_document(
            r#"<body>
                <img src="images/b.jpg">
                <img src="images/a.png">
                <p><img src="images/b.jpg"></p>
                <video src="clip.weird"></video>
                <img src="../shared.gif">
            </body>"#,
        );
        let assets = collect(&document, &root.path().join("posts"), &root);
        let refs: Vec<_> = assets.iter().map(|a| (a.reference.as_str(), a.mime.as_str())).collect();
        assert_eq!(
            refs,
            vec![
                ("images/b.jpg", "image/jpeg"),
                ("images/a.png", "image/png"),
                ("clip.weird", FALLBACK_MIME),
                ("../shared.gif", "image/gif"),
            ]
        );
        assert_eq!(assets[1].bytes, b"PNG");
        assert_eq!(assets[0].entry_name(), "OEBPS/images/b.jpg");
    }

    #[test]
    fn test_skips_remote_missing_and_escaping() {
        let (_dir, root) = setup();
        let document = Html::parse_document(
            r#"<body>
                <img src="data:image/png;base64,AAAA">
                <img src="http://example.com/a.png">
                <img src="https://example.com/a.png">
                <img src="images/missing.png">
                <img src="../../outside.png">
                <img src="images">
                <img src="">
            </body>"#,
        );
        assert!(collect(&document, &root.path().join("posts"), &root).is_empty());
    }

    #[test]
    fn test_equivalent_references_share_one_entry() {
        let (_dir, root) = setup();
        let document = Html::parse_document(
            r#"<body><img src="./images/a.png"><img src="images/a.png"><img src="images//a.png"></body>"#,
        );
        let assets = collect(&document, &root.path().join("posts"), &root);
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].reference, "./images/a.png");
        assert_eq!(assets[0].entry_name(), "OEBPS/images/a.png");
    }

    #[cfg(unix)]
    #[test]
    fn test_skips_symlink_escaping_root() {
        let (dir, root) = setup();
        std::os::unix::fs::symlink(dir.path().join("outside.png"), root.path().join("posts/images/link.png")).unwrap();
        std::os::unix::fs::symlink(dir.path(), root.path().join("posts/escape")).unwrap();
        let document = Html::parse_document(
            r#"<body><img src="images/link.png"><img src="escape/outside.png"><img src="images/a.png"></body>"#,
        );
        let assets = collect(&document, &root.path().join("posts"), &root);
        let refs: Vec<_> = assets.iter().map(|a| a.reference.as_str()).collect();
        assert_eq!(refs, vec!["images/a.png"]);
    }
}
