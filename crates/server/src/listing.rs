//! HTML directory listings for directories without an index document.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use litepub_storage::is_document;
use std::path::Path;
use tracing::instrument;

const STYLE: &str = "body{font-family:system-ui,-apple-system,sans-serif;margin:2em}\
ul{list-style:none;padding:0}li{margin:.5em 0}\
a{text-decoration:none;color:#0366d6}a:hover{text-decoration:underline}";

struct Entry {
    name: String,
    is_dir: bool,
}

/// Render the listing page for `directory`, reached through `request_path`.
///
/// Hidden entries are skipped. Every entry links to its own URL and every
/// document additionally links to its `.epub` alias.
#[instrument(level = "debug", skip(directory), fields(directory = %directory.display()))]
pub fn render(directory: &Path, request_path: &str) -> Result<String> {
    let request_path = request_path.trim_matches('/');
    let entries = self::entries(directory).or_raise(|| ErrorKind::Listing(directory.to_path_buf()))?;

    let mut items = String::new();
    if !request_path.is_empty() {
        let parent = request_path.rsplit_once('/').map_or("", |(parent, _)| parent);
        items.push_str(&format!(r#"<li><a href="/{}">..</a></li>"#, attr(&encode_path(parent))));
    }
    for entry in &entries {
        let href = match request_path.is_empty() {
            true => encode_path(&entry.name),
            false => format!("{}/{}", encode_path(request_path), encode_path(&entry.name)),
        };
        let label = match entry.is_dir {
            true => format!("{}/", entry.name),
            false => entry.name.clone(),
        };
        items.push_str(&format!(r#"<li><a href="/{}">{}</a>"#, attr(&href), text(&label)));
        if !entry.is_dir && is_document(&entry.name) {
            let stem = href.rsplit_once('.').map_or(href.as_str(), |(stem, _)| stem);
            items.push_str(&format!(r#" (<a href="/{}.epub">epub</a>)"#, attr(stem)));
        }
        items.push_str("</li>");
    }

    let title = text(request_path);
    Ok(format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\n<title>Directory listing for /{title}</title>\n\
<style>{STYLE}</style></head><body>\n<h1>Directory listing for /{title}</h1>\n<ul>{items}</ul></body></html>\n"
    ))
}

fn entries(directory: &Path) -> std::io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        // Follows symlinks, like the resolver does.
        let is_dir = entry.path().is_dir();
        entries.push(Entry { name, is_dir });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Percent-encode each segment of a relative URL path.
fn encode_path(path: &str) -> String {
    path.split('/').map(urlencoding::encode).collect::<Vec<_>>().join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn setup() -> tempfile::TempDir {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp_dir.path().join("b-dir")).unwrap();
        fs::write(temp_dir.path().join("c.html"), b"").unwrap();
        fs::write(temp_dir.path().join("a.xhtml"), b"").unwrap();
        fs::write(temp_dir.path().join("photo.png"), b"").unwrap();
        fs::write(temp_dir.path().join(".auth"), b"u:p").unwrap();
        fs::write(temp_dir.path().join("Tom & Jerry.htm"), b"").unwrap();
        temp_dir
    }

    #[test]
    fn test_root_listing() {
        let dir = setup();
        let page = render(dir.path(), "").unwrap();
        assert!(page.contains("<title>Directory listing for /</title>"));
        assert!(!page.contains(".."));
        assert!(!page.contains(".auth"));
        let a = page.find(r#"href="/a.xhtml""#).unwrap();
        let b = page.find(r#"href="/b-dir">b-dir/</a>"#).unwrap();
        let c = page.find(r#"href="/c.html""#).unwrap();
        assert!(a < b && b < c);
        assert!(page.contains(r#"<li><a href="/a.xhtml">a.xhtml</a> (<a href="/a.epub">epub</a>)</li>"#));
        assert!(page.contains(r#"<li><a href="/photo.png">photo.png</a></li>"#));
        assert!(page.contains(r#"<li><a href="/b-dir">b-dir/</a></li>"#));
    }

    #[test]
    fn test_nested_listing() {
        let dir = setup();
        let page = render(dir.path(), "/posts/2024/").unwrap();
        assert!(page.contains("<h1>Directory listing for /posts/2024</h1>"));
        assert!(page.contains(r#"<li><a href="/posts">..</a></li>"#));
        assert!(page.contains(r#"<a href="/posts/2024/c.html">c.html</a> (<a href="/posts/2024/c.epub">epub</a>)"#));
        let page = render(dir.path(), "posts").unwrap();
        assert!(page.contains(r#"<li><a href="/">..</a></li>"#));
    }

    #[test]
    fn test_names_are_escaped() {
        let dir = setup();
        let page = render(dir.path(), "").unwrap();
        assert!(page.contains(r#"<a href="/Tom%20%26%20Jerry.htm">Tom &amp; Jerry.htm</a>"#));
        assert!(page.contains(r#"(<a href="/Tom%20%26%20Jerry.epub">epub</a>)"#));
        let page = render(dir.path(), "<script>").unwrap();
        assert!(!page.contains("<script>"));
    }

    #[test]
    fn test_missing_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = render(&temp_dir.path().join("gone"), "gone").unwrap_err();
        assert!(matches!(&*err, ErrorKind::Listing(_)));
    }
}
