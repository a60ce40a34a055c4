//! Path validation and security utilities.
//!
//! This module turns untrusted request paths into relative filesystem paths
//! and decides whether a canonical path stays inside the content root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates an untrusted request path and returns it as a path relative to
/// the content root.
///
/// Leading separators and `.` segments are dropped, so an absolute-looking
/// path is always interpreted relative to the root. `..` segments are kept:
/// they are only meaningful once symlinks have been resolved, which is the
/// job of [`ContentRoot::confine`](crate::ContentRoot::confine).
///
/// > **Note:** Hidden components (anything starting with `.`, such as the
/// >           `.auth` credential file) are rejected, as are null bytes and
/// >           platform path prefixes.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use litepub_storage::request_path;
/// assert_eq!(request_path("/articles/one.html").unwrap(), Path::new("articles/one.html"));
/// assert_eq!(request_path("").unwrap(), Path::new(""));
/// assert_eq!(request_path("a/../b.html").unwrap(), Path::new("a/../b.html"));
/// assert!(request_path("private/.auth").is_err());
/// assert!(request_path("a\0b").is_err());
/// ```
pub fn request_path(raw: impl AsRef<Path>) -> Result<PathBuf> {
    let raw = raw.as_ref();
    let mut relative = PathBuf::new();
    for component in raw.components() {
        match component {
            Component::Normal(s) => {
                let bytes = s.as_encoded_bytes();
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls, reject them explicitly.
                if bytes.contains(&0) || bytes.starts_with(b".") {
                    exn::bail!(ErrorKind::InvalidPath(raw.to_path_buf()));
                }
                relative.push(s);
            },
            Component::ParentDir => relative.push(Component::ParentDir),
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(raw.to_path_buf())),
        }
    }
    Ok(relative)
}

/// Returns `true` if `candidate` is `root` itself or a descendant of it.
///
/// Both paths must already be canonical; the comparison is component-wise so
/// `/srv/content-old` is not considered inside `/srv/content`.
pub(crate) fn is_within(root: &Path, candidate: &Path) -> bool {
    candidate.starts_with(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("articles/one.html", "articles/one.html")]
    #[case("/articles/one.html", "articles/one.html")]
    #[case("//articles//one.html", "articles/one.html")]
    #[case("./a/./b/", "a/b")]
    #[case("/", "")]
    #[case("", "")]
    #[case("a/../../b", "a/../../b")]
    #[case("/etc/passwd", "etc/passwd")]
    fn test_request_paths(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(request_path(raw).unwrap(), Path::new(expected));
    }

    #[rstest]
    #[case(".auth")]
    #[case("private/.auth")]
    #[case(".git/config")]
    #[case("a/.hidden/b.html")]
    #[case("a\0b")]
    #[case("\0")]
    fn test_rejected_paths(#[case] raw: &str) {
        assert!(matches!(&*request_path(raw).unwrap_err(), ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_is_within() {
        let root = Path::new("/srv/content");
        assert!(is_within(root, Path::new("/srv/content")));
        assert!(is_within(root, Path::new("/srv/content/a/b.html")));
        assert!(!is_within(root, Path::new("/srv/content-old/b.html")));
        assert!(!is_within(root, Path::new("/srv")));
        assert!(!is_within(root, Path::new("/etc/passwd")));
    }
}
