//! Modification-time based cache freshness.

use crate::error::{ErrorKind, Result};
use std::path::Path;
use std::time::SystemTime;

/// Whether a derived file (such as a sanitized `.xhtml` sibling) can be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Derived file exists and is at least as new as its source.
    Current,
    /// Derived file does not exist yet.
    Missing,
    /// Derived file is older than its source.
    Stale,
    /// Source is gone; nothing can be regenerated.
    SourceMissing,
}
impl Freshness {
    /// Pure decision over the two modification times.
    ///
    /// Equal timestamps count as current, so regenerating a file within the
    /// same filesystem tick as its source edit does not loop.
    pub fn decide(source: Option<SystemTime>, derived: Option<SystemTime>) -> Self {
        match (source, derived) {
            (None, _) => Self::SourceMissing,
            (Some(_), None) => Self::Missing,
            (Some(source), Some(derived)) if derived >= source => Self::Current,
            (Some(_), Some(_)) => Self::Stale,
        }
    }

    /// Stat both files and decide.
    ///
    /// # Errors
    ///
    /// A missing file is a valid answer, not an error. Any other failure to
    /// read metadata (permissions, I/O) is returned.
    pub fn check(source: impl AsRef<Path>, derived: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::decide(modified(source.as_ref())?, modified(derived.as_ref())?))
    }
}

fn modified(path: &Path) -> Result<Option<SystemTime>> {
    match path.metadata().and_then(|metadata| metadata.modified()) {
        Ok(modified) => Ok(Some(modified)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ErrorKind::from_io(e, path).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use std::time::Duration;

    #[rstest]
    #[case(Some(10), Some(20), Freshness::Current)]
    #[case(Some(10), Some(10), Freshness::Current)]
    #[case(Some(20), Some(10), Freshness::Stale)]
    #[case(Some(10), None, Freshness::Missing)]
    #[case(None, Some(10), Freshness::SourceMissing)]
    #[case(None, None, Freshness::SourceMissing)]
    fn test_decide(#[case] source: Option<u64>, #[case] derived: Option<u64>, #[case] expected: Freshness) {
        let at = |secs: u64| SystemTime::UNIX_EPOCH + Duration::from_secs(secs);
        assert_eq!(Freshness::decide(source.map(at), derived.map(at)), expected);
    }

    #[test]
    fn test_check_against_disk() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("a.html");
        let derived = temp_dir.path().join("a.xhtml");
        assert_eq!(Freshness::check(&source, &derived).unwrap(), Freshness::SourceMissing);
        fs::write(&source, b"<p>a</p>").unwrap();
        assert_eq!(Freshness::check(&source, &derived).unwrap(), Freshness::Missing);
        fs::write(&derived, b"<p>a</p>").unwrap();
        assert_eq!(Freshness::check(&source, &derived).unwrap(), Freshness::Current);

        let later = SystemTime::now() + Duration::from_secs(60);
        fs::File::options().write(true).open(&source).unwrap().set_modified(later).unwrap();
        assert_eq!(Freshness::check(&source, &derived).unwrap(), Freshness::Stale);
    }
}
