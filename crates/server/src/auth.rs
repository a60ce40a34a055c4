//! Per-directory HTTP Basic authentication.
//!
//! A directory containing a `.auth` file holding `user:password` protects
//! every document directly inside it. The file is read on every request, so
//! credentials can be changed without a restart.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::path::Path;

pub const AUTH_FILE: &str = ".auth";

/// Decide whether a request carrying `authorization` (the raw header value)
/// may read documents in `directory`.
///
/// Unprotected directories always allow access. Anything unexpected (an
/// unreadable or malformed `.auth`, a non-`Basic` scheme, bad base64,
/// credentials without `:`) denies it.
pub fn authorize(directory: &Path, authorization: Option<&str>) -> bool {
    let stored = match std::fs::read_to_string(directory.join(AUTH_FILE)) {
        Ok(stored) => stored,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return true,
        Err(e) => {
            tracing::warn!(directory = %directory.display(), error = %e, "Unreadable credentials file, denying access");
            return false;
        },
    };
    let Some(expected) = stored.trim().split_once(':') else {
        tracing::warn!(directory = %directory.display(), "Malformed credentials file, denying access");
        return false;
    };
    credentials(authorization).is_some_and(|(user, password)| (user.as_str(), password.as_str()) == expected)
}

/// Decode `Basic <base64(user:password)>`.
fn credentials(authorization: Option<&str>) -> Option<(String, String)> {
    let encoded = authorization?.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(BASE64.decode(encoded.trim()).ok()?).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

/// Value of the `WWW-Authenticate` challenge header.
pub fn challenge(realm: &str) -> String {
    format!("Basic realm=\"{realm}\"")
}
