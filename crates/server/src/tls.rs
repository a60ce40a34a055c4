//! Self-signed certificates for local development.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use litepub_storage::{write_atomic, write_private};
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use std::fs::create_dir_all;
use std::path::Path;
use time::{Duration, OffsetDateTime};
use tracing::instrument;

pub const COMMON_NAME: &str = "Litepub Development";
pub const HOSTNAME: &str = "localhost";
pub const VALIDITY: Duration = Duration::days(365);

/// Generate a key pair and a certificate for `localhost`, valid from now for
/// [`VALIDITY`], and write both as PEM. Missing parent directories are
/// created and existing files are replaced.
#[instrument(skip_all, fields(cert = %cert.display(), key = %key.display()))]
pub fn generate_self_signed(cert: &Path, key: &Path) -> Result<()> {
    let mut params = CertificateParams::new(vec![HOSTNAME.to_string()]).or_raise(|| ErrorKind::Certificate)?;
    params.distinguished_name = DistinguishedName::new();
    params.distinguished_name.push(DnType::CommonName, COMMON_NAME);
    let now = OffsetDateTime::now_utc();
    params.not_before = now;
    params.not_after = now + VALIDITY;
    let key_pair = KeyPair::generate().or_raise(|| ErrorKind::Certificate)?;
    let certificate = params.self_signed(&key_pair).or_raise(|| ErrorKind::Certificate)?;

    for path in [cert, key] {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            create_dir_all(parent).or_raise(|| ErrorKind::WriteCertificate(path.to_path_buf()))?;
        }
    }
    write_private(key, key_pair.serialize_pem().as_bytes())
        .or_raise(|| ErrorKind::WriteCertificate(key.to_path_buf()))?;
    write_atomic(cert, certificate.pem().as_bytes()).or_raise(|| ErrorKind::WriteCertificate(cert.to_path_buf()))?;
    tracing::info!(expires = %certificate.params().not_after.date(), "Generated self-signed certificate for {HOSTNAME}");
    Ok(())
}
