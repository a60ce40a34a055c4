//! Immutable, layered configuration.
//!
//! Sources are merged in increasing order of precedence:
//!
//! 1. Built-in defaults.
//! 2. A TOML file (`--config`, or `litepub.toml` in the platform config
//!    directory).
//! 3. `LITEPUB_` environment variables, nested keys separated by `__`
//!    (`LITEPUB_SERVER__PORT=9000`).
//! 4. Command-line [`Overrides`].

pub mod error;

use crate::error::{ErrorKind, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "LITEPUB_";
pub const CONFIG_FILE_NAME: &str = "litepub.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub content: ContentConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub tls: TlsConfig,
}
impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8181, tls: TlsConfig::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    pub enabled: bool,
    /// PEM certificate chain.
    pub cert: PathBuf,
    /// PEM private key.
    pub key: PathBuf,
}
impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cert: PathBuf::from("tests/example-keys/server.crt"),
            key: PathBuf::from("tests/example-keys/server.key"),
        }
    }
}

/// Everything the request dispatcher needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Directory everything is served from; created when missing.
    pub root: PathBuf,
    /// Render a listing for directories without an index document.
    pub listing: bool,
    /// Realm advertised in `WWW-Authenticate` challenges.
    pub realm: String,
}
impl Default for ContentConfig {
    fn default() -> Self {
        Self { root: PathBuf::from("tests/example-content"), listing: true, realm: "Litepub".to_string() }
    }
}

/// Values given on the command line; `None` leaves the loaded value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub root: Option<PathBuf>,
    pub cert: Option<PathBuf>,
    pub key: Option<PathBuf>,
    pub no_tls: bool,
}
impl Overrides {
    fn apply(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(root) = self.root {
            config.content.root = root;
        }
        if let Some(cert) = self.cert {
            config.server.tls.cert = cert;
        }
        if let Some(key) = self.key {
            config.server.tls.key = key;
        }
        if self.no_tls {
            config.server.tls.enabled = false;
        }
    }
}

impl Config {
    /// Location of the per-user configuration file, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "litepub").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Defaults, file and environment merged, without overrides or validation.
    ///
    /// # Errors
    ///
    /// An explicitly given `file` must exist. The default file is optional.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match file {
            Some(file) if !file.is_file() => exn::bail!(ErrorKind::Missing(file.to_path_buf())),
            Some(file) => figment = figment.merge(Toml::file(file)),
            None => {
                if let Some(file) = Self::default_path().filter(|path| path.is_file()) {
                    tracing::debug!(path = %file.display(), "Using default configuration file");
                    figment = figment.merge(Toml::file(file));
                }
            },
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load, apply command-line overrides, and validate.
    pub fn load(file: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let mut config: Config = Self::figment(file)?.extract().map_err(|e| ErrorKind::Load(e.to_string()))?;
        overrides.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the rest of the program relies on.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            exn::bail!(ErrorKind::Invalid("server.port must be non-zero".to_string()));
        }
        if self.server.host.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("server.host must not be empty".to_string()));
        }
        if self.server.tls.enabled {
            if self.server.tls.cert.as_os_str().is_empty() {
                exn::bail!(ErrorKind::Invalid("server.tls.cert is required when TLS is enabled".to_string()));
            }
            if self.server.tls.key.as_os_str().is_empty() {
                exn::bail!(ErrorKind::Invalid("server.tls.key is required when TLS is enabled".to_string()));
            }
        }
        if self.content.root.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("content.root must not be empty".to_string()));
        }
        if self.content.realm.is_empty() || self.content.realm.contains('"') {
            exn::bail!(ErrorKind::Invalid("content.realm must be non-empty and must not contain '\"'".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8181);
        assert!(config.server.tls.enabled);
        assert_eq!(config.content.root, PathBuf::from("tests/example-content"));
        assert!(config.content.listing);
        assert_eq!(config.content.realm, "Litepub");
        config.validate().unwrap();
    }

    #[test]
    fn test_file_then_env_then_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "litepub.toml",
                r#"
                    [server]
                    port = 9000
                    [server.tls]
                    enabled = false
                    [content]
                    root = "/srv/articles"
                    listing = false
                "#,
            )?;
            jail.set_env("LITEPUB_SERVER__PORT", "9100");
            jail.set_env("LITEPUB_CONTENT__REALM", "Reading List");
            let overrides = Overrides { host: Some("0.0.0.0".to_string()), ..Default::default() };
            let config = Config::load(Some(Path::new("litepub.toml")), overrides).unwrap();
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.server.port, 9100);
            assert!(!config.server.tls.enabled);
            assert_eq!(config.server.tls.cert, PathBuf::from("tests/example-keys/server.crt"));
            assert_eq!(config.content.root, PathBuf::from("/srv/articles"));
            assert!(!config.content.listing);
            assert_eq!(config.content.realm, "Reading List");
            Ok(())
        });
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        Overrides {
            port: Some(4443),
            root: Some(PathBuf::from("docs")),
            cert: Some(PathBuf::from("a.crt")),
            key: Some(PathBuf::from("a.key")),
            no_tls: true,
            ..Default::default()
        }
        .apply(&mut config);
        assert_eq!(config.server.port, 4443);
        assert_eq!(config.content.root, PathBuf::from("docs"));
        assert_eq!(config.server.tls.cert, PathBuf::from("a.crt"));
        assert_eq!(config.server.tls.key, PathBuf::from("a.key"));
        assert!(!config.server.tls.enabled);
    }

    #[test]
    fn test_missing_explicit_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&temp_dir.path().join("nope.toml")), Overrides::default()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Missing(_)));
    }

    #[test]
    fn test_malformed_file() {
        Jail::expect_with(|jail| {
            jail.create_file("litepub.toml", "[server]\nport = \"not a number\"\n")?;
            let err = Config::load(Some(Path::new("litepub.toml")), Overrides::default()).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Load(_)));
            Ok(())
        });
    }

    #[rstest]
    #[case(|c: &mut Config| c.server.port = 0)]
    #[case(|c: &mut Config| c.server.host = " ".to_string())]
    #[case(|c: &mut Config| c.server.tls.cert = PathBuf::new())]
    #[case(|c: &mut Config| c.server.tls.key = PathBuf::new())]
    #[case(|c: &mut Config| c.content.root = PathBuf::new())]
    #[case(|c: &mut Config| c.content.realm = String::new())]
    #[case(|c: &mut Config| c.content.realm = "a\"b".to_string())]
    fn test_invalid(#[case] break_it: fn(&mut Config)) {
        let mut config = Config::default();
        break_it(&mut config);
        assert!(matches!(&*config.validate().unwrap_err(), ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_tls_paths_optional_without_tls() {
        let mut config = Config::default();
        config.server.tls = TlsConfig { enabled: false, cert: PathBuf::new(), key: PathBuf::new() };
        config.validate().unwrap();
    }
}
