//! Retrieval of manifest text from local files and HTTP(S) sources.

use crate::error::{Error, Result};
use crate::types::Location;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use std::io;
use std::path::Path;
use std::time::Duration;
use ureq::tls::TlsConfig;

/// Default timeout for remote manifest requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("sprinter/", env!("CARGO_PKG_VERSION"));

/// Basic-auth credentials for a remote manifest.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Value for the `Authorization` header.
    fn header_value(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Options controlling how a manifest is fetched.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Credentials sent with remote requests
    pub credentials: Option<Credentials>,
    /// Verify the server certificate (disabling is always logged)
    pub verify_certificate: bool,
    /// Global timeout for a remote request
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            credentials: None,
            verify_certificate: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl FetchOptions {
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn verify_certificate(mut self, verify: bool) -> Self {
        self.verify_certificate = verify;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Fetch raw manifest text from a location.
pub fn fetch(location: &Location, opts: &FetchOptions) -> Result<String> {
    match location {
        Location::Path(path) => read_local(path),
        Location::Remote(uri) => fetch_remote(uri, opts),
    }
}

fn read_local(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            Error::Fetch {
                location: path.display().to_string(),
                message: "file not found".to_string(),
            }
        } else {
            Error::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

fn fetch_remote(uri: &str, opts: &FetchOptions) -> Result<String> {
    let mut config = ureq::Agent::config_builder().timeout_global(Some(opts.timeout));

    if !opts.verify_certificate {
        log::warn!("Certificate verification is disabled for {uri}");
        config = config.tls_config(TlsConfig::builder().disable_verification(true).build());
    }

    let agent = ureq::Agent::new_with_config(config.build());

    let mut request = agent.get(uri).header("User-Agent", USER_AGENT);
    if let Some(credentials) = &opts.credentials {
        log::debug!("Fetching {uri} as {}", credentials.username);
        request = request.header("Authorization", credentials.header_value());
    } else {
        log::debug!("Fetching {uri}");
    }

    let mut response = request.call().map_err(|e| map_error(uri, e))?;

    response
        .body_mut()
        .read_to_string()
        .map_err(|e| map_error(uri, e))
}

fn map_error(uri: &str, err: ureq::Error) -> Error {
    match err {
        ureq::Error::StatusCode(status @ (401 | 403)) => Error::Auth {
            location: uri.to_string(),
            status,
        },
        ureq::Error::StatusCode(status) => Error::Fetch {
            location: uri.to_string(),
            message: format!("server responded with HTTP {status}"),
        },
        other => Error::Fetch {
            location: uri.to_string(),
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_basic_auth_header() {
        let credentials = Credentials::new("user", "pass");
        assert_eq!(credentials.header_value(), "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials::new("user", "hunter2");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("user"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_read_local() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tools.cfg");
        std::fs::write(&path, "[a]\nformula = command\n").unwrap();

        let text = fetch(&Location::Path(path), &FetchOptions::default()).unwrap();
        assert!(text.contains("[a]"));
    }

    #[test]
    fn test_missing_local_is_fetch_error() {
        let tmp = TempDir::new().unwrap();
        let err = fetch(
            &Location::Path(tmp.path().join("missing.cfg")),
            &FetchOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_error("https://x", ureq::Error::StatusCode(401)),
            Error::Auth { status: 401, .. }
        ));
        assert!(matches!(
            map_error("https://x", ureq::Error::StatusCode(403)),
            Error::Auth { status: 403, .. }
        ));
        assert!(matches!(
            map_error("https://x", ureq::Error::StatusCode(500)),
            Error::Fetch { .. }
        ));
    }
}
