//! Bearer credential lookup.
//!
//! The browser client kept its token in local storage. Here the persisted store is a small
//! token file written after sign-in; `MOONSHINE_TOKEN` overrides it.

use std::path::{Path, PathBuf};

use log::debug;

use super::ApiError;
use crate::logutil::redact_token;

pub const TOKEN_ENV: &str = "MOONSHINE_TOKEN";

#[derive(Clone, Default)]
pub struct Credentials {
    token: Option<String>,
    source: Option<PathBuf>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token.as_deref().map(redact_token))
            .field("source", &self.source)
            .finish()
    }
}

impl Credentials {
    /// Credentials holding a literal token.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            token: normalize(token.into()),
            source: None,
        }
    }

    /// Resolve the token: environment first, then the token file if one is configured.
    /// A missing or unreadable file yields empty credentials; requests will then fail with
    /// [`ApiError::MissingCredential`].
    pub async fn load(token_file: Option<&Path>) -> Self {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if let Some(token) = normalize(token) {
                debug!("Using bearer token from {}", TOKEN_ENV);
                return Self {
                    token: Some(token),
                    source: None,
                };
            }
        }
        let Some(path) = token_file else {
            return Self::default();
        };
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let token = normalize(content);
                debug!(
                    "Loaded bearer token from {} ({})",
                    path.display(),
                    token.as_deref().map(redact_token).unwrap_or_default()
                );
                Self {
                    token,
                    source: Some(path.to_path_buf()),
                }
            }
            Err(e) => {
                debug!("No token file at {}: {}", path.display(), e);
                Self {
                    token: None,
                    source: Some(path.to_path_buf()),
                }
            }
        }
    }

    pub fn bearer(&self) -> Result<&str, ApiError> {
        self.token.as_deref().ok_or(ApiError::MissingCredential)
    }

    pub fn is_present(&self) -> bool {
        self.token.is_some()
    }
}

fn normalize(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn literal_token_is_trimmed() {
        let creds = Credentials::from_token("  abc.def.ghi \n");
        assert_eq!(creds.bearer().unwrap(), "abc.def.ghi");
    }

    #[test]
    fn blank_token_is_missing() {
        let creds = Credentials::from_token("   ");
        assert!(matches!(creds.bearer(), Err(ApiError::MissingCredential)));
    }

    #[test]
    fn debug_output_redacts_token() {
        let creds = Credentials::from_token("eyJhbGciOiJIUzI1NiJ9.secret-part");
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("secret-part"));
    }

    #[tokio::test]
    async fn loads_token_from_file() {
        if std::env::var(TOKEN_ENV).is_ok() {
            return;
        }
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "file-token").unwrap();
        let creds = Credentials::load(Some(file.path())).await;
        assert_eq!(creds.bearer().unwrap(), "file-token");
    }

    #[tokio::test]
    async fn missing_file_yields_no_token() {
        if std::env::var(TOKEN_ENV).is_ok() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let creds = Credentials::load(Some(&dir.path().join("absent"))).await;
        assert!(!creds.is_present());
    }
}
