use crate::error::CredentialError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const VERIFY_TIMEOUT: Duration = Duration::from_secs(15);

/// API key for the analysis service. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Trim `raw` and reject it if nothing is left
    pub fn new(raw: &str) -> Result<Self, CredentialError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CredentialError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

/// Source of the key attached to outbound analysis requests
pub trait CredentialProvider: Send + Sync {
    fn api_key(&self) -> Option<ApiKey>;
}

/// Fixed key, e.g. from a command line flag
#[derive(Debug, Clone)]
pub struct StaticCredentials(Option<ApiKey>);

impl StaticCredentials {
    pub fn new(key: ApiKey) -> Self {
        Self(Some(key))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl CredentialProvider for StaticCredentials {
    fn api_key(&self) -> Option<ApiKey> {
        self.0.clone()
    }
}

/// API key persisted to a single file
#[derive(Debug)]
pub struct KeyStore {
    path: PathBuf,
    key: RwLock<Option<ApiKey>>,
}

impl KeyStore {
    /// Load the key saved at `path`, if any
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, CredentialError> {
        let path = path.as_ref().to_path_buf();

        let key = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => ApiKey::new(&contents).ok(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(storage_error(&path, e)),
        };

        debug!(
            "Key store opened at {} ({})",
            path.display(),
            if key.is_some() { "key present" } else { "empty" }
        );

        Ok(Self {
            path,
            key: RwLock::new(key),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_key(&self) -> bool {
        self.key.read().is_some()
    }

    pub async fn save(&self, key: ApiKey) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error(parent, e))?;
        }

        tokio::fs::write(&self.path, key.expose())
            .await
            .map_err(|e| storage_error(&self.path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            if let Err(e) = tokio::fs::set_permissions(&self.path, permissions).await {
                warn!("Could not restrict permissions on {}: {}", self.path.display(), e);
            }
        }

        *self.key.write() = Some(key);
        info!("API key saved to {}", self.path.display());
        Ok(())
    }

    /// Forget the key, in memory and on disk
    pub async fn delete(&self) -> Result<(), CredentialError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(storage_error(&self.path, e)),
        }

        *self.key.write() = None;
        info!("API key removed");
        Ok(())
    }

    /// Check `raw` with the verification service and keep it only if accepted
    pub async fn verify_and_save(
        &self,
        raw: &str,
        verifier: &KeyVerifier,
    ) -> Result<ApiKey, CredentialError> {
        let key = ApiKey::new(raw)?;
        let verdict = verifier.verify(&key).await?;

        if !verdict.valid {
            let reason = verdict
                .error
                .unwrap_or_else(|| "Invalid API key".to_string());
            warn!("API key rejected: {}", reason);
            return Err(CredentialError::Rejected { reason });
        }

        self.save(key.clone()).await?;
        Ok(key)
    }
}

impl CredentialProvider for KeyStore {
    fn api_key(&self) -> Option<ApiKey> {
        self.key.read().clone()
    }
}

fn storage_error(path: &Path, error: std::io::Error) -> CredentialError {
    CredentialError::Storage {
        details: format!("{}: {}", path.display(), error),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyVerdict {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Client for the key verification endpoint
#[derive(Debug, Clone)]
pub struct KeyVerifier {
    client: reqwest::Client,
    endpoint: String,
}

impl KeyVerifier {
    pub fn new<S: Into<String>>(endpoint: S) -> Result<Self, CredentialError> {
        let client = reqwest::Client::builder()
            .timeout(VERIFY_TIMEOUT)
            .build()
            .map_err(|e| CredentialError::Verification {
                details: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub async fn verify(&self, key: &ApiKey) -> Result<KeyVerdict, CredentialError> {
        debug!("Verifying API key against {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "api_key": key.expose() }))
            .send()
            .await
            .map_err(|e| CredentialError::Verification {
                details: e.to_string(),
            })?;

        response
            .json::<KeyVerdict>()
            .await
            .map_err(|e| CredentialError::Verification {
                details: e.to_string(),
            })
    }
}
