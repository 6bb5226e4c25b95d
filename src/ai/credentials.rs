use keyring::Entry;
use std::fs;
use std::path::{Path, PathBuf};

const SERVICE_NAME: &str = "com.drive-sorter";

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("API key not found for {provider} (tried {env_var}, keychain, {path})")]
    ApiKeyNotFound {
        provider: String,
        env_var: String,
        path: PathBuf,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed token file {path}: {source}")]
    MalformedTokenFile {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),
}

/// API key lookup: environment, then OS keychain, then a secret file
pub struct CredentialManager;

impl CredentialManager {
    fn env_var(provider: &str) -> String {
        format!("{}_API_KEY", provider.to_uppercase())
    }

    /// Path of the plain secret file for a provider under `base_dir`
    pub fn secret_path(base_dir: &Path, provider: &str) -> PathBuf {
        base_dir.join(format!("{}_secret", provider))
    }

    /// Get an API key for `provider`
    pub fn get_api_key(provider: &str, base_dir: &Path) -> Result<String, CredentialError> {
        let env_var = Self::env_var(provider);
        if let Ok(key) = std::env::var(&env_var) {
            if !key.trim().is_empty() {
                tracing::debug!("Using {} from environment", env_var);
                return Ok(key.trim().to_string());
            }
        }

        if let Ok(entry) = Entry::new(SERVICE_NAME, provider) {
            if let Ok(password) = entry.get_password() {
                tracing::debug!("Retrieved API key from keychain for: {}", provider);
                return Ok(password);
            }
        }

        let path = Self::secret_path(base_dir, provider);
        if path.exists() {
            let key = fs::read_to_string(&path).map_err(|source| CredentialError::Read {
                path: path.clone(),
                source,
            })?;
            let key = key.trim();
            if !key.is_empty() {
                tracing::debug!("Retrieved API key from file: {:?}", path);
                return Ok(key.to_string());
            }
        }

        Err(CredentialError::ApiKeyNotFound {
            provider: provider.to_string(),
            env_var,
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_secret_file_fallback() {
        let dir = TempDir::new().unwrap();
        // Provider name chosen so neither env nor keychain can hold it
        let provider = "sorter_test_provider_file";
        fs::write(CredentialManager::secret_path(dir.path(), provider), "  key-123\n").unwrap();

        let key = CredentialManager::get_api_key(provider, dir.path()).unwrap();
        assert_eq!(key, "key-123");
    }

    #[test]
    fn test_missing_key_reports_sources() {
        let dir = TempDir::new().unwrap();
        let err = CredentialManager::get_api_key("sorter_test_provider_missing", dir.path())
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("SORTER_TEST_PROVIDER_MISSING_API_KEY"));
    }
}
