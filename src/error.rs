use crate::ai::credentials::CredentialError;
use crate::config::ConfigError;
use crate::store::StoreError;

/// Failure while handling one file. Caught at the top of the per-file loop.
#[derive(Debug, thiserror::Error)]
pub enum FilingError {
    #[error("store: {0}")]
    Store(#[from] StoreError),
}

/// Failure before the first file is touched. Ends the run.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("credentials: {0}")]
    Credentials(#[from] CredentialError),
    #[error("no storage credentials: set {env_var} or provide {path}")]
    NoStoreCredentials { env_var: &'static str, path: String },
    #[error("http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
