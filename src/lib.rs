pub mod ai;
pub mod categories;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod naming;
pub mod pipeline;
pub mod report;
pub mod store;
pub mod utils;

use ai::credentials::CredentialManager;
use ai::http_client::{classifier_client, store_client};
use ai::{ClassificationCache, ClassifierAdapter, GeminiClassifier};
use categories::{CategoryRegistry, RecommendationLog};
use config::Settings;
use error::StartupError;
use pipeline::{FilingPipeline, ScanMode, ScanOptions};
use report::{AuditLog, RunStats};
use std::sync::Arc;
use std::time::Duration;
use store::credentials::ACCESS_TOKEN_ENV;
use store::{AccessTokenProvider, DriveStore, ObjectStore, RefreshTokenProvider, StaticToken};

const CLASSIFIER_PROVIDER: &str = "gemini";

/// Storage credentials: an access token from the environment, else the
/// authorized-user token file
fn store_tokens(
    settings: &Settings,
    client: reqwest::Client,
) -> Result<Arc<dyn AccessTokenProvider>, StartupError> {
    if let Some(token) = StaticToken::from_env() {
        tracing::debug!("Using storage token from {}", ACCESS_TOKEN_ENV);
        return Ok(Arc::new(token));
    }
    if settings.drive_token_path.exists() {
        let provider = RefreshTokenProvider::from_file(client, &settings.drive_token_path)?;
        return Ok(Arc::new(provider));
    }
    Err(StartupError::NoStoreCredentials {
        env_var: ACCESS_TOKEN_ENV,
        path: settings.drive_token_path.display().to_string(),
    })
}

/// Build every collaborator from `settings` and run one scan.
///
/// Credential and client failures end the run before any file is touched.
/// Per-file failures are counted in the returned stats.
pub async fn run(
    settings: &Settings,
    options: ScanOptions,
    folder: Option<String>,
) -> Result<RunStats, StartupError> {
    let api_key = CredentialManager::get_api_key(CLASSIFIER_PROVIDER, &settings.base_dir)?;
    let http = classifier_client(Duration::from_secs(settings.classifier.timeout_secs))?;
    let classifier = Arc::new(GeminiClassifier::new(http, api_key, &settings.classifier));

    let store_http = store_client()?;
    let tokens = store_tokens(settings, store_http.clone())?;
    let store: Arc<dyn ObjectStore> = Arc::new(DriveStore::new(store_http, tokens));

    let registry = CategoryRegistry::load(
        &settings.category_config,
        RecommendationLog::open(&settings.recommendations_path),
    );
    if registry.is_empty() {
        tracing::warn!(
            "No categories loaded from {}; files will be renamed but never moved",
            settings.category_config.display()
        );
    }

    let adapter = ClassifierAdapter::new(
        classifier,
        ClassificationCache::open(&settings.cache_path),
        settings.rules.clone(),
        settings.classifier.max_text_bytes,
    );

    let mut pipeline = FilingPipeline::new(
        store,
        registry,
        adapter,
        AuditLog::open(&settings.audit_log_path),
        &settings.inbox_folder_id,
        settings.time_context.clone(),
    );

    match options.mode {
        ScanMode::Inbox => tracing::info!("Mode: Inbox (Auto-Sort)"),
        ScanMode::Maintenance => tracing::info!("Mode: Scan"),
    }
    let folder_id = folder.unwrap_or_else(|| settings.inbox_folder_id.clone());
    pipeline.run(&folder_id, options).await;
    Ok(pipeline.into_stats())
}
