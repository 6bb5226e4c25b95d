//! Shared HTTP client construction
//!
//! One client per remote service, built once at startup and reused for every
//! request in the run so connections and TLS sessions are pooled.

use reqwest::Client;
use std::time::Duration;

/// Client for classifier calls.
///
/// Large document payloads and slow model responses need a generous timeout.
pub fn classifier_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .build()
}

/// Client for storage API and token refresh calls
pub fn store_client() -> reqwest::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(60))
        .pool_max_idle_per_host(8)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
}
