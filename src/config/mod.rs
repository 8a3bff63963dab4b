//! Configuration module for the TeamUp backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to Tantivy search index directory
    pub index_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Webhook receiving recruitment notifications. Unset means log-only.
    pub notify_webhook_url: Option<String>,
    /// Upper bound on one webhook delivery
    pub notify_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = env::var("TEAMUP_DB_PATH")
            .unwrap_or_else(|_| "./data/teamup.sqlite".to_string())
            .into();

        let index_path = env::var("TEAMUP_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let bind_addr = env::var("TEAMUP_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid TEAMUP_BIND_ADDR format");

        let log_level = env::var("TEAMUP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let notify_webhook_url = env::var("TEAMUP_NOTIFY_WEBHOOK_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let notify_timeout = env::var("TEAMUP_NOTIFY_TIMEOUT_MS")
            .ok()
            .and_then(|ms| ms.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_secs(3));

        Self {
            db_path,
            index_path,
            bind_addr,
            log_level,
            notify_webhook_url,
            notify_timeout,
        }
    }
}
