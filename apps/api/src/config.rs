use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

/// Which `SlotStore` backs the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    File { dir: PathBuf },
    Redis { url: String },
}

/// Application configuration loaded from environment variables.
/// Fails at startup if a variable is malformed or a required one is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub bind_addr: String,
    pub rust_log: String,
    pub store_backend: StoreBackend,
    pub store_quota_bytes: u64,
    pub store_key_prefix: String,
    pub autosave_debounce: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let store_backend = match var_or("STORE_BACKEND", "file").to_lowercase().as_str() {
            "memory" => StoreBackend::Memory,
            "file" => StoreBackend::File {
                dir: PathBuf::from(var_or("STORE_DIR", ".cv-data")),
            },
            "redis" => StoreBackend::Redis {
                url: require(&lookup, "REDIS_URL")?,
            },
            other => bail!("STORE_BACKEND must be one of memory, file, redis (got '{other}')"),
        };

        Ok(Config {
            port: var_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            bind_addr: var_or("BIND_ADDR", "127.0.0.1"),
            rust_log: var_or("RUST_LOG", "info"),
            store_backend,
            store_quota_bytes: match lookup("STORE_QUOTA_BYTES") {
                Some(v) => v
                    .parse::<u64>()
                    .context("STORE_QUOTA_BYTES must be a byte count")?,
                None => DEFAULT_QUOTA_BYTES,
            },
            store_key_prefix: var_or("STORE_KEY_PREFIX", "cv-builder"),
            autosave_debounce: Duration::from_millis(
                var_or("AUTOSAVE_DEBOUNCE_MS", "1500")
                    .parse::<u64>()
                    .context("AUTOSAVE_DEBOUNCE_MS must be a number of milliseconds")?,
            ),
        })
    }
}

fn require(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
