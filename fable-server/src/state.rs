//! Application state

use anyhow::Result;
use chrono::Duration;
use fable_core::{SessionGate, Store};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The resource repository
    pub store: Arc<Store>,

    /// Issues and verifies session tokens
    pub gate: SessionGate,
}

impl AppState {
    /// Create application state from the environment
    ///
    /// `FABLE_DATA_PATH` selects the data directory (default
    /// `./fable_data`); `FABLE_TOKEN_SECRET` the token signing key (a
    /// random per-process key when unset); `FABLE_TOKEN_TTL_SECS` the token
    /// lifetime (default one hour).
    pub async fn new() -> Result<Self> {
        let data_path =
            std::env::var("FABLE_DATA_PATH").unwrap_or_else(|_| "./fable_data".to_string());
        let data_path = PathBuf::from(data_path);
        tokio::fs::create_dir_all(&data_path).await?;

        let store = Store::open(data_path.join("fable.json")).await?;

        let ttl = std::env::var("FABLE_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::seconds)
            .unwrap_or_else(|| Duration::hours(1));

        let gate = match std::env::var("FABLE_TOKEN_SECRET") {
            Ok(secret) => SessionGate::new(secret.as_bytes(), ttl)?,
            Err(_) => {
                tracing::warn!("FABLE_TOKEN_SECRET not set; sessions will not survive a restart");
                SessionGate::with_random_key(ttl)
            }
        };

        Ok(Self::with_parts(store, gate))
    }

    /// Assemble state from prebuilt parts (used by tests)
    pub fn with_parts(store: Store, gate: SessionGate) -> Self {
        Self {
            store: Arc::new(store),
            gate,
        }
    }
}
