//! Upstream store credentials.
//!
//! Read once from the environment at process start and handed to the
//! extractor by reference. A `.env` file in the working directory is
//! loaded first when present.

use crate::error::{LensError, Result};

pub const STORE_URL_VAR: &str = "SUPABASE_URL";
pub const STORE_KEY_VAR: &str = "SUPABASE_SERVICE_ROLE";
pub const CUSTOMER_ID_VAR: &str = "CUSTOMER_ID";

#[derive(Clone)]
pub struct StoreConfig {
    pub store_url: String,
    pub store_key: String,
    pub customer_id: String,
}

// Keep the service key out of logs.
impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("store_url", &self.store_url)
            .field("store_key", &"<redacted>")
            .field("customer_id", &self.customer_id)
            .finish()
    }
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| -> Result<String> {
            match lookup(key).map(|v| v.trim().to_string()) {
                Some(v) if !v.is_empty() => Ok(v),
                _ => Err(LensError::Config(format!("{key} is not set"))),
            }
        };

        let store_url = require(STORE_URL_VAR)?.trim_end_matches('/').to_string();
        let store_key = require(STORE_KEY_VAR)?;
        let customer_id = require(CUSTOMER_ID_VAR)?;

        Ok(Self {
            store_url,
            store_key,
            customer_id,
        })
    }
}

/// Load `.env` from the working directory. A missing file is fine.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Failed to parse .env file"),
    }
}

/// Which credentials are present, without revealing their values.
pub fn credential_presence() -> Vec<(&'static str, bool)> {
    [STORE_URL_VAR, STORE_KEY_VAR, CUSTOMER_ID_VAR]
        .into_iter()
        .map(|key| {
            let set = std::env::var(key)
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false);
            (key, set)
        })
        .collect()
}
