//! Connection settings for the hosted backend.

use kofin_core::{KofinError, Result};
use std::env;
use std::fmt;
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const URL_VARS: [&str; 2] = ["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"];
const KEY_VARS: [&str; 2] = ["SUPABASE_ANON_KEY", "NEXT_PUBLIC_SUPABASE_ANON_KEY"];
const TIMEOUT_VAR: &str = "KOFIN_HTTP_TIMEOUT_SECS";

/// Project URL, anonymous key and request timeout.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL without trailing slash (e.g. `https://xyz.supabase.co`).
    pub url: String,
    /// Anonymous (public) API key.
    pub anon_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl SupabaseConfig {
    /// Create a configuration with the default timeout.
    #[must_use]
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let url: String = url.into();
        Self {
            url: url.trim().trim_end_matches('/').to_string(),
            anon_key: anon_key.into().trim().to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read the configuration from the environment.
    ///
    /// Loads a `.env` file first if one is present. Reads `SUPABASE_URL` and
    /// `SUPABASE_ANON_KEY`, falling back to their `NEXT_PUBLIC_` prefixed
    /// names. `KOFIN_HTTP_TIMEOUT_SECS` overrides the timeout.
    ///
    /// # Errors
    ///
    /// Returns [`KofinError::Config`] if the URL or key is missing or the
    /// timeout is not a whole number of seconds.
    pub fn from_env() -> Result<Self> {
        // Try to load .env file (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(name))
                .find(|value| !value.trim().is_empty())
        };

        let url = first(&URL_VARS)
            .ok_or_else(|| KofinError::Config(format!("{} is not set", URL_VARS[0])))?;
        let anon_key = first(&KEY_VARS)
            .ok_or_else(|| KofinError::Config(format!("{} is not set", KEY_VARS[0])))?;

        let config = Self::new(url, anon_key);
        let Some(raw) = first(&[TIMEOUT_VAR]) else {
            return Ok(config);
        };
        let secs: u64 = raw.trim().parse().map_err(|_| {
            KofinError::Config(format!("{TIMEOUT_VAR} must be whole seconds, got {raw:?}"))
        })?;
        Ok(config.with_timeout(Duration::from_secs(secs)))
    }

    /// REST endpoint for a table.
    #[must_use]
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.url)
    }
}

impl fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}
