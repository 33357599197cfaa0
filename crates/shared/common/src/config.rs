//! Configuration sources for the document repository.
//!
//! The repository never reads ambient global state. A [`SettingsSource`] is
//! injected at construction and consulted lazily, by well-known key, the first
//! time a value is needed.

use std::collections::HashMap;
use std::env;

// =============================================================================
// Setting Keys
// =============================================================================

/// Document service endpoint URI
pub const KEY_ENDPOINT: &str = "endpoint";

/// Document service master key
pub const KEY_AUTH_KEY: &str = "authKey";

/// Logical database name
pub const KEY_DATABASE: &str = "database";

/// Throughput tier for newly created collections
pub const KEY_OFFER_TYPE: &str = "offerType";

/// Prefix used by [`DocumentDbConfig::from_env`] and [`EnvSettings::default`]
pub const DEFAULT_ENV_PREFIX: &str = "DOCUMENTDB";

/// A string-valued configuration source, looked up by key.
pub trait SettingsSource: Send + Sync {
    /// Get the raw value for `key`, if present
    fn get(&self, key: &str) -> Option<String>;
}

/// Read a required setting. Absent or blank values are reported as
/// [`RepoError::MissingConfig`](crate::RepoError::MissingConfig).
pub fn require_setting(
    source: &dyn SettingsSource,
    key: &'static str,
) -> crate::RepoResult<String> {
    match source.get(key) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(crate::RepoError::MissingConfig(key)),
    }
}

/// Read an optional setting, treating blank values as absent.
pub fn optional_setting(source: &dyn SettingsSource, key: &str) -> Option<String> {
    source
        .get(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

// =============================================================================
// Explicit Configuration
// =============================================================================

/// Explicit repository configuration.
#[derive(Clone, Default)]
pub struct DocumentDbConfig {
    pub endpoint: String,
    auth_key: String,
    pub database: String,
    pub offer_type: Option<String>,
}

impl std::fmt::Debug for DocumentDbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentDbConfig")
            .field("endpoint", &self.endpoint)
            .field("auth_key", &"[REDACTED]")
            .field("database", &self.database)
            .field("offer_type", &self.offer_type)
            .finish()
    }
}

impl DocumentDbConfig {
    pub fn new(
        endpoint: impl Into<String>,
        auth_key: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            auth_key: auth_key.into(),
            database: database.into(),
            offer_type: None,
        }
    }

    pub fn with_offer_type(mut self, offer_type: impl Into<String>) -> Self {
        self.offer_type = Some(offer_type.into());
        self
    }

    /// Load configuration from environment variables (and `.env`).
    ///
    /// Missing variables are left empty; they are reported when the
    /// repository first needs them, not here.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let settings = EnvSettings::default();
        Self {
            endpoint: settings.get(KEY_ENDPOINT).unwrap_or_default(),
            auth_key: settings.get(KEY_AUTH_KEY).unwrap_or_default(),
            database: settings.get(KEY_DATABASE).unwrap_or_default(),
            offer_type: optional_setting(&settings, KEY_OFFER_TYPE),
        }
    }

    /// Get the master key.
    pub fn auth_key(&self) -> &str {
        &self.auth_key
    }
}

impl SettingsSource for DocumentDbConfig {
    fn get(&self, key: &str) -> Option<String> {
        match key {
            KEY_ENDPOINT => Some(self.endpoint.clone()),
            KEY_AUTH_KEY => Some(self.auth_key.clone()),
            KEY_DATABASE => Some(self.database.clone()),
            KEY_OFFER_TYPE => self.offer_type.clone(),
            _ => None,
        }
    }
}

// =============================================================================
// Environment and Map Sources
// =============================================================================

/// Live environment lookup. `authKey` with prefix `DOCUMENTDB` is read from
/// `DOCUMENTDB_AUTH_KEY`.
#[derive(Debug, Clone)]
pub struct EnvSettings {
    prefix: String,
}

impl EnvSettings {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Environment variable name for a setting key
    pub fn var_name(&self, key: &str) -> String {
        let mut name = String::with_capacity(self.prefix.len() + key.len() + 4);
        name.push_str(&self.prefix);
        name.push('_');
        for (i, ch) in key.chars().enumerate() {
            if ch.is_uppercase() && i > 0 {
                name.push('_');
            }
            name.push(ch.to_ascii_uppercase());
        }
        name
    }
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self::new(DEFAULT_ENV_PREFIX)
    }
}

impl SettingsSource for EnvSettings {
    fn get(&self, key: &str) -> Option<String> {
        let name = self.var_name(key);
        match env::var(&name) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::debug!("Environment variable {} not set", name);
                None
            }
        }
    }
}

/// App-settings style map keyed by the raw setting keys.
impl SettingsSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}
