//! Configuration for job storage

use serde::Deserialize;

/// Environment variable overriding [`StorageOptions::key_prefix`].
pub const KEY_PREFIX_ENV: &str = "WORKERS_KEY_PREFIX";
/// Environment variable overriding [`StorageOptions::redis_url`].
pub const REDIS_URL_ENV: &str = "WORKERS_REDIS_URL";

/// Where and how jobs are stored
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageOptions {
    /// Prefix of every key written to the store
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Redis connection URL (only used by the Redis store)
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            redis_url: default_redis_url(),
        }
    }
}

impl StorageOptions {
    /// Load options from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();

        if let Some(prefix) = lookup(KEY_PREFIX_ENV).filter(|v| !v.trim().is_empty()) {
            options.key_prefix = prefix;
        }

        if let Some(url) = lookup(REDIS_URL_ENV).filter(|v| !v.trim().is_empty()) {
            options.redis_url = url;
        }

        options
    }
}

fn default_key_prefix() -> String {
    "workers".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let options = StorageOptions::from_lookup(|_| None);
        assert_eq!(options, StorageOptions::default());
        assert_eq!(options.key_prefix, "workers");
    }

    #[test]
    fn environment_overrides_defaults() {
        let options = StorageOptions::from_lookup(|name| match name {
            KEY_PREFIX_ENV => Some("billing".to_string()),
            REDIS_URL_ENV => Some("  ".to_string()),
            _ => None,
        });

        assert_eq!(options.key_prefix, "billing");
        assert_eq!(options.redis_url, "redis://127.0.0.1:6379");
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let options: StorageOptions =
            serde_json::from_str(r#"{"redis_url": "redis://cache:6380"}"#).unwrap();

        assert_eq!(options.key_prefix, "workers");
        assert_eq!(options.redis_url, "redis://cache:6380");
    }
}
