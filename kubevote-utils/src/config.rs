//! Environment-variable configuration loading.
//!
//! Ported from the `load_config` helpers in the original Python services
//! (`_get_env`, `_get_env_int`, `_get_env_bool`): read a `.env` file if one
//! exists, then fall back to whatever is already in the process
//! environment.

use std::env::VarError;
use thiserror::Error;

/// Errors that can occur while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was not set.
    #[error("required environment variable '{0}' is not set")]
    Missing(&'static str),

    /// An environment variable was set but could not be parsed as the
    /// expected type.
    #[error("environment variable '{key}' must be {expected}, got: {value}")]
    Invalid {
        /// The variable's name.
        key: &'static str,
        /// What kind of value was expected.
        expected: &'static str,
        /// What was actually found.
        value: String,
    },
}

/// Loads a `.env` file from the current directory if present. Real
/// environment variables already set take precedence over its contents.
/// Absence of the file is not an error.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
        Err(dotenvy::Error::Io(_)) => {}
        Err(err) => tracing::warn!(%err, "failed to parse .env file"),
    }
}

/// Reads a required string environment variable.
pub fn require_str(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::Missing(key))
}

/// Reads an optional string environment variable, falling back to `default`.
pub fn env_str(key: &'static str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Reads an optional string environment variable, returning `None` if unset.
pub fn env_opt_str(key: &'static str) -> Option<String> {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

/// Reads an optional integer environment variable, falling back to `default`.
pub fn env_int(key: &'static str, default: i64) -> Result<i64, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid {
            key,
            expected: "an integer",
            value,
        }),
        Err(VarError::NotPresent) => Ok(default),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::Invalid {
            key,
            expected: "valid UTF-8",
            value: String::from("<non-utf8>"),
        }),
    }
}

/// Reads an optional boolean environment variable, falling back to `default`.
///
/// Accepts `true`/`1`/`yes`/`on` (case-insensitive) as truthy, anything else
/// as falsy, matching the Python service's `_get_env_bool`.
pub fn env_bool(key: &'static str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(value) => matches!(value.to_lowercase().as_str(), "true" | "1" | "yes" | "on"),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialise tests that touch
    // them so parallel execution doesn't race.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn env_int_falls_back_to_default() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe { std::env::remove_var("KUBEVOTE_TEST_INT") };
        assert_eq!(env_int("KUBEVOTE_TEST_INT", 42).unwrap(), 42);
    }

    #[test]
    fn env_int_rejects_non_numeric() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe { std::env::set_var("KUBEVOTE_TEST_INT", "not-a-number") };
        let err = env_int("KUBEVOTE_TEST_INT", 0).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        unsafe { std::env::remove_var("KUBEVOTE_TEST_INT") };
    }

    #[test]
    fn env_bool_accepts_common_truthy_spellings() {
        let _guard = ENV_LOCK.lock().unwrap();
        for value in ["true", "1", "yes", "on", "TRUE", "On"] {
            unsafe { std::env::set_var("KUBEVOTE_TEST_BOOL", value) };
            assert!(env_bool("KUBEVOTE_TEST_BOOL", false), "value: {value}");
        }
        unsafe { std::env::set_var("KUBEVOTE_TEST_BOOL", "nope") };
        assert!(!env_bool("KUBEVOTE_TEST_BOOL", true));
        unsafe { std::env::remove_var("KUBEVOTE_TEST_BOOL") };
    }

    #[test]
    fn require_str_errors_when_missing() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe { std::env::remove_var("KUBEVOTE_TEST_REQUIRED") };
        assert!(matches!(
            require_str("KUBEVOTE_TEST_REQUIRED"),
            Err(ConfigError::Missing("KUBEVOTE_TEST_REQUIRED"))
        ));
    }
}
