//! # Runtime Configuration Module
//!
//! Dispatch behavior knobs, layered from several sources.
//!
//! ## Sources
//!
//! Lowest to highest priority:
//!
//! 1. Built-in defaults
//! 2. A TOML file
//! 3. A dotenv file
//! 4. The process environment
//!
//! ## Environment Variables
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `STACKROUTE_STRIP_TRAILING_SLASH` | `strip_trailing_slash` | `true` |
//! | `STACKROUTE_HEAD_FALLBACK` | `head_falls_back_to_get` | `true` |
//! | `STACKROUTE_CATCH_PANICS` | `catch_panics` | `true` |
//! | `STACKROUTE_SLOW_DISPATCH_MS` | `slow_dispatch_ms` | `100` |
//!
//! Booleans accept `1/0`, `true/false`, `yes/no` and `on/off`.
//!
//! ## Usage
//!
//! ```rust
//! use stackroute::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("slow dispatch threshold: {} ms", config.slow_dispatch_ms);
//! ```
//!
//! The TOML file uses the field names directly:
//!
//! ```toml
//! strip_trailing_slash = false
//! slow_dispatch_ms = 250
//! ```

use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;

pub const ENV_STRIP_TRAILING_SLASH: &str = "STACKROUTE_STRIP_TRAILING_SLASH";
pub const ENV_HEAD_FALLBACK: &str = "STACKROUTE_HEAD_FALLBACK";
pub const ENV_CATCH_PANICS: &str = "STACKROUTE_CATCH_PANICS";
pub const ENV_SLOW_DISPATCH_MS: &str = "STACKROUTE_SLOW_DISPATCH_MS";

/// Runtime configuration for an [`Application`](crate::app::Application).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Match `/users/` as `/users`
    pub strip_trailing_slash: bool,
    /// Serve `HEAD` through the `GET` route when no `HEAD` route matches
    pub head_falls_back_to_get: bool,
    /// Turn handler panics into [`DispatchError::Panicked`](crate::error::DispatchError::Panicked)
    pub catch_panics: bool,
    /// Dispatches slower than this are logged at warn level
    pub slow_dispatch_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            strip_trailing_slash: true,
            head_falls_back_to_get: true,
            catch_panics: true,
            slow_dispatch_ms: 100,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    ///
    /// Lenient: a variable with an unparsable value is ignored with a
    /// warning and the default stays in place.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        for (key, value) in env::vars() {
            if let Err(err) = config.apply(&key, &value) {
                warn!(error = %err, "Ignoring invalid configuration variable");
            }
        }
        config
    }

    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Toml`] for invalid TOML, unknown keys or wrongly typed
    /// values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Strict layered load: defaults, then `toml_path`, then `env_file`, then
    /// the process environment.
    ///
    /// # Errors
    ///
    /// Any unreadable file, invalid TOML or invalid variable value.
    pub fn load(toml_path: Option<&Path>, env_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(toml_path, env_file, env::vars())
    }

    /// [`RuntimeConfig::load`] with an explicit environment instead of the
    /// process one.
    ///
    /// # Errors
    ///
    /// See [`RuntimeConfig::load`].
    pub fn load_with_env<I>(
        toml_path: Option<&Path>,
        env_file: Option<&Path>,
        vars: I,
    ) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = match toml_path {
            Some(path) => {
                let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&source)?
            }
            None => Self::default(),
        };

        if let Some(path) = env_file {
            let dotenv_error = |err: dotenv::Error| ConfigError::Dotenv {
                path: path.to_path_buf(),
                message: err.to_string(),
            };
            for item in dotenv::from_path_iter(path).map_err(dotenv_error)? {
                let (key, value) = item.map_err(dotenv_error)?;
                config.apply(&key, &value)?;
            }
        }

        for (key, value) in vars {
            config.apply(&key, &value)?;
        }
        Ok(config)
    }

    /// Apply one variable. Keys outside the `STACKROUTE_` set are ignored.
    fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            ENV_STRIP_TRAILING_SLASH => self.strip_trailing_slash = parse_bool(key, value)?,
            ENV_HEAD_FALLBACK => self.head_falls_back_to_get = parse_bool(key, value)?,
            ENV_CATCH_PANICS => self.catch_panics = parse_bool(key, value)?,
            ENV_SLOW_DISPATCH_MS => {
                self.slow_dispatch_ms =
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue {
                            key: key.to_string(),
                            value: value.to_string(),
                        })?;
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults() {
        let config = RuntimeConfig::default();
        assert!(config.strip_trailing_slash);
        assert!(config.head_falls_back_to_get);
        assert!(config.catch_panics);
        assert_eq!(config.slow_dispatch_ms, 100);
    }

    #[test]
    fn toml_overrides_defaults_partially() {
        let config = RuntimeConfig::from_toml_str("slow_dispatch_ms = 5\ncatch_panics = false").unwrap();
        assert_eq!(config.slow_dispatch_ms, 5);
        assert!(!config.catch_panics);
        assert!(config.strip_trailing_slash);
    }

    #[test]
    fn toml_rejects_unknown_keys() {
        assert!(matches!(
            RuntimeConfig::from_toml_str("no_such_key = 1"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn environment_wins_over_files() {
        let mut toml_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(toml_file, "slow_dispatch_ms = 5\nhead_falls_back_to_get = false").unwrap();
        let mut env_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(env_file, "STACKROUTE_SLOW_DISPATCH_MS=7\nSTACKROUTE_CATCH_PANICS=off").unwrap();

        let config = RuntimeConfig::load_with_env(
            Some(toml_file.path()),
            Some(env_file.path()),
            vars(&[(ENV_SLOW_DISPATCH_MS, "9"), ("UNRELATED", "x")]),
        )
        .unwrap();

        assert_eq!(config.slow_dispatch_ms, 9);
        assert!(!config.catch_panics);
        assert!(!config.head_falls_back_to_get);
        assert!(config.strip_trailing_slash);
    }

    #[test]
    fn strict_load_reports_bad_values() {
        let err = RuntimeConfig::load_with_env(None, None, vars(&[(ENV_CATCH_PANICS, "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == ENV_CATCH_PANICS));
    }

    #[test]
    fn missing_files_are_errors() {
        let missing = Path::new("/definitely/not/here.toml");
        assert!(matches!(
            RuntimeConfig::load_with_env(Some(missing), None, Vec::new()),
            Err(ConfigError::Io { .. })
        ));
        assert!(matches!(
            RuntimeConfig::load_with_env(None, Some(missing), Vec::new()),
            Err(ConfigError::Dotenv { .. })
        ));
    }
}
