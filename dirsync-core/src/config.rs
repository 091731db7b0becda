//! Engine configuration.
//!
//! Loaded from YAML, then overridden from the environment:
//!
//! | Variable | Field |
//! |---|---|
//! | `DIRSYNC_RETRY_MAX_ATTEMPTS` | `retry.max_attempts` |
//! | `DIRSYNC_RETRY_INITIAL_DELAY_MS` | `retry.initial_delay_ms` |
//! | `DIRSYNC_RETRY_MAX_DELAY_MS` | `retry.max_delay_ms` |
//! | `DIRSYNC_MESSAGE_FALLBACK` | `compat.message_fallback` |

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::retry::{self, RetryPolicy};

pub const ENV_RETRY_MAX_ATTEMPTS: &str = "DIRSYNC_RETRY_MAX_ATTEMPTS";
pub const ENV_RETRY_INITIAL_DELAY_MS: &str = "DIRSYNC_RETRY_INITIAL_DELAY_MS";
pub const ENV_RETRY_MAX_DELAY_MS: &str = "DIRSYNC_RETRY_MAX_DELAY_MS";
pub const ENV_MESSAGE_FALLBACK: &str = "DIRSYNC_MESSAGE_FALLBACK";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub retry: RetryConfig,
    pub compat: CompatConfig,
}

/// Post-create read-back retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    /// Optional cap on a single delay; at least twice `initial_delay_ms`.
    pub max_delay_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: retry::DEFAULT_MAX_ATTEMPTS,
            initial_delay_ms: retry::DEFAULT_INITIAL_DELAY.as_millis() as u64,
            max_delay_ms: None,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        let policy = RetryPolicy::new(self.max_attempts, Duration::from_millis(self.initial_delay_ms));
        match self.max_delay_ms {
            Some(ms) => policy.with_max_delay(Duration::from_millis(ms)),
            None => policy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatConfig {
    /// Classify uncoded remote failures by message text.
    pub message_fallback: bool,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            message_fallback: true,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).context("Failed to parse engine config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from `lookup`. Unset variables leave fields untouched;
    /// unparsable ones are errors rather than silent defaults.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_RETRY_MAX_ATTEMPTS) {
            self.retry.max_attempts = parse_var(ENV_RETRY_MAX_ATTEMPTS, &v)?;
        }
        if let Some(v) = lookup(ENV_RETRY_INITIAL_DELAY_MS) {
            self.retry.initial_delay_ms = parse_var(ENV_RETRY_INITIAL_DELAY_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_RETRY_MAX_DELAY_MS) {
            self.retry.max_delay_ms = Some(parse_var(ENV_RETRY_MAX_DELAY_MS, &v)?);
        }
        if let Some(v) = lookup(ENV_MESSAGE_FALLBACK) {
            self.compat.message_fallback = parse_bool(ENV_MESSAGE_FALLBACK, &v)?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }
        if let Some(max_delay_ms) = self.retry.max_delay_ms {
            let floor = self.retry.initial_delay_ms.saturating_mul(2);
            if max_delay_ms < floor {
                bail!(
                    "retry.max_delay_ms ({max_delay_ms}) is below twice retry.initial_delay_ms ({})",
                    self.retry.initial_delay_ms
                );
            }
        }
        Ok(())
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("{name}={value:?} is not a valid number"))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("{name}={value:?} is not a boolean"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.retry.max_attempts, 8);
        assert_eq!(config.retry.initial_delay_ms, 1000);
        assert_eq!(config.retry.max_delay_ms, None);
        assert_eq!(config.retry.policy().max_delay(), None);
        assert!(config.compat.message_fallback);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = EngineConfig::from_yaml_str("retry:\n  max_attempts: 3\n").unwrap();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.initial_delay_ms, 1000);
        assert!(config.compat.message_fallback);
    }

    #[test]
    fn full_yaml() {
        let yaml = r#"
retry:
  max_attempts: 4
  initial_delay_ms: 250
  max_delay_ms: 2000
compat:
  message_fallback: false
"#;
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        let policy = config.retry.policy();
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.initial_delay(), Duration::from_millis(250));
        assert_eq!(policy.max_delay(), Some(Duration::from_millis(2000)));
        assert!(!config.compat.message_fallback);
    }

    #[test]
    fn zero_attempts_rejected() {
        let err = EngineConfig::from_yaml_str("retry:\n  max_attempts: 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("max_attempts"));
    }

    #[test]
    fn inverted_delays_rejected() {
        let yaml = "retry:\n  initial_delay_ms: 5000\n  max_delay_ms: 100\n";
        assert!(EngineConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn cap_below_double_initial_rejected() {
        let yaml = "retry:\n  initial_delay_ms: 1000\n  max_delay_ms: 1500\n";
        let err = EngineConfig::from_yaml_str(yaml).unwrap_err();
        assert!(format!("{err:#}").contains("max_delay_ms"));
        assert!(EngineConfig::from_yaml_str("retry:\n  initial_delay_ms: 1000\n  max_delay_ms: 2000\n").is_ok());
    }

    #[test]
    fn env_cap_is_validated() {
        let mut config = EngineConfig::default();
        assert!(config
            .apply_env_overrides(env(&[(ENV_RETRY_INITIAL_DELAY_MS, "20000"), (ENV_RETRY_MAX_DELAY_MS, "30000")]))
            .is_err());
    }

    #[test]
    fn env_overrides_yaml() {
        let mut config = EngineConfig::from_yaml_str("retry:\n  max_attempts: 3\n").unwrap();
        config
            .apply_env_overrides(env(&[
                (ENV_RETRY_MAX_ATTEMPTS, "12"),
                (ENV_MESSAGE_FALLBACK, "off"),
            ]))
            .unwrap();
        assert_eq!(config.retry.max_attempts, 12);
        assert!(!config.compat.message_fallback);
    }

    #[test]
    fn bad_env_value_is_an_error() {
        let mut config = EngineConfig::default();
        let err = config
            .apply_env_overrides(env(&[(ENV_RETRY_INITIAL_DELAY_MS, "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_RETRY_INITIAL_DELAY_MS));
        assert!(config
            .apply_env_overrides(env(&[(ENV_MESSAGE_FALLBACK, "maybe")]))
            .is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "retry:\n  max_attempts: 2\n  initial_delay_ms: 10").unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.initial_delay_ms, 10);
    }

    #[test]
    fn missing_file_names_path() {
        let err = EngineConfig::load(Path::new("/nonexistent/dirsync.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/dirsync.yaml"));
    }
}
