//! Service configuration from environment variables
//!
//! | Variable                     | Default |
//! |------------------------------|---------|
//! | `PORT`                       | 3000    |
//! | `MD2PDF_MAX_CONCURRENT`      | 3       |
//! | `MD2PDF_RENDER_TIMEOUT_SECS` | 60      |
//! | `MD2PDF_BODY_LIMIT_MB`       | 50      |
//! | `MD2PDF_CHROME_SANDBOX`      | true    |
//! | `CHROME_PATH`                | auto    |
//!
//! Empty variables count as unset.

use std::path::PathBuf;
use std::time::Duration;

use ::config::{Environment, Map};
use serde::Deserialize;

use crate::error::ConfigError;

/// Renderer service settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub max_concurrent: usize,
    pub render_timeout: Duration,
    pub body_limit_bytes: usize,
    /// Chrome binary; auto-detected when `None`
    pub chrome_path: Option<PathBuf>,
    pub chrome_sandbox: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            max_concurrent: 3,
            render_timeout: Duration::from_secs(60),
            body_limit_bytes: 50 * 1024 * 1024,
            chrome_path: None,
            chrome_sandbox: true,
        }
    }
}

/// Variables as the environment source sees them (keys lowercased)
#[derive(Debug, Deserialize)]
#[serde(default)]
struct EnvSettings {
    port: u16,
    md2pdf_max_concurrent: usize,
    md2pdf_render_timeout_secs: u64,
    md2pdf_body_limit_mb: usize,
    md2pdf_chrome_sandbox: bool,
    chrome_path: Option<PathBuf>,
}

impl Default for EnvSettings {
    fn default() -> Self {
        let defaults = ServerConfig::default();
        Self {
            port: defaults.port,
            md2pdf_max_concurrent: defaults.max_concurrent,
            md2pdf_render_timeout_secs: defaults.render_timeout.as_secs(),
            md2pdf_body_limit_mb: defaults.body_limit_bytes / (1024 * 1024),
            md2pdf_chrome_sandbox: defaults.chrome_sandbox,
            chrome_path: defaults.chrome_path,
        }
    }
}

impl ServerConfig {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::default())
    }

    /// Read settings from an explicit set of variables
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let source: Map<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self::load(Environment::default().source(Some(source)))
    }

    fn load(environment: Environment) -> Result<Self, ConfigError> {
        let settings: EnvSettings = ::config::Config::builder()
            .add_source(environment.ignore_empty(true))
            .build()?
            .try_deserialize()?;

        if settings.md2pdf_max_concurrent == 0 {
            return Err(invalid("MD2PDF_MAX_CONCURRENT", "0", "must be at least 1"));
        }
        if settings.md2pdf_render_timeout_secs == 0 {
            return Err(invalid("MD2PDF_RENDER_TIMEOUT_SECS", "0", "must be at least 1"));
        }

        Ok(Self {
            port: settings.port,
            max_concurrent: settings.md2pdf_max_concurrent,
            render_timeout: Duration::from_secs(settings.md2pdf_render_timeout_secs),
            body_limit_bytes: settings.md2pdf_body_limit_mb.saturating_mul(1024 * 1024),
            chrome_path: settings.chrome_path,
            chrome_sandbox: settings.md2pdf_chrome_sandbox,
        })
    }
}

fn invalid(name: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_VARS: [(&str, &str); 0] = [];

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_vars(NO_VARS).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_concurrent, 3);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_vars([
            ("PORT", "3100"),
            ("MD2PDF_MAX_CONCURRENT", "8"),
            ("MD2PDF_RENDER_TIMEOUT_SECS", "15"),
            ("MD2PDF_BODY_LIMIT_MB", "2"),
            ("MD2PDF_CHROME_SANDBOX", "false"),
            ("CHROME_PATH", "/usr/bin/chromium"),
        ])
        .unwrap();

        assert_eq!(config.port, 3100);
        assert_eq!(config.max_concurrent, 8);
        assert_eq!(config.render_timeout, Duration::from_secs(15));
        assert_eq!(config.body_limit_bytes, 2 * 1024 * 1024);
        assert!(!config.chrome_sandbox);
        assert_eq!(config.chrome_path, Some(PathBuf::from("/usr/bin/chromium")));
    }

    #[test]
    fn test_empty_values_use_defaults() {
        let config = ServerConfig::from_vars([("PORT", ""), ("CHROME_PATH", "")]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.chrome_path, None);
    }

    #[test]
    fn test_unrelated_variables_ignored() {
        let config = ServerConfig::from_vars([("HOME", "/root"), ("PATH", "/usr/bin")]).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_invalid_port() {
        let err = ServerConfig::from_vars([("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = ServerConfig::from_vars([("MD2PDF_MAX_CONCURRENT", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "MD2PDF_MAX_CONCURRENT", .. }));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = ServerConfig::from_vars([("MD2PDF_RENDER_TIMEOUT_SECS", "0")]).unwrap_err();
        assert!(err.to_string().contains("MD2PDF_RENDER_TIMEOUT_SECS"));
    }
}
