//! school-desk/crates/configs/src/lib.rs
//!
//! Layered settings: built-in defaults, then `config/default.toml` if
//! present, then `SCHOOLDESK_*` environment variables (a `.env` file is
//! loaded first). Nested keys use a double underscore, e.g.
//! `SCHOOLDESK_AUTH__JWT_SECRET`.

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use domains::validation::ContentLimits;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "SCHOOLDESK";
pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";
const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("failed to read .env file: {0}")]
    DotEnv(#[from] dotenvy::Error),

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 secret for bearer tokens. Without it only static identities work.
    pub jwt_secret: Option<SecretString>,
    pub issuer: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log: LogConfig,
    pub auth: AuthConfig,
    pub content: ContentLimits,
}

impl AppConfig {
    /// Reads `.env`, the default config file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(err) if err.not_found() => {}
            Err(err) => return Err(err.into()),
        }
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Same layering as [`AppConfig::load`] with an explicit file and no `.env`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(env_source())
            .build()?;
        Self::finish(settings)
    }

    /// Parses TOML text on top of the defaults. Environment is ignored.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;
        Self::finish(settings)
    }

    fn finish(settings: Config) -> Result<Self, ConfigError> {
        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(secret) = &self.auth.jwt_secret {
            if secret.expose_secret().len() < MIN_JWT_SECRET_LEN {
                return Err(ConfigError::Invalid {
                    key: "auth.jwt_secret",
                    reason: format!("must be at least {MIN_JWT_SECRET_LEN} bytes"),
                });
            }
        }
        let limits = &self.content;
        if limits.min_priority > limits.max_priority {
            return Err(ConfigError::Invalid {
                key: "content.min_priority",
                reason: "must not exceed content.max_priority".into(),
            });
        }
        Ok(())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_sources() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, LogFormat::Pretty);
        assert!(config.auth.jwt_secret.is_none());
        assert_eq!(config.content.max_title_len, 200);
    }

    #[test]
    fn file_values_override_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [log]
            format = "json"

            [auth]
            jwt_secret = "0123456789abcdef0123456789abcdef"
            issuer = "school-desk"

            [content]
            max_tags = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.auth.issuer.as_deref(), Some("school-desk"));
        assert_eq!(config.content.max_tags, 5);
        assert_eq!(config.content.max_images, 10);
    }

    #[test]
    fn short_secret_is_rejected() {
        let err = AppConfig::from_toml("[auth]\njwt_secret = \"short\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "auth.jwt_secret", .. }));
    }
}
