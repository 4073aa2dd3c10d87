//! Application configuration management.

use serde::Deserialize;

/// Minimum length of the JWT signing secret, in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime (one year).
pub const MAX_TOKEN_EXPIRY_SECS: u64 = 365 * 24 * 60 * 60;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed by CORS. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait for a connection before giving up.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    8
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
    /// Refresh token expiration in seconds.
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

fn default_refresh_token_expiry() -> u64 {
    604_800 // 7 days
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

/// Configuration problems detected after loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration sources could not be read or deserialized.
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    /// A value was loaded but is unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones overriding earlier ones: `config/default`,
    /// `config/{RUN_MODE}`, then `BASTION__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("BASTION")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that deserialize fine but cannot run.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "jwt.secret must be at least {MIN_JWT_SECRET_LEN} bytes"
            )));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid(
                "database.min_connections exceeds database.max_connections".to_string(),
            ));
        }
        if self.jwt.access_token_expiry_secs == 0 || self.jwt.refresh_token_expiry_secs == 0 {
            return Err(ConfigError::Invalid(
                "token expiry must be greater than zero".to_string(),
            ));
        }
        if self.jwt.access_token_expiry_secs > MAX_TOKEN_EXPIRY_SECS
            || self.jwt.refresh_token_expiry_secs > MAX_TOKEN_EXPIRY_SECS
        {
            return Err(ConfigError::Invalid(format!(
                "token expiry must not exceed {MAX_TOKEN_EXPIRY_SECS} seconds"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn with_required_env<R>(extra: &[(&str, Option<&str>)], f: impl FnOnce() -> R) -> R {
        let base = [
            ("RUN_MODE", Some("test-no-such-file")),
            ("BASTION__DATABASE__URL", Some("postgres://localhost/bastion")),
            ("BASTION__JWT__SECRET", Some(SECRET)),
        ];
        let mut vars: Vec<(&str, Option<&str>)> = base
            .into_iter()
            .filter(|(key, _)| !extra.iter().any(|(k, _)| k == key))
            .collect();
        vars.extend_from_slice(extra);
        temp_env::with_vars(vars, f)
    }

    #[test]
    fn test_load_from_environment_with_defaults() {
        let config = with_required_env(&[], AppConfig::load).unwrap();

        assert_eq!(config.database.url, "postgres://localhost/bastion");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.jwt.access_token_expiry_secs, 900);
        assert_eq!(config.jwt.refresh_token_expiry_secs, 604_800);
        assert_eq!(config.log.format, LogFormat::Pretty);
    }

    #[test]
    fn test_load_overrides() {
        let config = with_required_env(
            &[
                ("BASTION__SERVER__PORT", Some("9000")),
                ("BASTION__LOG__FORMAT", Some("json")),
                (
                    "BASTION__SERVER__CORS_ORIGINS",
                    Some("http://a.test,http://b.test"),
                ),
            ],
            AppConfig::load,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(
            config.server.cors_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn test_load_rejects_short_secret() {
        let result = with_required_env(&[("BASTION__JWT__SECRET", Some("short"))], AppConfig::load);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_requires_database_url() {
        let result = with_required_env(&[("BASTION__DATABASE__URL", None)], AppConfig::load);
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_validate_pool_bounds() {
        let mut config = with_required_env(&[], AppConfig::load).unwrap();
        config.database.min_connections = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_token_expiry_upper_bound() {
        let mut config = with_required_env(&[], AppConfig::load).unwrap();
        config.jwt.refresh_token_expiry_secs = MAX_TOKEN_EXPIRY_SECS;
        assert!(config.validate().is_ok());

        config.jwt.access_token_expiry_secs = u64::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_rejects_oversized_expiry() {
        let result = with_required_env(
            &[("BASTION__JWT__ACCESS_TOKEN_EXPIRY_SECS", Some("31536001"))],
            AppConfig::load,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
