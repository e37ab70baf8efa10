use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "BOOKSTORE_ENV";
const CONFIG_DIR_ENV: &str = "BOOKSTORE_CONFIG_DIR";
const ENV_PREFIX: &str = "BOOKSTORE";
const PORT_ENV: &str = "PORT";
const DEV_JWT_SECRET: &str = "local-development-secret";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub payments: PaymentSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay and
    /// `BOOKSTORE__*` variables.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .context("unable to resolve current directory")?
                .join("config"),
        };

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{environment}.toml"));

        let port_override = std::env::var(PORT_ENV)
            .ok()
            .map(|raw| {
                raw.parse::<u16>()
                    .with_context(|| format!("{PORT_ENV} must be a port number, got '{raw}'"))
            })
            .transpose()?;

        let cfg = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .set_override_option("server.port", port_override.map(i64::from))
            .with_context(|| "failed to apply port override")?
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        settings.environment = parse_environment(&environment)?;

        Ok(settings)
    }

    /// Reject configurations that must never reach a shared deployment.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.environment == Environment::Local {
            return Ok(());
        }
        if self.auth.jwt_secret == DEV_JWT_SECRET || self.auth.jwt_secret.is_empty() {
            bail!("auth.jwt_secret must be set outside the local environment");
        }
        if self.payments.secret_key.is_empty() {
            bail!("payments.secret_key must be set outside the local environment");
        }
        if self.database.backend == DatabaseBackend::Memory {
            tracing::warn!(
                env = ?self.environment,
                "in-memory database backend selected; data will not survive a restart"
            );
        }
        Ok(())
    }
}

fn parse_environment(raw: &str) -> anyhow::Result<Environment> {
    match raw {
        "local" => Ok(Environment::Local),
        "staging" => Ok(Environment::Staging),
        "production" => Ok(Environment::Production),
        other => Err(anyhow!(
            "unsupported environment '{}'; expected local/staging/production",
            other
        )),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        5000
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

/// Which document store implementation backs the application.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Memory,
    Surreal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub backend: DatabaseBackend,
    #[serde(default = "DatabaseSettings::default_endpoint")]
    pub endpoint: String,
    #[serde(default = "DatabaseSettings::default_namespace")]
    pub namespace: String,
    #[serde(default = "DatabaseSettings::default_database")]
    pub database: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl DatabaseSettings {
    fn default_endpoint() -> String {
        "ws://127.0.0.1:8000".to_string()
    }

    fn default_namespace() -> String {
        "bookstore".to_string()
    }

    fn default_database() -> String {
        "marketplace".to_string()
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::default(),
            endpoint: Self::default_endpoint(),
            namespace: Self::default_namespace(),
            database: Self::default_database(),
            username: None,
            password: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info,tower_http=info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "AuthSettings::default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "AuthSettings::default_token_ttl_days")]
    pub token_ttl_days: u32,
}

impl AuthSettings {
    fn default_jwt_secret() -> String {
        DEV_JWT_SECRET.to_string()
    }

    fn default_token_ttl_days() -> u32 {
        20
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: Self::default_jwt_secret(),
            token_ttl_days: Self::default_token_ttl_days(),
        }
    }
}

/// Payment gateway credentials and endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentSettings {
    #[serde(default)]
    pub secret_key: String,
    #[serde(default = "PaymentSettings::default_api_base")]
    pub api_base: String,
    #[serde(default = "PaymentSettings::default_currency")]
    pub currency: String,
    #[serde(default = "PaymentSettings::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl PaymentSettings {
    fn default_api_base() -> String {
        "https://api.stripe.com".to_string()
    }

    fn default_currency() -> String {
        "usd".to_string()
    }

    fn default_timeout_ms() -> u64 {
        10000
    }
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            api_base: Self::default_api_base(),
            currency: Self::default_currency(),
            timeout_ms: Self::default_timeout_ms(),
        }
    }
}

/// Reference data seeded into an empty store at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    #[serde(default = "CatalogSettings::default_categories")]
    pub categories: Vec<String>,
}

impl CatalogSettings {
    fn default_categories() -> Vec<String> {
        ["Fiction", "Non-Fiction", "Science", "History", "Children", "Academic"]
            .into_iter()
            .map(String::from)
            .collect()
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            categories: Self::default_categories(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_token_window_is_twenty_days() {
        let settings = Settings::default();
        assert_eq!(settings.auth.token_ttl_days, 20);
    }

    #[test]
    fn default_backend_is_memory() {
        let settings = Settings::default();
        assert_eq!(settings.database.backend, DatabaseBackend::Memory);
        assert_eq!(settings.server.port, 5000);
    }

    #[test]
    fn default_catalog_has_categories() {
        let settings = Settings::default();
        assert!(!settings.catalog.categories.is_empty());
        assert!(settings.catalog.categories.iter().all(|name| !name.is_empty()));
    }

    #[test]
    fn local_environment_accepts_development_secret() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn production_rejects_development_secret() {
        let mut settings = Settings::default();
        settings.environment = Environment::Production;
        settings.payments.secret_key = "sk_live_x".to_string();
        assert!(settings.validate().is_err());

        settings.auth.jwt_secret = "a-real-secret".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn unknown_environment_is_rejected() {
        assert!(parse_environment("qa").is_err());
        assert_eq!(parse_environment("staging").unwrap(), Environment::Staging);
    }
}
