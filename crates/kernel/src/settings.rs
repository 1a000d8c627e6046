use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "CATALOG_ENV";
const CONFIG_DIR_ENV: &str = "CATALOG_CONFIG_DIR";
const ENV_PREFIX: &str = "CATALOG";

/// Plain connection variables honoured on top of the layered files.
const DATABASE_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("DB_HOST", "database.host"),
    ("DB_PORT", "database.port"),
    ("DB_NAME", "database.name"),
    ("DB_USER", "database.user"),
    ("DB_PASSWORD", "database.password"),
];

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl Environment {
    fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
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
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay,
    /// `CATALOG__*` variables and finally the `DB_*` connection variables.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .with_context(|| "unable to resolve current directory")?
                .join("config"),
        };

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let mut builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        for (var, key) in DATABASE_ENV_OVERRIDES {
            builder = builder
                .set_override_option(*key, std::env::var(var).ok())
                .with_context(|| format!("failed to apply {}", var))?;
        }

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // Override environment field with parsed enum variant.
        settings.environment = Environment::parse(&environment)?;

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    /// Prefix every module router is nested under.
    #[serde(default = "ServerSettings::default_api_prefix")]
    pub api_prefix: String,
    /// Per-request timeout. Unset means requests run to completion.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_api_prefix() -> String {
        "/api/v1".to_string()
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            api_prefix: Self::default_api_prefix(),
            request_timeout_ms: None,
        }
    }
}

/// Connection and pool settings for the relational store.
///
/// Connection parameters are optional here; [`DatabaseSettings::resolve`]
/// fills development defaults only when running locally.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "DatabaseSettings::default_max_connections")]
    pub max_connections: u32,
    /// Connections kept open while idle.
    #[serde(default = "DatabaseSettings::default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "DatabaseSettings::default_max_lifetime_secs")]
    pub max_lifetime_secs: u64,
    #[serde(default = "DatabaseSettings::default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "DatabaseSettings::default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

/// Fully resolved connection parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
}

impl DatabaseSettings {
    const LOCAL_HOST: &'static str = "localhost";
    const LOCAL_PORT: u16 = 5432;
    const LOCAL_NAME: &'static str = "bookstore";
    const LOCAL_USER: &'static str = "postgres";
    const LOCAL_PASSWORD: &'static str = "postgres";

    fn default_max_connections() -> u32 {
        25
    }

    fn default_min_connections() -> u32 {
        5
    }

    fn default_max_lifetime_secs() -> u64 {
        300
    }

    fn default_idle_timeout_secs() -> u64 {
        600
    }

    fn default_acquire_timeout_secs() -> u64 {
        30
    }

    /// Resolve connection parameters for `environment`.
    ///
    /// Outside `local`, host, name, user and password must be configured
    /// explicitly.
    pub fn resolve(&self, environment: &Environment) -> anyhow::Result<ConnectionTarget> {
        if *environment != Environment::Local {
            let missing: Vec<&str> = [
                ("host", self.host.is_none()),
                ("name", self.name.is_none()),
                ("user", self.user.is_none()),
                ("password", self.password.is_none()),
            ]
            .into_iter()
            .filter_map(|(field, absent)| absent.then_some(field))
            .collect();

            if !missing.is_empty() {
                bail!(
                    "database settings missing for {:?} environment: {}",
                    environment,
                    missing.join(", ")
                );
            }
        }

        Ok(ConnectionTarget {
            host: self.host.clone().unwrap_or_else(|| Self::LOCAL_HOST.to_string()),
            port: self.port.unwrap_or(Self::LOCAL_PORT),
            name: self.name.clone().unwrap_or_else(|| Self::LOCAL_NAME.to_string()),
            user: self.user.clone().unwrap_or_else(|| Self::LOCAL_USER.to_string()),
            password: self
                .password
                .clone()
                .unwrap_or_else(|| Self::LOCAL_PASSWORD.to_string()),
        })
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            name: None,
            user: None,
            password: None,
            max_connections: Self::default_max_connections(),
            min_connections: Self::default_min_connections(),
            max_lifetime_secs: Self::default_max_lifetime_secs(),
            idle_timeout_secs: Self::default_idle_timeout_secs(),
            acquire_timeout_secs: Self::default_acquire_timeout_secs(),
        }
    }
}

/// What to do with a row that cannot be decoded during a multi-row read.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RowDecodePolicy {
    /// Log the failure and continue with the remaining rows.
    #[default]
    Skip,
    /// Abort the whole read with an error.
    Fail,
}

/// Limits and policies for the catalog read views.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    #[serde(default = "CatalogSettings::default_view_limit")]
    pub featured_limit: i64,
    #[serde(default = "CatalogSettings::default_view_limit")]
    pub new_limit: i64,
    #[serde(default = "CatalogSettings::default_view_limit")]
    pub discounted_limit: i64,
    #[serde(default)]
    pub row_decode_policy: RowDecodePolicy,
}

impl CatalogSettings {
    fn default_view_limit() -> i64 {
        10
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            featured_limit: Self::default_view_limit(),
            new_limit: Self::default_view_limit(),
            discounted_limit: Self::default_view_limit(),
            row_decode_policy: RowDecodePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// Fallback filter directive when `RUST_LOG` is not set.
    #[serde(default = "TelemetrySettings::default_log_level")]
    pub log_level: String,
}

impl TelemetrySettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            log_level: Self::default_log_level(),
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
