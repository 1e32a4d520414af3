//! Configuration loading and validation

use anyhow::{Context, Result, anyhow, bail};
use bizdir_api::{validate_email, validate_password};
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Longest token validity accepted (30 days)
const MAX_TOKEN_VALIDITY_HOURS: i64 = 24 * 30;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
        }
    }
}

impl DatabaseConfig {
    /// Directory that must exist before SQLite can create the database file
    pub fn data_dir(&self) -> Option<PathBuf> {
        let path = self.url.strip_prefix("sqlite:")?;
        let path = path.trim_start_matches("//");
        let path = path.split('?').next().unwrap_or_default();
        if path.is_empty() || path == ":memory:" {
            return None;
        }
        Path::new(path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing tokens. There is deliberately no default.
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_validity_hours")]
    pub token_validity_hours: i64,
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_validity_hours: default_token_validity_hours(),
            bootstrap_admin: None,
        }
    }
}

/// Admin account created on first start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAdminConfig {
    pub email: String,
    pub password: String,
    #[serde(default = "default_admin_name")]
    pub name: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_url() -> String {
    "sqlite:./data/bizdir.db?mode=rwc".to_string()
}

fn default_token_validity_hours() -> i64 {
    24
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

/// Environment source: `BIZDIR__AUTH__JWT_SECRET` sets `auth.jwt_secret`
fn environment() -> Environment {
    Environment::with_prefix("BIZDIR")
        .prefix_separator("__")
        .separator("__")
}

impl Config {
    /// Load configuration from an optional TOML file plus the environment
    pub fn load(path: &str) -> Result<Self> {
        Self::load_with(path, environment())
    }

    fn load_with(path: &str, env: Environment) -> Result<Self> {
        if !Path::new(path).exists() {
            info!("Config file not found at {}, using defaults and environment", path);
        }

        let config: Config = config::Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(env)
            .build()
            .with_context(|| format!("Failed to load configuration from {}", path))?
            .try_deserialize()
            .with_context(|| format!("Failed to parse configuration from {}", path))?;

        Ok(config)
    }

    /// Check start-up invariants; the server must not run if this fails
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            bail!("auth.jwt_secret is not set (use BIZDIR__AUTH__JWT_SECRET)");
        }
        if !(1..=MAX_TOKEN_VALIDITY_HOURS).contains(&self.auth.token_validity_hours) {
            bail!(
                "auth.token_validity_hours must be between 1 and {}, got {}",
                MAX_TOKEN_VALIDITY_HOURS,
                self.auth.token_validity_hours
            );
        }
        if let Some(admin) = &self.auth.bootstrap_admin {
            validate_email(&admin.email)
                .map_err(|e| anyhow!("auth.bootstrap_admin.email: {}", e))?;
            validate_password(&admin.password)
                .map_err(|e| anyhow!("auth.bootstrap_admin.password: {}", e))?;
        }
        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            other => bail!("logging.format must be \"pretty\" or \"json\", got {:?}", other),
        }
        Ok(())
    }
}
