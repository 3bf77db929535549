//! Process configuration.
//!
//! Loaded once at startup from an optional `config.toml`, with the signing
//! secret overridable through `HOMEBASE_JWT_SECRET`. All sections have
//! working defaults so a bare `homebase` invocation serves on localhost.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file. Parent directories are created.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("homebase.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Token signing secret. When absent an ephemeral random secret is
    /// generated at startup and all tokens die with the process.
    pub jwt_secret: Option<String>,
    /// Session token validity window.
    pub token_ttl_hours: i64,
    /// PBKDF2-SHA256 round count for password hashing.
    pub pbkdf2_rounds: u32,
    pub min_password_len: usize,
    /// Seed admin account, created at startup when no admin exists and a
    /// password is configured.
    pub admin_username: String,
    pub admin_email: String,
    pub admin_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_hours: 24,
            pbkdf2_rounds: 100_000,
            min_password_len: 6,
            admin_username: "admin".into(),
            admin_email: "admin@example.com".into(),
            admin_password: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Login/registration attempts allowed per source address per window.
    pub auth_attempts_per_window: u32,
    pub auth_window_secs: u64,
    pub request_timeout_secs: u64,
    pub max_body_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            auth_attempts_per_window: 50,
            auth_window_secs: 15 * 60,
            request_timeout_secs: 30,
            max_body_bytes: 10 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from `path` (or defaults when `None` / missing),
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) if p.exists() => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config: {}", p.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("Failed to parse config: {}", p.display()))?
            }
            Some(p) => {
                anyhow::bail!("Config file not found: {}", p.display());
            }
            None => {
                let default_path = Path::new("config.toml");
                if default_path.exists() {
                    let raw = std::fs::read_to_string(default_path)
                        .context("Failed to read config.toml")?;
                    toml::from_str(&raw).context("Failed to parse config.toml")?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(secret) = std::env::var("HOMEBASE_JWT_SECRET") {
            if !secret.is_empty() {
                config.auth.jwt_secret = Some(secret);
            }
        }

        Ok(config)
    }

    pub fn token_ttl_secs(&self) -> i64 {
        self.auth.token_ttl_hours * 3600
    }
}
