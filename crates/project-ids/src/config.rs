//! Configuration loading and management

use std::path::Path;

use anyhow::{Context, Result};
use axum_extra::extract::cookie::Key;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::events::EventsConfig;
use crate::session::SessionConfig;

/// Main configuration for the identity service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Login/consent routing configuration
    #[serde(default)]
    pub interaction: InteractionConfig,

    /// Which audit events are raised
    #[serde(default)]
    pub events: EventsConfig,

    /// Resources, clients and users
    #[serde(default)]
    pub catalog: Catalog,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionConfig {
    #[serde(default = "default_login_path")]
    pub login_path: String,

    #[serde(default = "default_consent_path")]
    pub consent_path: String,

    /// Path the protocol engine resumes authorize requests on
    #[serde(default = "default_authorize_callback_path")]
    pub authorize_callback_path: String,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            consent_path: default_consent_path(),
            authorize_callback_path: default_authorize_callback_path(),
        }
    }
}

fn default_login_path() -> String {
    "/Account/Login".to_string()
}

fn default_consent_path() -> String {
    "/Consent".to_string()
}

fn default_authorize_callback_path() -> String {
    "/connect/authorize/callback".to_string()
}

impl Config {
    /// Read `config.json` from `config_dir`
    ///
    /// A missing file is not an error: the built-in configuration is used and
    /// written out so the catalog can be edited in place.
    pub fn load(config_dir: &str) -> Result<Self> {
        let path = Path::new(config_dir).join("config.json");

        if !path.exists() {
            let config = Config::default();
            config.write_to(&path)?;
            tracing::info!("Wrote built-in identity configuration to {:?}", path);
            return Ok(config);
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Cannot read identity configuration {:?}", path))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid identity configuration in {:?}", path))?;
        tracing::info!(
            "Identity configuration loaded from {:?} ({} clients, {} users)",
            path,
            config.catalog.clients.len(),
            config.catalog.users.len()
        );
        Ok(config)
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create config directory {:?}", dir))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Cannot write identity configuration {:?}", path))
    }

    /// Cookie signing key from the configured secret, or a fresh random one
    pub fn cookie_key(&self) -> Result<Key> {
        match &self.session.cookie_secret {
            Some(secret) => {
                let bytes = hex::decode(secret.trim())
                    .context("session.cookie_secret must be hex-encoded")?;
                Key::try_from(bytes.as_slice()).map_err(|_| {
                    anyhow::anyhow!(
                        "session.cookie_secret must be at least 64 bytes, got {}",
                        bytes.len()
                    )
                })
            }
            None => {
                tracing::warn!("No cookie secret configured; sessions won't survive restarts");
                Ok(Key::generate())
            }
        }
    }
}
