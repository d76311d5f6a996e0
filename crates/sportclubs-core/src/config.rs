//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API and accounts service URLs, the session cookie used
//! to obtain tokens, and view defaults.
//!
//! Configuration is stored at `~/.config/sportclubs/config.json`. Values can
//! be overridden with `SPORTCLUBS_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::schedule::DEFAULT_UPCOMING_LIMIT;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "sportclubs";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_BASE_URL: &str = "http://t9d.store/api";
const DEFAULT_TOKEN_ISSUER_URL: &str = "https://api.innohassle.ru/accounts/v0";

/// Path of the token endpoint relative to the issuer URL
const TOKEN_ENDPOINT: &str = "/tokens/generate-my-token";

const ENV_API_URL: &str = "SPORTCLUBS_API_URL";
const ENV_TOKEN_ISSUER_URL: &str = "SPORTCLUBS_TOKEN_ISSUER_URL";
const ENV_SESSION_COOKIE: &str = "SPORTCLUBS_SESSION_COOKIE";
const ENV_TIMEOUT_SECS: &str = "SPORTCLUBS_TIMEOUT_SECS";
const ENV_UPCOMING_LIMIT: &str = "SPORTCLUBS_UPCOMING_LIMIT";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub token_issuer_url: String,
    /// Raw `Cookie` header value for the accounts service session
    pub session_cookie: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub upcoming_limit: usize,
    pub log_to_file: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_issuer_url: DEFAULT_TOKEN_ISSUER_URL.to_string(),
            session_cookie: None,
            request_timeout_secs: None,
            upcoming_limit: DEFAULT_UPCOMING_LIMIT,
            log_to_file: false,
        }
    }
}

impl Config {
    /// Load the config file (defaults if missing) and apply env overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load the config file at `path` as stored, without env overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Store `cookie` in the config file so later runs can acquire tokens.
    /// Env overrides applied to `self` are not written out.
    pub fn remember_session_cookie(&mut self, cookie: &str) -> Result<()> {
        self.remember_session_cookie_at(&Self::config_path()?, cookie)
    }

    fn remember_session_cookie_at(&mut self, path: &Path, cookie: &str) -> Result<()> {
        let mut stored = Self::load_from(path)?;
        stored.session_cookie = Some(cookie.to_string());
        stored.save_to(path)?;
        self.session_cookie = Some(cookie.to_string());
        Ok(())
    }

    /// Apply overrides from `lookup` (normally the process environment)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(url) = lookup(ENV_TOKEN_ISSUER_URL) {
            self.token_issuer_url = url;
        }
        if let Some(cookie) = lookup(ENV_SESSION_COOKIE) {
            self.session_cookie = Some(cookie);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.parse() {
                Ok(secs) => self.request_timeout_secs = Some(secs),
                Err(_) => warn!(var = ENV_TIMEOUT_SECS, value = %raw, "Ignoring invalid override"),
            }
        }
        if let Some(raw) = lookup(ENV_UPCOMING_LIMIT) {
            match raw.parse() {
                Ok(limit) => self.upcoming_limit = limit,
                Err(_) => warn!(var = ENV_UPCOMING_LIMIT, value = %raw, "Ignoring invalid override"),
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Full URL of the token endpoint
    pub fn identity_url(&self) -> String {
        format!("{}{}", self.token_issuer_url.trim_end_matches('/'), TOKEN_ENDPOINT)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
