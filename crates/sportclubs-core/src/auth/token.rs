use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::{header, Client};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::config::Config;

use super::LocalStorage;

/// Storage key the access token is persisted under
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Obtains bearer tokens from the accounts service.
///
/// The latest token is cached in memory and persisted to `LocalStorage`.
/// Clones share the same cache.
#[derive(Clone)]
pub struct TokenProvider {
    client: Client,
    identity_url: String,
    session_cookie: Option<String>,
    cache: Arc<RwLock<Option<String>>>,
    storage: Option<Arc<LocalStorage>>,
}

impl TokenProvider {
    /// Create a provider for `identity_url`. The cache starts from the token
    /// persisted in `storage`, if any.
    pub fn new(
        identity_url: impl Into<String>,
        session_cookie: Option<String>,
        storage: Option<LocalStorage>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let persisted = storage.as_ref().and_then(Self::load_persisted);

        Ok(Self {
            client: builder.build()?,
            identity_url: identity_url.into(),
            session_cookie,
            cache: Arc::new(RwLock::new(persisted)),
            storage: storage.map(Arc::new),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let storage = LocalStorage::open(config.cache_dir()?);
        Self::new(
            config.identity_url(),
            config.session_cookie.clone(),
            Some(storage),
            config.request_timeout(),
        )
    }

    fn load_persisted(storage: &LocalStorage) -> Option<String> {
        let raw = match storage.get_item(ACCESS_TOKEN_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted access token");
                return None;
            }
        };
        match serde_json::from_str::<String>(&raw) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed persisted access token");
                None
            }
        }
    }

    /// Fetch a fresh token from the accounts service.
    ///
    /// Always performs a network request. On success the cached token is
    /// overwritten and persisted; the returned value is the caller's own copy.
    pub async fn acquire_token(&self) -> Result<String, ApiError> {
        let mut request = self
            .client
            .get(&self.identity_url)
            .header(header::ACCEPT, "application/json");
        if let Some(ref cookie) = self.session_cookie {
            request = request.header(header::COOKIE, cookie);
        }

        debug!(url = %self.identity_url, "Requesting access token");
        let response = request.send().await.map_err(|e| {
            warn!(url = %self.identity_url, error = %e, "Identity endpoint unreachable");
            ApiError::AuthUnavailable(format!("identity endpoint unreachable: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.identity_url, status = status.as_u16(), "Token request rejected");
            return Err(ApiError::AuthUnavailable(format!(
                "identity endpoint returned {}",
                status
            )));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            ApiError::AuthUnavailable(format!("invalid token response: {}", e))
        })?;

        *self.cache.write().await = Some(body.access_token.clone());
        self.persist(&body.access_token);

        Ok(body.access_token)
    }

    fn persist(&self, token: &str) {
        let Some(ref storage) = self.storage else {
            return;
        };
        let result = serde_json::to_string(token)
            .map_err(anyhow::Error::from)
            .and_then(|raw| storage.set_item(ACCESS_TOKEN_KEY, &raw));
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist access token");
        }
    }

    /// The most recently acquired (or persisted) token, without a network call
    pub async fn current_token(&self) -> Option<String> {
        self.cache.read().await.clone()
    }

    /// Whether a token has been obtained before
    pub async fn has_session(&self) -> bool {
        self.cache.read().await.is_some()
    }

    /// Forget the cached token and remove it from storage
    pub async fn sign_out(&self) -> Result<()> {
        *self.cache.write().await = None;
        if let Some(ref storage) = self.storage {
            storage.remove_item(ACCESS_TOKEN_KEY)?;
        }
        Ok(())
    }
}
