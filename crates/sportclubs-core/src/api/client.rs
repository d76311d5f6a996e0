//! API client for communicating with the InnoHassle sport REST API.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! API requests to fetch clubs and FAQ data.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;
use reqwest::{header, Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::auth::TokenProvider;
use crate::config::Config;
use crate::models::{Club, FaqEntries};

use super::ApiError;

/// Body attached to a request.
pub enum RequestBody {
    /// Serialized as JSON with `Content-Type: application/json`
    Json(Value),
    /// Sent as multipart form data; the transport sets the boundary header
    Multipart(reqwest::multipart::Form),
}

/// API client for the sport service.
/// Clone is cheap - reqwest::Client and TokenProvider share state internally.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: TokenProvider,
}

impl ApiClient {
    /// Create a new API client for `base_url` (no trailing slash)
    pub fn new(base_url: impl Into<String>, tokens: TokenProvider, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn from_config(config: &Config, tokens: TokenProvider) -> Result<Self> {
        Self::new(config.api_base_url.clone(), tokens, config.request_timeout())
    }

    /// The token provider this client authorizes requests with
    pub fn tokens(&self) -> &TokenProvider {
        &self.tokens
    }

    fn base_headers(token: &str, multipart: bool) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if !token.is_empty() {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                ApiError::AuthUnavailable("access token is not a valid header value".to_string())
            })?;
            headers.insert(header::AUTHORIZATION, value);
        }
        // Multipart bodies get their content type (with boundary) from reqwest
        if !multipart {
            headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
        }
        Ok(headers)
    }

    /// Perform an authenticated request against `endpoint` (relative to the
    /// base URL) and parse the JSON response.
    ///
    /// A fresh token is acquired before every request. Headers in
    /// `extra_headers` replace the defaults of the same name. Returns
    /// `Ok(None)` when the server answers successfully with an empty body.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<RequestBody>,
        extra_headers: Option<header::HeaderMap>,
    ) -> Result<Option<T>, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let token = self.tokens.acquire_token().await?;

        let multipart = matches!(body, Some(RequestBody::Multipart(_)));
        let mut headers = Self::base_headers(&token, multipart)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        // No cookie store on this client: resource calls never send cookies
        let mut request = self.client.request(method.clone(), &url).headers(headers);
        request = match body {
            Some(RequestBody::Json(value)) => request.json(&value),
            Some(RequestBody::Multipart(form)) => request.multipart(form),
            None => request,
        };

        debug!(method = %method, url = %url, "Sending API request");
        let response = request.send().await.map_err(|source| {
            warn!(url = %url, error = %source, "CORS or network error");
            ApiError::Network {
                url: url.clone(),
                source,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let details = serde_json::from_str::<Value>(&text).ok();
            error!(
                url = %url,
                status = status.as_u16(),
                status_text = status.canonical_reason().unwrap_or_default(),
                details = ?details,
                body = %ApiError::truncate_body(&text),
                "API request failed"
            );

            let err = ApiError::from_status(status, details);
            if matches!(err, ApiError::Auth { .. }) {
                warn!(url = %url, "Authentication error. Token may be expired or invalid.");
            }
            return Err(err);
        }

        let text = response.text().await.map_err(|source| ApiError::Network {
            url: url.clone(),
            source,
        })?;
        if text.is_empty() {
            debug!(url = %url, "Empty response body");
            return Ok(None);
        }

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| ApiError::MalformedResponse { url, source })
    }

    /// GET `endpoint` without a body
    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Option<T>, ApiError> {
        self.execute(endpoint, Method::GET, None, None).await
    }

    // ===== Data Fetching Methods =====

    /// Fetch all available clubs with their groups and trainings
    pub async fn get_clubs(&self) -> Result<Vec<Club>, ApiError> {
        Ok(self.get("/clubs").await?.unwrap_or_default())
    }

    /// Fetch all FAQ entries as a question -> answer map
    pub async fn get_faq(&self) -> Result<FaqEntries, ApiError> {
        Ok(self.get::<BTreeMap<String, String>>("/faq").await?.unwrap_or_default())
    }
}
