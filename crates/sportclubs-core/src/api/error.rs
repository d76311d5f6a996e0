use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Detail shown for rejected credentials when the server gives none.
const DEFAULT_AUTH_DETAIL: &str = "Access denied";

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Could not obtain access token: {0}")]
    AuthUnavailable(String),

    #[error("Authentication failed: {detail}")]
    Auth {
        status: u16,
        status_text: String,
        /// Server-provided `detail`, or "Access denied"
        detail: String,
        details: Option<Value>,
    },

    #[error("Network error: Unable to connect to API at {url}. This might be a CORS issue or the server is unavailable.")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("API Error: {status} {status_text}")]
    Api {
        status: u16,
        status_text: String,
        details: Option<Value>,
    },

    #[error("Malformed response from {url}: {source}")]
    MalformedResponse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Classify a non-success response. `details` is the best-effort parsed
    /// error body, `None` when the body was empty or not JSON.
    pub fn from_status(status: StatusCode, details: Option<Value>) -> Self {
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        match status.as_u16() {
            401 | 403 => {
                let detail = details
                    .as_ref()
                    .and_then(|d| d.get("detail"))
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_AUTH_DETAIL)
                    .to_string();
                ApiError::Auth {
                    status: status.as_u16(),
                    status_text,
                    detail,
                    details,
                }
            }
            _ => ApiError::Api {
                status: status.as_u16(),
                status_text,
                details,
            },
        }
    }

    /// True when the credential was rejected and signing in again may help
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth { .. } | ApiError::AuthUnavailable(_))
    }
}
