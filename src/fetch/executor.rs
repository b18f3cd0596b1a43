//! Single-attempt request executor
//!
//! Performs exactly one network attempt and classifies the outcome into the
//! [`FetchError`] taxonomy. Retrying lives one level up, in
//! [`execute_with_retry`](super::execute_with_retry).

use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::warn;

use super::error::{FetchError, Result};

/// Descriptor of one logical request.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

impl RequestSpec {
    pub fn get(url: impl Into<String>) -> Self {
        Self { method: Method::GET, url: url.into(), body: None }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self { method: Method::POST, url: url.into(), body: Some(body) }
    }

    pub fn delete(url: impl Into<String>, body: Value) -> Self {
        Self { method: Method::DELETE, url: url.into(), body: Some(body) }
    }
}

/// Successful settlement of one attempt.
#[derive(Debug, Clone)]
pub struct FetchSuccess {
    pub status: StatusCode,
    pub body: String,
}

/// Perform exactly one attempt of `spec` and classify the outcome.
pub async fn execute(client: &Client, spec: &RequestSpec) -> Result<FetchSuccess> {
    let mut request = client.request(spec.method.clone(), &spec.url);
    if let Some(body) = &spec.body {
        request = request.json(body);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            let err = classify_send_error(e);
            warn!(url = %spec.url, "request failed without a response: {err}");
            return Err(err);
        }
    };

    let status = response.status();
    if status.is_success() {
        // A connection dropped mid-body counts as no response received
        let body = response.text().await.map_err(|_| FetchError::NoResponse)?;
        return Ok(FetchSuccess { status, body });
    }

    let body = response.text().await.unwrap_or_default();
    let err = classify_status(status, body);
    warn!(url = %spec.url, status = status.as_u16(), "request failed: {err}");
    Err(err)
}

/// Deterministic status-to-taxonomy mapping.
pub(crate) fn classify_status(status: StatusCode, body: String) -> FetchError {
    match status.as_u16() {
        400 => FetchError::BadRequest(body),
        401 => FetchError::Unauthorized,
        403 => FetchError::Forbidden,
        404 => FetchError::NotFound,
        500 => FetchError::ServerError,
        code => FetchError::UnexpectedStatus {
            status: code,
            reason: status.canonical_reason().unwrap_or("Unknown status").to_string(),
        },
    }
}

fn classify_send_error(e: reqwest::Error) -> FetchError {
    if e.is_builder() {
        FetchError::Malformed(e.to_string())
    } else {
        FetchError::NoResponse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_follows_the_table() {
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, "card not found".into()),
            FetchError::BadRequest(body) if body == "card not found"
        ));
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, String::new()),
            FetchError::Unauthorized
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, String::new()),
            FetchError::Forbidden
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, String::new()),
            FetchError::NotFound
        ));
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, String::new()),
            FetchError::ServerError
        ));
    }

    #[test]
    fn unlisted_statuses_surface_the_status_text() {
        let err = classify_status(StatusCode::BAD_GATEWAY, String::new());
        match err {
            FetchError::UnexpectedStatus { status, reason } => {
                assert_eq!(status, 502);
                assert_eq!(reason, "Bad Gateway");
            }
            other => panic!("expected UnexpectedStatus, got {other:?}"),
        }
        assert!(!classify_status(StatusCode::BAD_GATEWAY, String::new()).is_transient());
    }
}
