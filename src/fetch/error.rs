//! Error taxonomy for the request layer

use thiserror::Error;

/// Classified outcome of a failed request.
///
/// The classification is the single source of truth for whether a failure is
/// worth retrying: only [`FetchError::ServerError`] and
/// [`FetchError::NoResponse`] report `true` from [`FetchError::is_transient`].
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// 400 - the server-provided body is surfaced verbatim
    #[error("{0}")]
    BadRequest(String),

    /// 401
    #[error("Unauthorized. Please, authorize and try again")]
    Unauthorized,

    /// 403
    #[error("Forbidden. You don't have rights to make this request")]
    Forbidden,

    /// 404
    #[error("Not found, check the request")]
    NotFound,

    /// 500 - retried
    #[error("Internal server error. Please, try again later")]
    ServerError,

    /// Any other HTTP status
    #[error("{reason}")]
    UnexpectedStatus { status: u16, reason: String },

    /// The request was sent but no response came back - retried
    #[error("Server isn't responding. Please, try again")]
    NoResponse,

    /// The request could not be constructed at all
    #[error("{0}")]
    Malformed(String),

    /// A successful response carried a body the API layer could not decode
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl FetchError {
    /// HTTP status code, where one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::BadRequest(_) => Some(400),
            FetchError::Unauthorized => Some(401),
            FetchError::Forbidden => Some(403),
            FetchError::NotFound => Some(404),
            FetchError::ServerError => Some(500),
            FetchError::UnexpectedStatus { status, .. } => Some(*status),
            FetchError::NoResponse | FetchError::Malformed(_) | FetchError::Decode(_) => None,
        }
    }

    /// Whether the failure is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::ServerError | FetchError::NoResponse)
    }

    /// Operator-facing message.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Result type for the request layer
pub type Result<T> = std::result::Result<T, FetchError>;
