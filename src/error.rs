use reqwest::{Method, StatusCode};

use crate::ResponseScheme;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum AtlassianError {
    /// The endpoint or base site could not be parsed or joined.
    #[error("invalid url: {0}")]
    UrlParse(#[from] url::ParseError),
    /// The request body could not be encoded as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[source] serde_json::Error),
    /// The HTTP request could not be assembled (bad header value or method).
    #[error("request construction error: {0}")]
    RequestConstruction(String),
    /// A required path parameter was empty.
    #[error("{0} is required")]
    MissingParameter(&'static str),
    /// Network or request execution error from the transport.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
    /// The status line arrived but the body could not be read.
    #[error("body read error: {method} {endpoint} returned {status}: {source}")]
    BodyRead {
        #[source]
        source: reqwest::Error,
        status: StatusCode,
        method: Method,
        endpoint: String,
    },
    /// The call context was cancelled while waiting to retry.
    #[error("call cancelled")]
    Cancelled,
    /// The call context deadline passed while waiting to retry.
    #[error("call deadline exceeded")]
    DeadlineExceeded,
    /// Terminal non-2xx response.
    #[error("{kind}: {} {} returned {}", .response.method, .response.endpoint, .response.code())]
    Status {
        kind: StatusError,
        response: Box<ResponseScheme>,
    },
    /// A successful response whose body did not match the target type.
    #[error("decode error: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        response: Box<ResponseScheme>,
    },
}

impl AtlassianError {
    /// Returns the response envelope captured for status and decode errors.
    pub fn response(&self) -> Option<&ResponseScheme> {
        match self {
            Self::Status { response, .. } | Self::Decode { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Returns the status classification, if this is a status error.
    pub fn status_kind(&self) -> Option<StatusError> {
        match self {
            Self::Status { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Classification of a terminal non-2xx status code.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, thiserror::Error)]
pub enum StatusError {
    /// 400
    #[error("client: bad request")]
    BadRequest,
    /// 401
    #[error("client: unauthorized")]
    Unauthorized,
    /// 404
    #[error("client: not found")]
    NotFound,
    /// 429 after retries were exhausted or disabled.
    #[error("client: rate limited")]
    RateLimited,
    /// 500
    #[error("client: internal server error")]
    Internal,
    /// Any other non-2xx code.
    #[error("client: invalid http response status")]
    InvalidStatusCode,
}

impl StatusError {
    /// Maps a non-2xx status code onto the fixed taxonomy.
    pub fn from_code(code: u16) -> Self {
        match code {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            500 => Self::Internal,
            _ => Self::InvalidStatusCode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StatusError;

    #[test]
    fn maps_fixed_status_table() {
        assert_eq!(StatusError::from_code(400), StatusError::BadRequest);
        assert_eq!(StatusError::from_code(401), StatusError::Unauthorized);
        assert_eq!(StatusError::from_code(404), StatusError::NotFound);
        assert_eq!(StatusError::from_code(429), StatusError::RateLimited);
        assert_eq!(StatusError::from_code(500), StatusError::Internal);
    }

    #[test]
    fn status_kinds_render_client_prefix() {
        assert_eq!(StatusError::NotFound.to_string(), "client: not found");
        assert_eq!(
            StatusError::InvalidStatusCode.to_string(),
            "client: invalid http response status"
        );
    }

    #[test]
    fn unknown_codes_are_invalid_status() {
        for code in [302, 403, 409, 418, 502, 503] {
            assert_eq!(StatusError::from_code(code), StatusError::InvalidStatusCode);
        }
    }
}
