use std::borrow::Cow;

use bytes::Bytes;
use reqwest::{header::HeaderMap, Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::{AtlassianError, Result, StatusError};

/// Captured terminal response: status, request metadata and the raw body.
///
/// Returned on success and carried by every status or decode error so the
/// caller can inspect what the server actually sent.
#[derive(Clone, Debug)]
pub struct ResponseScheme {
    pub status: StatusCode,
    pub method: Method,
    pub endpoint: String,
    pub headers: HeaderMap,
    pub bytes: Bytes,
}

impl ResponseScheme {
    pub fn code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

/// Typed body decoded from a successful response, plus its envelope.
#[derive(Clone, Debug)]
pub struct ApiResponse<T> {
    pub data: T,
    pub response: ResponseScheme,
}

/// Drains `response` fully into an envelope. The connection is released
/// when this returns, whatever the outcome.
pub(crate) async fn capture(
    response: reqwest::Response,
    method: Method,
    endpoint: String,
) -> Result<ResponseScheme> {
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(source) => {
            return Err(AtlassianError::BodyRead {
                source,
                status,
                method,
                endpoint,
            })
        }
    };

    Ok(ResponseScheme {
        status,
        method,
        endpoint,
        headers,
        bytes,
    })
}

/// Passes 2xx envelopes through and maps everything else to a status error.
pub(crate) fn classify(response: ResponseScheme) -> Result<ResponseScheme> {
    if response.is_success() {
        return Ok(response);
    }

    Err(AtlassianError::Status {
        kind: StatusError::from_code(response.code()),
        response: Box::new(response),
    })
}

/// Decodes the captured body of a successful response into `T`.
pub(crate) fn decode<T: DeserializeOwned>(response: ResponseScheme) -> Result<ApiResponse<T>> {
    match serde_json::from_slice::<T>(&response.bytes) {
        Ok(data) => Ok(ApiResponse { data, response }),
        Err(source) => Err(AtlassianError::Decode {
            source,
            response: Box::new(response),
        }),
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use reqwest::{header::HeaderMap, Method, StatusCode};
    use serde::Deserialize;

    use super::{classify, decode, ResponseScheme};
    use crate::{AtlassianError, StatusError};

    fn envelope(code: u16, body: &'static str) -> ResponseScheme {
        ResponseScheme {
            status: StatusCode::from_u16(code).expect("status must be valid"),
            method: Method::GET,
            endpoint: "https://x/items".to_owned(),
            headers: HeaderMap::new(),
            bytes: Bytes::from_static(body.as_bytes()),
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        #[serde(rename = "id")]
        id: i64,
    }

    #[test]
    fn status_table_preserves_envelope() {
        let table = [
            (400, StatusError::BadRequest),
            (401, StatusError::Unauthorized),
            (404, StatusError::NotFound),
            (429, StatusError::RateLimited),
            (500, StatusError::Internal),
            (403, StatusError::InvalidStatusCode),
            (503, StatusError::InvalidStatusCode),
        ];

        for (code, expected) in table {
            let err = classify(envelope(code, "oops")).expect_err("non-2xx must fail");
            assert_eq!(err.status_kind(), Some(expected), "status {code}");

            let response = err.response().expect("envelope must be kept");
            assert_eq!(response.code(), code);
            assert_eq!(response.method, Method::GET);
            assert_eq!(response.endpoint, "https://x/items");
            assert_eq!(response.text(), "oops");
        }
    }

    #[test]
    fn not_found_keeps_raw_body() {
        let err = classify(envelope(404, "not found")).expect_err("404 must fail");
        match err {
            AtlassianError::Status { kind, response } => {
                assert_eq!(kind, StatusError::NotFound);
                assert_eq!(response.code(), 404);
                assert_eq!(&response.bytes[..], b"not found");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn success_range_is_half_open() {
        assert!(classify(envelope(200, "")).is_ok());
        assert!(classify(envelope(204, "")).is_ok());
        assert!(classify(envelope(299, "")).is_ok());
        assert!(classify(envelope(300, "")).is_err());
    }

    #[test]
    fn decode_populates_target() {
        let decoded = decode::<Item>(envelope(200, r#"{"id":4}"#)).expect("body must decode");
        assert_eq!(decoded.data, Item { id: 4 });
        assert_eq!(decoded.response.code(), 200);
    }

    #[test]
    fn decode_failure_is_not_a_status_error() {
        let err = decode::<Item>(envelope(200, "<html>")).expect_err("html must not decode");
        assert!(matches!(err, AtlassianError::Decode { .. }));
        assert_eq!(err.status_kind(), None);
        assert_eq!(err.response().map(|r| r.text().into_owned()), Some("<html>".to_owned()));
    }
}
