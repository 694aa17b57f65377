use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Method, Url,
};
use serde::Serialize;

use crate::{AtlassianError, Authentication, CallContext, Result};

const APPLICATION_JSON: &str = "application/json";
const ATLASSIAN_TOKEN: HeaderName = HeaderName::from_static("x-atlassian-token");

/// Request body handed to the request builder.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Payload {
    #[default]
    Empty,
    /// Pre-encoded JSON document.
    Json(Bytes),
    /// Body sent verbatim, e.g. a multipart upload.
    Raw(Bytes),
}

impl Payload {
    /// Encodes `value` as JSON followed by a newline.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let mut buf = serde_json::to_vec(value).map_err(AtlassianError::Serialization)?;
        buf.push(b'\n');
        Ok(Self::Json(Bytes::from(buf)))
    }

    pub fn raw(bytes: impl Into<Bytes>) -> Self {
        Self::Raw(bytes.into())
    }

    fn into_bytes(self) -> Option<Bytes> {
        match self {
            Self::Empty => None,
            Self::Json(bytes) | Self::Raw(bytes) => Some(bytes),
        }
    }
}

/// A fully resolved request, replayable on every retry attempt.
#[derive(Clone, Debug)]
pub struct PreparedRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
    context: CallContext,
}

impl PreparedRequest {
    /// HTTP method sent on every attempt.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Absolute URL, site joined with the request path.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Accept, content type, auth and user agent headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Encoded body, or `None` for bodyless requests.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Cancellation and deadline observed by the retry loop.
    pub fn context(&self) -> &CallContext {
        &self.context
    }

    /// Builds a fresh transport request. The body buffer is shared, never
    /// consumed, so every attempt sends the same bytes.
    pub(crate) fn to_transport(&self, timeout: Option<Duration>) -> reqwest::Request {
        let mut request = reqwest::Request::new(self.method.clone(), self.url.clone());
        *request.headers_mut() = self.headers.clone();
        if let Some(body) = &self.body {
            *request.body_mut() = Some(reqwest::Body::from(body.clone()));
        }
        *request.timeout_mut() = timeout;
        request
    }
}

/// Resolves `path` against `site` and assembles headers and body.
pub(crate) fn build_request(
    site: &Url,
    auth: &Authentication,
    ctx: &CallContext,
    method: Method,
    path: &str,
    content_type: Option<&str>,
    payload: Payload,
) -> Result<PreparedRequest> {
    let url = site.join(path)?;
    let body = payload.into_bytes();

    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static(APPLICATION_JSON));

    if body.is_some() {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_JSON),
        );
    }

    if let Some(content_type) = content_type.filter(|value| !value.is_empty()) {
        headers.insert(header::CONTENT_TYPE, header_value("content type", content_type)?);
        headers.insert(ATLASSIAN_TOKEN, HeaderValue::from_static("no-check"));
    }

    if let Some((mail, token)) = auth.basic_auth() {
        let encoded = STANDARD.encode(format!("{mail}:{token}"));
        let mut value = header_value("basic auth", &format!("Basic {encoded}"))?;
        value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, value);
    }

    if let Some(agent) = auth.user_agent() {
        headers.insert(header::USER_AGENT, header_value("user agent", agent)?);
    }

    if !auth.has_basic_auth() {
        if let Some(token) = auth.bearer_token() {
            let mut value = header_value("bearer token", &format!("Bearer {token}"))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
    }

    Ok(PreparedRequest {
        method,
        url,
        headers,
        body,
        context: ctx.clone(),
    })
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|err| AtlassianError::RequestConstruction(format!("invalid {name} header: {err}")))
}
