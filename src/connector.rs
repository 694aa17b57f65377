use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::{
    response::decode, ApiResponse, CallContext, Payload, PreparedRequest, ResponseScheme, Result,
};

/// The two operations a resource service needs from the core client.
///
/// Services hold an `Arc<dyn Connector>` so they can be exercised against
/// any implementation, not only [`crate::ApiClient`].
#[async_trait]
pub trait Connector: Send + Sync {
    /// Builds a request for `path`, relative to the client's site.
    fn new_request(
        &self,
        ctx: &CallContext,
        method: Method,
        path: &str,
        content_type: Option<&str>,
        payload: Payload,
    ) -> Result<PreparedRequest>;

    /// Runs the request through the retry pipeline and classifies the
    /// terminal response.
    async fn call(&self, request: PreparedRequest) -> Result<ResponseScheme>;
}

/// Calls `request` through `connector` and decodes the 2xx body into `T`.
pub async fn call_json<T: DeserializeOwned>(
    connector: &dyn Connector,
    request: PreparedRequest,
) -> Result<ApiResponse<T>> {
    let response = connector.call(request).await?;
    decode(response)
}
