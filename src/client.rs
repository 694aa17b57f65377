use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use tokio::time::sleep;

use crate::{
    request::build_request,
    response::{capture, classify, decode},
    transport::Transport,
    ApiResponse, AtlassianError, Authentication, CallContext, ClientOptions, Connector, Payload,
    PreparedRequest, ResponseScheme, Result, SharedAuth,
};

/// Parses `site` as a base URL, appending the trailing `/` that relative
/// joins need to keep the full path.
pub fn parse_site(site: &str) -> Result<Url> {
    let site = site.trim();
    let url = if site.ends_with('/') {
        Url::parse(site)?
    } else {
        Url::parse(&format!("{site}/"))?
    };
    Ok(url)
}

/// Core HTTP client shared by every product: builds requests against one
/// site and runs them through the rate-limit retry pipeline.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    site: Url,
    auth: SharedAuth,
    options: ClientOptions,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("site", &self.site.as_str())
            .field("auth", &self.auth.snapshot())
            .field("options", &self.options)
            .finish()
    }
}

impl ApiClient {
    /// Creates a client for `site` using a default `reqwest::Client`.
    pub fn new(site: &str) -> Result<Self> {
        Ok(Self::from_url(parse_site(site)?))
    }

    /// Creates a client for an already parsed base URL. The URL is used
    /// as given, so it should end with `/`.
    pub fn from_url(site: Url) -> Self {
        Self {
            transport: Arc::new(reqwest::Client::new()),
            site,
            auth: SharedAuth::default(),
            options: ClientOptions::default(),
        }
    }

    /// Applies retry and timeout options.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    /// Replaces the HTTP transport.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Replaces the credentials. Clones made earlier keep the old handle.
    pub fn with_auth(mut self, auth: Authentication) -> Self {
        self.auth = SharedAuth::new(auth);
        self
    }

    /// Base URL that request paths are resolved against.
    pub fn site(&self) -> &Url {
        &self.site
    }

    /// Retry and timeout options in effect.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Credentials handle shared with every clone of this client.
    pub fn auth(&self) -> &SharedAuth {
        &self.auth
    }

    /// Builds a request for `path` with an optional content-type override.
    pub fn new_request(
        &self,
        ctx: &CallContext,
        method: Method,
        path: &str,
        content_type: Option<&str>,
        payload: Payload,
    ) -> Result<PreparedRequest> {
        build_request(
            &self.site,
            &self.auth.snapshot(),
            ctx,
            method,
            path,
            content_type,
            payload,
        )
    }

    /// Builds a request whose body is `body` encoded as JSON.
    pub fn new_json_request<B: Serialize + ?Sized>(
        &self,
        ctx: &CallContext,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<PreparedRequest> {
        self.new_request(ctx, method, path, None, Payload::json(body)?)
    }

    /// Executes `request`, retrying on HTTP 429, and returns the envelope of
    /// the terminal 2xx response.
    pub async fn call(&self, request: PreparedRequest) -> Result<ResponseScheme> {
        let response = self.send_with_retry(&request).await?;
        classify(response)
    }

    /// Like [`ApiClient::call`], then decodes the body into `T`.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        request: PreparedRequest,
    ) -> Result<ApiResponse<T>> {
        let response = self.call(request).await?;
        decode(response)
    }

    async fn send_with_retry(&self, request: &PreparedRequest) -> Result<ResponseScheme> {
        let ctx = request.context();
        let endpoint = request.url().to_string();
        let mut attempt = 0u32;

        loop {
            // An expired deadline would otherwise surface as a zero transport timeout.
            if ctx.remaining().is_some_and(|left| left.is_zero()) {
                return Err(ctx.err().unwrap_or(AtlassianError::DeadlineExceeded));
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(method = %request.method(), %endpoint, attempt, "dispatching request");

            let response = self
                .transport
                .execute(request.to_transport(self.attempt_timeout(ctx)))
                .await
                .map_err(AtlassianError::Transport)?;

            let rate_limited = response.status() == StatusCode::TOO_MANY_REQUESTS;
            // Drained here so the connection is released before sleeping.
            let captured = capture(response, request.method().clone(), endpoint.clone()).await?;
            if !rate_limited {
                return Ok(captured);
            }

            self.wait_before_retry(ctx, attempt, &endpoint).await?;
            attempt += 1;
            if attempt > self.options.max_retries {
                #[cfg(feature = "tracing")]
                tracing::warn!(%endpoint, attempt, "rate limit retries exhausted");

                return Ok(captured);
            }
        }
    }

    fn attempt_timeout(&self, ctx: &CallContext) -> Option<Duration> {
        match (self.options.timeout, ctx.remaining()) {
            (Some(timeout), Some(remaining)) => Some(timeout.min(remaining)),
            (timeout, remaining) => timeout.or(remaining),
        }
    }

    /// Sleeps for the backoff of `attempt` unless the context finishes first.
    async fn wait_before_retry(
        &self,
        ctx: &CallContext,
        attempt: u32,
        endpoint: &str,
    ) -> Result<()> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        let delay = self.options.retry_delay(attempt);

        #[cfg(feature = "tracing")]
        tracing::info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            endpoint,
            attempt,
            "rate limit exceeded, waiting before retry"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = endpoint;

        tokio::select! {
            biased;
            err = ctx.done() => Err(err),
            () = sleep(delay) => Ok(()),
        }
    }
}

#[async_trait]
impl Connector for ApiClient {
    fn new_request(
        &self,
        ctx: &CallContext,
        method: Method,
        path: &str,
        content_type: Option<&str>,
        payload: Payload,
    ) -> Result<PreparedRequest> {
        ApiClient::new_request(self, ctx, method, path, content_type, payload)
    }

    async fn call(&self, request: PreparedRequest) -> Result<ResponseScheme> {
        ApiClient::call(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::StatusCode;
    use tokio::time::Instant;

    use super::{parse_site, ApiClient};
    use crate::{
        transport::Transport, AtlassianError, Authentication, CallContext, CancelToken,
        ClientOptions, Payload, StatusError,
    };

    /// Answers every dispatch with `status` and records when it arrived.
    struct ScriptedTransport {
        status: StatusCode,
        dispatches: Mutex<Vec<Instant>>,
    }

    impl ScriptedTransport {
        fn always(status: StatusCode) -> Arc<Self> {
            Arc::new(Self {
                status,
                dispatches: Mutex::new(Vec::new()),
            })
        }

        fn dispatches(&self) -> Vec<Instant> {
            self.dispatches
                .lock()
                .expect("dispatch log mutex must not be poisoned")
                .clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn execute(
            &self,
            _request: reqwest::Request,
        ) -> Result<reqwest::Response, reqwest::Error> {
            self.dispatches
                .lock()
                .expect("dispatch log mutex must not be poisoned")
                .push(Instant::now());
            let response = axum::http::Response::builder()
                .status(self.status)
                .body(format!("status {}", self.status.as_u16()))
                .expect("scripted response must build");
            Ok(reqwest::Response::from(response))
        }
    }

    fn scripted_client(transport: Arc<ScriptedTransport>, opts: ClientOptions) -> ApiClient {
        ApiClient::new("https://x")
            .expect("client must build")
            .with_transport(transport)
            .with_options(opts)
    }

    async fn call_thing(client: &ApiClient, ctx: &CallContext) -> crate::Result<crate::ResponseScheme> {
        let request = client
            .new_request(ctx, reqwest::Method::GET, "thing", None, Payload::Empty)
            .expect("request must build");
        client.call(request).await
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_doubles_between_dispatches_up_to_ceiling() {
        let transport = ScriptedTransport::always(StatusCode::TOO_MANY_REQUESTS);
        let client = scripted_client(
            transport.clone(),
            ClientOptions {
                max_retries: 4,
                initial_retry_delay: Duration::from_secs(1),
                max_retry_delay: Duration::from_secs(3),
                timeout: None,
            },
        );

        let started = Instant::now();
        let err = call_thing(&client, &CallContext::new())
            .await
            .expect_err("retries must be exhausted");
        assert_eq!(err.status_kind(), Some(StatusError::RateLimited));

        let dispatches = transport.dispatches();
        assert_eq!(dispatches.len(), 5);
        let expected = [1, 2, 3, 3].map(Duration::from_secs);
        for (gap, want) in dispatches.windows(2).map(|w| w[1] - w[0]).zip(expected) {
            assert!(
                gap >= want && gap < want + Duration::from_millis(10),
                "gap {gap:?} should be {want:?}"
            );
        }
        // The last rate-limited response is also waited out before giving up.
        assert!(started.elapsed() >= Duration::from_secs(12));
        assert!(started.elapsed() < Duration::from_secs(13));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_still_waits_once() {
        let transport = ScriptedTransport::always(StatusCode::TOO_MANY_REQUESTS);
        let client = scripted_client(
            transport.clone(),
            ClientOptions {
                max_retries: 0,
                initial_retry_delay: Duration::from_secs(2),
                max_retry_delay: Duration::from_secs(10),
                timeout: None,
            },
        );

        let started = Instant::now();
        let err = call_thing(&client, &CallContext::new())
            .await
            .expect_err("429 must surface");

        assert_eq!(err.status_kind(), Some(StatusError::RateLimited));
        assert_eq!(err.response().map(|r| r.text().into_owned()), Some("status 429".to_owned()));
        assert_eq!(transport.dispatches().len(), 1);
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_context_skips_the_wait() {
        let transport = ScriptedTransport::always(StatusCode::TOO_MANY_REQUESTS);
        let client = scripted_client(
            transport.clone(),
            ClientOptions {
                max_retries: 3,
                initial_retry_delay: Duration::from_secs(60),
                max_retry_delay: Duration::from_secs(600),
                timeout: None,
            },
        );
        let token = CancelToken::new();
        token.cancel();
        let ctx = CallContext::new().with_cancel_token(token);

        let started = Instant::now();
        let err = call_thing(&client, &ctx)
            .await
            .expect_err("cancelled call must fail");

        assert!(matches!(err, AtlassianError::Cancelled));
        assert_eq!(transport.dispatches().len(), 1);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_final_wait_wins_over_rate_limit() {
        let transport = ScriptedTransport::always(StatusCode::TOO_MANY_REQUESTS);
        let client = scripted_client(
            transport.clone(),
            ClientOptions {
                max_retries: 0,
                initial_retry_delay: Duration::from_secs(60),
                max_retry_delay: Duration::from_secs(600),
                timeout: None,
            },
        );
        let token = CancelToken::new();
        let ctx = CallContext::new().with_cancel_token(token.clone());
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            token.cancel();
        });

        let err = call_thing(&client, &ctx)
            .await
            .expect_err("cancelled call must fail");
        canceller.await.expect("canceller must finish");

        assert!(matches!(err, AtlassianError::Cancelled));
        assert_eq!(transport.dispatches().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_deadline_is_reported_before_dispatch() {
        let transport = ScriptedTransport::always(StatusCode::OK);
        let client = scripted_client(transport.clone(), ClientOptions::default());
        let ctx = CallContext::new().with_deadline(Instant::now());

        let err = call_thing(&client, &ctx)
            .await
            .expect_err("expired deadline must fail");

        assert!(matches!(err, AtlassianError::DeadlineExceeded));
        assert!(transport.dispatches().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn success_returns_without_waiting() {
        let transport = ScriptedTransport::always(StatusCode::OK);
        let client = scripted_client(transport.clone(), ClientOptions::default());

        let response = call_thing(&client, &CallContext::new())
            .await
            .expect("200 must succeed");

        assert_eq!(response.code(), 200);
        assert_eq!(transport.dispatches().len(), 1);
    }

    #[test]
    fn parse_site_appends_trailing_slash() {
        let url = parse_site("https://example.atlassian.net/wiki").expect("site must parse");
        assert_eq!(url.as_str(), "https://example.atlassian.net/wiki/");
        assert_eq!(
            url.join("rest/api/2/issue").expect("path must join").as_str(),
            "https://example.atlassian.net/wiki/rest/api/2/issue"
        );
    }

    #[test]
    fn parse_site_rejects_garbage() {
        assert!(parse_site("not a url").is_err());
    }

    #[test]
    fn debug_redacts_credentials() {
        let mut auth = Authentication::new();
        auth.set_basic_auth("kit@example.com", "secret-token");
        let client = ApiClient::new("https://x").expect("client must build").with_auth(auth);
        let debug = format!("{client:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn auth_changes_reach_clones() {
        let client = ApiClient::new("https://x").expect("client must build");
        let clone = client.clone();
        client.auth().set_bearer_token("pat");

        let request = clone
            .new_request(
                &CallContext::new(),
                reqwest::Method::GET,
                "a",
                None,
                crate::Payload::Empty,
            )
            .expect("request must build");
        assert_eq!(request.headers()[reqwest::header::AUTHORIZATION], "Bearer pat");
    }

    #[tokio::test]
    async fn attempt_timeout_takes_smaller_bound() {
        let client = ApiClient::new("https://x")
            .expect("client must build")
            .with_options(ClientOptions {
                timeout: Some(Duration::from_secs(30)),
                ..ClientOptions::default()
            });

        assert_eq!(
            client.attempt_timeout(&CallContext::new()),
            Some(Duration::from_secs(30))
        );

        let short = CallContext::new().with_timeout(Duration::from_secs(1));
        let bound = client.attempt_timeout(&short).expect("deadline must bound attempt");
        assert!(bound <= Duration::from_secs(1));

        let unbounded = ApiClient::new("https://x").expect("client must build");
        assert_eq!(unbounded.attempt_timeout(&CallContext::new()), None);
    }
}
