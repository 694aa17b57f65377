//! Jira Cloud platform REST API.

mod comment;

use std::fmt;
use std::sync::Arc;

pub use comment::CommentService;

use crate::{ApiClient, AtlassianError, ClientOptions, Connector, Result, SharedAuth};

/// Client for a Jira Cloud site such as `https://acme.atlassian.net`.
#[derive(Clone)]
pub struct JiraClient {
    core: Arc<ApiClient>,
    pub comment: CommentService,
}

impl fmt::Debug for JiraClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JiraClient").field("core", &self.core).finish()
    }
}

impl JiraClient {
    /// Jira has no shared host, so the site is required.
    pub fn new(site: &str) -> Result<Self> {
        if site.trim().is_empty() {
            return Err(AtlassianError::MissingParameter("site"));
        }
        Ok(Self::from_core(ApiClient::new(site)?))
    }

    /// Wraps an already configured core client.
    pub fn from_core(core: ApiClient) -> Self {
        let core = Arc::new(core);
        let connector: Arc<dyn Connector> = core.clone();
        Self {
            comment: CommentService::new(connector),
            core,
        }
    }

    /// Rebuilds the client with new retry and timeout options.
    pub fn with_options(self, opts: ClientOptions) -> Self {
        Self::from_core(self.core.as_ref().clone().with_options(opts))
    }

    /// Credentials shared with every service of this client.
    pub fn auth(&self) -> &SharedAuth {
        self.core.auth()
    }

    /// Underlying call pipeline.
    pub fn core(&self) -> &ApiClient {
        &self.core
    }
}
