//! Bitbucket Cloud REST API 2.0.

mod permission;
mod project;
mod repository;
mod workspace;

use std::fmt;
use std::sync::Arc;

pub use permission::WorkspacePermissionService;
pub use project::ProjectService;
pub use repository::RepositoryService;
pub use workspace::WorkspaceService;

use crate::{ApiClient, ClientOptions, Connector, Result, SharedAuth};

/// Default Bitbucket Cloud API site.
pub const DEFAULT_BITBUCKET_SITE: &str = "https://api.bitbucket.org/";

/// Client for Bitbucket Cloud.
///
/// ```no_run
/// use atlassian_http::{bitbucket::BitbucketClient, CallContext};
///
/// # async fn run() -> atlassian_http::Result<()> {
/// let bitbucket = BitbucketClient::new(None)?;
/// bitbucket.auth().set_basic_auth("me@example.com", "app-password");
///
/// let workspace = bitbucket
///     .workspace
///     .get(&CallContext::new(), "acme", None)
///     .await?;
/// println!("{:?}", workspace.data.name);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BitbucketClient {
    core: Arc<ApiClient>,
    pub workspace: WorkspaceService,
}

impl fmt::Debug for BitbucketClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitbucketClient")
            .field("core", &self.core)
            .finish()
    }
}

impl BitbucketClient {
    /// Creates a client for `site`, or `https://api.bitbucket.org/` when
    /// `None` or empty.
    pub fn new(site: Option<&str>) -> Result<Self> {
        let site = site
            .filter(|site| !site.trim().is_empty())
            .unwrap_or(DEFAULT_BITBUCKET_SITE);
        Ok(Self::from_core(ApiClient::new(site)?))
    }

    /// Wraps an already configured core client.
    pub fn from_core(core: ApiClient) -> Self {
        let core = Arc::new(core);
        let connector: Arc<dyn Connector> = core.clone();
        Self {
            workspace: WorkspaceService::new(connector),
            core,
        }
    }

    /// Rebuilds the client with new retry and timeout options.
    pub fn with_options(self, opts: ClientOptions) -> Self {
        Self::from_core(self.core.as_ref().clone().with_options(opts))
    }

    pub fn auth(&self) -> &SharedAuth {
        self.core.auth()
    }

    pub fn core(&self) -> &ApiClient {
        &self.core
    }
}

pub(crate) fn require(value: &str, name: &'static str) -> Result<()> {
    if value.is_empty() {
        return Err(crate::AtlassianError::MissingParameter(name));
    }
    Ok(())
}
