//! Atlassian Admin (organization) API.

mod token;

use std::fmt;
use std::sync::Arc;

pub use token::{OrgKeyService, OrgTokenService, UserTokenService};

use crate::{ApiClient, ClientOptions, Connector, Result, SharedAuth};

/// Default Admin API site.
pub const DEFAULT_ADMIN_SITE: &str = "https://api.atlassian.com/";

/// Client for the Admin API.
#[derive(Clone)]
pub struct AdminClient {
    core: Arc<ApiClient>,
    pub org_token: OrgTokenService,
    pub org_key: OrgKeyService,
    pub user_token: UserTokenService,
}

impl fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminClient").field("core", &self.core).finish()
    }
}

impl AdminClient {
    /// Creates a client for `https://api.atlassian.com/`.
    pub fn new() -> Result<Self> {
        Ok(Self::from_core(ApiClient::new(DEFAULT_ADMIN_SITE)?))
    }

    /// Wraps an already configured core client.
    pub fn from_core(core: ApiClient) -> Self {
        let core = Arc::new(core);
        let connector: Arc<dyn Connector> = core.clone();
        Self {
            org_token: OrgTokenService::new(connector.clone()),
            org_key: OrgKeyService::new(connector.clone()),
            user_token: UserTokenService::new(connector),
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
