use std::sync::Arc;

use reqwest::Method;

use crate::{
    connector::call_json,
    models::admin::{OrgKeyPage, OrgTokenPage, OrgTokenQueryParams, UserToken},
    pagination::with_query,
    ApiResponse, AtlassianError, CallContext, Connector, Payload, ResponseScheme, Result,
};

/// API tokens owned by an organization.
#[derive(Clone)]
pub struct OrgTokenService {
    c: Arc<dyn Connector>,
}

impl OrgTokenService {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { c: connector }
    }

    /// GET /admin/api-access/v1/orgs/{orgID}/api-tokens
    pub async fn gets(
        &self,
        ctx: &CallContext,
        org_id: &str,
        params: Option<&OrgTokenQueryParams>,
    ) -> Result<ApiResponse<OrgTokenPage>> {
        let endpoint = org_endpoint(org_id, "api-tokens", params)?;
        let request = self
            .c
            .new_request(ctx, Method::GET, &endpoint, None, Payload::Empty)?;
        call_json(self.c.as_ref(), request).await
    }
}

/// API keys owned by an organization.
#[derive(Clone)]
pub struct OrgKeyService {
    c: Arc<dyn Connector>,
}

impl OrgKeyService {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { c: connector }
    }

    /// GET /admin/api-access/v1/orgs/{orgID}/api-keys
    pub async fn gets(
        &self,
        ctx: &CallContext,
        org_id: &str,
        params: Option<&OrgTokenQueryParams>,
    ) -> Result<ApiResponse<OrgKeyPage>> {
        let endpoint = org_endpoint(org_id, "api-keys", params)?;
        let request = self
            .c
            .new_request(ctx, Method::GET, &endpoint, None, Payload::Empty)?;
        call_json(self.c.as_ref(), request).await
    }
}

fn org_endpoint(
    org_id: &str,
    resource: &str,
    params: Option<&OrgTokenQueryParams>,
) -> Result<String> {
    if org_id.is_empty() {
        return Err(AtlassianError::MissingParameter("organization id"));
    }

    let endpoint = format!("admin/api-access/v1/orgs/{org_id}/{resource}");
    let endpoint = match params {
        Some(params) if params.page_size > 0 || params.cursor.is_some() => with_query(
            &endpoint,
            [
                ("pageSize", params.page_size.to_string()),
                ("cursor", params.cursor.clone().unwrap_or_default()),
            ],
        ),
        _ => endpoint,
    };
    Ok(endpoint)
}

/// API tokens of a managed account.
#[derive(Clone)]
pub struct UserTokenService {
    c: Arc<dyn Connector>,
}

impl UserTokenService {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { c: connector }
    }

    /// GET /users/{accountID}/manage/api-tokens
    pub async fn gets(
        &self,
        ctx: &CallContext,
        account_id: &str,
    ) -> Result<ApiResponse<Vec<UserToken>>> {
        if account_id.is_empty() {
            return Err(AtlassianError::MissingParameter("account id"));
        }

        let endpoint = format!("users/{account_id}/manage/api-tokens");
        let request = self
            .c
            .new_request(ctx, Method::GET, &endpoint, None, Payload::Empty)?;
        call_json(self.c.as_ref(), request).await
    }

    /// DELETE /users/{accountID}/manage/api-tokens/{tokenID}
    pub async fn delete(
        &self,
        ctx: &CallContext,
        account_id: &str,
        token_id: &str,
    ) -> Result<ResponseScheme> {
        if account_id.is_empty() {
            return Err(AtlassianError::MissingParameter("account id"));
        }
        if token_id.is_empty() {
            return Err(AtlassianError::MissingParameter("token id"));
        }

        let endpoint = format!("users/{account_id}/manage/api-tokens/{token_id}");
        let request = self
            .c
            .new_request(ctx, Method::DELETE, &endpoint, None, Payload::Empty)?;
        self.c.call(request).await
    }
}
