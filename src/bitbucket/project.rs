use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;

use super::require;
use crate::{
    connector::call_json,
    models::bitbucket::{Page, ProjectGroupPermission, ProjectUserPermission},
    pagination::{paginate, PageOptions},
    ApiResponse, CallContext, Connector, Payload, Result,
};

/// Explicit permissions configured on a project.
#[derive(Clone)]
pub struct ProjectService {
    c: Arc<dyn Connector>,
}

impl ProjectService {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { c: connector }
    }

    /// GET /2.0/workspaces/{workspace}/projects/{project_key}/permissions-config/users
    pub async fn list_explicit_user_permissions(
        &self,
        ctx: &CallContext,
        workspace: &str,
        project_key: &str,
        opts: Option<&PageOptions>,
    ) -> Result<ApiResponse<Page<ProjectUserPermission>>> {
        self.permissions(ctx, workspace, project_key, "users", opts)
            .await
    }

    /// GET /2.0/workspaces/{workspace}/projects/{project_key}/permissions-config/groups
    pub async fn list_explicit_group_permissions(
        &self,
        ctx: &CallContext,
        workspace: &str,
        project_key: &str,
        opts: Option<&PageOptions>,
    ) -> Result<ApiResponse<Page<ProjectGroupPermission>>> {
        self.permissions(ctx, workspace, project_key, "groups", opts)
            .await
    }

    async fn permissions<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        workspace: &str,
        project_key: &str,
        subject: &str,
        opts: Option<&PageOptions>,
    ) -> Result<ApiResponse<T>> {
        require(workspace, "workspace")?;
        require(project_key, "project key")?;
        let endpoint = paginate(
            &format!("2.0/workspaces/{workspace}/projects/{project_key}/permissions-config/{subject}"),
            opts,
        );
        let request = self
            .c
            .new_request(ctx, Method::GET, &endpoint, None, Payload::Empty)?;
        call_json(self.c.as_ref(), request).await
    }
}
