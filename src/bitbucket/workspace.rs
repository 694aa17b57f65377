use std::sync::Arc;

use reqwest::Method;

use super::{require, ProjectService, RepositoryService, WorkspacePermissionService};
use crate::{
    connector::call_json,
    models::bitbucket::{Page, Project, Workspace, WorkspaceMembership},
    pagination::{paginate, PageOptions},
    ApiResponse, CallContext, Connector, Payload, Result,
};

/// Workspace endpoints plus the services scoped below a workspace.
#[derive(Clone)]
pub struct WorkspaceService {
    c: Arc<dyn Connector>,
    pub permission: WorkspacePermissionService,
    pub repository: RepositoryService,
    pub project: ProjectService,
}

impl WorkspaceService {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            permission: WorkspacePermissionService::new(connector.clone()),
            repository: RepositoryService::new(connector.clone()),
            project: ProjectService::new(connector.clone()),
            c: connector,
        }
    }

    /// GET /2.0/workspaces/{workspace}
    pub async fn get(
        &self,
        ctx: &CallContext,
        workspace: &str,
        opts: Option<&PageOptions>,
    ) -> Result<ApiResponse<Workspace>> {
        require(workspace, "workspace")?;
        let endpoint = paginate(&format!("2.0/workspaces/{workspace}"), opts);
        self.fetch(ctx, &endpoint).await
    }

    /// GET /2.0/workspaces/{workspace}/members
    pub async fn members(
        &self,
        ctx: &CallContext,
        workspace: &str,
        opts: Option<&PageOptions>,
    ) -> Result<ApiResponse<Page<WorkspaceMembership>>> {
        require(workspace, "workspace")?;
        let endpoint = paginate(&format!("2.0/workspaces/{workspace}/members"), opts);
        self.fetch(ctx, &endpoint).await
    }

    /// GET /2.0/workspaces/{workspace}/members/{member}
    pub async fn membership(
        &self,
        ctx: &CallContext,
        workspace: &str,
        member_id: &str,
    ) -> Result<ApiResponse<WorkspaceMembership>> {
        require(workspace, "workspace")?;
        require(member_id, "member id")?;
        let endpoint = format!("2.0/workspaces/{workspace}/members/{member_id}");
        self.fetch(ctx, &endpoint).await
    }

    /// GET /2.0/workspaces/{workspace}/projects
    pub async fn projects(
        &self,
        ctx: &CallContext,
        workspace: &str,
        opts: Option<&PageOptions>,
    ) -> Result<ApiResponse<Page<Project>>> {
        require(workspace, "workspace")?;
        let endpoint = paginate(&format!("2.0/workspaces/{workspace}/projects"), opts);
        self.fetch(ctx, &endpoint).await
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        ctx: &CallContext,
        endpoint: &str,
    ) -> Result<ApiResponse<T>> {
        let request = self
            .c
            .new_request(ctx, Method::GET, endpoint, None, Payload::Empty)?;
        call_json(self.c.as_ref(), request).await
    }
}
