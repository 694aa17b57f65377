use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;

use super::require;
use crate::{
    connector::call_json,
    models::bitbucket::{
        Account, BranchRestriction, DeployKey, Page, PipelineRun, PipelineStep, PipelineVariable,
        PullRequest, Repository, RepositoryGroupPermission,
    },
    pagination::{paginate, with_query, PageOptions},
    ApiResponse, CallContext, Connector, Payload, Result,
};

/// Every pull request state; without it the API only returns open ones.
const ALL_PULL_REQUEST_STATES: &str = "OPEN,MERGED,DECLINED,SUPERSEDED";

/// Repositories of a workspace and the resources below them.
#[derive(Clone)]
pub struct RepositoryService {
    c: Arc<dyn Connector>,
}

impl RepositoryService {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { c: connector }
    }

    /// GET /2.0/repositories/{workspace}
    pub async fn list(
        &self,
        ctx: &CallContext,
        workspace: &str,
        opts: Option<&PageOptions>,
    ) -> Result<ApiResponse<Page<Repository>>> {
        require(workspace, "workspace")?;
        let endpoint = paginate(&format!("2.0/repositories/{workspace}"), opts);
        self.fetch(ctx, &endpoint).await
    }

    /// POST /2.0/repositories/{workspace}/{repo_slug}
    pub async fn create(
        &self,
        ctx: &CallContext,
        workspace: &str,
        repo_slug: &str,
        payload: &Repository,
    ) -> Result<ApiResponse<Repository>> {
        require(workspace, "workspace")?;
        require(repo_slug, "repository")?;
        let endpoint = format!("2.0/repositories/{workspace}/{repo_slug}");
        let request = self.c.new_request(
            ctx,
            Method::POST,
            &endpoint,
            None,
            Payload::json(payload)?,
        )?;
        call_json(self.c.as_ref(), request).await
    }

    /// GET /2.0/repositories/{workspace}/{repo_slug}/branch-restrictions
    pub async fn list_branch_restrictions(
        &self,
        ctx: &CallContext,
        workspace: &str,
        repo_slug: &str,
        opts: Option<&PageOptions>,
    ) -> Result<ApiResponse<Page<BranchRestriction>>> {
        self.list_below(ctx, workspace, repo_slug, "branch-restrictions", opts)
            .await
    }

    /// GET /2.0/repositories/{workspace}/{repo_slug}/default-reviewers
    pub async fn list_default_reviewers(
        &self,
        ctx: &CallContext,
        workspace: &str,
        repo_slug: &str,
        opts: Option<&PageOptions>,
    ) -> Result<ApiResponse<Page<Account>>> {
        self.list_below(ctx, workspace, repo_slug, "default-reviewers", opts)
            .await
    }

    /// Pull requests in every state.
    ///
    /// GET /2.0/repositories/{workspace}/{repo_slug}/pullrequests
    pub async fn list_pull_requests(
        &self,
        ctx: &CallContext,
        workspace: &str,
        repo_slug: &str,
        opts: Option<&PageOptions>,
    ) -> Result<ApiResponse<Page<PullRequest>>> {
        require(workspace, "workspace")?;
        require(repo_slug, "repository")?;
        let endpoint = paginate(
            &format!("2.0/repositories/{workspace}/{repo_slug}/pullrequests"),
            opts,
        );
        let endpoint = with_query(&endpoint, [("state", ALL_PULL_REQUEST_STATES)]);
        self.fetch(ctx, &endpoint).await
    }

    /// GET /2.0/repositories/{workspace}/{repo_slug}/deploy-keys
    pub async fn list_deploy_keys(
        &self,
        ctx: &CallContext,
        workspace: &str,
        repo_slug: &str,
        opts: Option<&PageOptions>,
    ) -> Result<ApiResponse<Page<DeployKey>>> {
        self.list_below(ctx, workspace, repo_slug, "deploy-keys", opts)
            .await
    }

    /// Groups with an explicit permission on the repository.
    ///
    /// GET /2.0/repositories/{workspace}/{repo_slug}/permissions-config/groups
    pub async fn list_group_permissions(
        &self,
        ctx: &CallContext,
        workspace: &str,
        repo_slug: &str,
        opts: Option<&PageOptions>,
    ) -> Result<ApiResponse<Page<RepositoryGroupPermission>>> {
        self.list_below(ctx, workspace, repo_slug, "permissions-config/groups", opts)
            .await
    }

    /// GET /2.0/repositories/{workspace}/{repo_slug}/pipelines_config/variables
    pub async fn list_pipeline_variables(
        &self,
        ctx: &CallContext,
        workspace: &str,
        repo_slug: &str,
        opts: Option<&PageOptions>,
    ) -> Result<ApiResponse<Page<PipelineVariable>>> {
        self.list_below(ctx, workspace, repo_slug, "pipelines_config/variables", opts)
            .await
    }

    /// GET /2.0/repositories/{workspace}/{repo_slug}/pipelines
    pub async fn list_pipeline_runs(
        &self,
        ctx: &CallContext,
        workspace: &str,
        repo_slug: &str,
        opts: Option<&PageOptions>,
    ) -> Result<ApiResponse<Page<PipelineRun>>> {
        self.list_below(ctx, workspace, repo_slug, "pipelines", opts)
            .await
    }

    /// GET /2.0/repositories/{workspace}/{repo_slug}/pipelines/{pipeline_uuid}/steps
    pub async fn list_pipeline_run_steps(
        &self,
        ctx: &CallContext,
        workspace: &str,
        repo_slug: &str,
        pipeline_uuid: &str,
        opts: Option<&PageOptions>,
    ) -> Result<ApiResponse<Page<PipelineStep>>> {
        require(workspace, "workspace")?;
        require(repo_slug, "repository")?;
        require(pipeline_uuid, "pipeline uuid")?;
        let resource = format!("pipelines/{pipeline_uuid}/steps");
        self.list_below(ctx, workspace, repo_slug, &resource, opts)
            .await
    }

    async fn list_below<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        workspace: &str,
        repo_slug: &str,
        resource: &str,
        opts: Option<&PageOptions>,
    ) -> Result<ApiResponse<T>> {
        require(workspace, "workspace")?;
        require(repo_slug, "repository")?;
        let endpoint = paginate(
            &format!("2.0/repositories/{workspace}/{repo_slug}/{resource}"),
            opts,
        );
        self.fetch(ctx, &endpoint).await
    }

    async fn fetch<T: DeserializeOwned>(
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
