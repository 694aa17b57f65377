use std::sync::Arc;

use reqwest::Method;

use super::require;
use crate::{
    connector::call_json,
    models::bitbucket::{Page, RepositoryPermission, WorkspaceMembership},
    pagination::{paginate, with_query, PageOptions},
    ApiResponse, CallContext, Connector, Payload, Result,
};

/// Effective permissions inside a workspace.
#[derive(Clone)]
pub struct WorkspacePermissionService {
    c: Arc<dyn Connector>,
}

impl WorkspacePermissionService {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { c: connector }
    }

    /// Members of a workspace and their permission level.
    ///
    /// GET /2.0/workspaces/{workspace}/permissions
    pub async fn members(
        &self,
        ctx: &CallContext,
        workspace: &str,
        query: Option<&str>,
        opts: Option<&PageOptions>,
    ) -> Result<ApiResponse<Page<WorkspaceMembership>>> {
        require(workspace, "workspace")?;
        let endpoint = paginate(&format!("2.0/workspaces/{workspace}/permissions"), opts);
        let endpoint = with_query(&endpoint, non_empty([("q", query)]));
        self.fetch(ctx, &endpoint).await
    }

    /// Repository permissions for every repository in the workspace.
    /// Only workspace admins may call this.
    ///
    /// GET /2.0/workspaces/{workspace}/permissions/repositories
    pub async fn repositories(
        &self,
        ctx: &CallContext,
        workspace: &str,
        query: Option<&str>,
        sort: Option<&str>,
        opts: Option<&PageOptions>,
    ) -> Result<ApiResponse<Page<RepositoryPermission>>> {
        require(workspace, "workspace")?;
        let endpoint = paginate(
            &format!("2.0/workspaces/{workspace}/permissions/repositories"),
            opts,
        );
        let endpoint = with_query(&endpoint, non_empty([("q", query), ("sort", sort)]));
        self.fetch(ctx, &endpoint).await
    }

    /// GET /2.0/workspaces/{workspace}/permissions/repositories/{repo_slug}
    pub async fn repository(
        &self,
        ctx: &CallContext,
        workspace: &str,
        repo_slug: &str,
        sort: Option<&str>,
        opts: Option<&PageOptions>,
    ) -> Result<ApiResponse<Page<RepositoryPermission>>> {
        require(workspace, "workspace")?;
        require(repo_slug, "repository")?;
        let endpoint = paginate(
            &format!("2.0/workspaces/{workspace}/permissions/repositories/{repo_slug}"),
            opts,
        );
        let endpoint = with_query(&endpoint, non_empty([("sort", sort)]));
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

fn non_empty<'a, const N: usize>(
    pairs: [(&'static str, Option<&'a str>); N],
) -> impl Iterator<Item = (&'static str, &'a str)> {
    pairs
        .into_iter()
        .filter_map(|(key, value)| value.filter(|v| !v.is_empty()).map(|v| (key, v)))
}

#[cfg(test)]
mod tests {
    use super::non_empty;

    #[test]
    fn non_empty_drops_missing_and_blank_values() {
        let pairs: Vec<_> = non_empty([("q", Some("")), ("sort", Some("user.display_name")), ("x", None)]).collect();
        assert_eq!(pairs, vec![("sort", "user.display_name")]);
    }
}
