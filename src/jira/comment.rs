use std::sync::Arc;

use reqwest::Method;

use crate::{
    connector::call_json,
    models::jira::{Comment, CommentPage, CommentPayload},
    pagination::with_query,
    ApiResponse, AtlassianError, CallContext, Connector, Payload, ResponseScheme, Result,
};

/// Rich-text issue comments (REST API version 2).
#[derive(Clone)]
pub struct CommentService {
    c: Arc<dyn Connector>,
}

impl CommentService {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { c: connector }
    }

    /// Comments of an issue, one page at a time.
    ///
    /// GET /rest/api/2/issue/{issueKeyOrId}/comment
    pub async fn gets(
        &self,
        ctx: &CallContext,
        issue_key_or_id: &str,
        order_by: Option<&str>,
        expand: &[&str],
        start_at: u32,
        max_results: u32,
    ) -> Result<ApiResponse<CommentPage>> {
        require_issue(issue_key_or_id)?;

        let mut params = vec![
            ("startAt", start_at.to_string()),
            ("maxResults", max_results.to_string()),
        ];
        if !expand.is_empty() {
            params.push(("expand", expand.join(",")));
        }
        if let Some(order_by) = order_by.filter(|o| !o.is_empty()) {
            params.push(("orderBy", order_by.to_owned()));
        }

        let endpoint = with_query(&format!("rest/api/2/issue/{issue_key_or_id}/comment"), params);
        let request = self
            .c
            .new_request(ctx, Method::GET, &endpoint, None, Payload::Empty)?;
        call_json(self.c.as_ref(), request).await
    }

    /// GET /rest/api/2/issue/{issueKeyOrId}/comment/{id}
    pub async fn get(
        &self,
        ctx: &CallContext,
        issue_key_or_id: &str,
        comment_id: &str,
    ) -> Result<ApiResponse<Comment>> {
        let endpoint = comment_endpoint(issue_key_or_id, comment_id)?;
        let request = self
            .c
            .new_request(ctx, Method::GET, &endpoint, None, Payload::Empty)?;
        call_json(self.c.as_ref(), request).await
    }

    /// POST /rest/api/2/issue/{issueKeyOrId}/comment
    pub async fn add(
        &self,
        ctx: &CallContext,
        issue_key_or_id: &str,
        payload: &CommentPayload,
        expand: &[&str],
    ) -> Result<ApiResponse<Comment>> {
        require_issue(issue_key_or_id)?;

        let mut endpoint = format!("rest/api/2/issue/{issue_key_or_id}/comment");
        if !expand.is_empty() {
            endpoint = with_query(&endpoint, [("expand", expand.join(","))]);
        }

        let request = self.c.new_request(
            ctx,
            Method::POST,
            &endpoint,
            None,
            Payload::json(payload)?,
        )?;
        call_json(self.c.as_ref(), request).await
    }

    /// DELETE /rest/api/2/issue/{issueKeyOrId}/comment/{id}
    pub async fn delete(
        &self,
        ctx: &CallContext,
        issue_key_or_id: &str,
        comment_id: &str,
    ) -> Result<ResponseScheme> {
        let endpoint = comment_endpoint(issue_key_or_id, comment_id)?;
        let request = self
            .c
            .new_request(ctx, Method::DELETE, &endpoint, None, Payload::Empty)?;
        self.c.call(request).await
    }
}

fn require_issue(issue_key_or_id: &str) -> Result<()> {
    if issue_key_or_id.is_empty() {
        return Err(AtlassianError::MissingParameter("issue key or id"));
    }
    Ok(())
}

fn comment_endpoint(issue_key_or_id: &str, comment_id: &str) -> Result<String> {
    require_issue(issue_key_or_id)?;
    if comment_id.is_empty() {
        return Err(AtlassianError::MissingParameter("comment id"));
    }
    Ok(format!("rest/api/2/issue/{issue_key_or_id}/comment/{comment_id}"))
}

#[cfg(test)]
mod tests {
    use super::comment_endpoint;
    use crate::AtlassianError;

    #[test]
    fn comment_endpoint_checks_both_ids() {
        assert_eq!(
            comment_endpoint("DUMMY-1", "10001").expect("endpoint must build"),
            "rest/api/2/issue/DUMMY-1/comment/10001"
        );
        assert!(matches!(
            comment_endpoint("", "10001"),
            Err(AtlassianError::MissingParameter("issue key or id"))
        ));
        assert!(matches!(
            comment_endpoint("DUMMY-1", ""),
            Err(AtlassianError::MissingParameter("comment id"))
        ));
    }
}
