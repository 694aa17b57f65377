//! Query-string helpers shared by the resource services.

use url::form_urlencoded;

/// Bitbucket Cloud page selection: `page`, `pagelen` and the `q` filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageOptions {
    /// 1-based page number; zero leaves it to the server.
    pub page: u32,
    /// Results per page; zero leaves it to the server.
    pub page_len: u32,
    /// Filter expression in Bitbucket query language.
    pub q: Option<String>,
}

impl PageOptions {
    pub fn page(page: u32) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    pub fn with_page_len(mut self, page_len: u32) -> Self {
        self.page_len = page_len;
        self
    }

    pub fn with_query(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    pub(crate) fn pairs(opts: Option<&Self>) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let Some(opts) = opts else {
            return pairs;
        };
        if opts.page > 0 {
            pairs.push(("page", opts.page.to_string()));
        }
        if opts.page_len > 0 {
            pairs.push(("pagelen", opts.page_len.to_string()));
        }
        if let Some(q) = opts.q.as_deref().filter(|q| !q.is_empty()) {
            pairs.push(("q", q.to_owned()));
        }
        pairs
    }
}

/// Appends `pairs` to the query string of `endpoint`, keeping any query it
/// already carries. Values are form-encoded.
pub fn with_query<K, V>(endpoint: &str, pairs: impl IntoIterator<Item = (K, V)>) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let (path, existing) = match endpoint.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (endpoint, None),
    };

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if let Some(existing) = existing {
        serializer.extend_pairs(form_urlencoded::parse(existing.as_bytes()));
    }
    serializer.extend_pairs(pairs);

    let query = serializer.finish();
    if query.is_empty() {
        path.to_owned()
    } else {
        format!("{path}?{query}")
    }
}

/// `endpoint` with the page options applied.
pub fn paginate(endpoint: &str, opts: Option<&PageOptions>) -> String {
    with_query(endpoint, PageOptions::pairs(opts))
}

#[cfg(test)]
mod tests {
    use super::{paginate, with_query, PageOptions};

    #[test]
    fn no_options_leaves_endpoint_untouched() {
        assert_eq!(paginate("2.0/workspaces/acme", None), "2.0/workspaces/acme");
        assert_eq!(
            paginate("2.0/workspaces/acme", Some(&PageOptions::default())),
            "2.0/workspaces/acme"
        );
    }

    #[test]
    fn page_options_become_query_params() {
        let opts = PageOptions::page(2)
            .with_page_len(50)
            .with_query("name ~ \"api\"");
        assert_eq!(
            paginate("2.0/repositories/acme", Some(&opts)),
            "2.0/repositories/acme?page=2&pagelen=50&q=name+%7E+%22api%22"
        );
    }

    #[test]
    fn existing_query_is_kept() {
        assert_eq!(
            with_query("rest/api/2/issue/KEY-1/comment?expand=renderedBody", [("startAt", "0")]),
            "rest/api/2/issue/KEY-1/comment?expand=renderedBody&startAt=0"
        );
    }

    #[test]
    fn empty_filter_is_skipped() {
        let opts = PageOptions::default().with_query("");
        assert_eq!(paginate("2.0/workspaces", Some(&opts)), "2.0/workspaces");
    }
}
