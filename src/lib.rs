//! `atlassian-http` is an async client for the Atlassian Cloud REST APIs.
//!
//! Every product client shares one call pipeline ([`ApiClient`]): it builds
//! authenticated requests, retries `429 Too Many Requests` with capped
//! exponential backoff, and maps the terminal response to an
//! [`AtlassianError`] when it is not a 2xx.
//!
//! - [`admin::AdminClient`]
//! - [`bitbucket::BitbucketClient`]
//! - [`jira::JiraClient`]

mod auth;
mod client;
mod connector;
mod context;
mod error;
mod options;
mod request;
mod response;
mod transport;

pub mod admin;
pub mod bitbucket;
pub mod jira;
pub mod models;
pub mod pagination;

pub use auth::{Authentication, SharedAuth};
pub use client::{parse_site, ApiClient};
pub use connector::{call_json, Connector};
pub use context::{CallContext, CancelToken};
pub use error::{AtlassianError, StatusError};
pub use options::ClientOptions;
pub use pagination::PageOptions;
pub use request::{Payload, PreparedRequest};
pub use response::{ApiResponse, ResponseScheme};
pub use transport::Transport;

pub type Result<T> = std::result::Result<T, AtlassianError>;
