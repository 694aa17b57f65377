//! JSON payloads exchanged with the Admin, Bitbucket and Jira APIs.
//!
//! Every field the services do not need to inspect is optional so partial
//! responses still decode.

pub mod admin;
pub mod bitbucket;
pub mod jira;
