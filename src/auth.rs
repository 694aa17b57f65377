//! Credential storage shared by every request a client builds.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Credential material attached to outgoing requests.
///
/// Basic auth and the bearer token share the token slot, as Atlassian API
/// tokens are used for both. When basic auth is set it takes precedence.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Authentication {
    basic_auth: bool,
    mail: String,
    token: String,
    user_agent: Option<String>,
}

impl Authentication {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_basic_auth(&mut self, mail: impl Into<String>, token: impl Into<String>) {
        self.mail = mail.into();
        self.token = token.into();
        self.basic_auth = true;
    }

    pub fn set_bearer_token(&mut self, token: impl Into<String>) {
        self.token = token.into();
    }

    pub fn set_user_agent(&mut self, agent: impl Into<String>) {
        self.user_agent = Some(agent.into());
    }

    pub fn has_basic_auth(&self) -> bool {
        self.basic_auth
    }

    /// Returns `(mail, token)` when basic auth is configured.
    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        self.basic_auth
            .then_some((self.mail.as_str(), self.token.as_str()))
    }

    /// Returns the token, or `None` when it is empty.
    pub fn bearer_token(&self) -> Option<&str> {
        (!self.token.is_empty()).then_some(self.token.as_str())
    }

    pub fn has_user_agent(&self) -> bool {
        self.user_agent.is_some()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authentication")
            .field("basic_auth", &self.basic_auth)
            .field("mail", &self.mail)
            .field("token", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Thread-safe handle to the [`Authentication`] of a client and its clones.
///
/// Writes are visible to requests built afterwards. A request already built
/// keeps the credentials it was built with.
#[derive(Clone, Debug, Default)]
pub struct SharedAuth {
    inner: Arc<RwLock<Authentication>>,
}

impl SharedAuth {
    pub fn new(auth: Authentication) -> Self {
        Self {
            inner: Arc::new(RwLock::new(auth)),
        }
    }

    /// Returns a copy of the current credentials.
    pub fn snapshot(&self) -> Authentication {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the credentials wholesale.
    pub fn replace(&self, auth: Authentication) {
        *self.write() = auth;
    }

    pub fn set_basic_auth(&self, mail: impl Into<String>, token: impl Into<String>) {
        self.write().set_basic_auth(mail, token);
    }

    pub fn set_bearer_token(&self, token: impl Into<String>) {
        self.write().set_bearer_token(token);
    }

    pub fn set_user_agent(&self, agent: impl Into<String>) {
        self.write().set_user_agent(agent);
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Authentication> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{Authentication, SharedAuth};

    #[test]
    fn empty_auth_reports_nothing() {
        let auth = Authentication::new();
        assert!(!auth.has_basic_auth());
        assert!(!auth.has_user_agent());
        assert_eq!(auth.basic_auth(), None);
        assert_eq!(auth.bearer_token(), None);
    }

    #[test]
    fn basic_auth_shares_token_slot() {
        let mut auth = Authentication::new();
        auth.set_basic_auth("kit@example.com", "api-token");
        assert_eq!(auth.basic_auth(), Some(("kit@example.com", "api-token")));
        assert_eq!(auth.bearer_token(), Some("api-token"));
    }

    #[test]
    fn bearer_only_does_not_enable_basic() {
        let mut auth = Authentication::new();
        auth.set_bearer_token("pat");
        assert!(!auth.has_basic_auth());
        assert_eq!(auth.bearer_token(), Some("pat"));
    }

    #[test]
    fn shared_writes_visible_to_later_snapshots() {
        let shared = SharedAuth::default();
        let before = shared.snapshot();
        let clone = shared.clone();
        clone.set_user_agent("atlassian-http-tests");

        assert!(!before.has_user_agent());
        assert_eq!(shared.snapshot().user_agent(), Some("atlassian-http-tests"));
    }

    #[test]
    fn debug_redacts_token() {
        let mut auth = Authentication::new();
        auth.set_basic_auth("kit@example.com", "secret-token");
        let debug = format!("{auth:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }
}
