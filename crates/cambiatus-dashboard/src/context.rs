//! Session and configuration threaded through the controllers.

use std::fmt;
use std::sync::Arc;

use cambiatus_claims::{Credentials, ErrorCodeTable, FeedConfig, TranslateError, Verifier};
use cambiatus_types::{Account, Symbol};

use crate::effect::AuthToken;

/// Default number of transfers shown on the dashboard.
pub const DEFAULT_TRANSFERS_PAGE_SIZE: u32 = 10;

/// Default number of notices kept before the oldest is dropped.
pub const DEFAULT_MAX_NOTICES: usize = 5;

/// The signed-in member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub account: Account,
    /// Community selected for this dashboard.
    pub community: Symbol,
    /// Bearer token for the GraphQL API.
    pub auth_token: Option<String>,
    /// Whether a signing key is unlocked locally.
    pub credentials: Credentials,
}

/// Knobs for the dashboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardConfig {
    pub feed: FeedConfig,
    pub transfers_page_size: u32,
    /// Contract account that receives `verifyclaim`.
    pub contract: Account,
    /// Public base URL of the web app, used in invite links.
    pub app_url: String,
    pub max_notices: usize,
}

impl DashboardConfig {
    /// Defaults for everything but the contract.
    pub fn new(contract: Account) -> Self {
        Self {
            feed: FeedConfig::default(),
            transfers_page_size: DEFAULT_TRANSFERS_PAGE_SIZE,
            contract,
            app_url: String::new(),
            max_notices: DEFAULT_MAX_NOTICES,
        }
    }
}

/// Everything a controller needs from its surroundings.
#[derive(Clone)]
pub struct Context {
    pub session: Session,
    pub config: DashboardConfig,
    translator: Arc<dyn TranslateError + Send + Sync>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("session", &self.session)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// A context using the built-in error code table.
    pub fn new(session: Session, config: DashboardConfig) -> Self {
        Self {
            session,
            config,
            translator: Arc::new(ErrorCodeTable::default()),
        }
    }

    /// Replace the chain error translator.
    pub fn with_translator(mut self, translator: Arc<dyn TranslateError + Send + Sync>) -> Self {
        self.translator = translator;
        self
    }

    pub fn translator(&self) -> &dyn TranslateError {
        self.translator.as_ref()
    }

    /// The member as a claim verifier.
    pub fn verifier(&self) -> Verifier {
        Verifier {
            account: self.session.account.clone(),
            contract: self.config.contract.clone(),
            credentials: self.session.credentials,
        }
    }

    /// Snapshot of the auth token for an outgoing request.
    pub fn auth(&self) -> AuthToken {
        AuthToken(self.session.auth_token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::context;

    #[test]
    fn test_verifier_reflects_session() {
        let ctx = context(Credentials::Missing);
        let verifier = ctx.verifier();
        assert_eq!(verifier.account.as_str(), "verifier1");
        assert_eq!(verifier.contract.as_str(), "cambiatus.cm");
        assert_eq!(verifier.credentials, Credentials::Missing);
    }

    #[test]
    fn test_auth_is_a_snapshot() {
        let mut ctx = context(Credentials::Cached);
        let auth = ctx.auth();
        ctx.session.auth_token = None;
        assert_eq!(auth, AuthToken(Some("token".to_string())));
        assert_eq!(ctx.auth(), AuthToken(None));
    }

    #[test]
    fn test_config_defaults() {
        let config = DashboardConfig::new("cambiatus.cm".parse().expect("account"));
        assert_eq!(config.feed, FeedConfig::default());
        assert_eq!(config.transfers_page_size, DEFAULT_TRANSFERS_PAGE_SIZE);
        assert_eq!(config.max_notices, DEFAULT_MAX_NOTICES);
    }
}
