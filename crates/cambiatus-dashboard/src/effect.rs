//! Side-effect requests returned by the reducer.
//!
//! The reducer never performs I/O. Each effect is a self-contained request:
//! every value it needs (symbol, account, token) is copied in when the
//! effect is created, so later session changes do not leak into requests
//! already issued.

use std::fmt;

use cambiatus_claims::{PageRequest, VerificationAction};
use cambiatus_types::{Account, Symbol};

use crate::contact::Contact;

/// Bearer token captured when an effect was created.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(pub Option<String>);

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("AuthToken(<redacted>)"),
            None => f.write_str("AuthToken(None)"),
        }
    }
}

/// Work the host must perform and report back as a [`crate::Msg`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// GraphQL `community(symbol)`; answer with `Msg::CommunityLoaded`.
    QueryCommunity { symbol: Symbol, auth: AuthToken },
    /// Balance endpoint; answer with `Msg::BalancesLoaded`.
    FetchBalances { account: Account },
    /// GraphQL transfers; answer with `Msg::TransfersLoaded`.
    QueryTransfers {
        symbol: Symbol,
        first: u32,
        auth: AuthToken,
    },
    /// GraphQL claims page; answer with `Msg::ClaimPageLoaded` carrying the
    /// same request.
    QueryClaims { request: PageRequest, auth: AuthToken },
    /// Push to the chain; answer with `Msg::VoteConfirmed` or
    /// `Msg::VoteRejected`.
    SubmitVerification { action: VerificationAction },
    /// Out-of-band unlock; answer with `Msg::AuthenticationCompleted` or
    /// `Msg::AuthenticationCancelled`.
    RequestAuthentication { account: Account },
    /// GraphQL invite mutation; answer with `InviteMsg::Created`.
    CreateInvite {
        symbol: Symbol,
        inviter: Account,
        auth: AuthToken,
    },
    /// Fire and forget.
    CopyToClipboard { text: String },
    /// GraphQL contact mutation; answer with `ContactMsg::Saved`.
    SaveContact { contact: Contact, auth: AuthToken },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_redacted_in_debug() {
        let token = AuthToken(Some("secret".to_string()));
        assert_eq!(format!("{token:?}"), "AuthToken(<redacted>)");
        assert!(!format!("{:?}", Effect::CopyToClipboard { text: "x".into() }).contains("secret"));
    }
}
