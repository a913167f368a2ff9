//! # cambiatus-claims
//!
//! Claim verification: the paginated feed of claims awaiting the current
//! member's vote, and the per-claim voting state machine driven by user
//! clicks and blockchain callbacks.
//!
//! ## Modules
//!
//! - [`status`]: per-claim state (`Loaded → Loading → Voted | VoteFailed`)
//! - [`feed`]: cursor-paginated claim feed with stale-response discard
//! - [`voting`]: vote casting, confirmation, rejection, deferred auth
//! - [`translate`]: blockchain error codes to human text
//!
//! The feed owns its claim list exclusively. Every operation runs to
//! completion and returns the next request to issue, if any; nothing here
//! performs I/O.

pub mod feed;
pub mod status;
pub mod translate;
pub mod voting;

pub use feed::{ClaimFeed, FeedConfig, FeedStatus, PageRequest};
pub use status::ClaimStatus;
pub use translate::{ErrorCodeTable, TranslateError};
pub use voting::{
    Authorization, Credentials, DeferredVote, VerificationAction, Verifier, VerifyClaimData,
    VoteOutcome,
};

use cambiatus_types::ClaimId;

/// Error types for feed and voting operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimsError {
    /// No claim with this id is loaded.
    #[error("claim {0} is not loaded")]
    UnknownClaim(ClaimId),

    /// The claim is not in a state that accepts this event.
    #[error("claim {id} is {state}, cannot {event}")]
    InvalidTransition {
        /// The claim.
        id: ClaimId,
        /// Current state name.
        state: &'static str,
        /// The rejected event.
        event: &'static str,
    },

    /// A page response that no longer matches the in-flight request.
    #[error("stale page response (generation {generation}, current {current})")]
    StalePage {
        /// Generation the response was requested under.
        generation: u64,
        /// Generation of the feed now.
        current: u64,
    },

    /// The resumed vote had nothing deferred.
    #[error("no vote is waiting for authentication")]
    NothingDeferred,
}

/// Convenience result type for claim operations.
pub type Result<T> = std::result::Result<T, ClaimsError>;
