//! Per-claim voting state.

use serde::Serialize;

use cambiatus_types::{Claim, ClaimId};

/// A loaded claim together with where the current member's vote on it
/// stands.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Arrived with a page; no vote cast yet.
    Loaded { claim: Claim },
    /// Vote submitted, awaiting the chain's answer.
    Loading { claim: Claim, approve: bool },
    /// Chain confirmed the vote. Terminal.
    Voted {
        claim: Claim,
        approved: bool,
        transaction_id: String,
    },
    /// Chain rejected the vote; the card stays visible.
    VoteFailed { claim: Claim, message: String },
}

impl ClaimStatus {
    /// Wrap a freshly loaded claim.
    pub fn loaded(claim: Claim) -> Self {
        Self::Loaded { claim }
    }

    /// The wrapped claim.
    pub fn claim(&self) -> &Claim {
        match self {
            Self::Loaded { claim }
            | Self::Loading { claim, .. }
            | Self::Voted { claim, .. }
            | Self::VoteFailed { claim, .. } => claim,
        }
    }

    pub fn id(&self) -> ClaimId {
        self.claim().id
    }

    /// Short state name used in errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Loaded { .. } => "loaded",
            Self::Loading { .. } => "loading",
            Self::Voted { .. } => "voted",
            Self::VoteFailed { .. } => "vote_failed",
        }
    }

    /// Still awaiting a successful vote from this member.
    pub fn is_pending(&self) -> bool {
        !matches!(self, Self::Voted { .. })
    }

    /// `Loaded → Loading`. Returns false from any other state.
    pub(crate) fn begin_vote(&mut self, approve: bool) -> bool {
        match self {
            Self::Loaded { claim } => {
                *self = Self::Loading {
                    claim: claim.clone(),
                    approve,
                };
                true
            }
            _ => false,
        }
    }

    /// `Loading → Voted`.
    pub(crate) fn confirm(&mut self, transaction_id: &str) -> bool {
        match self {
            Self::Loading { claim, approve } => {
                *self = Self::Voted {
                    claim: claim.clone(),
                    approved: *approve,
                    transaction_id: transaction_id.to_string(),
                };
                true
            }
            _ => false,
        }
    }

    /// `Loading → VoteFailed`.
    pub(crate) fn fail(&mut self, message: &str) -> bool {
        match self {
            Self::Loading { claim, .. } => {
                *self = Self::VoteFailed {
                    claim: claim.clone(),
                    message: message.to_string(),
                };
                true
            }
            _ => false,
        }
    }

    /// `VoteFailed → Loaded`, when the member re-opens the card.
    pub(crate) fn reopen(&mut self) -> bool {
        match self {
            Self::VoteFailed { claim, .. } => {
                *self = Self::Loaded {
                    claim: claim.clone(),
                };
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::claim;

    #[test]
    fn test_happy_path() {
        let mut status = ClaimStatus::loaded(claim(1));
        assert!(status.begin_vote(true));
        assert_eq!(status.name(), "loading");
        assert!(status.confirm("0xT1"));
        assert_eq!(
            status,
            ClaimStatus::Voted {
                claim: claim(1),
                approved: true,
                transaction_id: "0xT1".to_string(),
            }
        );
        assert!(!status.is_pending());
    }

    #[test]
    fn test_voted_never_reverts() {
        let mut status = ClaimStatus::loaded(claim(1));
        status.begin_vote(false);
        status.confirm("tx");
        assert!(!status.begin_vote(true));
        assert!(!status.fail("late"));
        assert!(!status.reopen());
        assert_eq!(status.name(), "voted");
    }

    #[test]
    fn test_failed_reopens_to_loaded() {
        let mut status = ClaimStatus::loaded(claim(2));
        status.begin_vote(true);
        assert!(status.fail("missing permission"));
        assert!(status.is_pending());
        assert!(!status.begin_vote(true));
        assert!(status.reopen());
        assert!(status.begin_vote(true));
    }

    #[test]
    fn test_second_begin_is_rejected() {
        let mut status = ClaimStatus::loaded(claim(3));
        assert!(status.begin_vote(true));
        assert!(!status.begin_vote(true));
    }

    #[test]
    fn test_serialized_tag() {
        let json = serde_json::to_value(ClaimStatus::loaded(claim(4))).expect("serialize");
        assert_eq!(json["state"], "loaded");
        assert_eq!(json["claim"]["id"], 4);
    }
}
