//! Claim voting state machine.
//!
//! `Loaded → Loading → Voted | VoteFailed`, with `VoteFailed → Loaded` when
//! the member re-opens the card. A vote can only be cast from `Loaded`, so
//! a second click before the chain answers is rejected and never produces a
//! second submission.
//!
//! Casting requires a cached signing key. Without one the vote is parked as
//! a [`DeferredVote`] and replayed verbatim once authentication completes.
//!
//! Every submitted vote is also recorded on the feed until the chain
//! answers, and confirmed votes stay recorded. Answers for claims that a
//! restart removed from the list settle against that record.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cambiatus_types::{Account, ChainError, Claim, ClaimId};

use crate::feed::{ClaimFeed, PageRequest};
use crate::status::ClaimStatus;
use crate::translate::TranslateError;
use crate::{ClaimsError, Result};

/// Contract action that records a verifier's vote.
pub const VERIFY_CLAIM_ACTION: &str = "verifyclaim";

/// Permission the verifier signs with.
pub const ACTIVE_PERMISSION: &str = "active";

/// Whether the acting member holds a usable signing key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Credentials {
    Cached,
    Missing,
}

/// The member voting and the contract they vote on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verifier {
    pub account: Account,
    pub contract: Account,
    pub credentials: Credentials,
}

/// A vote waiting for authentication.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredVote {
    pub claim_id: ClaimId,
    pub approve: bool,
}

/// A vote the member submitted, as remembered by the feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum CastVote {
    InFlight { approve: bool },
    Confirmed { approved: bool, transaction_id: String },
}

impl CastVote {
    /// The state a re-listed claim takes.
    pub(crate) fn status(&self, claim: Claim) -> ClaimStatus {
        match self {
            Self::InFlight { approve } => ClaimStatus::Loading {
                claim,
                approve: *approve,
            },
            Self::Confirmed {
                approved,
                transaction_id,
            } => ClaimStatus::Voted {
                claim,
                approved: *approved,
                transaction_id: transaction_id.clone(),
            },
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::InFlight { .. } => "loading",
            Self::Confirmed { .. } => "voted",
        }
    }
}

/// Signing authority of an action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    pub actor: Account,
    pub permission: String,
}

/// Payload of `verifyclaim`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyClaimData {
    pub claim_id: ClaimId,
    pub verifier: Account,
    /// 1 approves, 0 rejects.
    pub vote: u8,
}

/// The action bundle handed to the transaction bridge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationAction {
    pub account: Account,
    pub name: String,
    pub authorization: Vec<Authorization>,
    pub data: VerifyClaimData,
}

impl VerificationAction {
    /// Build the `verifyclaim` action for one vote.
    pub fn verify_claim(verifier: &Verifier, claim_id: ClaimId, approve: bool) -> Self {
        Self {
            account: verifier.contract.clone(),
            name: VERIFY_CLAIM_ACTION.to_string(),
            authorization: vec![Authorization {
                actor: verifier.account.clone(),
                permission: ACTIVE_PERMISSION.to_string(),
            }],
            data: VerifyClaimData {
                claim_id,
                verifier: verifier.account.clone(),
                vote: u8::from(approve),
            },
        }
    }

    pub fn claim_id(&self) -> ClaimId {
        self.data.claim_id
    }

    pub fn approves(&self) -> bool {
        self.data.vote == 1
    }
}

/// What the caller must do after a vote was cast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Push this action to the chain; the claim is now `Loading`.
    Submit(VerificationAction),
    /// Run the out-of-band authentication step, then call
    /// [`ClaimFeed::resume_after_authentication`].
    AuthenticationRequired(DeferredVote),
}

impl ClaimFeed {
    /// Cast a vote on a loaded claim.
    ///
    /// # Errors
    ///
    /// - [`ClaimsError::UnknownClaim`] if the claim is not in the feed
    /// - [`ClaimsError::InvalidTransition`] unless the claim is `Loaded`
    pub fn cast_vote(
        &mut self,
        claim_id: ClaimId,
        approve: bool,
        verifier: &Verifier,
    ) -> Result<VoteOutcome> {
        let status = self.get_mut(claim_id)?;
        if !matches!(status, ClaimStatus::Loaded { .. }) {
            debug!(%claim_id, state = status.name(), "vote ignored");
            return Err(ClaimsError::InvalidTransition {
                id: claim_id,
                state: status.name(),
                event: "cast vote",
            });
        }

        if verifier.credentials == Credentials::Missing {
            let deferred = DeferredVote { claim_id, approve };
            info!(%claim_id, "vote deferred until authentication");
            self.deferred = Some(deferred);
            return Ok(VoteOutcome::AuthenticationRequired(deferred));
        }

        status.begin_vote(approve);
        self.votes.insert(claim_id, CastVote::InFlight { approve });
        info!(%claim_id, approve, "vote submitted");
        Ok(VoteOutcome::Submit(VerificationAction::verify_claim(
            verifier, claim_id, approve,
        )))
    }

    /// Replay the deferred vote with the same arguments.
    ///
    /// # Errors
    ///
    /// - [`ClaimsError::NothingDeferred`] if no vote was waiting
    /// - any error of [`ClaimFeed::cast_vote`]
    pub fn resume_after_authentication(&mut self, verifier: &Verifier) -> Result<VoteOutcome> {
        let deferred = self.deferred.take().ok_or(ClaimsError::NothingDeferred)?;
        self.cast_vote(deferred.claim_id, deferred.approve, verifier)
    }

    /// Forget the deferred vote.
    pub fn cancel_authentication(&mut self) -> Option<DeferredVote> {
        self.deferred.take()
    }

    /// The chain accepted the vote. Returns the page request that tops the
    /// feed back up, when the server has more claims.
    ///
    /// A claim no longer listed (the feed restarted meanwhile) only has its
    /// recorded vote settled; nothing is fetched for it.
    ///
    /// # Errors
    ///
    /// - [`ClaimsError::UnknownClaim`] if no vote on the claim is known
    /// - [`ClaimsError::InvalidTransition`] unless the vote is in flight
    pub fn on_vote_confirmed(
        &mut self,
        claim_id: ClaimId,
        transaction_id: &str,
    ) -> Result<Option<PageRequest>> {
        let approved = self.take_in_flight(claim_id, "confirm vote")?;
        self.votes.insert(
            claim_id,
            CastVote::Confirmed {
                approved,
                transaction_id: transaction_id.to_string(),
            },
        );
        let Some(status) = self.claims.iter_mut().find(|status| status.id() == claim_id) else {
            info!(%claim_id, transaction_id, "vote confirmed for unlisted claim");
            return Ok(None);
        };
        status.confirm(transaction_id);
        info!(%claim_id, transaction_id, "vote confirmed");
        Ok(self.request_top_up())
    }

    /// The chain rejected the vote. Returns the message shown to the member.
    ///
    /// # Errors
    ///
    /// - [`ClaimsError::UnknownClaim`] if no vote on the claim is known
    /// - [`ClaimsError::InvalidTransition`] unless the vote is in flight
    pub fn on_vote_rejected(
        &mut self,
        claim_id: ClaimId,
        error: &ChainError,
        translator: &dyn TranslateError,
    ) -> Result<String> {
        self.take_in_flight(claim_id, "reject vote")?;
        let message = translator.translate(error);
        if let Some(status) = self.claims.iter_mut().find(|status| status.id() == claim_id) {
            status.fail(&message);
        }
        warn!(%claim_id, code = ?error.code, %message, "vote rejected");
        Ok(message)
    }

    /// Remove the in-flight record of a vote, returning its approve flag.
    fn take_in_flight(&mut self, claim_id: ClaimId, event: &'static str) -> Result<bool> {
        match self.votes.get(&claim_id) {
            Some(CastVote::InFlight { approve }) => {
                let approve = *approve;
                self.votes.remove(&claim_id);
                Ok(approve)
            }
            Some(vote) => Err(ClaimsError::InvalidTransition {
                id: claim_id,
                state: vote.name(),
                event,
            }),
            None => match self.get(claim_id) {
                Some(status) => Err(ClaimsError::InvalidTransition {
                    id: claim_id,
                    state: status.name(),
                    event,
                }),
                None => Err(ClaimsError::UnknownClaim(claim_id)),
            },
        }
    }

    /// Votes submitted and not yet answered by the chain.
    pub fn votes_in_flight(&self) -> usize {
        self.votes
            .values()
            .filter(|vote| matches!(vote, CastVote::InFlight { .. }))
            .count()
    }

    /// Re-open a failed claim so it can be voted again.
    ///
    /// # Errors
    ///
    /// - [`ClaimsError::UnknownClaim`] if the claim is not in the feed
    /// - [`ClaimsError::InvalidTransition`] unless the claim is `VoteFailed`
    pub fn reopen(&mut self, claim_id: ClaimId) -> Result<()> {
        let status = self.get_mut(claim_id)?;
        if !status.reopen() {
            return Err(ClaimsError::InvalidTransition {
                id: claim_id,
                state: status.name(),
                event: "reopen",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedConfig;
    use crate::fixtures::page;
    use crate::translate::ErrorCodeTable;
    use crate::ClaimStatus;
    use cambiatus_types::{Cursor, Direction};

    fn verifier(credentials: Credentials) -> Verifier {
        Verifier {
            account: "verifier1".parse().expect("account"),
            contract: "cambiatus.cm".parse().expect("account"),
            credentials,
        }
    }

    fn loaded_feed(ids: &[u64], has_next_page: bool) -> ClaimFeed {
        let mut feed = ClaimFeed::new(
            "4,BES".parse().expect("symbol"),
            FeedConfig {
                first_page_size: 5,
                next_page_size: 1,
            },
        );
        let request = feed.start(Direction::Desc);
        feed.on_page(&request, Ok(page(ids, Some("abc"), has_next_page)))
            .expect("page");
        feed
    }

    #[test]
    fn test_cast_vote_builds_action() {
        let mut feed = loaded_feed(&[42], false);
        let outcome = feed
            .cast_vote(ClaimId(42), true, &verifier(Credentials::Cached))
            .expect("vote");
        let VoteOutcome::Submit(action) = outcome else {
            unreachable!("expected submission, got {outcome:?}");
        };
        assert_eq!(action.name, VERIFY_CLAIM_ACTION);
        assert_eq!(action.account.as_str(), "cambiatus.cm");
        assert_eq!(action.authorization[0].actor.as_str(), "verifier1");
        assert_eq!(action.data.vote, 1);
        assert!(action.approves());
        assert_eq!(feed.get(ClaimId(42)).map(ClaimStatus::name), Some("loading"));
    }

    #[test]
    fn test_double_click_submits_once() {
        let mut feed = loaded_feed(&[1, 2], false);
        let cached = verifier(Credentials::Cached);
        assert!(feed.cast_vote(ClaimId(1), false, &cached).is_ok());
        let second = feed.cast_vote(ClaimId(1), false, &cached);
        assert_eq!(
            second,
            Err(ClaimsError::InvalidTransition {
                id: ClaimId(1),
                state: "loading",
                event: "cast vote",
            })
        );
    }

    #[test]
    fn test_unknown_claim() {
        let mut feed = loaded_feed(&[1], false);
        assert_eq!(
            feed.cast_vote(ClaimId(9), true, &verifier(Credentials::Cached)),
            Err(ClaimsError::UnknownClaim(ClaimId(9)))
        );
    }

    #[test]
    fn test_missing_credentials_defers_and_replays() {
        let mut feed = loaded_feed(&[7], false);
        let outcome = feed
            .cast_vote(ClaimId(7), false, &verifier(Credentials::Missing))
            .expect("deferred");
        assert_eq!(
            outcome,
            VoteOutcome::AuthenticationRequired(DeferredVote {
                claim_id: ClaimId(7),
                approve: false,
            })
        );
        assert_eq!(feed.get(ClaimId(7)).map(ClaimStatus::name), Some("loaded"));

        let replayed = feed
            .resume_after_authentication(&verifier(Credentials::Cached))
            .expect("replayed");
        let VoteOutcome::Submit(action) = replayed else {
            unreachable!("expected submission, got {replayed:?}");
        };
        assert_eq!(action.claim_id(), ClaimId(7));
        assert!(!action.approves());
        assert_eq!(
            feed.resume_after_authentication(&verifier(Credentials::Cached)),
            Err(ClaimsError::NothingDeferred)
        );
    }

    #[test]
    fn test_cancelled_authentication_drops_vote() {
        let mut feed = loaded_feed(&[7], false);
        feed.cast_vote(ClaimId(7), true, &verifier(Credentials::Missing))
            .expect("deferred");
        assert!(feed.cancel_authentication().is_some());
        assert!(feed.deferred().is_none());
    }

    #[test]
    fn test_confirmation_tops_up_once() {
        let mut feed = loaded_feed(&[1, 2, 3, 4, 5], true);
        feed.cast_vote(ClaimId(3), true, &verifier(Credentials::Cached))
            .expect("vote");
        let request = feed
            .on_vote_confirmed(ClaimId(3), "0xT1")
            .expect("confirmed")
            .expect("top-up");
        assert_eq!(request.after, Some(Cursor::from("abc")));
        assert_eq!(request.first, 1);
        assert_eq!(feed.pending_count(), 4);

        // A late duplicate confirmation changes nothing.
        assert!(feed.on_vote_confirmed(ClaimId(3), "0xT1").is_err());
        assert!(feed.fetch_next_page().is_none(), "top-up still in flight");
    }

    #[test]
    fn test_rejection_marks_only_that_claim() {
        let mut feed = loaded_feed(&[1, 2], false);
        let cached = verifier(Credentials::Cached);
        feed.cast_vote(ClaimId(1), true, &cached).expect("vote");
        feed.cast_vote(ClaimId(2), true, &cached).expect("vote");

        let error = ChainError {
            code: Some(3_090_003),
            name: Some("unsatisfied_authorization".to_string()),
            message: "missing authority".to_string(),
            details: Vec::new(),
        };
        let message = feed
            .on_vote_rejected(ClaimId(1), &error, &ErrorCodeTable::default())
            .expect("rejected");
        assert!(!message.is_empty());
        assert_eq!(
            feed.get(ClaimId(1)).map(ClaimStatus::name),
            Some("vote_failed")
        );
        assert_eq!(feed.get(ClaimId(2)).map(ClaimStatus::name), Some("loading"));
        assert_eq!(feed.pending_count(), 2);
    }

    #[test]
    fn test_reopen_allows_retry() {
        let mut feed = loaded_feed(&[1], false);
        let cached = verifier(Credentials::Cached);
        feed.cast_vote(ClaimId(1), true, &cached).expect("vote");
        feed.on_vote_rejected(ClaimId(1), &ChainError::message("no"), &ErrorCodeTable::default())
            .expect("rejected");
        assert!(feed.cast_vote(ClaimId(1), true, &cached).is_err());
        feed.reopen(ClaimId(1)).expect("reopened");
        assert!(matches!(
            feed.cast_vote(ClaimId(1), true, &cached),
            Ok(VoteOutcome::Submit(_))
        ));
        assert!(feed.reopen(ClaimId(1)).is_err());
    }

    #[test]
    fn test_vote_stays_locked_across_restart() {
        let mut feed = loaded_feed(&[42, 43], false);
        let cached = verifier(Credentials::Cached);
        feed.cast_vote(ClaimId(42), true, &cached).expect("vote");

        let request = feed.toggle_direction();
        feed.on_page(&request, Ok(page(&[43, 42], Some("d"), false)))
            .expect("page");
        assert!(matches!(
            feed.get(ClaimId(42)),
            Some(ClaimStatus::Loading { approve: true, .. })
        ));
        assert_eq!(
            feed.cast_vote(ClaimId(42), true, &cached),
            Err(ClaimsError::InvalidTransition {
                id: ClaimId(42),
                state: "loading",
                event: "cast vote",
            })
        );
        assert_eq!(feed.votes_in_flight(), 1);

        feed.on_vote_confirmed(ClaimId(42), "0xT1").expect("confirmed");
        assert_eq!(feed.get(ClaimId(42)).map(ClaimStatus::name), Some("voted"));
        assert_eq!(feed.votes_in_flight(), 0);
    }

    #[test]
    fn test_answers_for_unlisted_claims() {
        let mut feed = loaded_feed(&[1, 2], true);
        let cached = verifier(Credentials::Cached);
        feed.cast_vote(ClaimId(1), true, &cached).expect("vote");
        feed.cast_vote(ClaimId(2), false, &cached).expect("vote");

        let request = feed.toggle_direction();
        feed.on_page(&request, Ok(page(&[3], Some("e"), true)))
            .expect("page");
        assert_eq!(feed.on_vote_confirmed(ClaimId(1), "0xA"), Ok(None));
        let message = feed
            .on_vote_rejected(ClaimId(2), &ChainError::message("no"), &ErrorCodeTable::default())
            .expect("rejected");
        assert_eq!(message, "no");
        assert_eq!(feed.votes_in_flight(), 0);

        // Re-listed later: the confirmed vote shows, the rejected one is free.
        let next = feed.fetch_next_page().expect("next page");
        feed.on_page(&next, Ok(page(&[1, 2], Some("f"), false)))
            .expect("page");
        assert_eq!(feed.get(ClaimId(1)).map(ClaimStatus::name), Some("voted"));
        assert_eq!(feed.get(ClaimId(2)).map(ClaimStatus::name), Some("loaded"));
        assert_eq!(
            feed.on_vote_confirmed(ClaimId(1), "0xA"),
            Err(ClaimsError::InvalidTransition {
                id: ClaimId(1),
                state: "voted",
                event: "confirm vote",
            })
        );
        assert_eq!(
            feed.on_vote_confirmed(ClaimId(9), "0xB"),
            Err(ClaimsError::UnknownClaim(ClaimId(9)))
        );
    }
}
