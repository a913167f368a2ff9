//! Inputs to the dashboard reducer: user actions and request completions.

use cambiatus_claims::PageRequest;
use cambiatus_types::{
    Balance, ChainError, ClaimId, ClaimPage, Community, Direction, TransferPage, TransportError,
};

use crate::contact::ContactMsg;
use crate::invite::InviteMsg;

/// One event, processed to completion before the next.
#[derive(Clone, Debug, PartialEq)]
pub enum Msg {
    CommunityLoaded(Result<Community, TransportError>),
    BalancesLoaded(Result<Vec<Balance>, TransportError>),
    TransfersLoaded(Result<TransferPage, TransportError>),
    ClaimPageLoaded {
        request: PageRequest,
        result: Result<ClaimPage, TransportError>,
    },
    VoteClicked {
        claim_id: ClaimId,
        approve: bool,
    },
    VoteConfirmed {
        claim_id: ClaimId,
        transaction_id: String,
    },
    VoteRejected {
        claim_id: ClaimId,
        error: ChainError,
    },
    AuthenticationCompleted,
    AuthenticationCancelled,
    DirectionSelected(Direction),
    DirectionToggled,
    LoadMoreClaims,
    ReopenClaim(ClaimId),
    Invite(InviteMsg),
    Contact(ContactMsg),
    DismissNotice(usize),
    Reload,
}
