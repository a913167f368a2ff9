//! The dashboard controller.
//!
//! Four resources load independently: community, transfers, balances and
//! the claim feed. The last two need the community first (its symbol and
//! whether objectives are enabled); until it resolves they sit in
//! [`Dependent::Waiting`] and render as loading. A failed community blocks
//! them; any other failure stays in its own slot.
//!
//! A reload retires the claim feed instead of dropping it. The next feed
//! inherits its generation and unanswered votes, and chain answers that
//! arrive in between still settle against it.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, info, warn};

use cambiatus_claims::{ClaimFeed, ClaimsError, Credentials, PageRequest, VoteOutcome};
use cambiatus_types::{Balance, Community, Direction, RemoteResource, TransferPage, TransportError};

use crate::contact::ContactModal;
use crate::context::Context;
use crate::effect::Effect;
use crate::invite::{InviteModal, InviteMsg};
use crate::msg::Msg;

/// A resource that cannot be requested before another one resolves.
#[derive(Clone, Debug, PartialEq)]
pub enum Dependent<R> {
    /// Prerequisite still loading.
    Waiting,
    /// Prerequisite failed or the feature is switched off.
    Blocked,
    Ready(R),
}

impl<R> Dependent<R> {
    pub fn ready(&self) -> Option<&R> {
        match self {
            Self::Ready(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn ready_mut(&mut self) -> Option<&mut R> {
        match self {
            Self::Ready(resource) => Some(resource),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A user-visible message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

type Resource<T> = RemoteResource<TransportError, T>;

/// Dashboard state. Owns every slot; nothing else mutates them.
#[derive(Debug)]
pub struct Dashboard {
    pub(crate) ctx: Context,
    pub(crate) community: Resource<Community>,
    pub(crate) balances: Dependent<Resource<Vec<Balance>>>,
    pub(crate) transfers: Resource<TransferPage>,
    pub(crate) claims: Dependent<ClaimFeed>,
    /// Feed replaced by a reload, until the next feed takes it over.
    pub(crate) retired: Option<ClaimFeed>,
    pub(crate) invite: InviteModal,
    pub(crate) contact: ContactModal,
    pub(crate) notices: VecDeque<Notice>,
}

impl Dashboard {
    /// Enter the dashboard. Community and transfers are requested at once;
    /// balances and claims wait for the community.
    pub fn init(ctx: Context) -> (Self, Vec<Effect>) {
        let mut dashboard = Self {
            ctx,
            community: RemoteResource::NotAsked,
            balances: Dependent::Waiting,
            transfers: RemoteResource::NotAsked,
            claims: Dependent::Waiting,
            retired: None,
            invite: InviteModal::default(),
            contact: ContactModal::default(),
            notices: VecDeque::new(),
        };
        let effects = dashboard.load();
        (dashboard, effects)
    }

    fn load(&mut self) -> Vec<Effect> {
        let query_community = self.community.start_loading();
        let query_transfers = self.transfers.start_loading();
        self.balances = Dependent::Waiting;
        if let Dependent::Ready(mut feed) = std::mem::replace(&mut self.claims, Dependent::Waiting)
        {
            feed.retire();
            self.retired = Some(feed);
        }

        let session = &self.ctx.session;
        info!(account = %session.account, community = %session.community, "dashboard loading");
        // A query still in flight answers the reload as well.
        let mut effects = Vec::new();
        if query_community {
            effects.push(Effect::QueryCommunity {
                symbol: session.community.clone(),
                auth: self.ctx.auth(),
            });
        }
        if query_transfers {
            effects.push(Effect::QueryTransfers {
                symbol: session.community.clone(),
                first: self.ctx.config.transfers_page_size,
                auth: self.ctx.auth(),
            });
        }
        effects
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn community(&self) -> &Resource<Community> {
        &self.community
    }

    pub fn balances(&self) -> &Dependent<Resource<Vec<Balance>>> {
        &self.balances
    }

    pub fn transfers(&self) -> &Resource<TransferPage> {
        &self.transfers
    }

    pub fn claims(&self) -> &Dependent<ClaimFeed> {
        &self.claims
    }

    pub fn invite(&self) -> &InviteModal {
        &self.invite
    }

    pub fn contact(&self) -> &ContactModal {
        &self.contact
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    /// Apply one message and return the effects it requires.
    pub fn update(&mut self, msg: Msg) -> Vec<Effect> {
        match msg {
            Msg::CommunityLoaded(result) => self.on_community(result),
            Msg::BalancesLoaded(result) => {
                let applied = match self.balances.ready_mut() {
                    Some(balances) => balances.resolve(result),
                    None => false,
                };
                if !applied {
                    debug!("balances response ignored");
                }
                Vec::new()
            }
            Msg::TransfersLoaded(result) => {
                if !self.transfers.resolve(result) {
                    debug!("transfers response ignored");
                }
                Vec::new()
            }
            Msg::ClaimPageLoaded { request, result } => {
                let Some(feed) = self.claims.ready_mut() else {
                    debug!("claim page without feed ignored");
                    return Vec::new();
                };
                let next = feed.on_page(&request, result);
                self.claims_effect(next)
            }
            Msg::VoteClicked { claim_id, approve } => {
                let verifier = self.ctx.verifier();
                let Some(feed) = self.claims.ready_mut() else {
                    return Vec::new();
                };
                let outcome = feed.cast_vote(claim_id, approve, &verifier);
                self.vote_effect(outcome)
            }
            Msg::VoteConfirmed {
                claim_id,
                transaction_id,
            } => {
                let Some(feed) = self.vote_feed() else {
                    return Vec::new();
                };
                let next = feed.on_vote_confirmed(claim_id, &transaction_id);
                if next.is_ok() {
                    self.push_notice(NoticeKind::Success, "Thanks for verifying this claim");
                }
                self.claims_effect(next)
            }
            Msg::VoteRejected { claim_id, error } => {
                let translator = self.ctx.translator();
                let feed = match &mut self.claims {
                    Dependent::Ready(feed) => Some(feed),
                    _ => self.retired.as_mut(),
                };
                let Some(feed) = feed else {
                    return Vec::new();
                };
                match feed.on_vote_rejected(claim_id, &error, translator) {
                    Ok(message) => self.push_notice(NoticeKind::Error, message),
                    Err(err) => debug!(error = %err, "vote rejection ignored"),
                }
                Vec::new()
            }
            Msg::AuthenticationCompleted => {
                self.ctx.session.credentials = Credentials::Cached;
                let verifier = self.ctx.verifier();
                let Some(feed) = self.claims.ready_mut() else {
                    return Vec::new();
                };
                let outcome = feed.resume_after_authentication(&verifier);
                self.vote_effect(outcome)
            }
            Msg::AuthenticationCancelled => {
                if let Some(feed) = self.claims.ready_mut() {
                    if let Some(deferred) = feed.cancel_authentication() {
                        info!(claim_id = %deferred.claim_id, "deferred vote dropped");
                    }
                }
                Vec::new()
            }
            Msg::DirectionSelected(direction) => {
                let request = self
                    .claims
                    .ready_mut()
                    .and_then(|feed| feed.set_direction(direction));
                self.claims_effect(Ok(request))
            }
            Msg::DirectionToggled => {
                let request = self.claims.ready_mut().map(ClaimFeed::toggle_direction);
                self.claims_effect(Ok(request))
            }
            Msg::LoadMoreClaims => {
                let request = self.claims.ready_mut().and_then(ClaimFeed::fetch_next_page);
                self.claims_effect(Ok(request))
            }
            Msg::ReopenClaim(claim_id) => {
                if let Some(feed) = self.claims.ready_mut() {
                    if let Err(err) = feed.reopen(claim_id) {
                        debug!(error = %err, "reopen ignored");
                    }
                }
                Vec::new()
            }
            Msg::Invite(msg) => {
                let copying = msg == InviteMsg::Copy;
                let effects = self.invite.update(msg, &self.ctx);
                if copying && !effects.is_empty() {
                    self.push_notice(NoticeKind::Success, "Invite link copied");
                }
                effects
            }
            Msg::Contact(msg) => self.contact.update(msg, &self.ctx),
            Msg::DismissNotice(index) => {
                if self.notices.remove(index).is_none() {
                    debug!(index, "no notice to dismiss");
                }
                Vec::new()
            }
            Msg::Reload => self.load(),
        }
    }

    fn on_community(&mut self, result: Result<Community, TransportError>) -> Vec<Effect> {
        if !self.community.resolve(result) {
            debug!("community response ignored");
            return Vec::new();
        }

        let community = match &self.community {
            RemoteResource::Success(community) => community.clone(),
            RemoteResource::Failure(err) => {
                warn!(error = %err, "community failed; balances and claims blocked");
                self.balances = Dependent::Blocked;
                self.claims = Dependent::Blocked;
                return Vec::new();
            }
            RemoteResource::NotAsked | RemoteResource::Loading => return Vec::new(),
        };

        let mut effects = vec![Effect::FetchBalances {
            account: self.ctx.session.account.clone(),
        }];
        self.balances = Dependent::Ready(RemoteResource::Loading);

        if community.has_objectives {
            let mut feed = ClaimFeed::new(community.symbol.clone(), self.ctx.config.feed);
            if let Some(previous) = self.retired.take() {
                feed.inherit(previous);
            }
            let request = feed.start(Direction::default());
            self.claims = Dependent::Ready(feed);
            effects.push(self.query_claims(request));
        } else {
            info!(community = %community.symbol, "objectives disabled; no claim feed");
            self.claims = Dependent::Blocked;
        }
        effects
    }

    /// The feed chain answers settle against: the live one, else the one a
    /// reload retired.
    fn vote_feed(&mut self) -> Option<&mut ClaimFeed> {
        match &mut self.claims {
            Dependent::Ready(feed) => Some(feed),
            _ => self.retired.as_mut(),
        }
    }

    fn query_claims(&self, request: PageRequest) -> Effect {
        Effect::QueryClaims {
            request,
            auth: self.ctx.auth(),
        }
    }

    fn claims_effect(&self, next: cambiatus_claims::Result<Option<PageRequest>>) -> Vec<Effect> {
        match next {
            Ok(Some(request)) => vec![self.query_claims(request)],
            Ok(None) => Vec::new(),
            Err(err) => {
                debug!(error = %err, "claim event ignored");
                Vec::new()
            }
        }
    }

    fn vote_effect(&self, outcome: cambiatus_claims::Result<VoteOutcome>) -> Vec<Effect> {
        match outcome {
            Ok(VoteOutcome::Submit(action)) => vec![Effect::SubmitVerification { action }],
            Ok(VoteOutcome::AuthenticationRequired(_)) => vec![Effect::RequestAuthentication {
                account: self.ctx.session.account.clone(),
            }],
            Err(ClaimsError::NothingDeferred) => Vec::new(),
            Err(err) => {
                debug!(error = %err, "vote ignored");
                Vec::new()
            }
        }
    }

    fn push_notice(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.notices.push_back(Notice {
            kind,
            text: text.into(),
        });
        while self.notices.len() > self.ctx.config.max_notices {
            self.notices.pop_front();
        }
    }
}
