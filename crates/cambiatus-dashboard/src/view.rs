//! Per-slot view model.
//!
//! Every slot is computed from its own resource only, so a failure shows
//! up where it happened and nowhere else.

use serde::Serialize;

use cambiatus_claims::{ClaimFeed, ClaimStatus, FeedStatus};
use cambiatus_types::{
    Account, Asset, ClaimId, Community, Direction, RemoteResource, Symbol, TransportError,
};

use crate::contact::{Contact, ContactKind, ContactModal};
use crate::dashboard::{Dashboard, Dependent, Notice};
use crate::invite::InviteModal;

/// State of one slot on the page.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Section<T> {
    Loading,
    Ready(T),
    /// The slot's own request failed.
    Error(String),
    /// A prerequisite failed or the feature is off for this community.
    Unavailable,
}

impl<T> Section<T> {
    fn from_resource<U>(
        resource: &RemoteResource<TransportError, U>,
        f: impl FnOnce(&U) -> T,
    ) -> Self {
        match resource {
            RemoteResource::NotAsked | RemoteResource::Loading => Self::Loading,
            RemoteResource::Success(value) => Self::Ready(f(value)),
            RemoteResource::Failure(err) => Self::Error(err.to_string()),
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TransferView {
    pub id: u64,
    /// The other side of the transfer.
    pub counterparty: Account,
    pub amount: Asset,
    pub incoming: bool,
    pub memo: Option<String>,
    pub created_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CardState {
    Open,
    Voting { approve: bool },
    Failed { message: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClaimCard {
    pub id: ClaimId,
    pub claimer: String,
    pub action: String,
    pub objective: String,
    pub reward: Asset,
    pub created_at: String,
    #[serde(flatten)]
    pub state: CardState,
}

impl ClaimCard {
    fn from_status(status: &ClaimStatus) -> Option<Self> {
        let state = match status {
            ClaimStatus::Loaded { .. } => CardState::Open,
            ClaimStatus::Loading { approve, .. } => CardState::Voting { approve: *approve },
            ClaimStatus::VoteFailed { message, .. } => CardState::Failed {
                message: message.clone(),
            },
            ClaimStatus::Voted { .. } => return None,
        };
        let claim = status.claim();
        Some(Self {
            id: claim.id,
            claimer: claim.claimer.display_name().to_string(),
            action: claim.action.description.clone(),
            objective: claim.action.objective.description.clone(),
            reward: claim.verifier_reward.clone(),
            created_at: claim.created_at.clone(),
            state,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClaimsView {
    pub direction: Direction,
    /// Claims awaiting this member's vote, in feed order.
    pub cards: Vec<ClaimCard>,
    pub loading_more: bool,
    /// A later page failed; earlier cards stay visible.
    pub error: Option<String>,
    pub can_load_more: bool,
}

impl ClaimsView {
    fn section(feed: &ClaimFeed) -> Section<Self> {
        let error = match feed.status() {
            FeedStatus::Idle | FeedStatus::Loading => return Section::Loading,
            FeedStatus::Failed(err) if feed.claims().is_empty() => {
                return Section::Error(err.to_string())
            }
            FeedStatus::Failed(err) => Some(err.to_string()),
            FeedStatus::LoadingMore | FeedStatus::Loaded => None,
        };
        Section::Ready(Self {
            direction: feed.direction(),
            cards: feed.pending().filter_map(ClaimCard::from_status).collect(),
            loading_more: *feed.status() == FeedStatus::LoadingMore,
            error,
            can_load_more: feed.in_flight().is_none() && feed.page_info().next_cursor().is_some(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InviteView {
    pub link: Section<String>,
    pub copied: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ContactView {
    Editing {
        kind: ContactKind,
        value: String,
        error: Option<String>,
    },
    Submitting {
        contact: Contact,
    },
    Saved {
        contact: Contact,
        url: String,
    },
    Failed {
        kind: ContactKind,
        value: String,
        message: String,
    },
}

/// Everything the page shows, slot by slot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardView {
    pub community: Section<Community>,
    pub balance: Section<Asset>,
    pub transfers: Section<Vec<TransferView>>,
    pub claims: Section<ClaimsView>,
    pub invite: Option<InviteView>,
    pub contact: Option<ContactView>,
    pub notices: Vec<Notice>,
}

impl Dashboard {
    /// Render whatever subset of resources has resolved.
    pub fn view(&self) -> DashboardView {
        DashboardView {
            community: Section::from_resource(&self.community, Community::clone),
            balance: self.balance_section(),
            transfers: self.transfers_section(),
            claims: match &self.claims {
                Dependent::Waiting => Section::Loading,
                Dependent::Blocked => Section::Unavailable,
                Dependent::Ready(feed) => ClaimsView::section(feed),
            },
            invite: self.invite_view(),
            contact: self.contact_view(),
            notices: self.notices.iter().cloned().collect(),
        }
    }

    fn balance_section(&self) -> Section<Asset> {
        let balances = match &self.balances {
            Dependent::Waiting => return Section::Loading,
            Dependent::Blocked => return Section::Unavailable,
            Dependent::Ready(balances) => balances,
        };
        let symbol: &Symbol = self
            .community
            .success()
            .map_or(&self.ctx.session.community, |community| &community.symbol);
        Section::from_resource(balances, |balances| {
            balances
                .iter()
                .find(|balance| balance.symbol() == symbol)
                .map_or_else(|| Asset::zero(symbol.clone()), |balance| balance.asset.clone())
        })
    }

    fn transfers_section(&self) -> Section<Vec<TransferView>> {
        let me = &self.ctx.session.account;
        Section::from_resource(&self.transfers, |page| {
            page.newest_first()
                .into_iter()
                .map(|transfer| {
                    let incoming = &transfer.to == me;
                    TransferView {
                        id: transfer.id,
                        counterparty: if incoming { transfer.from } else { transfer.to },
                        amount: transfer.amount,
                        incoming,
                        memo: transfer.memo,
                        created_at: transfer.created_at,
                    }
                })
                .collect()
        })
    }

    fn invite_view(&self) -> Option<InviteView> {
        match &self.invite {
            InviteModal::Closed => None,
            InviteModal::Open { link, copied } => Some(InviteView {
                link: Section::from_resource(link, |invite| invite.url.clone()),
                copied: *copied,
            }),
        }
    }

    fn contact_view(&self) -> Option<ContactView> {
        Some(match &self.contact {
            ContactModal::Closed => return None,
            ContactModal::Editing { form, error } => ContactView::Editing {
                kind: form.kind,
                value: form.value.clone(),
                error: error.as_ref().map(ToString::to_string),
            },
            ContactModal::Submitting { contact, .. } => ContactView::Submitting {
                contact: contact.clone(),
            },
            ContactModal::Saved(contact) => ContactView::Saved {
                contact: contact.clone(),
                url: contact.url(),
            },
            ContactModal::Failed { form, message } => ContactView::Failed {
                kind: form.kind,
                value: form.value.clone(),
                message: message.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{balance, community, context, page};
    use crate::msg::Msg;
    use crate::Effect;
    use cambiatus_claims::Credentials;
    use cambiatus_types::{Transfer, TransferPage};

    fn error() -> TransportError {
        TransportError::Http {
            status: 502,
            message: "bad gateway".to_string(),
        }
    }

    fn claims_request(effects: Vec<Effect>) -> cambiatus_claims::PageRequest {
        effects
            .into_iter()
            .find_map(|effect| match effect {
                Effect::QueryClaims { request, .. } => Some(request),
                _ => None,
            })
            .expect("claims requested")
    }

    fn transfer(id: u64, from: &str, to: &str, created_at: &str) -> Transfer {
        Transfer {
            id,
            from: from.parse().expect("account"),
            to: to.parse().expect("account"),
            amount: "1.0000 BES".parse().expect("asset"),
            memo: None,
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn test_initial_view_is_loading_everywhere() {
        let (dashboard, _) = Dashboard::init(context(Credentials::Cached));
        let view = dashboard.view();
        assert_eq!(view.community, Section::Loading);
        assert_eq!(view.balance, Section::Loading);
        assert_eq!(view.transfers, Section::Loading);
        assert_eq!(view.claims, Section::Loading);
        assert!(view.invite.is_none());
        assert!(view.contact.is_none());
    }

    #[test]
    fn test_balance_failure_stays_in_its_slot() {
        let (mut dashboard, _) = Dashboard::init(context(Credentials::Cached));
        let effects = dashboard.update(Msg::CommunityLoaded(Ok(community(true))));
        let request = claims_request(effects);
        dashboard.update(Msg::BalancesLoaded(Err(error())));
        dashboard.update(Msg::TransfersLoaded(Ok(TransferPage::default())));
        dashboard.update(Msg::ClaimPageLoaded {
            request,
            result: Ok(page(&[1, 2], "c", false)),
        });

        let view = dashboard.view();
        assert_eq!(view.balance, Section::Error("HTTP 502: bad gateway".to_string()));
        assert_eq!(view.community.ready().map(|c| c.name.as_str()), Some("Buss"));
        assert!(view.transfers.ready().is_some());
        assert_eq!(view.claims.ready().map(|c| c.cards.len()), Some(2));
        assert!(view.notices.is_empty());
    }

    #[test]
    fn test_every_status_combination_is_local() {
        let community_results = [None, Some(Ok(community(true))), Some(Err(error()))];
        let other_results = [None, Some(true), Some(false)];

        for community_result in &community_results {
            for transfers_ok in other_results {
                for balances_ok in other_results {
                    let (mut dashboard, _) = Dashboard::init(context(Credentials::Cached));
                    if let Some(result) = community_result {
                        dashboard.update(Msg::CommunityLoaded(result.clone()));
                    }
                    if let Some(ok) = transfers_ok {
                        let result = if ok { Ok(TransferPage::default()) } else { Err(error()) };
                        dashboard.update(Msg::TransfersLoaded(result));
                    }
                    if let Some(ok) = balances_ok {
                        let result = if ok { Ok(Vec::new()) } else { Err(error()) };
                        dashboard.update(Msg::BalancesLoaded(result));
                    }

                    let view = dashboard.view();
                    let community_ok = matches!(community_result, Some(Ok(_)));
                    let community_failed = matches!(community_result, Some(Err(_)));

                    assert_eq!(view.community.is_error(), community_failed);
                    assert_eq!(view.transfers.is_error(), transfers_ok == Some(false));
                    match view.balance {
                        Section::Unavailable => assert!(community_failed),
                        Section::Loading => assert!(!community_ok || balances_ok.is_none()),
                        Section::Error(_) => {
                            assert!(community_ok && balances_ok == Some(false))
                        }
                        Section::Ready(_) => assert!(community_ok && balances_ok == Some(true)),
                    }
                    assert_eq!(
                        matches!(view.claims, Section::Unavailable),
                        community_failed
                    );
                }
            }
        }
    }

    #[test]
    fn test_missing_balance_renders_zero() {
        let (mut dashboard, _) = Dashboard::init(context(Credentials::Cached));
        dashboard.update(Msg::CommunityLoaded(Ok(community(false))));
        dashboard.update(Msg::BalancesLoaded(Ok(vec![balance("3.0000 OTH")])));
        assert_eq!(
            dashboard.view().balance,
            Section::Ready("0.0000 BES".parse().expect("asset"))
        );

        let (mut dashboard, _) = Dashboard::init(context(Credentials::Cached));
        dashboard.update(Msg::CommunityLoaded(Ok(community(false))));
        dashboard.update(Msg::BalancesLoaded(Ok(vec![
            balance("3.0000 OTH"),
            balance("12.5000 BES"),
        ])));
        assert_eq!(
            dashboard.view().balance,
            Section::Ready("12.5000 BES".parse().expect("asset"))
        );
        assert_eq!(dashboard.view().claims, Section::Unavailable);
    }

    #[test]
    fn test_transfers_newest_first_with_direction() {
        let (mut dashboard, _) = Dashboard::init(context(Credentials::Cached));
        dashboard.update(Msg::TransfersLoaded(Ok(TransferPage {
            transfers: vec![
                transfer(1, "alice", "verifier1", "2021-05-01T10:00:00Z"),
                transfer(2, "verifier1", "bob", "2021-05-02T10:00:00Z"),
            ],
            ..TransferPage::default()
        })));
        let view = dashboard.view();
        let transfers = view.transfers.ready().expect("transfers");
        assert_eq!(transfers[0].id, 2);
        assert!(!transfers[0].incoming);
        assert_eq!(transfers[0].counterparty.as_str(), "bob");
        assert!(transfers[1].incoming);
        assert_eq!(transfers[1].counterparty.as_str(), "alice");
    }

    #[test]
    fn test_claim_cards_hide_voted_and_keep_failed_tail() {
        let (mut dashboard, _) = Dashboard::init(context(Credentials::Cached));
        let request = claims_request(dashboard.update(Msg::CommunityLoaded(Ok(community(true)))));
        dashboard.update(Msg::ClaimPageLoaded {
            request,
            result: Ok(page(&[1, 2, 3], "abc", true)),
        });

        dashboard.update(Msg::VoteClicked {
            claim_id: ClaimId(1),
            approve: true,
        });
        let request = claims_request(dashboard.update(Msg::VoteConfirmed {
            claim_id: ClaimId(1),
            transaction_id: "0xT".to_string(),
        }));
        dashboard.update(Msg::VoteClicked {
            claim_id: ClaimId(2),
            approve: false,
        });
        dashboard.update(Msg::ClaimPageLoaded {
            request,
            result: Err(error()),
        });

        let view = dashboard.view();
        let claims = view.claims.ready().expect("claims");
        let ids: Vec<u64> = claims.cards.iter().map(|card| card.id.0).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(claims.cards[0].state, CardState::Voting { approve: false });
        assert_eq!(claims.error.as_deref(), Some("HTTP 502: bad gateway"));
        assert!(claims.can_load_more);
        assert!(!claims.loading_more);
    }

    #[test]
    fn test_first_page_failure_is_slot_error() {
        let (mut dashboard, _) = Dashboard::init(context(Credentials::Cached));
        let request = claims_request(dashboard.update(Msg::CommunityLoaded(Ok(community(true)))));
        dashboard.update(Msg::ClaimPageLoaded {
            request,
            result: Err(error()),
        });
        assert!(dashboard.view().claims.is_error());
    }

    #[test]
    fn test_view_serialises_with_status_tags() {
        let (dashboard, _) = Dashboard::init(context(Credentials::Cached));
        let json = serde_json::to_value(dashboard.view()).expect("serialise");
        assert_eq!(json["balance"]["status"], "loading");
        assert_eq!(json["claims"]["status"], "loading");
        assert!(json["invite"].is_null());
    }
}
