//! The async host around the dashboard reducer.
//!
//! The runtime owns the [`Dashboard`] and applies messages one at a time.
//! Every network effect runs as its own task and reports back through the
//! completion channel; the reducer never waits on I/O.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use cambiatus_claims::{PageRequest, VerificationAction};
use cambiatus_dashboard::{
    AuthToken, Contact, ContactMsg, Context, Dashboard, Effect, InviteMsg, Msg,
};
use cambiatus_types::{
    Account, Balance, ChainError, ClaimPage, Community, Symbol, TransferPage, TransportError,
};

use crate::balance::BalanceClient;
use crate::events::{self, EventBus};
use crate::graphql::GraphQlClient;
use crate::signer::SignerBridge;

/// Everything the runtime needs from the outside world.
pub trait Services: Send + Sync + 'static {
    fn community(
        &self,
        symbol: Symbol,
        auth: AuthToken,
    ) -> impl Future<Output = Result<Community, TransportError>> + Send;

    fn balances(
        &self,
        account: Account,
    ) -> impl Future<Output = Result<Vec<Balance>, TransportError>> + Send;

    fn transfers(
        &self,
        symbol: Symbol,
        first: u32,
        auth: AuthToken,
    ) -> impl Future<Output = Result<TransferPage, TransportError>> + Send;

    fn claims(
        &self,
        request: PageRequest,
        auth: AuthToken,
    ) -> impl Future<Output = Result<ClaimPage, TransportError>> + Send;

    /// Push a vote; resolves to the transaction id.
    fn push_verification(
        &self,
        action: VerificationAction,
    ) -> impl Future<Output = Result<String, ChainError>> + Send;

    /// Out-of-band unlock; `true` once the member authenticated.
    fn authenticate(&self, account: Account) -> impl Future<Output = bool> + Send;

    fn create_invite(
        &self,
        symbol: Symbol,
        inviter: Account,
        auth: AuthToken,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;

    fn save_contact(
        &self,
        contact: Contact,
        auth: AuthToken,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Production services: GraphQL API, balance endpoint and signer.
pub struct LiveServices {
    graphql: GraphQlClient,
    balances: BalanceClient,
    signer: SignerBridge,
}

impl LiveServices {
    pub fn new(graphql: GraphQlClient, balances: BalanceClient, signer: SignerBridge) -> Self {
        Self {
            graphql,
            balances,
            signer,
        }
    }
}

impl Services for LiveServices {
    async fn community(&self, symbol: Symbol, auth: AuthToken) -> Result<Community, TransportError> {
        self.graphql.community(&symbol, &auth).await
    }

    async fn balances(&self, account: Account) -> Result<Vec<Balance>, TransportError> {
        self.balances.fetch(&account).await
    }

    async fn transfers(
        &self,
        symbol: Symbol,
        first: u32,
        auth: AuthToken,
    ) -> Result<TransferPage, TransportError> {
        self.graphql.transfers(&symbol, first, &auth).await
    }

    async fn claims(
        &self,
        request: PageRequest,
        auth: AuthToken,
    ) -> Result<ClaimPage, TransportError> {
        self.graphql.claims(&request, &auth).await
    }

    async fn push_verification(&self, action: VerificationAction) -> Result<String, ChainError> {
        self.signer
            .push_action(&action)
            .await
            .map_err(|e| e.into_chain_error())
    }

    async fn authenticate(&self, account: Account) -> bool {
        match self.signer.authenticate(&account).await {
            Ok(unlocked) => unlocked,
            Err(e) => {
                warn!(error = %e, "authentication failed");
                false
            }
        }
    }

    async fn create_invite(
        &self,
        symbol: Symbol,
        inviter: Account,
        auth: AuthToken,
    ) -> Result<String, TransportError> {
        self.graphql.create_invite(&symbol, &inviter, &auth).await
    }

    async fn save_contact(&self, contact: Contact, auth: AuthToken) -> Result<(), TransportError> {
        self.graphql.save_contact(&contact, &auth).await
    }
}

/// Owner of the dashboard and dispatcher of its effects.
pub struct Runtime<S> {
    services: Arc<S>,
    dashboard: Dashboard,
    events: EventBus,
    completions_tx: mpsc::UnboundedSender<Msg>,
    completions_rx: mpsc::UnboundedReceiver<Msg>,
    in_flight: usize,
}

impl<S: Services> Runtime<S> {
    /// Build the dashboard. Nothing is requested until [`Runtime::start`].
    pub fn new(ctx: Context, services: Arc<S>, events: EventBus) -> (Self, Vec<Effect>) {
        let (dashboard, effects) = Dashboard::init(ctx);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let runtime = Self {
            services,
            dashboard,
            events,
            completions_tx,
            completions_rx,
            in_flight: 0,
        };
        (runtime, effects)
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// Requests whose completion has not been applied yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Issue the initial effects and publish the first view.
    pub fn start(&mut self, effects: Vec<Effect>) {
        self.dispatch(effects);
        self.publish();
        self.events.emit(
            events::CLIENT_STARTED,
            serde_json::json!({ "version": env!("CARGO_PKG_VERSION") }),
        );
    }

    /// Apply one message, publish the resulting view and dispatch effects.
    pub fn apply(&mut self, msg: Msg) {
        let effects = self.dashboard.update(msg);
        self.publish();
        self.dispatch(effects);
    }

    /// Wait for the next completed request and apply it. Returns false when
    /// nothing is in flight.
    pub async fn step(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        match self.completions_rx.recv().await {
            Some(msg) => {
                self.in_flight -= 1;
                self.apply(msg);
                true
            }
            None => false,
        }
    }

    /// Apply completions until no request is in flight.
    pub async fn settle(&mut self) {
        while self.step().await {}
    }

    /// Main loop: member input and completions in arrival order until
    /// shutdown or the input channel closes.
    pub async fn run(
        mut self,
        mut input: mpsc::UnboundedReceiver<Msg>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> anyhow::Result<Dashboard> {
        loop {
            tokio::select! {
                msg = input.recv() => match msg {
                    Some(msg) => self.apply(msg),
                    None => {
                        info!("input closed");
                        break;
                    }
                },
                Some(msg) = self.completions_rx.recv() => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    self.apply(msg);
                }
                _ = shutdown.recv() => {
                    info!("shutdown requested");
                    break;
                }
            }
        }
        if self.in_flight > 0 {
            debug!(in_flight = self.in_flight, "abandoning in-flight requests");
        }
        Ok(self.dashboard)
    }

    fn publish(&self) {
        match serde_json::to_value(self.dashboard.view()) {
            Ok(view) => self.events.emit(events::VIEW_UPDATED, view),
            Err(e) => warn!(error = %e, "view not serialisable"),
        }
    }

    fn dispatch(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            if let Effect::CopyToClipboard { text } = effect {
                self.events
                    .emit(events::COPY_TO_CLIPBOARD, serde_json::json!({ "text": text }));
                continue;
            }
            self.in_flight += 1;
            let services = Arc::clone(&self.services);
            let tx = self.completions_tx.clone();
            tokio::spawn(async move {
                if let Some(msg) = perform(services.as_ref(), effect).await {
                    // Receiver gone means the runtime stopped.
                    let _ = tx.send(msg);
                }
            });
        }
    }
}

/// Run one effect against the services and turn its outcome into a message.
async fn perform<S: Services>(services: &S, effect: Effect) -> Option<Msg> {
    debug!(?effect, "performing effect");
    let msg = match effect {
        Effect::QueryCommunity { symbol, auth } => {
            Msg::CommunityLoaded(services.community(symbol, auth).await)
        }
        Effect::FetchBalances { account } => Msg::BalancesLoaded(services.balances(account).await),
        Effect::QueryTransfers {
            symbol,
            first,
            auth,
        } => Msg::TransfersLoaded(services.transfers(symbol, first, auth).await),
        Effect::QueryClaims { request, auth } => {
            let result = services.claims(request.clone(), auth).await;
            Msg::ClaimPageLoaded { request, result }
        }
        Effect::SubmitVerification { action } => {
            let claim_id = action.claim_id();
            match services.push_verification(action).await {
                Ok(transaction_id) => Msg::VoteConfirmed {
                    claim_id,
                    transaction_id,
                },
                Err(error) => Msg::VoteRejected { claim_id, error },
            }
        }
        Effect::RequestAuthentication { account } => {
            if services.authenticate(account).await {
                Msg::AuthenticationCompleted
            } else {
                Msg::AuthenticationCancelled
            }
        }
        Effect::CreateInvite {
            symbol,
            inviter,
            auth,
        } => Msg::Invite(InviteMsg::Created(
            services.create_invite(symbol, inviter, auth).await,
        )),
        Effect::SaveContact { contact, auth } => {
            Msg::Contact(ContactMsg::Saved(services.save_contact(contact, auth).await))
        }
        Effect::CopyToClipboard { .. } => return None,
    };
    Some(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cambiatus_claims::{Credentials, FeedConfig};
    use cambiatus_dashboard::{DashboardConfig, Section, Session};
    use cambiatus_types::{ActionRef, Claim, ClaimId, Cursor, ObjectiveRef, PageInfo, Profile};

    struct Fake {
        claims: Vec<u64>,
    }

    fn symbol() -> Symbol {
        "4,BES".parse().expect("symbol")
    }

    fn claim(id: u64) -> Claim {
        Claim {
            id: ClaimId(id),
            claimer: Profile {
                account: "claimer".parse().expect("account"),
                name: None,
                avatar: None,
            },
            action: ActionRef {
                id: 1,
                description: "Recycle".to_string(),
                objective: ObjectiveRef {
                    id: 2,
                    description: "Clean".to_string(),
                    community: symbol(),
                },
            },
            verifier_reward: "0.5000 BES".parse().expect("asset"),
            created_at: "2021-05-01T10:00:00Z".to_string(),
        }
    }

    impl Services for Fake {
        async fn community(&self, symbol: Symbol, _: AuthToken) -> Result<Community, TransportError> {
            Ok(Community {
                symbol,
                name: "Buss".to_string(),
                description: String::new(),
                logo: String::new(),
                creator: "founder".parse().expect("account"),
                has_objectives: true,
                has_shop: false,
                has_kyc: false,
            })
        }

        async fn balances(&self, _: Account) -> Result<Vec<Balance>, TransportError> {
            Err(TransportError::Network {
                message: "down".to_string(),
            })
        }

        async fn transfers(
            &self,
            _: Symbol,
            _: u32,
            _: AuthToken,
        ) -> Result<TransferPage, TransportError> {
            Ok(TransferPage::default())
        }

        async fn claims(
            &self,
            request: PageRequest,
            _: AuthToken,
        ) -> Result<ClaimPage, TransportError> {
            let start = request
                .after
                .as_ref()
                .and_then(|cursor| cursor.0.parse::<usize>().ok())
                .unwrap_or(0);
            let end = (start + request.first as usize).min(self.claims.len());
            Ok(ClaimPage {
                claims: self.claims[start..end].iter().map(|id| claim(*id)).collect(),
                page_info: PageInfo {
                    end_cursor: Some(Cursor(end.to_string())),
                    has_next_page: end < self.claims.len(),
                },
            })
        }

        async fn push_verification(&self, action: VerificationAction) -> Result<String, ChainError> {
            Ok(format!("tx-{}", action.claim_id()))
        }

        async fn authenticate(&self, _: Account) -> bool {
            true
        }

        async fn create_invite(
            &self,
            _: Symbol,
            _: Account,
            _: AuthToken,
        ) -> Result<String, TransportError> {
            Ok("inv".to_string())
        }

        async fn save_contact(&self, _: Contact, _: AuthToken) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn context() -> Context {
        let mut config = DashboardConfig::new("cambiatus.cm".parse().expect("account"));
        config.feed = FeedConfig {
            first_page_size: 2,
            next_page_size: 1,
        };
        Context::new(
            Session {
                account: "verifier1".parse().expect("account"),
                community: symbol(),
                auth_token: None,
                credentials: Credentials::Missing,
            },
            config,
        )
    }

    fn runtime() -> Runtime<Fake> {
        let services = Arc::new(Fake {
            claims: vec![1, 2, 3],
        });
        let (mut runtime, effects) = Runtime::new(context(), services, EventBus::new(64));
        runtime.start(effects);
        runtime
    }

    #[tokio::test]
    async fn test_start_settles_all_resources() {
        let mut runtime = runtime();
        runtime.settle().await;
        let view = runtime.dashboard().view();
        assert!(view.community.ready().is_some());
        assert!(view.balance.is_error());
        assert!(view.transfers.ready().is_some());
        assert_eq!(view.claims.ready().map(|c| c.cards.len()), Some(2));
        assert_eq!(runtime.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_vote_authenticates_submits_and_tops_up() {
        let mut runtime = runtime();
        runtime.settle().await;

        runtime.apply(Msg::VoteClicked {
            claim_id: ClaimId(1),
            approve: true,
        });
        runtime.settle().await;

        let Section::Ready(claims) = runtime.dashboard().view().claims else {
            unreachable!("claims should be ready");
        };
        let ids: Vec<u64> = claims.cards.iter().map(|card| card.id.0).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!(!claims.can_load_more);
    }

    #[tokio::test]
    async fn test_copy_is_forwarded_as_event() {
        let mut runtime = runtime();
        let mut rx = runtime.events.subscribe();
        runtime.settle().await;
        runtime.apply(Msg::Invite(InviteMsg::Open));
        runtime.settle().await;
        runtime.apply(Msg::Invite(InviteMsg::Copy));

        let mut copied = None;
        while let Ok(event) = rx.try_recv() {
            if event.event_type == events::COPY_TO_CLIPBOARD {
                copied = event.payload["text"].as_str().map(str::to_string);
            }
        }
        assert_eq!(copied.as_deref(), Some("/invite/inv"));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let runtime = runtime();
        let (_input_tx, input_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(runtime.run(input_rx, shutdown_rx));
        shutdown_tx.send(()).expect("send shutdown");
        let dashboard = handle.await.expect("join").expect("run");
        assert_eq!(dashboard.context().session.account.as_str(), "verifier1");
    }
}
