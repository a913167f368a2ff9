//! Integration tests for the Cambiatus dashboard core.
//!
//! The tests under `tests/` drive the claim feed, the dashboard reducer and
//! the client runtime together through their public APIs. This library only
//! holds the fixtures they share.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p cambiatus-integration-tests
//! ```

use cambiatus_claims::{Credentials, FeedConfig, PageRequest};
use cambiatus_dashboard::{Context, DashboardConfig, Effect, Session};
use cambiatus_types::{
    ActionRef, Claim, ClaimId, ClaimPage, Community, Cursor, ObjectiveRef, PageInfo, Profile,
    Symbol,
};

/// Community symbol used throughout.
pub fn bes() -> Symbol {
    "4,BES".parse().expect("symbol")
}

/// A pending claim with the given id.
pub fn claim(id: u64) -> Claim {
    Claim {
        id: ClaimId(id),
        claimer: Profile {
            account: "claimer".parse().expect("account"),
            name: Some("Ana".to_string()),
            avatar: None,
        },
        action: ActionRef {
            id: 1,
            description: "Plant a tree".to_string(),
            objective: ObjectiveRef {
                id: 2,
                description: "Reforestation".to_string(),
                community: bes(),
            },
        },
        verifier_reward: "1.0000 BES".parse().expect("asset"),
        created_at: "2021-05-01T10:00:00Z".to_string(),
    }
}

/// A page of claims.
pub fn page(ids: &[u64], cursor: &str, has_next_page: bool) -> ClaimPage {
    ClaimPage {
        claims: ids.iter().copied().map(claim).collect(),
        page_info: PageInfo {
            end_cursor: Some(Cursor::from(cursor)),
            has_next_page,
        },
    }
}

/// The community, with objectives switched on or off.
pub fn community(has_objectives: bool) -> Community {
    Community {
        symbol: bes(),
        name: "Buss".to_string(),
        description: "Community currency".to_string(),
        logo: String::new(),
        creator: "founder".parse().expect("account"),
        has_objectives,
        has_shop: false,
        has_kyc: false,
    }
}

/// Dashboard context for `verifier1` with a first page of `first_page_size`.
pub fn context(first_page_size: u32, credentials: Credentials) -> Context {
    let mut config = DashboardConfig::new("cambiatus.cm".parse().expect("account"));
    config.feed = FeedConfig {
        first_page_size,
        next_page_size: 1,
    };
    config.app_url = "https://app.cambiatus.io".to_string();
    Context::new(
        Session {
            account: "verifier1".parse().expect("account"),
            community: bes(),
            auth_token: Some("token".to_string()),
            credentials,
        },
        config,
    )
}

/// Every claims request among `effects`.
pub fn claim_requests(effects: &[Effect]) -> Vec<PageRequest> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::QueryClaims { request, .. } => Some(request.clone()),
            _ => None,
        })
        .collect()
}
