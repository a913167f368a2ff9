//! GraphQL transport.
//!
//! Documents alias server fields to the snake_case names of the wire
//! structs below, so responses decode without renaming rules.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use cambiatus_claims::PageRequest;
use cambiatus_dashboard::{AuthToken, Contact};
use cambiatus_types::{
    Account, ActionRef, Asset, Claim, ClaimId, ClaimPage, Community, ObjectiveRef, PageInfo,
    Profile, Symbol, Transfer, TransferPage, TransportError,
};

pub const COMMUNITY_QUERY: &str = r#"
query Community($symbol: String!) {
  community(symbol: $symbol) {
    symbol
    name
    description
    logo
    creator
    has_objectives: hasObjectives
    has_shop: hasShop
    has_kyc: hasKyc
  }
}"#;

pub const TRANSFERS_QUERY: &str = r#"
query Transfers($symbol: String!, $first: Int!) {
  community(symbol: $symbol) {
    transfers(first: $first) {
      edges {
        node {
          id
          from { account }
          to { account }
          amount
          memo
          created_at: createdAt
        }
      }
      page_info: pageInfo { end_cursor: endCursor has_next_page: hasNextPage }
    }
  }
}"#;

pub const CLAIMS_QUERY: &str = r#"
query PendingClaims($communityId: String!, $first: Int!, $after: String, $filter: ClaimsFilter) {
  pendingClaims(communityId: $communityId, first: $first, after: $after, filter: $filter) {
    edges {
      node {
        id
        claimer { account name avatar }
        action {
          id
          description
          verifier_reward: verifierReward
          objective { id description community { symbol } }
        }
        created_at: createdAt
      }
    }
    page_info: pageInfo { end_cursor: endCursor has_next_page: hasNextPage }
  }
}"#;

pub const CREATE_INVITE_MUTATION: &str = r#"
mutation CreateInvite($input: InviteInput!) {
  invite(input: $input) { code }
}"#;

pub const UPSERT_CONTACT_MUTATION: &str = r#"
mutation UpsertContact($contacts: [ContactInput]) {
  user(input: { contacts: $contacts }) { account }
}"#;

#[derive(Serialize)]
struct Request<'a, V> {
    query: &'a str,
    variables: V,
}

#[derive(Deserialize)]
struct Response<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<ResponseError>,
}

#[derive(Deserialize)]
struct ResponseError {
    message: String,
}

/// Map a reqwest failure onto the resource error vocabulary.
pub(crate) fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_decode() {
        TransportError::Decode {
            message: err.to_string(),
        }
    } else if let Some(status) = err.status() {
        TransportError::Http {
            status: status.as_u16(),
            message: err.to_string(),
        }
    } else {
        TransportError::Network {
            message: err.to_string(),
        }
    }
}

/// GraphQL API client.
#[derive(Clone)]
pub struct GraphQlClient {
    http: reqwest::Client,
    url: String,
}

impl GraphQlClient {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    /// Run one document and decode its `data`.
    pub async fn execute<V: Serialize, T: DeserializeOwned>(
        &self,
        query: &str,
        variables: V,
        auth: &AuthToken,
    ) -> Result<T, TransportError> {
        let mut request = self.http.post(&self.url).json(&Request { query, variables });
        if let Some(token) = &auth.0 {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "GraphQL request failed");
            return Err(TransportError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(transport_error)?;
        debug!(bytes = body.len(), "GraphQL response received");
        decode_response(&body)
    }

    pub async fn community(
        &self,
        symbol: &Symbol,
        auth: &AuthToken,
    ) -> Result<Community, TransportError> {
        let data: CommunityData<Community> = self
            .execute(COMMUNITY_QUERY, json!({ "symbol": symbol }), auth)
            .await?;
        data.community.ok_or_else(|| not_found("community", symbol))
    }

    pub async fn transfers(
        &self,
        symbol: &Symbol,
        first: u32,
        auth: &AuthToken,
    ) -> Result<TransferPage, TransportError> {
        let data: CommunityData<TransfersData> = self
            .execute(
                TRANSFERS_QUERY,
                json!({ "symbol": symbol, "first": first }),
                auth,
            )
            .await?;
        let community = data.community.ok_or_else(|| not_found("community", symbol))?;
        Ok(community.transfers.into_page(symbol))
    }

    pub async fn claims(
        &self,
        request: &PageRequest,
        auth: &AuthToken,
    ) -> Result<ClaimPage, TransportError> {
        let data: PendingClaimsData = self
            .execute(CLAIMS_QUERY, claims_variables(request), auth)
            .await?;
        Ok(data.pending_claims.into_claim_page())
    }

    /// Create an invitation and return its id.
    pub async fn create_invite(
        &self,
        symbol: &Symbol,
        inviter: &Account,
        auth: &AuthToken,
    ) -> Result<String, TransportError> {
        let data: InviteData = self
            .execute(
                CREATE_INVITE_MUTATION,
                json!({ "input": { "communityId": symbol, "inviter": inviter } }),
                auth,
            )
            .await?;
        data.invite
            .map(|invite| invite.code)
            .ok_or_else(|| TransportError::Decode {
                message: "invite mutation returned no invite".to_string(),
            })
    }

    pub async fn save_contact(
        &self,
        contact: &Contact,
        auth: &AuthToken,
    ) -> Result<(), TransportError> {
        let _: serde_json::Value = self
            .execute(
                UPSERT_CONTACT_MUTATION,
                json!({ "contacts": [contact] }),
                auth,
            )
            .await?;
        Ok(())
    }
}

fn not_found(what: &str, symbol: &Symbol) -> TransportError {
    TransportError::GraphQl {
        messages: vec![format!("{what} {symbol} not found")],
    }
}

pub(crate) fn claims_variables(request: &PageRequest) -> serde_json::Value {
    json!({
        "communityId": request.community,
        "first": request.first,
        "after": request.after,
        "filter": { "direction": request.direction },
    })
}

pub(crate) fn decode_response<T: DeserializeOwned>(body: &str) -> Result<T, TransportError> {
    let response: Response<T> = serde_json::from_str(body).map_err(|e| TransportError::Decode {
        message: e.to_string(),
    })?;
    if !response.errors.is_empty() {
        return Err(TransportError::GraphQl {
            messages: response.errors.into_iter().map(|e| e.message).collect(),
        });
    }
    response.data.ok_or_else(|| TransportError::Decode {
        message: "response carried neither data nor errors".to_string(),
    })
}

// Wire shapes

#[derive(Deserialize)]
struct CommunityData<T> {
    community: Option<T>,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "N: Deserialize<'de>"))]
struct Connection<N> {
    #[serde(default)]
    edges: Vec<Edge<N>>,
    #[serde(default)]
    page_info: PageInfo,
}

#[derive(Deserialize)]
struct Edge<N> {
    node: N,
}

#[derive(Deserialize)]
struct TransfersData {
    transfers: Connection<TransferNode>,
}

#[derive(Deserialize)]
struct AccountRef {
    account: Account,
}

#[derive(Deserialize)]
struct TransferNode {
    id: u64,
    from: AccountRef,
    to: AccountRef,
    amount: f64,
    memo: Option<String>,
    created_at: String,
}

impl Connection<TransferNode> {
    fn into_page(self, symbol: &Symbol) -> TransferPage {
        TransferPage {
            transfers: self
                .edges
                .into_iter()
                .map(|Edge { node }| Transfer {
                    id: node.id,
                    from: node.from.account,
                    to: node.to.account,
                    amount: Asset::from_float(node.amount, symbol.clone()),
                    memo: node.memo.filter(|memo| !memo.is_empty()),
                    created_at: node.created_at,
                })
                .collect(),
            page_info: self.page_info,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PendingClaimsData {
    pending_claims: Connection<ClaimNode>,
}

#[derive(Deserialize)]
struct ClaimNode {
    id: u64,
    claimer: Profile,
    action: ActionNode,
    created_at: String,
}

#[derive(Deserialize)]
struct ActionNode {
    id: u64,
    description: String,
    verifier_reward: f64,
    objective: ObjectiveNode,
}

#[derive(Deserialize)]
struct ObjectiveNode {
    id: u64,
    description: String,
    community: SymbolRef,
}

#[derive(Deserialize)]
struct SymbolRef {
    symbol: Symbol,
}

impl Connection<ClaimNode> {
    fn into_claim_page(self) -> ClaimPage {
        let claims = self
            .edges
            .into_iter()
            .map(|Edge { node }| {
                let symbol = node.action.objective.community.symbol;
                Claim {
                    id: ClaimId(node.id),
                    claimer: node.claimer,
                    action: ActionRef {
                        id: node.action.id,
                        description: node.action.description,
                        objective: ObjectiveRef {
                            id: node.action.objective.id,
                            description: node.action.objective.description,
                            community: symbol.clone(),
                        },
                    },
                    verifier_reward: Asset::from_float(node.action.verifier_reward, symbol),
                    created_at: node.created_at,
                }
            })
            .collect();
        ClaimPage {
            claims,
            page_info: self.page_info,
        }
    }
}

#[derive(Deserialize)]
struct InviteData {
    invite: Option<InviteNode>,
}

#[derive(Deserialize)]
struct InviteNode {
    code: String,
}
