//! Claim structures.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chain::{Asset, Symbol};
use crate::community::Profile;
use crate::page::PageInfo;

/// Server-side claim identifier.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ts_rs::TS,
)]
#[ts(export)]
#[serde(transparent)]
pub struct ClaimId(#[ts(type = "number")] pub u64);

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A member's assertion of having completed a community action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Claim {
    pub id: ClaimId,
    pub claimer: Profile,
    pub action: ActionRef,
    /// Paid to each verifier who votes on the claim.
    #[ts(type = "string")]
    pub verifier_reward: Asset,
    /// ISO-8601 timestamp as issued by the API.
    pub created_at: String,
}

impl Claim {
    /// The community this claim belongs to.
    pub fn community(&self) -> &Symbol {
        &self.action.objective.community
    }
}

/// The action a claim was made against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct ActionRef {
    pub id: u64,
    pub description: String,
    pub objective: ObjectiveRef,
}

/// The objective an action belongs to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct ObjectiveRef {
    pub id: u64,
    pub description: String,
    #[ts(type = "string")]
    pub community: Symbol,
}

/// One page of claims awaiting the current user's vote.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct ClaimPage {
    pub claims: Vec<Claim>,
    pub page_info: PageInfo,
}
