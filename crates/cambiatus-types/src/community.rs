//! Community, profile and wallet structures.

use serde::{Deserialize, Serialize};

use crate::chain::{Account, Asset, Symbol};
use crate::page::PageInfo;

/// A community and the features it has switched on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Community {
    #[ts(type = "string")]
    pub symbol: Symbol,
    pub name: String,
    pub description: String,
    pub logo: String,
    #[ts(type = "string")]
    pub creator: Account,
    pub has_objectives: bool,
    pub has_shop: bool,
    pub has_kyc: bool,
}

/// Public profile of a member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Profile {
    #[ts(type = "string")]
    pub account: Account,
    pub name: Option<String>,
    pub avatar: Option<String>,
}

impl Profile {
    /// Name to show for this member: the profile name, else the account.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.account.as_str())
    }
}

/// Balance of one community currency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Balance {
    #[ts(type = "string")]
    pub asset: Asset,
}

impl Balance {
    /// The balance's currency.
    pub fn symbol(&self) -> &Symbol {
        self.asset.symbol()
    }
}

/// A transfer between two accounts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Transfer {
    pub id: u64,
    #[ts(type = "string")]
    pub from: Account,
    #[ts(type = "string")]
    pub to: Account,
    #[ts(type = "string")]
    pub amount: Asset,
    pub memo: Option<String>,
    /// ISO-8601 timestamp as issued by the API.
    pub created_at: String,
}

/// One page of a community's transfer feed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct TransferPage {
    pub transfers: Vec<Transfer>,
    pub page_info: PageInfo,
}

impl TransferPage {
    /// Transfers newest first. ISO-8601 timestamps in a single zone sort
    /// lexicographically; ids break ties.
    pub fn newest_first(&self) -> Vec<Transfer> {
        let mut transfers = self.transfers.clone();
        transfers.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        transfers
    }
}
