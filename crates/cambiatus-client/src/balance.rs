//! Balance HTTP endpoint: `GET {balance_url}/{account}`.

use serde::Deserialize;
use tracing::debug;

use cambiatus_types::{Account, Asset, Balance, Symbol, TransportError};

use crate::graphql::transport_error;

#[derive(Deserialize)]
struct BalanceEntry {
    symbol: Symbol,
    amount: f64,
}

/// Client for the balance endpoint.
#[derive(Clone)]
pub struct BalanceClient {
    http: reqwest::Client,
    base_url: String,
}

impl BalanceClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn url(&self, account: &Account) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), account)
    }

    /// Every balance the account holds.
    pub async fn fetch(&self, account: &Account) -> Result<Vec<Balance>, TransportError> {
        let response = self
            .http
            .get(self.url(account))
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        let body = response.text().await.map_err(transport_error)?;
        let balances = decode_balances(&body)?;
        debug!(%account, count = balances.len(), "balances fetched");
        Ok(balances)
    }
}

fn decode_balances(body: &str) -> Result<Vec<Balance>, TransportError> {
    let entries: Vec<BalanceEntry> =
        serde_json::from_str(body).map_err(|e| TransportError::Decode {
            message: e.to_string(),
        })?;
    Ok(entries
        .into_iter()
        .map(|entry| Balance {
            asset: Asset::from_float(entry.amount, entry.symbol),
        })
        .collect())
}
