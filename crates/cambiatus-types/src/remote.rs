//! Lifecycle of a server-fetched value.
//!
//! Every resource the dashboard shows (balances, community, transfers) sits
//! in exactly one [`RemoteResource`] variant. Transitions only go forward
//! (`NotAsked`/`Loading` to `Success`/`Failure`) unless the owner explicitly
//! reloads.

use serde::{Deserialize, Serialize};

/// A value fetched from a remote service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum RemoteResource<E, T> {
    #[default]
    NotAsked,
    Loading,
    Success(T),
    Failure(E),
}

impl<E, T> RemoteResource<E, T> {
    /// Build a resolved resource from a request result.
    pub fn from_result(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Failure(err),
        }
    }

    /// True while the request is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The loaded value, if any.
    pub fn success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    /// The failure, if any.
    pub fn failure(&self) -> Option<&E> {
        match self {
            Self::Failure(err) => Some(err),
            _ => None,
        }
    }

    /// Move to `Loading`, returning false when a request is already in flight.
    pub fn start_loading(&mut self) -> bool {
        if self.is_loading() {
            return false;
        }
        *self = Self::Loading;
        true
    }

    /// Resolve an in-flight request. A result arriving when nothing is
    /// loading is dropped and `false` is returned.
    pub fn resolve(&mut self, result: Result<T, E>) -> bool {
        if !self.is_loading() {
            return false;
        }
        *self = Self::from_result(result);
        true
    }
}

/// Failure talking to the GraphQL API or the balance endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportError {
    /// Non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The GraphQL endpoint answered with errors.
    #[error("GraphQL error: {}", .messages.join("; "))]
    GraphQl { messages: Vec<String> },

    /// Connection-level failure.
    #[error("network error: {message}")]
    Network { message: String },

    /// The response body could not be decoded.
    #[error("bad response: {message}")]
    Decode { message: String },
}
