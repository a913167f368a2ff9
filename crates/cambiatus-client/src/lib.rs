//! # cambiatus-client
//!
//! Headless host for the Cambiatus dashboard: loads configuration, talks to
//! the GraphQL API, the balance endpoint and the transaction signer, and
//! drives [`cambiatus_dashboard::Dashboard`] from a single message loop.

pub mod balance;
pub mod commands;
pub mod config;
pub mod events;
pub mod graphql;
pub mod runtime;
pub mod signer;

pub use config::ClientConfig;
pub use events::{Event, EventBus};
pub use runtime::{LiveServices, Runtime, Services};
