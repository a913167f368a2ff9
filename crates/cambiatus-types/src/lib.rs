//! # cambiatus-types
//!
//! Shared domain types used across the Cambiatus client workspace.
//!
//! ## Modules
//!
//! - [`chain`]: EOS primitives: symbols, accounts, assets, chain errors
//! - [`claim`]: claims and the actions/objectives they refer to
//! - [`community`]: communities, profiles, balances, transfers
//! - [`page`]: cursor pagination and sort direction
//! - [`remote`]: the fetch lifecycle wrapper and transport errors

pub mod chain;
pub mod claim;
pub mod community;
pub mod page;
pub mod remote;

pub use chain::{Account, Asset, ChainError, Symbol};
pub use claim::{ActionRef, Claim, ClaimId, ClaimPage, ObjectiveRef};
pub use community::{Balance, Community, Profile, Transfer, TransferPage};
pub use page::{Cursor, Direction, PageInfo};
pub use remote::{RemoteResource, TransportError};

/// Maximum length of an EOS account name.
pub const MAX_ACCOUNT_LEN: usize = 12;

/// Maximum precision an EOS symbol may carry.
pub const MAX_SYMBOL_PRECISION: u8 = 18;

/// Maximum length of an EOS symbol code.
pub const MAX_SYMBOL_CODE_LEN: usize = 7;

/// Error types for parsing domain primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesError {
    /// The symbol is not of the form `precision,CODE`.
    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    /// The account name violates EOS naming rules.
    #[error("invalid account name: {0}")]
    InvalidAccount(String),

    /// The asset string is not of the form `12.3400 CODE`.
    #[error("invalid asset: {0}")]
    InvalidAsset(String),
}

/// Convenience result type for type parsing.
pub type Result<T> = std::result::Result<T, TypesError>;

#[cfg(test)]
mod tests {
    #[test]
    fn test_id_newtypes_export_as_wire_primitives() {
        use ts_rs::TS;
        assert_eq!(crate::claim::ClaimId::inline(), "number");
        assert_eq!(crate::page::Cursor::inline(), "string");
    }

    // Run `cargo test -p cambiatus-types -- --ignored export_ts_bindings` to write files.

    #[test]
    #[ignore] // Run manually to generate bindings
    fn export_ts_bindings() {
        use ts_rs::TS;
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../bindings");
        std::fs::create_dir_all(&dir).expect("create bindings dir");
        crate::claim::Claim::export_all_to(&dir).expect("export Claim");
        crate::claim::ClaimPage::export_all_to(&dir).expect("export ClaimPage");
        crate::community::Community::export_all_to(&dir).expect("export Community");
        crate::community::Balance::export_all_to(&dir).expect("export Balance");
        crate::community::TransferPage::export_all_to(&dir).expect("export TransferPage");
        crate::page::Direction::export_all_to(&dir).expect("export Direction");
        crate::chain::ChainError::export_all_to(&dir).expect("export ChainError");
    }
}
