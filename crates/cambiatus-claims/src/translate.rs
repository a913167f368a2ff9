//! Blockchain error codes to member-facing text.

use std::collections::HashMap;

use cambiatus_types::ChainError;

/// `eosio_assert_message_exception`: a contract assertion fired.
pub const ASSERT_MESSAGE_EXCEPTION: i64 = 3_050_003;
/// `unsatisfied_authorization`.
pub const UNSATISFIED_AUTHORIZATION: i64 = 3_090_003;
/// `tx_net_usage_exceeded`.
pub const NET_USAGE_EXCEEDED: i64 = 3_080_002;
/// `tx_cpu_usage_exceeded`.
pub const CPU_USAGE_EXCEEDED: i64 = 3_080_004;
/// `expired_tx_exception`.
pub const EXPIRED_TRANSACTION: i64 = 3_040_005;

const ASSERTION_PREFIX: &str = "assertion failure with message: ";

/// Turns a structured chain error into text for the member.
pub trait TranslateError {
    fn translate(&self, error: &ChainError) -> String;
}

/// Table-driven translator keyed by EOS exception code.
#[derive(Clone, Debug)]
pub struct ErrorCodeTable {
    messages: HashMap<i64, String>,
    fallback: String,
}

impl Default for ErrorCodeTable {
    fn default() -> Self {
        let messages = [
            (
                UNSATISFIED_AUTHORIZATION,
                "You don't have permission to verify this claim",
            ),
            (
                NET_USAGE_EXCEEDED,
                "Not enough network resources to complete the transaction",
            ),
            (
                CPU_USAGE_EXCEEDED,
                "Not enough CPU to complete the transaction, try again later",
            ),
            (EXPIRED_TRANSACTION, "The transaction expired, try again"),
        ]
        .into_iter()
        .map(|(code, text)| (code, text.to_string()))
        .collect();

        Self {
            messages,
            fallback: "Something went wrong, please try again".to_string(),
        }
    }
}

impl ErrorCodeTable {
    /// Override or add the text for one code.
    pub fn with_message(mut self, code: i64, text: impl Into<String>) -> Self {
        self.messages.insert(code, text.into());
        self
    }

    /// Text used when nothing better is known.
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = text.into();
        self
    }
}

impl TranslateError for ErrorCodeTable {
    fn translate(&self, error: &ChainError) -> String {
        match error.code {
            Some(ASSERT_MESSAGE_EXCEPTION) => assertion_text(error)
                .map(str::to_string)
                .unwrap_or_else(|| self.fallback.clone()),
            Some(code) => self
                .messages
                .get(&code)
                .cloned()
                .unwrap_or_else(|| self.fallback.clone()),
            // Errors raised by the signer itself carry no code; their message
            // is already meant for the member.
            None if !error.message.trim().is_empty() => error.message.clone(),
            None => self.fallback.clone(),
        }
    }
}

/// The contract's own assertion text, innermost detail first.
fn assertion_text(error: &ChainError) -> Option<&str> {
    error
        .details
        .iter()
        .chain(std::iter::once(&error.message))
        .find_map(|text| text.strip_prefix(ASSERTION_PREFIX))
        .map(str::trim)
        .filter(|text| !text.is_empty())
}
