//! EOS chain primitives.
//!
//! Symbols, account names and assets travel as strings on every wire the
//! client speaks (GraphQL, the balance endpoint, the signer bridge), so each
//! type parses with [`FromStr`] and serialises through its [`fmt::Display`]
//! form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::{TypesError, MAX_ACCOUNT_LEN, MAX_SYMBOL_CODE_LEN, MAX_SYMBOL_PRECISION};

/// A community currency symbol, written `precision,CODE` (e.g. `4,BES`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct Symbol {
    precision: u8,
    code: String,
}

impl Symbol {
    /// Build a symbol from its parts, validating both.
    pub fn new(precision: u8, code: &str) -> crate::Result<Self> {
        if precision > MAX_SYMBOL_PRECISION {
            return Err(TypesError::InvalidSymbol(format!(
                "precision {precision} exceeds {MAX_SYMBOL_PRECISION}"
            )));
        }
        if code.is_empty()
            || code.len() > MAX_SYMBOL_CODE_LEN
            || !code.bytes().all(|b| b.is_ascii_uppercase())
        {
            return Err(TypesError::InvalidSymbol(code.to_string()));
        }
        Ok(Self {
            precision,
            code: code.to_string(),
        })
    }

    /// Number of decimal places.
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// The uppercase symbol code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// `10^precision`, the number of units in one whole token.
    pub fn scale(&self) -> i64 {
        10_i64.saturating_pow(u32::from(self.precision))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision, self.code)
    }
}

impl FromStr for Symbol {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (precision, code) = s
            .split_once(',')
            .ok_or_else(|| TypesError::InvalidSymbol(s.to_string()))?;
        let precision: u8 = precision
            .trim()
            .parse()
            .map_err(|_| TypesError::InvalidSymbol(s.to_string()))?;
        Self::new(precision, code.trim())
    }
}

/// An EOS account name: 1-12 characters from `a-z`, `1-5` and `.`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub struct Account(String);

impl Account {
    /// Borrow the account name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Account {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid_chars = s
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'1'..=b'5' | b'.'));
        if s.is_empty() || s.len() > MAX_ACCOUNT_LEN || !valid_chars || s.ends_with('.') {
            return Err(TypesError::InvalidAccount(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

/// An amount of a community currency, held as integer units.
#[derive(Clone, Debug, PartialEq, Eq, SerializeDisplay, DeserializeFromStr)]
pub struct Asset {
    units: i64,
    symbol: Symbol,
}

impl Asset {
    /// An asset of `units` smallest units (`1.0000 BES` is 10000 units).
    pub fn from_units(units: i64, symbol: Symbol) -> Self {
        Self { units, symbol }
    }

    /// Zero of the given currency.
    pub fn zero(symbol: Symbol) -> Self {
        Self::from_units(0, symbol)
    }

    /// Convert a floating amount as reported by the API, rounding to the
    /// symbol's precision.
    pub fn from_float(amount: f64, symbol: Symbol) -> Self {
        let units = (amount * symbol.scale() as f64).round() as i64;
        Self { units, symbol }
    }

    /// Raw units.
    pub fn units(&self) -> i64 {
        self.units
    }

    /// The currency symbol.
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Amount as a float, for display arithmetic only.
    pub fn to_float(&self) -> f64 {
        self.units as f64 / self.symbol.scale() as f64
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.units < 0 { "-" } else { "" };
        let abs = self.units.unsigned_abs();
        let precision = usize::from(self.symbol.precision);
        if precision == 0 {
            return write!(f, "{sign}{abs} {}", self.symbol.code);
        }
        let scale = self.symbol.scale().unsigned_abs();
        write!(
            f,
            "{sign}{}.{:0width$} {}",
            abs / scale,
            abs % scale,
            self.symbol.code,
            width = precision
        )
    }
}

impl FromStr for Asset {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypesError::InvalidAsset(s.to_string());
        let (amount, code) = s.trim().split_once(' ').ok_or_else(invalid)?;
        let (negative, amount) = match amount.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, amount),
        };
        let (whole, frac) = amount.split_once('.').unwrap_or((amount, ""));
        let precision = u8::try_from(frac.len()).map_err(|_| invalid())?;
        let symbol = Symbol::new(precision, code.trim()).map_err(|_| invalid())?;

        let digits = format!("{whole}{frac}");
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let units: i64 = digits.parse().map_err(|_| invalid())?;
        Ok(Self {
            units: if negative { -units } else { units },
            symbol,
        })
    }
}

/// A structured error returned by the blockchain bridge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error, ts_rs::TS)]
#[ts(export)]
#[error("{message}")]
pub struct ChainError {
    /// Numeric EOS exception code (e.g. 3050003), when the node reported one.
    #[serde(default)]
    pub code: Option<i64>,
    /// Exception name (e.g. `eosio_assert_message_exception`).
    #[serde(default)]
    pub name: Option<String>,
    /// Top-level message.
    pub message: String,
    /// Per-frame detail messages, innermost first.
    #[serde(default)]
    pub details: Vec<String>,
}

impl ChainError {
    /// An error carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            code: None,
            name: None,
            message: message.into(),
            details: Vec::new(),
        }
    }
}
