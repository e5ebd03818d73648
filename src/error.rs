//! Error taxonomy for the trading core.
//!
//! Every fallible operation in this crate returns one of these variants
//! rather than panicking. Pure validation failures are always recoverable:
//! the caller gets `Err` (or `None` from the `Option<Order>`-returning
//! account methods) and the mutated structure is left untouched.

use thiserror::Error;

/// Top-level error type surfaced by the core.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("insufficient funds: need {required:.2}, available {available:.2}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("insufficient position: need {required}, available {available} on {symbol}")]
    InsufficientPosition {
        symbol: String,
        required: f64,
        available: f64,
    },

    #[error("market rule violated: {0}")]
    MarketRule(String),

    #[error("unknown order: {0}")]
    UnknownOrder(String),

    #[error("payload overflow: {size} bytes exceeds {max} byte capacity")]
    Overflow { size: usize, max: usize },

    #[error("broadcast transport error: {0}")]
    Transport(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),
}

/// Malformed-input failures, cheap enough to construct freely at call sites.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol must not be empty")]
    EmptySymbol,

    #[error("volume must be positive, got {0}")]
    NonPositiveVolume(String),

    #[error("price must be positive, got {0}")]
    NonPositivePrice(String),

    #[error("invalid towards code: {0}")]
    InvalidTowards(i32),
}

pub type CoreResult<T> = Result<T, CoreError>;
