//! Shared types for the order matching engine (component E).

use rust_decimal::Decimal;
use thiserror::Error;

use crate::order::Direction;

/// Fixed-point price, scaled by 1e8, so `BTreeMap<PriceLevel, _>` keys sort
/// and compare exactly — no float rounding noise at a price level boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PriceLevel(i64);

const SCALE: i64 = 100_000_000;

impl PriceLevel {
    pub fn from_decimal(price: Decimal) -> Self {
        let scaled = price * Decimal::from(SCALE);
        PriceLevel(scaled.try_into().unwrap_or(i64::MAX))
    }

    pub fn from_f64(price: f64) -> Self {
        PriceLevel((price * SCALE as f64).round() as i64)
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(SCALE)
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / SCALE as f64
    }

    pub fn raw(self) -> i64 {
        self.0
    }

    pub fn from_raw(raw: i64) -> Self {
        PriceLevel(raw)
    }
}

/// Buy/sell side of a resting order in the book. Distinct from `Direction`
/// in `crate::order` only in name — kept separate so the matching engine
/// doesn't need to import offset semantics it has no use for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl From<Direction> for Side {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Buy => Side::Buy,
            Direction::Sell => Side::Sell,
        }
    }
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// One resting order in a price-level queue. FIFO within a level.
#[derive(Debug, Clone)]
pub struct OrderEntry {
    pub order_id: String,
    pub account_id: String,
    pub side: Side,
    pub price: PriceLevel,
    pub volume: f64,
    /// Monotonic acceptance sequence, used to break ties within a price
    /// level (earlier orders fill first).
    pub sequence: u64,
}

/// One trade produced by matching, always priced at the resting (maker)
/// order's level.
#[derive(Debug, Clone)]
pub struct TradeResult {
    pub symbol: String,
    pub maker_order_id: String,
    pub maker_account_id: String,
    pub taker_order_id: String,
    pub taker_account_id: String,
    pub price: PriceLevel,
    pub volume: f64,
    pub taker_side: Side,
    pub sequence: u64,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchingError {
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("unknown order: {0}")]
    UnknownOrder(String),

    #[error("order volume must be positive, got {0}")]
    NonPositiveVolume(f64),

    #[error("order price must be positive, got {0}")]
    NonPositivePrice(f64),

    #[error("order {0} already resting or filled, cannot resubmit")]
    DuplicateOrder(String),
}
