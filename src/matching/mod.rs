//! Order Matching Engine (component E): price-time priority limit order
//! books, one per symbol, run through a shared `MatchingEngine`.

pub mod engine;
pub mod orderbook;
pub mod types;

pub use engine::{MatchingEngine, TradeCallback};
pub use orderbook::{Orderbook, OrderbookSnapshot};
pub use types::{MatchingError, OrderEntry, PriceLevel, Side, TradeResult};
