//! Quantitative trading backend core: account/position ledger, order
//! matching engine, algorithmic order splitter, QIFI account snapshot
//! codec, and a zero-copy-shaped market-data broadcast hub.
//!
//! This crate has no HTTP surface, no database, and no external network
//! collaborators — it is the settlement/matching/broadcast core a trading
//! system is built around, not the system itself.

pub mod account;
pub mod algo;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod matching;
pub mod metrics;
pub mod order;
pub mod position;
pub mod preset;
pub mod protocol;

pub use account::{Account, AccountStats, Trade};
pub use error::{CoreError, CoreResult, ValidationError};
pub use order::{Direction, Offset, Order, OrderStatus, OrderType, TimeCondition};
pub use position::{Position, Side};
pub use preset::{Preset, PresetTable};
