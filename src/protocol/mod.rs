//! Account Snapshot Codec (component G).

pub mod qifi;

pub use qifi::{from_qifi, to_qifi, QifiAccountTotals, QifiFrozen, QifiOrder, QifiPosition, QifiSnapshot, QifiTrade};
