//! Market-Data Broadcast Hub (component H).

pub mod block;
pub mod config;
pub mod hub;

pub use block::{DataType, MarketDataBlock, BLOCK_SIZE, HEADER_SIZE, PAYLOAD_CAPACITY};
pub use config::BroadcastConfig;
pub use hub::{BroadcastManager, Publisher, PublisherStats, Subscriber};
