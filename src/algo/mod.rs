//! Algorithmic Order Splitter (component F).

pub mod splitter;

pub use splitter::{
    AlgoOrderManager, ChunkStatus, SplitAlgorithm, SplitOrderChunk, SplitOrderPlan, SplitParams,
};
