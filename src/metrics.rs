//! Metrics module for the trading core.
//!
//! Provides Prometheus-compatible metrics for:
//! - Order matching (submitted, matched, cancelled, rejected, latency)
//! - Account/ledger activity (trades settled, commission, realized P&L)
//! - Algorithmic order splitting (chunks dispatched, plans completed)
//! - Market-data broadcast (blocks published, dropped, subscriber count)

#![allow(dead_code)]

use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Metric names as constants for consistency.
pub mod names {
    // Matching Engine Metrics
    pub const ORDERS_SUBMITTED_TOTAL: &str = "orders_submitted_total";
    pub const ORDERS_ACCEPTED_TOTAL: &str = "orders_accepted_total";
    pub const ORDERS_REJECTED_TOTAL: &str = "orders_rejected_total";
    pub const ORDERS_CANCELLED_TOTAL: &str = "orders_cancelled_total";
    pub const ORDER_MATCH_DURATION_SECONDS: &str = "order_match_duration_seconds";
    pub const TRADES_EXECUTED_TOTAL: &str = "trades_executed_total";
    pub const TRADE_VOLUME_TOTAL: &str = "trade_volume_total";

    // Account / Ledger Metrics
    pub const TRADES_SETTLED_TOTAL: &str = "trades_settled_total";
    pub const COMMISSION_CHARGED_TOTAL: &str = "commission_charged_total";
    pub const REALIZED_PROFIT_TOTAL: &str = "realized_profit_total";

    // Algo Splitter Metrics
    pub const ALGO_CHUNKS_DISPATCHED_TOTAL: &str = "algo_chunks_dispatched_total";
    pub const ALGO_PLANS_COMPLETED_TOTAL: &str = "algo_plans_completed_total";
    pub const ALGO_PLANS_CANCELLED_TOTAL: &str = "algo_plans_cancelled_total";

    // Broadcast Hub Metrics
    pub const BROADCAST_BLOCKS_PUBLISHED_TOTAL: &str = "broadcast_blocks_published_total";
    pub const BROADCAST_BLOCKS_DROPPED_TOTAL: &str = "broadcast_blocks_dropped_total";
    pub const BROADCAST_BYTES_PUBLISHED_TOTAL: &str = "broadcast_bytes_published_total";
    pub const BROADCAST_SUBSCRIBERS_ACTIVE: &str = "broadcast_subscribers_active";
}

/// Label keys.
pub mod labels {
    pub const SYMBOL: &str = "symbol";
    pub const SIDE: &str = "side";
    pub const TIME_CONDITION: &str = "time_condition";
    pub const ALGORITHM: &str = "algorithm";
    pub const STREAM: &str = "stream";
}

/// Initializes the Prometheus metrics exporter, returning a handle that can
/// render the current metric set for scraping.
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(names::ORDER_MATCH_DURATION_SECONDS.to_string()),
            &[0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5],
        )
        .unwrap();

    builder
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

// ============================================================================
// Matching Engine Metrics
// ============================================================================

pub fn record_order_submitted(symbol: &str, side: &str) {
    counter!(
        names::ORDERS_SUBMITTED_TOTAL,
        labels::SYMBOL => symbol.to_string(),
        labels::SIDE => side.to_string()
    )
    .increment(1);
}

pub fn record_order_accepted() {
    counter!(names::ORDERS_ACCEPTED_TOTAL).increment(1);
}

pub fn record_order_rejected() {
    counter!(names::ORDERS_REJECTED_TOTAL).increment(1);
}

pub fn record_order_cancelled() {
    counter!(names::ORDERS_CANCELLED_TOTAL).increment(1);
}

pub fn record_order_match_duration(duration_secs: f64) {
    histogram!(names::ORDER_MATCH_DURATION_SECONDS).record(duration_secs);
}

pub fn record_trade_executed(symbol: &str, volume: f64) {
    counter!(
        names::TRADES_EXECUTED_TOTAL,
        labels::SYMBOL => symbol.to_string()
    )
    .increment(1);
    counter!(names::TRADE_VOLUME_TOTAL).increment(volume as u64);
}

// ============================================================================
// Account / Ledger Metrics
// ============================================================================

pub fn record_trade_settled(commission: f64, realized_profit: f64) {
    counter!(names::TRADES_SETTLED_TOTAL).increment(1);
    counter!(names::COMMISSION_CHARGED_TOTAL).increment(commission as u64);
    if realized_profit >= 0.0 {
        counter!(names::REALIZED_PROFIT_TOTAL).increment(realized_profit as u64);
    }
}

// ============================================================================
// Algo Splitter Metrics
// ============================================================================

pub fn record_algo_chunk_dispatched(algorithm: &str) {
    counter!(
        names::ALGO_CHUNKS_DISPATCHED_TOTAL,
        labels::ALGORITHM => algorithm.to_string()
    )
    .increment(1);
}

pub fn record_algo_plan_completed() {
    counter!(names::ALGO_PLANS_COMPLETED_TOTAL).increment(1);
}

pub fn record_algo_plan_cancelled() {
    counter!(names::ALGO_PLANS_CANCELLED_TOTAL).increment(1);
}

// ============================================================================
// Broadcast Hub Metrics
// ============================================================================

pub fn record_broadcast_block_published(stream: &str, bytes: u64) {
    counter!(
        names::BROADCAST_BLOCKS_PUBLISHED_TOTAL,
        labels::STREAM => stream.to_string()
    )
    .increment(1);
    counter!(names::BROADCAST_BYTES_PUBLISHED_TOTAL).increment(bytes);
}

pub fn record_broadcast_block_dropped(stream: &str) {
    counter!(
        names::BROADCAST_BLOCKS_DROPPED_TOTAL,
        labels::STREAM => stream.to_string()
    )
    .increment(1);
}

pub fn set_broadcast_subscribers_active(stream: &str, count: i64) {
    gauge!(
        names::BROADCAST_SUBSCRIBERS_ACTIVE,
        labels::STREAM => stream.to_string()
    )
    .set(count as f64);
}

// ============================================================================
// Timer Helper
// ============================================================================

/// Timer for measuring durations ahead of a histogram record call.
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_reports_elapsed_time() {
        let timer = Timer::new();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let elapsed = timer.elapsed_secs();
        assert!(elapsed >= 0.01);
        assert!(elapsed < 0.5);
    }

    #[test]
    fn metric_names_are_stable() {
        assert_eq!(names::ORDERS_SUBMITTED_TOTAL, "orders_submitted_total");
        assert_eq!(names::BROADCAST_BLOCKS_PUBLISHED_TOTAL, "broadcast_blocks_published_total");
    }
}
