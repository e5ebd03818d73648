//! Order Matching Engine (component E): one `Orderbook` per symbol, behind
//! a concurrent map so unrelated symbols never contend. Authored fresh —
//! the teacher's own engine-level wiring above `Orderbook` was not present
//! in the retrieval pack — but follows the teacher's concurrency idiom of
//! `dashmap::DashMap` for the symbol map (see `cache/pubsub.rs`'s use of
//! `DashMap` for subscriber registries) and `parking_lot` for the
//! lower-level per-book locks already used inside `Orderbook`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::order::{Order, OrderStatus, OrderType, TimeCondition};

use super::orderbook::Orderbook;
use super::types::{MatchingError, PriceLevel, Side, TradeResult};

pub type TradeCallback = Arc<dyn Fn(&TradeResult) + Send + Sync>;

/// Per-symbol multi-book matching engine; admits orders and reports fills
/// through a registered callback (the engine holds no reference back to any
/// Account — wiring trades to account state is the caller's responsibility,
/// per the explicit decoupling design note).
pub struct MatchingEngine {
    books: DashMap<String, Arc<Orderbook>>,
    callbacks: RwLock<Vec<TradeCallback>>,
    orders_accepted: AtomicU64,
    orders_rejected: AtomicU64,
    trades_executed: AtomicU64,
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchingEngine {
    pub fn new() -> Self {
        MatchingEngine {
            books: DashMap::new(),
            callbacks: RwLock::new(Vec::new()),
            orders_accepted: AtomicU64::new(0),
            orders_rejected: AtomicU64::new(0),
            trades_executed: AtomicU64::new(0),
        }
    }

    pub fn register_trade_callback(&self, callback: TradeCallback) {
        self.callbacks.write().push(callback);
    }

    fn book_for(&self, symbol: &str) -> Arc<Orderbook> {
        self.books
            .entry(symbol.to_string())
            .or_insert_with(|| Arc::new(Orderbook::new(symbol)))
            .clone()
    }

    pub fn book(&self, symbol: &str) -> Option<Arc<Orderbook>> {
        self.books.get(symbol).map(|b| b.clone())
    }

    pub fn orders_accepted(&self) -> u64 {
        self.orders_accepted.load(Ordering::Relaxed)
    }

    pub fn orders_rejected(&self) -> u64 {
        self.orders_rejected.load(Ordering::Relaxed)
    }

    pub fn trades_executed(&self) -> u64 {
        self.trades_executed.load(Ordering::Relaxed)
    }

    /// Submit `order` for matching. Returns the trades produced. Honors
    /// `TimeCondition`: `Ioc` discards any unfilled remainder, `Fok` rejects
    /// the whole order up front unless the book can fill it entirely, `Gtc`/
    /// `Day` rest the remainder in the book. A `Market` order crosses the
    /// book at any price and never rests — its residual is cancelled,
    /// regardless of `time_condition`, since it carries no price to rest at.
    pub fn submit_order(&self, order: &Order) -> Result<Vec<TradeResult>, MatchingError> {
        if order.status != OrderStatus::Pending {
            return Err(MatchingError::DuplicateOrder(order.order_id.clone()));
        }
        let book = self.book_for(&order.symbol);
        let side: Side = order.direction.into();
        let price = PriceLevel::from_f64(order.price);
        let is_market = order.order_type == OrderType::Market;

        if order.time_condition == TimeCondition::Fok {
            let available = book.available_volume(side, price, is_market);
            if available + 1e-9 < order.volume {
                self.orders_rejected.fetch_add(1, Ordering::Relaxed);
                return Err(MatchingError::NonPositiveVolume(0.0));
            }
        }

        let (trades, remaining) =
            book.match_order(&order.order_id, &order.account_id, side, price, order.volume, is_market)?;
        self.orders_accepted.fetch_add(1, Ordering::Relaxed);
        self.trades_executed.fetch_add(trades.len() as u64, Ordering::Relaxed);

        let callbacks = self.callbacks.read();
        for trade in &trades {
            for callback in callbacks.iter() {
                callback(trade);
            }
        }

        if remaining > 1e-9 && !is_market && matches!(order.time_condition, TimeCondition::Gtc | TimeCondition::Day) {
            book.add_order(order.order_id.clone(), order.account_id.clone(), side, price, remaining)?;
        }

        Ok(trades)
    }

    pub fn cancel_order(&self, symbol: &str, order_id: &str) -> Result<(), MatchingError> {
        let book = self
            .books
            .get(symbol)
            .ok_or_else(|| MatchingError::UnknownSymbol(symbol.to_string()))?;
        book.cancel_order(order_id)
    }
}
