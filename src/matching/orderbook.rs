//! Per-symbol limit order book: price-time priority matching.
//!
//! Adapted from the teacher's `services/matching/orderbook.rs`: a
//! `BTreeMap<PriceLevel, VecDeque<OrderEntry>>` per side guarded by
//! `parking_lot::RwLock`, a `DashMap` index from order id to its resting
//! location for O(1) cancel, and `AtomicI64`/`AtomicU64` counters for the
//! last trade price and a monotonic acceptance sequence.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::RwLock;

use super::types::{MatchingError, OrderEntry, PriceLevel, Side, TradeResult};

pub struct Orderbook {
    symbol: String,
    bids: RwLock<BTreeMap<PriceLevel, VecDeque<OrderEntry>>>,
    asks: RwLock<BTreeMap<PriceLevel, VecDeque<OrderEntry>>>,
    /// order_id -> (side, price level), so cancel doesn't need to scan.
    index: DashMap<String, (Side, PriceLevel)>,
    last_trade_price: AtomicI64,
    sequence: AtomicU64,
}

impl Orderbook {
    pub fn new(symbol: impl Into<String>) -> Self {
        Orderbook {
            symbol: symbol.into(),
            bids: RwLock::new(BTreeMap::new()),
            asks: RwLock::new(BTreeMap::new()),
            index: DashMap::new(),
            last_trade_price: AtomicI64::new(0),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    pub fn last_trade_price(&self) -> PriceLevel {
        PriceLevel::from_raw(self.last_trade_price.load(Ordering::Relaxed))
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids.read().keys().next_back().copied()
    }

    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks.read().keys().next().copied()
    }

    pub fn spread(&self) -> Option<PriceLevel> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some(PriceLevel::from_raw(ask.raw() - bid.raw())),
            _ => None,
        }
    }

    /// Insert a resting order directly (used for the unmatched remainder of
    /// an incoming order after `match_order`, or for pure book-building in
    /// tests).
    pub fn add_order(&self, order_id: String, account_id: String, side: Side, price: PriceLevel, volume: f64) -> Result<(), MatchingError> {
        if volume <= 0.0 {
            return Err(MatchingError::NonPositiveVolume(volume));
        }
        if self.index.contains_key(&order_id) {
            return Err(MatchingError::DuplicateOrder(order_id));
        }
        let sequence = self.next_sequence();
        let entry = OrderEntry {
            order_id: order_id.clone(),
            account_id,
            side,
            price,
            volume,
            sequence,
        };
        let book = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        book.write().entry(price).or_insert_with(VecDeque::new).push_back(entry);
        self.index.insert(order_id, (side, price));
        Ok(())
    }

    pub fn cancel_order(&self, order_id: &str) -> Result<(), MatchingError> {
        let (side, price) = self
            .index
            .remove(order_id)
            .map(|(_, v)| v)
            .ok_or_else(|| MatchingError::UnknownOrder(order_id.to_string()))?;
        let book = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        let mut guard = book.write();
        if let Some(queue) = guard.get_mut(&price) {
            queue.retain(|e| e.order_id != order_id);
            if queue.is_empty() {
                guard.remove(&price);
            }
        }
        Ok(())
    }

    pub fn has_order(&self, order_id: &str) -> bool {
        self.index.contains_key(order_id)
    }

    pub fn get_order(&self, order_id: &str) -> Option<OrderEntry> {
        let (side, price) = *self.index.get(order_id)?;
        let book = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        book.read()
            .get(&price)
            .and_then(|queue| queue.iter().find(|e| e.order_id == order_id).cloned())
    }

    /// Match an incoming `(side, price, volume)` order against the resting
    /// book, walking price levels in price-time priority. Returns the trades
    /// produced; any unfilled remainder is left to the caller to `add_order`
    /// as a new resting order (the book does not auto-rest it, so a caller
    /// can choose IOC/FOK semantics upstream). `is_market` crosses the book
    /// at any price (a market order carries `price == 0`, which would
    /// otherwise never satisfy the limit-price filter below).
    pub fn match_order(
        &self,
        order_id: &str,
        account_id: &str,
        side: Side,
        price: PriceLevel,
        volume: f64,
        is_market: bool,
    ) -> Result<(Vec<TradeResult>, f64), MatchingError> {
        if volume <= 0.0 {
            return Err(MatchingError::NonPositiveVolume(volume));
        }

        let opposite_book = match side {
            Side::Buy => &self.asks,
            Side::Sell => &self.bids,
        };

        let mut trades = Vec::new();
        let mut remaining = volume;
        let mut guard = opposite_book.write();

        loop {
            if remaining <= 1e-9 {
                break;
            }
            let best_level = match side {
                // Buying: consume asks from lowest price up, while ask <= our limit.
                Side::Buy => guard.keys().next().copied().filter(|ask| is_market || ask.raw() <= price.raw()),
                // Selling: consume bids from highest price down, while bid >= our limit.
                Side::Sell => guard.keys().next_back().copied().filter(|bid| is_market || bid.raw() >= price.raw()),
            };
            let Some(level) = best_level else { break };

            let queue = guard.get_mut(&level).expect("level came from keys()");
            while remaining > 1e-9 {
                let Some(maker) = queue.front_mut() else { break };
                let fill_volume = remaining.min(maker.volume);
                maker.volume -= fill_volume;
                remaining -= fill_volume;

                let sequence = self.next_sequence();
                trades.push(TradeResult {
                    symbol: self.symbol.clone(),
                    maker_order_id: maker.order_id.clone(),
                    maker_account_id: maker.account_id.clone(),
                    taker_order_id: order_id.to_string(),
                    taker_account_id: account_id.to_string(),
                    price: level,
                    volume: fill_volume,
                    taker_side: side,
                    sequence,
                });
                self.last_trade_price.store(level.raw(), Ordering::Relaxed);

                if maker.volume <= 1e-9 {
                    let filled = queue.pop_front().unwrap();
                    self.index.remove(&filled.order_id);
                } else {
                    break;
                }
            }
            if queue.is_empty() {
                guard.remove(&level);
            }
        }

        Ok((trades, remaining))
    }

    /// Total opposite-side volume available at or better than `price` for an
    /// incoming order of `side` — used by fill-or-kill admission checks
    /// before committing a match. `is_market` counts all opposite-side
    /// liquidity regardless of price, matching `match_order`'s crossing rule.
    pub fn available_volume(&self, side: Side, price: PriceLevel, is_market: bool) -> f64 {
        let opposite_book = match side {
            Side::Buy => &self.asks,
            Side::Sell => &self.bids,
        };
        opposite_book
            .read()
            .iter()
            .filter(|(level, _)| {
                is_market
                    || match side {
                        Side::Buy => level.raw() <= price.raw(),
                        Side::Sell => level.raw() >= price.raw(),
                    }
            })
            .flat_map(|(_, queue)| queue.iter())
            .map(|e| e.volume)
            .sum()
    }

    pub fn bid_depth(&self) -> Vec<(PriceLevel, f64)> {
        self.bids
            .read()
            .iter()
            .rev()
            .map(|(price, queue)| (*price, queue.iter().map(|e| e.volume).sum()))
            .collect()
    }

    pub fn ask_depth(&self) -> Vec<(PriceLevel, f64)> {
        self.asks
            .read()
            .iter()
            .map(|(price, queue)| (*price, queue.iter().map(|e| e.volume).sum()))
            .collect()
    }

    pub fn snapshot(&self) -> OrderbookSnapshot {
        OrderbookSnapshot {
            symbol: self.symbol.clone(),
            bids: self.bid_depth(),
            asks: self.ask_depth(),
            last_trade_price: self.last_trade_price(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderbookSnapshot {
    pub symbol: String,
    pub bids: Vec<(PriceLevel, f64)>,
    pub asks: Vec<(PriceLevel, f64)>,
    pub last_trade_price: PriceLevel,
}
