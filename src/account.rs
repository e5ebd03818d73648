//! Account Aggregate (component D).
//!
//! The account is the single-writer owner of its cash ledger, its positions,
//! and every order it has ever sent. `cash` is the ground-truth balance:
//! opening a position debits it by the margin/notional amount up front
//! (`Preset::frozen_money`), closing credits back the released margin plus
//! realized P&L, and every fill also debits commission/tax. `balance()` is
//! then `cash + Σ position_profit + Σ float_profit` — an invariant, not a
//! reconciliation (see `crate::position::TradeEffect`).
//!
//! All money-moving operations go through `send_order` (which reserves
//! margin for a pending open, or reserves position volume for a pending
//! close) followed by `apply_fill` (which settles the reservation into cash
//! and position movement) or `cancel_order` (which releases the reservation
//! without moving money).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::algo::splitter::AlgoOrderManager;
use crate::error::{CoreError, ValidationError};
use crate::order::{Direction, Offset, Order, OrderType, TimeCondition};
use crate::position::{Position, Side};
use crate::preset::{PresetTable, TradeSign};

/// One completed (possibly partial) fill, kept in the day's trade log.
#[derive(Debug, Clone)]
pub struct Trade {
    pub trade_id: String,
    pub order_id: String,
    pub symbol: String,
    pub direction: Direction,
    pub offset: Offset,
    pub price: f64,
    pub volume: f64,
    pub commission: f64,
    pub tax: f64,
    pub realized_profit: f64,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct AccountStats {
    pub total_positions: usize,
    pub active_positions: usize,
    pub total_profit: f64,
    pub total_margin: f64,
    pub total_market_value: f64,
}

impl AccountStats {
    pub fn update(&mut self, account: &Account, presets: &PresetTable) {
        self.total_positions = account.positions.len();
        self.active_positions = account.positions.values().filter(|p| p.has_position()).count();
        self.total_profit = account.position_profit(presets) + account.float_profit(presets);
        self.total_margin = account.margin();
        self.total_market_value = account
            .positions
            .values()
            .map(|p| {
                let preset = presets.get(&p.symbol);
                let last = account.last_price.get(&p.symbol).copied().unwrap_or(p.position_price);
                p.market_value(last, &preset)
            })
            .sum();
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub account_id: String,
    pub currency: String,
    /// Ground-truth spendable cash; every fill, commission, tax and
    /// margin movement is applied here directly.
    pub cash: f64,
    /// Accumulated realized close profit since the last settle (informational;
    /// already folded into `cash` at the moment each close fills).
    pub close_profit: f64,
    /// Accumulated commission since the last settle (informational).
    pub commission: f64,
    /// Accumulated stamp duty since the last settle (informational).
    pub tax: f64,
    /// Margin reserved against pending (unfilled) open orders — not yet
    /// debited from `cash`.
    pub frozen_margin: f64,

    pub commission_ratio: f64,
    pub tax_ratio: f64,
    pub allow_t0: bool,
    pub allow_sellopen: bool,
    pub allow_margin: bool,

    pub positions: HashMap<String, Position>,
    pub orders: HashMap<String, Order>,
    pub last_price: HashMap<String, f64>,
    pub daily_trades: Vec<Trade>,
    pub daily_order_ids: Vec<String>,
    pub events: Vec<(DateTime<Utc>, String)>,
    pub event_id: u64,
    pub trading_day: String,

    pub algo_manager: AlgoOrderManager,
}

impl Account {
    pub fn new(account_id: impl Into<String>, init_cash: f64, trading_day: impl Into<String>) -> Self {
        Account {
            account_id: account_id.into(),
            currency: "CNY".to_string(),
            cash: init_cash,
            close_profit: 0.0,
            commission: 0.0,
            tax: 0.0,
            frozen_margin: 0.0,
            commission_ratio: 0.00025,
            tax_ratio: 0.001,
            allow_t0: false,
            allow_sellopen: false,
            allow_margin: false,
            positions: HashMap::new(),
            orders: HashMap::new(),
            last_price: HashMap::new(),
            daily_trades: Vec::new(),
            daily_order_ids: Vec::new(),
            events: Vec::new(),
            event_id: 0,
            trading_day: trading_day.into(),
            algo_manager: AlgoOrderManager::new(),
        }
    }

    pub fn set_sellopen(&mut self, allow: bool) {
        self.allow_sellopen = allow;
    }

    pub fn set_t0(&mut self, allow: bool) {
        self.allow_t0 = allow;
    }

    fn push_event(&mut self, now: DateTime<Utc>, message: impl Into<String>) {
        self.event_id += 1;
        self.events.push((now, message.into()));
    }

    // ---- ledger readouts ----------------------------------------------

    /// Margin currently locked up across all positions (already debited
    /// from `cash`); distinct from `frozen_margin`, which is reserved for
    /// orders not yet filled.
    pub fn margin(&self) -> f64 {
        self.positions.values().map(|p| p.margin()).sum()
    }

    pub fn position_profit(&self, presets: &PresetTable) -> f64 {
        self.positions
            .values()
            .map(|p| {
                let preset = presets.get(&p.symbol);
                p.position_profit(&preset)
            })
            .sum()
    }

    pub fn float_profit(&self, presets: &PresetTable) -> f64 {
        self.positions
            .values()
            .map(|p| {
                let preset = presets.get(&p.symbol);
                let last = self.last_price.get(&p.symbol).copied().unwrap_or(p.position_price);
                p.float_profit(last, &preset)
            })
            .sum()
    }

    /// `cash + Σ position_profit + Σ float_profit` — the core ledger
    /// equation that must hold after every operation.
    pub fn balance(&self, presets: &PresetTable) -> f64 {
        self.cash + self.position_profit(presets) + self.float_profit(presets)
    }

    pub fn available(&self) -> f64 {
        self.cash - self.frozen_margin
    }

    pub fn risk_ratio(&self, presets: &PresetTable) -> f64 {
        let balance = self.balance(presets);
        if balance <= 0.0 {
            0.0
        } else {
            (self.margin() + self.frozen_margin) / balance
        }
    }

    pub fn on_price_change(&mut self, symbol: &str, price: f64) {
        self.last_price.insert(symbol.to_string(), price);
    }

    // ---- order entry ----------------------------------------------------

    /// Core order-placement path: validates, reserves funds/position volume,
    /// and records the order. Mirrors `order_check` + `insert_order` in the
    /// original account implementation.
    #[allow(clippy::too_many_arguments)]
    pub fn send_order(
        &mut self,
        symbol: &str,
        direction: Direction,
        offset: Offset,
        price: f64,
        volume: f64,
        order_type: OrderType,
        time_condition: TimeCondition,
        presets: &PresetTable,
        now: DateTime<Utc>,
    ) -> Result<Order, CoreError> {
        if symbol.is_empty() {
            return Err(ValidationError::EmptySymbol.into());
        }
        if volume <= 0.0 {
            return Err(ValidationError::NonPositiveVolume(volume.to_string()).into());
        }
        // STAR market board lot rule: codes on the 688xxx board require a
        // minimum opening clip of 200 shares.
        if offset == Offset::Open && symbol.starts_with("688") && volume < 200.0 {
            return Err(CoreError::MarketRule(format!(
                "STAR board order for {symbol} must open at least 200 shares, got {volume}"
            )));
        }

        let preset = presets.get(symbol);
        let position = self
            .positions
            .entry(symbol.to_string())
            .or_insert_with(|| Position::new(symbol));

        match offset {
            Offset::Open => {
                if direction == Direction::Sell && !self.allow_sellopen {
                    return Err(CoreError::MarketRule(format!(
                        "sell-open is not enabled on account {}",
                        self.account_id
                    )));
                }
                let required_margin = preset.frozen_money(price, volume);
                let available_now = self.cash - self.frozen_margin;
                if available_now < required_margin - 1e-6 {
                    return Err(CoreError::InsufficientFunds {
                        required: required_margin,
                        available: available_now,
                    });
                }
                self.frozen_margin += required_margin;
            }
            Offset::Close => {
                let side = close_side(direction);
                position.freeze(side, volume, false)?;
            }
            Offset::CloseToday => {
                if preset.exchange_code == "STOCK" && !self.allow_t0 {
                    return Err(CoreError::MarketRule(format!(
                        "{symbol} is T+1 settled; close-today is not permitted on account {}",
                        self.account_id
                    )));
                }
                let side = close_side(direction);
                position.freeze(side, volume, true)?;
            }
        }

        let order = Order::new(
            self.account_id.clone(),
            symbol,
            direction,
            offset,
            order_type,
            time_condition,
            price,
            volume,
            preset.exchange_code.clone(),
            now,
        )?;
        self.orders.insert(order.order_id.clone(), order.clone());
        self.daily_order_ids.push(order.order_id.clone());
        self.push_event(now, format!("sent order {} {symbol} {volume}@{price}", order.order_id));
        info!(order_id = %order.order_id, %symbol, volume, price, "order accepted");
        Ok(order)
    }

    pub fn buy_open(&mut self, symbol: &str, price: f64, volume: f64, presets: &PresetTable, now: DateTime<Utc>) -> Result<Order, CoreError> {
        self.send_order(symbol, Direction::Buy, Offset::Open, price, volume, OrderType::Limit, TimeCondition::Gtc, presets, now)
    }

    pub fn sell_open(&mut self, symbol: &str, price: f64, volume: f64, presets: &PresetTable, now: DateTime<Utc>) -> Result<Order, CoreError> {
        self.send_order(symbol, Direction::Sell, Offset::Open, price, volume, OrderType::Limit, TimeCondition::Gtc, presets, now)
    }

    pub fn buy_close(&mut self, symbol: &str, price: f64, volume: f64, presets: &PresetTable, now: DateTime<Utc>) -> Result<Order, CoreError> {
        self.send_order(symbol, Direction::Buy, Offset::Close, price, volume, OrderType::Limit, TimeCondition::Gtc, presets, now)
    }

    pub fn sell_close(&mut self, symbol: &str, price: f64, volume: f64, presets: &PresetTable, now: DateTime<Utc>) -> Result<Order, CoreError> {
        self.send_order(symbol, Direction::Sell, Offset::Close, price, volume, OrderType::Limit, TimeCondition::Gtc, presets, now)
    }

    pub fn buy_closetoday(&mut self, symbol: &str, price: f64, volume: f64, presets: &PresetTable, now: DateTime<Utc>) -> Result<Order, CoreError> {
        self.send_order(symbol, Direction::Buy, Offset::CloseToday, price, volume, OrderType::Limit, TimeCondition::Gtc, presets, now)
    }

    pub fn sell_closetoday(&mut self, symbol: &str, price: f64, volume: f64, presets: &PresetTable, now: DateTime<Utc>) -> Result<Order, CoreError> {
        self.send_order(symbol, Direction::Sell, Offset::CloseToday, price, volume, OrderType::Limit, TimeCondition::Gtc, presets, now)
    }

    /// Buy, routing automatically: close any short position first (closing
    /// is never blocked by `allow_sellopen`), then open the remainder. Sends
    /// up to two orders, matching `smart_buy` in the original.
    pub fn smart_buy(
        &mut self,
        symbol: &str,
        price: f64,
        volume: f64,
        presets: &PresetTable,
        now: DateTime<Utc>,
    ) -> Result<Vec<Order>, CoreError> {
        let short_avail = self
            .positions
            .get(symbol)
            .map(|p| p.available_short_close())
            .unwrap_or(0.0);

        if short_avail <= 1e-6 {
            Ok(vec![self.buy_open(symbol, price, volume, presets, now)?])
        } else if short_avail >= volume - 1e-6 {
            Ok(vec![self.buy_close(symbol, price, volume, presets, now)?])
        } else {
            let close_leg = self.buy_close(symbol, price, short_avail, presets, now)?;
            let open_leg = self.buy_open(symbol, price, volume - short_avail, presets, now)?;
            Ok(vec![close_leg, open_leg])
        }
    }

    /// Mirror of `smart_buy` for the sell side: close long first, then
    /// open-short the remainder (subject to `allow_sellopen`).
    pub fn smart_sell(
        &mut self,
        symbol: &str,
        price: f64,
        volume: f64,
        presets: &PresetTable,
        now: DateTime<Utc>,
    ) -> Result<Vec<Order>, CoreError> {
        let long_avail = self
            .positions
            .get(symbol)
            .map(|p| p.available_long_close())
            .unwrap_or(0.0);

        if long_avail <= 1e-6 {
            Ok(vec![self.sell_open(symbol, price, volume, presets, now)?])
        } else if long_avail >= volume - 1e-6 {
            Ok(vec![self.sell_close(symbol, price, volume, presets, now)?])
        } else {
            let close_leg = self.sell_close(symbol, price, long_avail, presets, now)?;
            let open_leg = self.sell_open(symbol, price, volume - long_avail, presets, now)?;
            Ok(vec![close_leg, open_leg])
        }
    }

    pub fn cancel_order(&mut self, order_id: &str, presets: &PresetTable, now: DateTime<Utc>) -> Result<(), CoreError> {
        let order = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| CoreError::UnknownOrder(order_id.to_string()))?;
        if !order.is_active() {
            return Err(CoreError::MarketRule(format!("order {order_id} is not active")));
        }
        let remaining = order.volume_left;
        let symbol = order.symbol.clone();
        let offset = order.offset;
        let direction = order.direction;
        let order_price = order.price;
        order.cancel("cancelled by account", now)?;

        let preset = presets.get(&symbol);
        match offset {
            Offset::Open => {
                self.frozen_margin = (self.frozen_margin - preset.frozen_money(order_price, remaining)).max(0.0);
            }
            Offset::Close | Offset::CloseToday => {
                if let Some(position) = self.positions.get_mut(&symbol) {
                    position.unfreeze(close_side(direction), remaining);
                }
            }
        }
        self.push_event(now, format!("cancelled order {order_id}"));
        warn!(order_id, "order cancelled");
        Ok(())
    }

    /// Settle a fill against its order and position: moves cash, releases
    /// whatever fraction of the open-order margin reservation the fill
    /// consumed, and books commission/tax/realized-profit.
    pub fn apply_fill(
        &mut self,
        order_id: &str,
        fill_price: f64,
        fill_volume: f64,
        presets: &PresetTable,
        now: DateTime<Utc>,
    ) -> Result<Trade, CoreError> {
        let order = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| CoreError::UnknownOrder(order_id.to_string()))?;
        let symbol = order.symbol.clone();
        let direction = order.direction;
        let offset = order.offset;
        let order_price = order.price;
        order.fill(fill_volume, fill_price, now)?;

        let preset = presets.get(&symbol);
        let position = self
            .positions
            .get_mut(&symbol)
            .ok_or_else(|| CoreError::UnknownOrder(format!("no position for {symbol}")))?;
        let effect = position.apply_trade(direction, offset, fill_price, fill_volume, &preset)?;

        let trade_sign = match direction {
            Direction::Buy => TradeSign::Buy,
            Direction::Sell => TradeSign::Sell,
        };
        let commission = preset.commission(fill_price, fill_volume);
        let tax = preset.tax(fill_price, fill_volume, trade_sign);

        self.commission += commission;
        self.tax += tax;
        self.close_profit += effect.realized_profit;
        self.cash += effect.margin_cash_delta + effect.realized_profit - commission - tax;

        if offset == Offset::Open {
            self.frozen_margin = (self.frozen_margin - preset.frozen_money(order_price, fill_volume)).max(0.0);
        }

        let trade = Trade {
            trade_id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            symbol: symbol.clone(),
            direction,
            offset,
            price: fill_price,
            volume: fill_volume,
            commission,
            tax,
            realized_profit: effect.realized_profit,
            time: now,
        };
        self.daily_trades.push(trade.clone());
        self.push_event(now, format!("filled {order_id} {fill_volume}@{fill_price}"));
        info!(order_id, %symbol, fill_volume, fill_price, realized = effect.realized_profit, "fill applied");
        Ok(trade)
    }

    // ---- non-trading ledger events --------------------------------------

    /// Administrative transfer of `volume` (signed: positive adds to the
    /// long-historical bucket, negative to the short-historical bucket) at
    /// zero commission/tax, recorded as a zero-price trade. Used for broker
    /// position transfers-in that bypass the matching engine.
    pub fn transfer_event(&mut self, symbol: &str, volume: f64, now: DateTime<Utc>) {
        let position = self
            .positions
            .entry(symbol.to_string())
            .or_insert_with(|| Position::new(symbol));
        if volume > 0.0 {
            position.volume_long_his += volume;
        } else {
            position.volume_short_his += -volume;
        }
        let trade = Trade {
            trade_id: Uuid::new_v4().to_string(),
            order_id: String::new(),
            symbol: symbol.to_string(),
            direction: if volume > 0.0 { Direction::Buy } else { Direction::Sell },
            offset: Offset::Open,
            price: 0.0,
            volume: volume.abs(),
            commission: 0.0,
            tax: 0.0,
            realized_profit: 0.0,
            time: now,
        };
        self.daily_trades.push(trade);
        self.push_event(now, format!("transfer {volume} {symbol}"));
    }

    /// Cash dividend/distribution: credits `(long_his - short_his) * ratio`.
    pub fn dividend_event(&mut self, symbol: &str, money_ratio: f64, now: DateTime<Utc>) {
        if let Some(position) = self.positions.get(symbol) {
            let net = position.volume_long_his - position.volume_short_his;
            self.cash += net * money_ratio;
            self.push_event(now, format!("dividend {symbol} ratio {money_ratio}"));
        }
    }

    /// End-of-day settlement: crystallize each position's mark-to-market
    /// `position_profit` into cash (daily futures-style settlement), roll
    /// today's volume into historical, reset daily accumulators, and re-mark
    /// each position to its settlement price for the next trading day.
    pub fn settle(&mut self, next_trading_day: impl Into<String>, presets: &PresetTable) {
        let mut mtm_total = 0.0;
        for position in self.positions.values_mut() {
            let preset = presets.get(&position.symbol);
            let settlement_price = position.position_price;
            mtm_total += position.position_profit(&preset);
            position.roll_today_to_historical(settlement_price);
        }
        self.cash += mtm_total;
        self.close_profit = 0.0;
        self.commission = 0.0;
        self.tax = 0.0;
        self.daily_trades.clear();
        self.daily_order_ids.clear();
        self.trading_day = next_trading_day.into();
    }

    pub fn stats(&self, presets: &PresetTable) -> AccountStats {
        let mut stats = AccountStats::default();
        stats.update(self, presets);
        stats
    }

    // ---- algo splitter delegation ---------------------------------------

    pub fn active_algo_plan_count(&self) -> usize {
        self.algo_manager.active_plan_count()
    }
}

fn close_side(direction: Direction) -> Side {
    match direction {
        Direction::Buy => Side::Short,
        Direction::Sell => Side::Long,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::{Preset, PresetTable};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn s1_stock_buy_then_partial_sell() {
        let presets = PresetTable::new();
        let mut account = Account::new("acc1", 1_000_000.0, "20260101");
        let order = account.buy_open("SH000001", 10.0, 1000.0, &presets, now()).unwrap();
        account.apply_fill(&order.order_id, 10.0, 1000.0, &presets, now()).unwrap();

        assert_eq!(account.positions["SH000001"].volume_long(), 1000.0);
        assert!((account.cash - 989_997.5).abs() < 1e-6);

        account.on_price_change("SH000001", 10.5);
        assert!((account.float_profit(&presets) - 500.0).abs() < 1e-6);

        let cash_before_sell = account.cash;
        let sell = account.sell_close("SH000001", 10.6, 400.0, &presets, now()).unwrap();
        account.apply_fill(&sell.order_id, 10.6, 400.0, &presets, now()).unwrap();

        assert!((account.positions["SH000001"].volume_long() - 600.0).abs() < 1e-6);
        let expected_cash_delta = 400.0 * 10.6 - 1.06 - 0.001 * 400.0 * 10.6;
        assert!((account.cash - cash_before_sell - expected_cash_delta).abs() < 1e-4);
    }

    #[test]
    fn s2_futures_open_close_with_margin() {
        // Spec §8 S2 pins an exact preset (unit_table=10, buy_frozen_coeff=0.1,
        // commission_per_volume=2.0); the catalogue's "IF" entry carries a
        // different unit_table, so build the scenario's preset explicitly
        // instead of relying on the default lookup.
        let mut presets = PresetTable::new();
        presets.insert(
            "IF",
            Preset {
                name: "IF2401".to_string(),
                exchange_code: "CFFEX".to_string(),
                unit_table: 10,
                price_tick: 0.2,
                buy_frozen_coeff: 0.1,
                sell_frozen_coeff: 0.1,
                commission_per_amount: 0.0,
                commission_per_volume: 2.0,
                commission_today_per_amount: 0.0,
                commission_today_per_volume: 2.0,
            },
        );
        let mut account = Account::new("acc1", 1_000_000.0, "20260101");
        let cash_start = account.cash;

        let open = account.buy_open("IF2401", 4000.0, 2.0, &presets, now()).unwrap();
        account.apply_fill(&open.order_id, 4000.0, 2.0, &presets, now()).unwrap();

        let preset = presets.get("IF2401");
        let expected_margin = preset.frozen_money(4000.0, 2.0);
        let open_commission = preset.commission(4000.0, 2.0);
        assert!((cash_start - account.cash - (expected_margin + open_commission)).abs() < 1e-6);

        account.on_price_change("IF2401", 4010.0);

        let close = account.sell_close("IF2401", 4010.0, 2.0, &presets, now()).unwrap();
        account.apply_fill(&close.order_id, 4010.0, 2.0, &presets, now()).unwrap();

        assert!((account.positions["IF2401"].volume_long()).abs() < 1e-9);
        let close_commission = preset.commission(4010.0, 2.0);
        let total_delta = account.cash - cash_start;
        let expected_total_delta = 200.0 - open_commission - close_commission;
        assert!((total_delta - expected_total_delta).abs() < 1e-4);
    }

    #[test]
    fn sell_open_rejected_without_sellopen_flag() {
        let presets = PresetTable::new();
        let mut account = Account::new("acc1", 1_000_000.0, "20260101");
        assert!(account.sell_open("RB2301", 3500.0, 10.0, &presets, now()).is_err());
    }

    #[test]
    fn smart_buy_closes_short_then_opens_residual() {
        let presets = PresetTable::new();
        let mut account = Account::new("acc1", 1_000_000.0, "20260101");
        account.set_sellopen(true);
        let short_order = account.sell_open("RB2301", 3500.0, 5.0, &presets, now()).unwrap();
        account.apply_fill(&short_order.order_id, 3500.0, 5.0, &presets, now()).unwrap();

        let legs = account.smart_buy("RB2301", 3510.0, 8.0, &presets, now()).unwrap();
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].offset, Offset::Close);
        assert_eq!(legs[0].volume, 5.0);
        assert_eq!(legs[1].offset, Offset::Open);
        assert_eq!(legs[1].volume, 3.0);
    }

    #[test]
    fn cancel_releases_frozen_margin() {
        let presets = PresetTable::new();
        let mut account = Account::new("acc1", 1_000_000.0, "20260101");
        let order = account.buy_open("RB2301", 3500.0, 10.0, &presets, now()).unwrap();
        let frozen_before = account.frozen_margin;
        assert!(frozen_before > 0.0);
        account.cancel_order(&order.order_id, &presets, now()).unwrap();
        assert!(account.frozen_margin.abs() < 1e-6);
    }

    #[test]
    fn settle_clears_daily_accumulators_and_rolls_positions() {
        let presets = PresetTable::new();
        let mut account = Account::new("acc1", 1_000_000.0, "20260101");
        let order = account.buy_open("RB2301", 3500.0, 10.0, &presets, now()).unwrap();
        account.apply_fill(&order.order_id, 3500.0, 10.0, &presets, now()).unwrap();
        account.settle("20260102", &presets);
        assert_eq!(account.commission, 0.0);
        assert!(account.daily_trades.is_empty());
        assert_eq!(account.positions["RB2301"].volume_long_today, 0.0);
        assert_eq!(account.positions["RB2301"].volume_long_his, 10.0);
        assert_eq!(account.trading_day, "20260102");
    }

    #[test]
    fn transfer_and_dividend_events() {
        let mut account = Account::new("acc1", 1_000_000.0, "20260101");
        account.transfer_event("RB2301", 10.0, now());
        assert_eq!(account.positions["RB2301"].volume_long_his, 10.0);
        let cash_before = account.cash;
        account.dividend_event("RB2301", 0.5, now());
        assert!((account.cash - cash_before - 5.0).abs() < 1e-9);
    }

    #[test]
    fn ledger_equation_holds_after_open_and_price_move() {
        let presets = PresetTable::new();
        let mut account = Account::new("acc1", 1_000_000.0, "20260101");
        let order = account.buy_open("RB2301", 3500.0, 10.0, &presets, now()).unwrap();
        account.apply_fill(&order.order_id, 3500.0, 10.0, &presets, now()).unwrap();
        account.on_price_change("RB2301", 3550.0);

        let expected_balance = account.cash + account.position_profit(&presets) + account.float_profit(&presets);
        assert!((account.balance(&presets) - expected_balance).abs() < 1e-9);
    }
}
