//! Account Snapshot Codec ("QIFI", component G).
//!
//! `to_qifi` materializes a portable, serializable snapshot of an `Account`;
//! `from_qifi` reconstructs an `Account` from one. Field names mirror the
//! normative record in full, so the snapshot can cross a process boundary
//! (persisted to disk, sent over a wire) and be reloaded without loss of any
//! field the record names. Account-local configuration that the record
//! doesn't name (`allow_t0`/`allow_sellopen`/`allow_margin`, commission/tax
//! ratios, the event log, in-flight algo plans) resets to account defaults
//! on reconstruction — callers that need those preserved carry them
//! alongside the snapshot themselves.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::{Account, Trade};
use crate::order::{Direction, Offset, Order, OrderStatus, OrderType, TimeCondition};
use crate::position::Position;
use crate::preset::PresetTable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QifiAccountTotals {
    pub balance: f64,
    pub margin: f64,
    pub available: f64,
    pub risk_ratio: f64,
    pub position_profit: f64,
    pub float_profit: f64,
    pub close_profit: f64,
    pub commission: f64,
    pub pre_balance: f64,
    pub static_balance: f64,
    pub frozen_margin: f64,
    pub frozen_commission: f64,
    pub frozen_premium: f64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QifiPosition {
    pub symbol: String,
    pub volume_long_today: f64,
    pub volume_long_his: f64,
    pub volume_short_today: f64,
    pub volume_short_his: f64,
    pub frozen_long_today: f64,
    pub frozen_short_today: f64,
    pub open_price_long: f64,
    pub open_price_short: f64,
    pub margin_long: f64,
    pub margin_short: f64,
    pub position_price: f64,
    pub latest_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QifiOrder {
    pub order_id: String,
    pub account_id: String,
    pub symbol: String,
    pub direction: Direction,
    pub offset: Offset,
    pub order_type: OrderType,
    pub time_condition: TimeCondition,
    pub price: f64,
    pub volume: f64,
    pub volume_left: f64,
    pub volume_filled: f64,
    pub average_fill_price: f64,
    pub status: OrderStatus,
    pub exchange_id: String,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QifiTrade {
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QifiFrozen {
    pub money: f64,
    pub code: String,
    pub datetime: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QifiSnapshot {
    pub account_cookie: String,
    pub portfolio_cookie: String,
    pub investor_name: String,
    pub broker_name: String,
    pub money: f64,
    pub updatetime: DateTime<Utc>,
    pub trading_day: String,
    pub accounts: QifiAccountTotals,
    pub positions: HashMap<String, QifiPosition>,
    pub orders: HashMap<String, QifiOrder>,
    pub trades: HashMap<String, QifiTrade>,
    pub frozen: HashMap<String, QifiFrozen>,
}

pub fn to_qifi(account: &Account, presets: &PresetTable, now: DateTime<Utc>) -> QifiSnapshot {
    let positions = account
        .positions
        .values()
        .filter(|p| p.has_position())
        .map(|p| {
            let preset = presets.get(&p.symbol);
            let latest_price = account.last_price.get(&p.symbol).copied().unwrap_or(p.position_price);
            (
                p.symbol.clone(),
                QifiPosition {
                    symbol: p.symbol.clone(),
                    volume_long_today: p.volume_long_today,
                    volume_long_his: p.volume_long_his,
                    volume_short_today: p.volume_short_today,
                    volume_short_his: p.volume_short_his,
                    frozen_long_today: p.frozen_long_today,
                    frozen_short_today: p.frozen_short_today,
                    open_price_long: p.open_price_long,
                    open_price_short: p.open_price_short,
                    margin_long: p.margin_held_long,
                    margin_short: p.margin_held_short,
                    position_price: p.position_price,
                    latest_price,
                },
            )
        })
        .collect();

    let orders = account
        .orders
        .iter()
        .map(|(id, o)| {
            (
                id.clone(),
                QifiOrder {
                    order_id: o.order_id.clone(),
                    account_id: o.account_id.clone(),
                    symbol: o.symbol.clone(),
                    direction: o.direction,
                    offset: o.offset,
                    order_type: o.order_type,
                    time_condition: o.time_condition,
                    price: o.price,
                    volume: o.volume,
                    volume_left: o.volume_left,
                    volume_filled: o.volume_filled,
                    average_fill_price: o.average_fill_price,
                    status: o.status,
                    exchange_id: o.exchange_id.clone(),
                    create_time: o.create_time,
                    update_time: o.update_time,
                },
            )
        })
        .collect();

    let trades = account
        .daily_trades
        .iter()
        .map(|t| {
            (
                t.trade_id.clone(),
                QifiTrade {
                    trade_id: t.trade_id.clone(),
                    order_id: t.order_id.clone(),
                    symbol: t.symbol.clone(),
                    direction: t.direction,
                    offset: t.offset,
                    price: t.price,
                    volume: t.volume,
                    commission: t.commission,
                    tax: t.tax,
                    realized_profit: t.realized_profit,
                    time: t.time,
                },
            )
        })
        .collect();

    let frozen = account
        .orders
        .values()
        .filter(|o| o.is_active() && o.offset == Offset::Open)
        .map(|o| {
            let preset = presets.get(&o.symbol);
            (
                o.order_id.clone(),
                QifiFrozen {
                    money: preset.frozen_money(o.price, o.volume_left),
                    code: o.symbol.clone(),
                    datetime: o.update_time,
                },
            )
        })
        .collect();

    QifiSnapshot {
        account_cookie: account.account_id.clone(),
        portfolio_cookie: account.account_id.clone(),
        investor_name: account.account_id.clone(),
        broker_name: "qaultra-core".to_string(),
        money: account.cash,
        updatetime: now,
        trading_day: account.trading_day.clone(),
        accounts: QifiAccountTotals {
            balance: account.balance(presets),
            margin: account.margin(),
            available: account.available(),
            risk_ratio: account.risk_ratio(presets),
            position_profit: account.position_profit(presets),
            float_profit: account.float_profit(presets),
            close_profit: account.close_profit,
            commission: account.commission,
            pre_balance: account.balance(presets),
            static_balance: account.cash,
            frozen_margin: account.frozen_margin,
            frozen_commission: 0.0,
            frozen_premium: 0.0,
            currency: account.currency.clone(),
        },
        positions,
        orders,
        trades,
        frozen,
    }
}

pub fn from_qifi(snapshot: &QifiSnapshot) -> Account {
    let mut account = Account::new(snapshot.account_cookie.clone(), snapshot.money, snapshot.trading_day.clone());
    account.currency = snapshot.accounts.currency.clone();
    account.close_profit = snapshot.accounts.close_profit;
    account.commission = snapshot.accounts.commission;
    account.frozen_margin = snapshot.accounts.frozen_margin;

    for (symbol, qp) in &snapshot.positions {
        let mut position = Position::new(symbol.clone());
        position.volume_long_today = qp.volume_long_today;
        position.volume_long_his = qp.volume_long_his;
        position.volume_short_today = qp.volume_short_today;
        position.volume_short_his = qp.volume_short_his;
        position.frozen_long_today = qp.frozen_long_today;
        position.frozen_short_today = qp.frozen_short_today;
        position.open_price_long = qp.open_price_long;
        position.open_price_short = qp.open_price_short;
        position.margin_held_long = qp.margin_long;
        position.margin_held_short = qp.margin_short;
        position.position_price = qp.position_price;
        account.last_price.insert(symbol.clone(), qp.latest_price);
        account.positions.insert(symbol.clone(), position);
    }

    let mut order_ids: Vec<String> = Vec::new();
    for (id, qo) in &snapshot.orders {
        let order = Order {
            order_id: qo.order_id.clone(),
            account_id: qo.account_id.clone(),
            symbol: qo.symbol.clone(),
            direction: qo.direction,
            offset: qo.offset,
            order_type: qo.order_type,
            time_condition: qo.time_condition,
            price: qo.price,
            volume: qo.volume,
            volume_left: qo.volume_left,
            volume_filled: qo.volume_filled,
            average_fill_price: qo.average_fill_price,
            status: qo.status,
            exchange_id: qo.exchange_id.clone(),
            user_id: None,
            strategy_id: None,
            create_time: qo.create_time,
            update_time: qo.update_time,
            last_message: String::new(),
        };
        order_ids.push(id.clone());
        account.orders.insert(id.clone(), order);
    }
    order_ids.sort();
    account.daily_order_ids = order_ids;

    let mut trades: Vec<Trade> = snapshot
        .trades
        .values()
        .map(|qt| Trade {
            trade_id: qt.trade_id.clone(),
            order_id: qt.order_id.clone(),
            symbol: qt.symbol.clone(),
            direction: qt.direction,
            offset: qt.offset,
            price: qt.price,
            volume: qt.volume,
            commission: qt.commission,
            tax: qt.tax,
            realized_profit: qt.realized_profit,
            time: qt.time,
        })
        .collect();
    trades.sort_by(|a, b| a.trade_id.cmp(&b.trade_id));
    account.daily_trades = trades;

    account
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::PresetTable;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn round_trip_preserves_cash_positions_orders_and_trades() {
        let presets = PresetTable::new();
        let mut account = Account::new("acc1", 1_000_000.0, "20260101");
        let order = account.buy_open("SH000001", 10.0, 1000.0, &presets, now()).unwrap();
        account.apply_fill(&order.order_id, 10.0, 1000.0, &presets, now()).unwrap();
        account.on_price_change("SH000001", 10.5);

        let snapshot = to_qifi(&account, &presets, now());
        let restored = from_qifi(&snapshot);

        assert!((restored.cash - account.cash).abs() < 1e-9);
        assert!((restored.balance(&presets) - account.balance(&presets)).abs() < 1e-6);
        assert!((restored.margin() - account.margin()).abs() < 1e-9);
        assert_eq!(restored.positions["SH000001"].volume_long(), account.positions["SH000001"].volume_long());
        assert_eq!(restored.orders.len(), account.orders.len());
        assert_eq!(restored.daily_trades.len(), account.daily_trades.len());
        assert_eq!(restored.trading_day, account.trading_day);
    }

    #[test]
    fn snapshot_omits_flat_positions() {
        let presets = PresetTable::new();
        let mut account = Account::new("acc1", 1_000_000.0, "20260101");
        let order = account.buy_open("RB2301", 3500.0, 10.0, &presets, now()).unwrap();
        account.apply_fill(&order.order_id, 3500.0, 10.0, &presets, now()).unwrap();
        let close = account.sell_close("RB2301", 3500.0, 10.0, &presets, now()).unwrap();
        account.apply_fill(&close.order_id, 3500.0, 10.0, &presets, now()).unwrap();

        let snapshot = to_qifi(&account, &presets, now());
        assert!(!snapshot.positions.contains_key("RB2301"));
    }

    #[test]
    fn frozen_map_reflects_pending_open_orders() {
        let presets = PresetTable::new();
        let mut account = Account::new("acc1", 1_000_000.0, "20260101");
        let order = account.buy_open("RB2301", 3500.0, 10.0, &presets, now()).unwrap();

        let snapshot = to_qifi(&account, &presets, now());
        assert!(snapshot.frozen.contains_key(&order.order_id));
        assert!(snapshot.frozen[&order.order_id].money > 0.0);
    }
}
