//! Order Value Object (component B).
//!
//! An `Order` is an immutable-identity, mutable-state record: once created
//! its id/account/symbol/side/offset/price/volume never change, but its
//! `status`, `volume_filled` and `average_fill_price` advance monotonically
//! as fills arrive.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CoreError, ValidationError};

/// Buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn sign(self) -> i32 {
        match self {
            Direction::Buy => 1,
            Direction::Sell => -1,
        }
    }
}

/// Position effect: open a new position, close historical volume first, or
/// close only today's volume (distinct frozen bucket, futures-only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Offset {
    Open,
    Close,
    CloseToday,
}

/// `direction`×`offset` packed into the original's single signed `towards`
/// code (1/-1 generic, ±2 open, ±3 close, ±4 close-today). Kept for QIFI
/// round-tripping and for callers that think in the original's vocabulary.
pub fn towards(direction: Direction, offset: Offset) -> i32 {
    let magnitude = match offset {
        Offset::Open => 2,
        Offset::Close => 3,
        Offset::CloseToday => 4,
    };
    direction.sign() * magnitude
}

pub fn from_towards(code: i32) -> Result<(Direction, Offset), CoreError> {
    let direction = if code > 0 { Direction::Buy } else { Direction::Sell };
    let offset = match code.abs() {
        2 => Offset::Open,
        3 => Offset::Close,
        4 => Offset::CloseToday,
        _ => return Err(ValidationError::InvalidTowards(code).into()),
    };
    Ok((direction, offset))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TimeCondition {
    /// Good till cancel.
    Gtc,
    /// Immediate or cancel.
    Ioc,
    /// Fill or kill.
    Fok,
    /// Expires at end of trading day.
    Day,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OrderStatus {
    Pending,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Order {
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
    /// Volume-weighted average price across all fills so far; 0 until the
    /// first fill.
    pub average_fill_price: f64,
    pub status: OrderStatus,
    pub exchange_id: String,
    pub user_id: Option<String>,
    pub strategy_id: Option<String>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub last_message: String,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account_id: impl Into<String>,
        symbol: impl Into<String>,
        direction: Direction,
        offset: Offset,
        order_type: OrderType,
        time_condition: TimeCondition,
        price: f64,
        volume: f64,
        exchange_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, CoreError> {
        let symbol = symbol.into();
        if symbol.is_empty() {
            return Err(ValidationError::EmptySymbol.into());
        }
        if volume <= 0.0 {
            return Err(ValidationError::NonPositiveVolume(volume.to_string()).into());
        }
        if order_type != OrderType::Market && price <= 0.0 {
            return Err(ValidationError::NonPositivePrice(price.to_string()).into());
        }
        Ok(Order {
            order_id: Uuid::new_v4().to_string(),
            account_id: account_id.into(),
            symbol,
            direction,
            offset,
            order_type,
            time_condition,
            price,
            volume,
            volume_left: volume,
            volume_filled: 0.0,
            average_fill_price: 0.0,
            status: OrderStatus::Pending,
            exchange_id: exchange_id.into(),
            user_id: None,
            strategy_id: None,
            create_time: now,
            update_time: now,
            last_message: String::new(),
        })
    }

    pub fn towards(&self) -> i32 {
        towards(self.direction, self.offset)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::PartiallyFilled)
    }

    pub fn is_completed(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }

    pub fn fill_percentage(&self) -> f64 {
        if self.volume <= 0.0 {
            0.0
        } else {
            self.volume_filled / self.volume * 100.0
        }
    }

    pub fn order_value(&self) -> f64 {
        self.price * self.volume
    }

    pub fn filled_value(&self) -> f64 {
        self.average_fill_price * self.volume_filled
    }

    /// Apply a fill of `fill_volume` at `fill_price`. Recomputes the running
    /// VWAP fill price and advances status; never undoes a completed order.
    pub fn fill(&mut self, fill_volume: f64, fill_price: f64, now: DateTime<Utc>) -> Result<(), CoreError> {
        if self.is_completed() {
            return Err(CoreError::MarketRule(format!(
                "order {} already completed, cannot fill",
                self.order_id
            )));
        }
        if fill_volume <= 0.0 {
            return Err(ValidationError::NonPositiveVolume(fill_volume.to_string()).into());
        }
        if fill_volume > self.volume_left + 1e-6 {
            return Err(CoreError::MarketRule(format!(
                "fill volume {fill_volume} exceeds remaining {left}",
                left = self.volume_left
            )));
        }
        let prior_value = self.average_fill_price * self.volume_filled;
        self.volume_filled += fill_volume;
        self.volume_left = (self.volume_left - fill_volume).max(0.0);
        self.average_fill_price = (prior_value + fill_price * fill_volume) / self.volume_filled;
        self.status = if self.volume_left <= 1e-6 {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.update_time = now;
        Ok(())
    }

    pub fn cancel(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> Result<(), CoreError> {
        if self.is_completed() {
            return Err(CoreError::MarketRule(format!(
                "order {} already completed, cannot cancel",
                self.order_id
            )));
        }
        self.status = OrderStatus::Cancelled;
        self.last_message = reason.into();
        self.update_time = now;
        Ok(())
    }

    pub fn reject(&mut self, reason: impl Into<String>, now: DateTime<Utc>) {
        self.status = OrderStatus::Rejected;
        self.last_message = reason.into();
        self.update_time = now;
    }
}
