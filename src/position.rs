//! Position Ledger Entry (component C).
//!
//! Tracks long/short volume for one symbol in one account, split into a
//! "today" and a "historical" bucket (T+1 settlement: volume opened today
//! cannot be withdrawn to cash until it rolls into the historical bucket at
//! settlement, though for T+0-eligible instruments it can still be closed
//! same-day via the `CloseToday` offset). Frozen volume — volume reserved by
//! a pending close order — is only ever tracked against the *today* bucket,
//! matching `settle_position()` in the original, which rolls today into
//! historical and resets only the today-frozen counters to zero.
//!
//! Cash movement on open/close is mediated through `margin_held_*`: opening
//! a position debits the account's cash by the margin amount up front
//! (`Preset::frozen_money`); closing credits back the proportional share of
//! that held margin plus the realized gain/loss versus open price. This
//! keeps `Account::balance = cash + Σ position_profit + Σ float_profit` an
//! invariant rather than something reconciled after the fact — see
//! `TradeEffect`.

use crate::error::{CoreError, ValidationError};
use crate::order::{Direction, Offset};
use crate::preset::Preset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Long,
    Short,
}

/// Cash consequence of one fill against a position, for the Account to fold
/// into its own cash ledger. `margin_cash_delta` is negative on an opening
/// fill (cash leaves to fund the margin/notional) and positive on a closing
/// fill (held margin is released back). `realized_profit` is the P&L versus
/// open price, nonzero only on a closing fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeEffect {
    pub realized_profit: f64,
    pub margin_cash_delta: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Position {
    pub symbol: String,
    pub volume_long_today: f64,
    pub volume_long_his: f64,
    pub volume_short_today: f64,
    pub volume_short_his: f64,
    /// Volume reserved against today's long bucket by pending close-today/close orders.
    pub frozen_long_today: f64,
    /// Volume reserved against today's short bucket by pending close-today/close orders.
    pub frozen_short_today: f64,
    pub open_price_long: f64,
    pub open_price_short: f64,
    /// Cash already debited to fund the currently-open long/short volume;
    /// released proportionally as that volume is closed.
    pub margin_held_long: f64,
    pub margin_held_short: f64,
    /// Mark used for `position_profit` (today's settlement price pre-settle,
    /// last settlement price post-settle). Seeded to the first opening
    /// trade's price so `position_profit` starts at zero intraday.
    pub position_price: f64,
}

impl Position {
    pub fn new(symbol: impl Into<String>) -> Self {
        Position {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    pub fn has_position(&self) -> bool {
        self.volume_long() > 1e-6 || self.volume_short() > 1e-6
    }

    pub fn volume_long(&self) -> f64 {
        self.volume_long_today + self.volume_long_his
    }

    pub fn volume_short(&self) -> f64 {
        self.volume_short_today + self.volume_short_his
    }

    /// Volume available to close against the long side: all long volume
    /// minus whatever is already reserved by a pending close order.
    pub fn available_long_close(&self) -> f64 {
        self.volume_long() - self.frozen_long_today
    }

    pub fn available_short_close(&self) -> f64 {
        self.volume_short() - self.frozen_short_today
    }

    /// Volume available to close same-day only (`CloseToday` offset):
    /// today's bucket minus whatever of it is already reserved.
    pub fn available_long_close_today(&self) -> f64 {
        self.volume_long_today - self.frozen_long_today
    }

    pub fn available_short_close_today(&self) -> f64 {
        self.volume_short_today - self.frozen_short_today
    }

    /// Margin currently locked up in this position (already debited from
    /// cash at open time).
    pub fn margin(&self) -> f64 {
        self.margin_held_long + self.margin_held_short
    }

    /// Unrealized P&L versus `position_price` (the mark used by settlement),
    /// distinct from `float_profit`'s live last-traded-price mark.
    pub fn position_profit(&self, preset: &Preset) -> f64 {
        self.mark_to(self.position_price, preset)
    }

    pub fn float_profit(&self, last_price: f64, preset: &Preset) -> f64 {
        self.mark_to(last_price, preset)
    }

    fn mark_to(&self, mark_price: f64, preset: &Preset) -> f64 {
        let unit = preset.unit_table as f64;
        let long_profit = (mark_price - self.open_price_long) * self.volume_long() * unit;
        let short_profit = (self.open_price_short - mark_price) * self.volume_short() * unit;
        long_profit + short_profit
    }

    pub fn market_value(&self, last_price: f64, preset: &Preset) -> f64 {
        preset.market_value(last_price, self.volume_long()) - preset.market_value(last_price, self.volume_short())
    }

    /// Reserve `volume` against `side`'s close-eligible bucket ahead of
    /// sending a close order. `today_only` mirrors `Offset::CloseToday`;
    /// otherwise the check runs against the combined (history-first)
    /// available volume but still reserves out of the today bucket, the
    /// same convention the original uses since historical volume is never
    /// frozen (it cannot be cancelled away by another order racing it).
    pub fn freeze(&mut self, side: Side, volume: f64, today_only: bool) -> Result<(), CoreError> {
        if volume <= 0.0 {
            return Err(ValidationError::NonPositiveVolume(volume.to_string()).into());
        }
        let available = match (side, today_only) {
            (Side::Long, true) => self.available_long_close_today(),
            (Side::Long, false) => self.available_long_close(),
            (Side::Short, true) => self.available_short_close_today(),
            (Side::Short, false) => self.available_short_close(),
        };
        if volume > available + 1e-6 {
            return Err(CoreError::InsufficientPosition {
                symbol: self.symbol.clone(),
                required: volume,
                available,
            });
        }
        match side {
            Side::Long => self.frozen_long_today += volume,
            Side::Short => self.frozen_short_today += volume,
        }
        Ok(())
    }

    pub fn unfreeze(&mut self, side: Side, volume: f64) {
        match side {
            Side::Long => self.frozen_long_today = (self.frozen_long_today - volume).max(0.0),
            Side::Short => self.frozen_short_today = (self.frozen_short_today - volume).max(0.0),
        }
    }

    /// Apply one fill to this position, returning the cash consequence for
    /// the Account to book.
    pub fn apply_trade(
        &mut self,
        direction: Direction,
        offset: Offset,
        price: f64,
        volume: f64,
        preset: &Preset,
    ) -> Result<TradeEffect, CoreError> {
        if volume <= 0.0 {
            return Err(ValidationError::NonPositiveVolume(volume.to_string()).into());
        }
        match offset {
            Offset::Open => Ok(self.apply_open(direction, price, volume, preset)),
            Offset::Close => self.apply_close(direction, price, volume, preset, false),
            Offset::CloseToday => self.apply_close(direction, price, volume, preset, true),
        }
    }

    fn apply_open(&mut self, direction: Direction, price: f64, volume: f64, preset: &Preset) -> TradeEffect {
        let margin = preset.frozen_money(price, volume);
        match direction {
            Direction::Buy => {
                let was_flat = self.volume_long() <= 1e-9 && self.volume_short() <= 1e-9;
                let prior_cost = self.open_price_long * self.volume_long();
                self.volume_long_today += volume;
                self.open_price_long = (prior_cost + price * volume) / self.volume_long();
                self.margin_held_long += margin;
                if was_flat {
                    self.position_price = price;
                }
            }
            Direction::Sell => {
                let was_flat = self.volume_long() <= 1e-9 && self.volume_short() <= 1e-9;
                let prior_cost = self.open_price_short * self.volume_short();
                self.volume_short_today += volume;
                self.open_price_short = (prior_cost + price * volume) / self.volume_short();
                self.margin_held_short += margin;
                if was_flat {
                    self.position_price = price;
                }
            }
        }
        TradeEffect {
            realized_profit: 0.0,
            margin_cash_delta: -margin,
        }
    }

    /// A buy-close reduces the short side; a sell-close reduces the long
    /// side. History-first: consume `*_his` before `*_today`, except when
    /// `today_only` forces consumption out of the today bucket.
    fn apply_close(
        &mut self,
        direction: Direction,
        price: f64,
        volume: f64,
        preset: &Preset,
        today_only: bool,
    ) -> Result<TradeEffect, CoreError> {
        let (his, today, frozen, margin_held, open_price) = match direction {
            Direction::Buy => (
                &mut self.volume_short_his,
                &mut self.volume_short_today,
                &mut self.frozen_short_today,
                &mut self.margin_held_short,
                self.open_price_short,
            ),
            Direction::Sell => (
                &mut self.volume_long_his,
                &mut self.volume_long_today,
                &mut self.frozen_long_today,
                &mut self.margin_held_long,
                self.open_price_long,
            ),
        };

        let side_volume_before = *his + *today;
        let available = if today_only { *today } else { side_volume_before };
        if volume > available + 1e-6 {
            return Err(CoreError::InsufficientPosition {
                symbol: self.symbol.clone(),
                required: volume,
                available,
            });
        }

        let mut remaining = volume;
        if !today_only {
            let from_his = remaining.min(*his);
            *his -= from_his;
            remaining -= from_his;
        }
        if remaining > 0.0 {
            let from_today = remaining.min(*today);
            *today -= from_today;
            *frozen = (*frozen - from_today).max(0.0);
            remaining -= from_today;
        }
        debug_assert!(remaining <= 1e-6);

        let released_margin = if side_volume_before > 1e-9 {
            *margin_held * (volume / side_volume_before)
        } else {
            0.0
        };
        *margin_held = (*margin_held - released_margin).max(0.0);

        let unit = preset.unit_table as f64;
        let realized = match direction {
            // Buying closes a short: profit when price fell below the short's open.
            Direction::Buy => (open_price - price) * volume * unit,
            // Selling closes a long: profit when price rose above the long's open.
            Direction::Sell => (price - open_price) * volume * unit,
        };
        Ok(TradeEffect {
            realized_profit: realized,
            margin_cash_delta: released_margin,
        })
    }

    /// Roll today's volume into the historical bucket, reset only the
    /// today-frozen counters, and re-mark `position_price` for the next
    /// trading day — mirroring `settle_position()`.
    pub fn roll_today_to_historical(&mut self, settlement_price: f64) {
        self.volume_long_his += self.volume_long_today;
        self.volume_short_his += self.volume_short_today;
        self.volume_long_today = 0.0;
        self.volume_short_today = 0.0;
        self.frozen_long_today = 0.0;
        self.frozen_short_today = 0.0;
        if self.has_position() {
            self.position_price = settlement_price;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::PresetTable;

    fn rb_preset() -> Preset {
        PresetTable::new().get("RB2301")
    }

    #[test]
    fn open_then_close_books_realized_profit_and_releases_margin() {
        let preset = rb_preset();
        let mut pos = Position::new("RB2301");
        let open_effect = pos.apply_trade(Direction::Buy, Offset::Open, 3500.0, 10.0, &preset).unwrap();
        assert_eq!(pos.volume_long(), 10.0);
        assert!((pos.open_price_long - 3500.0).abs() < 1e-9);
        let expected_margin = preset.frozen_money(3500.0, 10.0);
        assert!((open_effect.margin_cash_delta + expected_margin).abs() < 1e-9);
        assert!((pos.margin_held_long - expected_margin).abs() < 1e-9);

        let close_effect = pos
            .apply_trade(Direction::Sell, Offset::Close, 3520.0, 4.0, &preset)
            .unwrap();
        let expected_profit = (3520.0 - 3500.0) * 4.0 * preset.unit_table as f64;
        assert!((close_effect.realized_profit - expected_profit).abs() < 1e-6);
        assert!((pos.volume_long() - 6.0).abs() < 1e-9);
        assert!((pos.margin_held_long - expected_margin * 0.6).abs() < 1e-6);
    }

    #[test]
    fn history_first_consumption_order() {
        let preset = rb_preset();
        let mut pos = Position::new("RB2301");
        pos.volume_long_his = 5.0;
        pos.volume_long_today = 5.0;
        pos.open_price_long = 3500.0;

        pos.apply_trade(Direction::Sell, Offset::Close, 3510.0, 7.0, &preset).unwrap();
        assert!((pos.volume_long_his - 0.0).abs() < 1e-9);
        assert!((pos.volume_long_today - 3.0).abs() < 1e-9);
    }

    #[test]
    fn close_today_only_consumes_today_bucket() {
        let preset = rb_preset();
        let mut pos = Position::new("RB2301");
        pos.volume_long_his = 5.0;
        pos.volume_long_today = 3.0;
        pos.open_price_long = 3500.0;

        assert!(pos
            .apply_trade(Direction::Sell, Offset::CloseToday, 3510.0, 4.0, &preset)
            .is_err());
        pos.apply_trade(Direction::Sell, Offset::CloseToday, 3510.0, 3.0, &preset)
            .unwrap();
        assert!((pos.volume_long_today).abs() < 1e-9);
        assert!((pos.volume_long_his - 5.0).abs() < 1e-9);
    }

    #[test]
    fn freeze_rejects_over_reservation() {
        let mut pos = Position::new("RB2301");
        pos.volume_long_today = 5.0;
        pos.freeze(Side::Long, 3.0, true).unwrap();
        assert!(pos.freeze(Side::Long, 3.0, true).is_err());
        pos.unfreeze(Side::Long, 3.0);
        assert!(pos.freeze(Side::Long, 3.0, true).is_ok());
    }

    #[test]
    fn position_profit_starts_at_zero_and_tracks_mark_after_settle() {
        let preset = rb_preset();
        let mut pos = Position::new("RB2301");
        pos.apply_trade(Direction::Buy, Offset::Open, 3500.0, 10.0, &preset).unwrap();
        assert!(pos.position_profit(&preset).abs() < 1e-9);

        pos.roll_today_to_historical(3510.0);
        let expected = (3510.0 - 3500.0) * 10.0 * preset.unit_table as f64;
        assert!((pos.position_profit(&preset) - expected).abs() < 1e-6);
    }

    #[test]
    fn settle_rolls_today_into_historical_and_clears_frozen() {
        let mut pos = Position::new("RB2301");
        pos.volume_long_today = 5.0;
        pos.frozen_long_today = 2.0;
        pos.roll_today_to_historical(100.0);
        assert!((pos.volume_long_his - 5.0).abs() < 1e-9);
        assert_eq!(pos.volume_long_today, 0.0);
        assert_eq!(pos.frozen_long_today, 0.0);
    }
}
