//! End-to-end integration tests threading together components that are
//! otherwise only unit-tested in isolation: an order placed through the
//! account ledger, matched by the engine, and settled back onto both
//! counterparties' ledgers; a TWAP plan whose chunks are actually dispatched
//! through the matching engine; a QIFI snapshot round-trip after real
//! trading activity; and a broadcast stream resolved through the config
//! layer rather than constructed directly.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};

use qaultra_core::account::Account;
use qaultra_core::algo::{ChunkStatus, SplitAlgorithm, SplitParams};
use qaultra_core::broadcast::{BroadcastManager, DataType};
use qaultra_core::config::BroadcastSettings;
use qaultra_core::matching::MatchingEngine;
use qaultra_core::preset::{Preset, PresetTable};

fn futures_preset_table() -> PresetTable {
    let mut presets = PresetTable::new();
    presets.insert(
        "IF2401",
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
    presets
}

#[test]
fn order_crossing_two_accounts_settles_on_both_ledgers() {
    let presets = futures_preset_table();
    let t1 = Utc.with_ymd_and_hms(2026, 1, 1, 9, 30, 0).unwrap();
    let engine = MatchingEngine::new();

    let mut seller = Account::new("seller", 1_000_000.0, "20260101");
    seller.set_sellopen(true);
    let mut buyer = Account::new("buyer", 1_000_000.0, "20260101");

    let sell_order = seller.sell_open("IF2401", 4000.0, 5.0, &presets, t1).unwrap();
    let resting_trades = engine.submit_order(&sell_order).unwrap();
    assert!(resting_trades.is_empty(), "nothing resting yet, the sell should just rest in the book");

    let buy_order = buyer.buy_open("IF2401", 4000.0, 5.0, &presets, t1).unwrap();
    let trades = engine.submit_order(&buy_order).unwrap();
    assert_eq!(trades.len(), 1);
    let trade = &trades[0];
    assert_eq!(trade.maker_order_id, sell_order.order_id);
    assert_eq!(trade.taker_order_id, buy_order.order_id);
    assert_eq!(trade.volume, 5.0);

    let fill_price = trade.price.to_f64();
    seller.apply_fill(&trade.maker_order_id, fill_price, trade.volume, &presets, t1).unwrap();
    buyer.apply_fill(&trade.taker_order_id, fill_price, trade.volume, &presets, t1).unwrap();

    assert_eq!(seller.positions["IF2401"].volume_short(), 5.0);
    assert_eq!(buyer.positions["IF2401"].volume_long(), 5.0);

    // Ledger equation (Testable Property 1) holds for both counterparties.
    for account in [&seller, &buyer] {
        let expected_balance = account.cash + account.position_profit(&presets) + account.float_profit(&presets);
        assert!((account.balance(&presets) - expected_balance).abs() < 1e-6);
    }
}

#[test]
fn twap_chunks_dispatch_through_the_matching_engine_as_they_come_due() {
    let presets = futures_preset_table();
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 9, 30, 0).unwrap();
    let engine = MatchingEngine::new();
    let mut account = Account::new("algo-trader", 1_000_000.0, "20260101");

    let params = SplitParams { chunks: 3, interval_secs: 60, ..SplitParams::default() };
    let plan_id = account.algo_manager.create_plan(
        "IF2401".to_string(),
        300.0,
        4000.0,
        qaultra_core::order::Direction::Buy,
        t0,
        SplitAlgorithm::Twap,
        params,
    );

    let dispatched = Arc::new(Mutex::new(Vec::new()));
    {
        let dispatched = Arc::clone(&dispatched);
        let plan = account.algo_manager.plan_mut(&plan_id).unwrap();
        let mut dispatch = |symbol: &str, volume: f64, _now: chrono::DateTime<Utc>, price: f64, _direction| {
            let order = qaultra_core::order::Order::new(
                "algo-trader",
                symbol,
                qaultra_core::order::Direction::Buy,
                qaultra_core::order::Offset::Open,
                qaultra_core::order::OrderType::Limit,
                qaultra_core::order::TimeCondition::Gtc,
                price,
                volume,
                "CFFEX",
                t0,
            )
            .unwrap();
            let order_id = order.order_id.clone();
            let _ = engine.submit_order(&order);
            dispatched.lock().unwrap().push(order_id.clone());
            Some(order_id)
        };
        let first = plan.execute_next_chunk(t0, &mut dispatch);
        assert!(first.is_some());

        // The next two chunks are not due yet at t0.
        let too_early = plan.execute_next_chunk(t0, &mut dispatch);
        assert!(too_early.is_none());

        let later = t0 + chrono::Duration::seconds(61);
        let second = plan.execute_next_chunk(later, &mut dispatch);
        assert!(second.is_some());
    }

    assert_eq!(dispatched.lock().unwrap().len(), 2);
    let plan = account.algo_manager.plan(&plan_id).unwrap();
    assert_eq!(plan.chunks[0].status, ChunkStatus::Sent);
    assert_eq!(plan.chunks[1].status, ChunkStatus::Sent);
    assert_eq!(plan.chunks[2].status, ChunkStatus::Pending);
    assert_eq!(account.active_algo_plan_count(), 1);
}

#[test]
fn qifi_snapshot_round_trip_preserves_ledger_equation_after_trading() {
    let presets = futures_preset_table();
    let t1 = Utc.with_ymd_and_hms(2026, 1, 1, 9, 30, 0).unwrap();
    let mut account = Account::new("roundtrip", 1_000_000.0, "20260101");

    let order = account.buy_open("IF2401", 4000.0, 3.0, &presets, t1).unwrap();
    account.apply_fill(&order.order_id, 4000.0, 3.0, &presets, t1).unwrap();
    account.on_price_change("IF2401", 4050.0);

    let snapshot = qaultra_core::protocol::to_qifi(&account, &presets, t1);
    let restored = qaultra_core::protocol::from_qifi(&snapshot);

    assert_eq!(restored.cash, account.cash);
    assert_eq!(restored.positions["IF2401"].volume_long(), account.positions["IF2401"].volume_long());

    let original_balance = account.balance(&presets);
    let restored_balance = restored.balance(&presets);
    assert!((original_balance - restored_balance).abs() < 1e-6);
}

#[test]
fn broadcast_stream_resolved_through_config_layer_delivers_in_order() {
    let mut settings = BroadcastSettings::default();
    settings.broadcast_preset = "low_latency".to_string();
    let broadcast_config = settings.broadcast_config().unwrap();

    let hub = BroadcastManager::new();
    let publisher = hub.publisher("market_data", broadcast_config).unwrap();
    let mut subscriber = hub.subscriber("market_data");

    for i in 0..50u32 {
        publisher.publish(i as u64, 1, DataType::Tick, &i.to_le_bytes()).unwrap();
    }

    for expected_seq in 1..=50u64 {
        let block = subscriber.receive(Some(Duration::from_millis(50))).unwrap();
        assert_eq!(block.sequence_number, expected_seq);
    }
    assert_eq!(publisher.stats().blocks_published.load(std::sync::atomic::Ordering::Relaxed), 50);
}
