//! Thin wiring binary: initializes logging, loads configuration, constructs
//! a preset table, an account, a matching engine, an algo splitter plan,
//! and a broadcast hub, then runs a short scripted sequence across them.
//! Not a production server — there is no HTTP surface, no database, no
//! signer, because the core has none of those collaborators.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qaultra_core::account::Account;
use qaultra_core::algo::{SplitAlgorithm, SplitParams};
use qaultra_core::broadcast::{BroadcastManager, DataType};
use qaultra_core::config::BroadcastSettings;
use qaultra_core::matching::MatchingEngine;
use qaultra_core::order::Direction;
use qaultra_core::preset::PresetTable;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qaultra_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = BroadcastSettings::load().unwrap_or_default();
    let broadcast_config = settings.broadcast_config()?;
    tracing::info!(preset = %settings.broadcast_preset, "loaded broadcast settings");

    let presets = PresetTable::new();
    let now = Utc::now();
    let mut account = Account::new("demo-account", 1_000_000.0, now.format("%Y%m%d").to_string());

    let engine = MatchingEngine::new();
    engine.register_trade_callback(Arc::new(|trade| {
        tracing::info!(symbol = %trade.maker_order_id, price = trade.price.to_f64(), volume = trade.volume, "trade executed");
    }));

    let order = account.buy_open("AG2301", 4500.0, 5.0, &presets, now)?;
    tracing::info!(order_id = %order.order_id, "submitted demo order via account ledger");
    let _ = engine.submit_order(&order);

    let plan_id = account.algo_manager.create_plan(
        "AG2301".to_string(),
        1000.0,
        4500.0,
        Direction::Buy,
        now,
        SplitAlgorithm::Twap,
        SplitParams::default(),
    );
    tracing::info!(plan_id = %plan_id, "created TWAP split plan");

    let hub = BroadcastManager::new();
    let publisher = hub.publisher("market_data", broadcast_config)?;
    let mut subscriber = hub.subscriber("market_data");
    publisher.publish(now.timestamp_nanos_opt().unwrap_or(0) as u64, 1, DataType::Trade, b"demo-tick")?;
    if let Some(block) = subscriber.receive(Some(Duration::from_millis(100))) {
        tracing::info!(sequence = block.sequence_number, "received demo market-data block");
    }

    let snapshot = qaultra_core::protocol::to_qifi(&account, &presets, now);
    tracing::info!(account_cookie = %snapshot.account_cookie, "built QIFI snapshot");

    Ok(())
}
