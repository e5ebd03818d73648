//! Instrument Preset Table (component A).
//!
//! Per-symbol contract metadata: multiplier, tick size, margin coefficients,
//! fee schedule, exchange code. Immutable after construction, looked up by
//! the alphabetic prefix of a symbol (e.g. "AG2301" -> "AG").
//!
//! Table contents are ported from the original `marketpreset.cpp` preset
//! catalogue (SHFE/DCE/CZCE/CFFEX/INE/GFEX plus a crypto perpetual), not a
//! toy stub, since `Preset` is meant to model real contracts.

use std::collections::HashMap;

/// Direction×offset sign used by `tax`/`commission` dispatch. Matches the
/// `towards` encoding of `account::Towards` but `Preset` only needs the sign
/// of the trade (buy vs sell) to decide stock stamp duty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSign {
    Buy,
    Sell,
}

/// Immutable per-symbol contract preset.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: String,
    pub exchange_code: String,
    pub unit_table: i64,
    pub price_tick: f64,
    pub buy_frozen_coeff: f64,
    pub sell_frozen_coeff: f64,
    pub commission_per_amount: f64,
    pub commission_per_volume: f64,
    pub commission_today_per_amount: f64,
    pub commission_today_per_volume: f64,
}

impl Preset {
    /// `vol · price · unit_table`
    pub fn market_value(&self, price: f64, volume: f64) -> f64 {
        volume * price * self.unit_table as f64
    }

    /// `market_value · buy_frozen_coeff`
    pub fn frozen_money(&self, price: f64, volume: f64) -> f64 {
        self.market_value(price, volume) * self.buy_frozen_coeff
    }

    /// Additive commission: per-volume plus per-amount components (spec §9
    /// resolves the additive-vs-either-or ambiguity in the original source).
    pub fn commission(&self, price: f64, volume: f64) -> f64 {
        self.commission_per_volume * volume + self.commission_per_amount * self.market_value(price, volume)
    }

    pub fn commission_today(&self, price: f64, volume: f64) -> f64 {
        self.commission_today_per_volume * volume
            + self.commission_today_per_amount * self.market_value(price, volume)
    }

    /// Stock stamp duty: 0.1% of market value on a sell-side trade, 0 otherwise.
    pub fn tax(&self, price: f64, volume: f64, sign: TradeSign) -> f64 {
        if self.exchange_code == "STOCK" && sign == TradeSign::Sell {
            0.001 * self.market_value(price, volume)
        } else {
            0.0
        }
    }

    fn default_stock(symbol: &str) -> Self {
        Preset {
            name: symbol.to_string(),
            exchange_code: "STOCK".to_string(),
            unit_table: 1,
            price_tick: 0.01,
            buy_frozen_coeff: 1.0,
            sell_frozen_coeff: 1.0,
            commission_per_amount: 0.00032,
            commission_per_volume: 0.0,
            commission_today_per_amount: 0.00032,
            commission_today_per_volume: 0.0,
        }
    }
}

/// Process-wide read-only instrument preset table. Built once, shared by
/// reference; no interior mutability needed since there is no mutation path
/// after `PresetTable::new()`.
#[derive(Debug, Clone)]
pub struct PresetTable {
    entries: HashMap<String, Preset>,
}

impl Default for PresetTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetTable {
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        for preset in default_catalogue() {
            entries.insert(preset.name_key(), preset.preset);
        }
        PresetTable { entries }
    }

    /// Register or override a preset for `symbol_prefix` (already uppercase).
    pub fn insert(&mut self, symbol_prefix: &str, preset: Preset) {
        self.entries.insert(symbol_prefix.to_uppercase(), preset);
    }

    pub fn contains(&self, symbol_prefix: &str) -> bool {
        self.entries.contains_key(&symbol_prefix.to_uppercase())
    }

    pub fn all_codes(&self) -> Vec<&str> {
        self.entries.keys().map(|s| s.as_str()).collect()
    }

    /// Strip a continuous-contract `L8`/`L9` suffix, else take the longest
    /// contiguous alphabetic prefix; uppercase; look up; default to a stock
    /// preset on miss.
    pub fn get(&self, symbol: &str) -> Preset {
        let key = extract_lookup_key(symbol);
        self.entries
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Preset::default_stock(symbol))
    }
}

fn extract_lookup_key(symbol: &str) -> String {
    if symbol.len() >= 2 {
        let (head, tail) = symbol.split_at(symbol.len() - 2);
        if tail.eq_ignore_ascii_case("L8") || tail.eq_ignore_ascii_case("L9") {
            return head.to_uppercase();
        }
    }
    symbol
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_uppercase()
}

/// Deduces the market type tag used elsewhere (order routing, sell-open
/// gating): symbols on the Shanghai/Shenzhen stock exchanges are "stock_cn",
/// everything else recognized is "future_cn". Mirrors `adjust_market()` in
/// the original `position.cpp`.
pub fn adjust_market(symbol: &str) -> &'static str {
    let prefix = extract_lookup_key(symbol);
    if symbol.to_uppercase().contains("XSHG") || symbol.to_uppercase().contains("XSHE") {
        "stock_cn"
    } else if prefix.is_empty() {
        "stock_cn"
    } else {
        "future_cn"
    }
}

struct CatalogueEntry {
    preset: Preset,
}

impl CatalogueEntry {
    fn name_key(&self) -> String {
        self.preset.name.clone()
    }
}

macro_rules! preset {
    ($code:expr, $name:expr, $unit:expr, $tick:expr, $buy_coeff:expr, $sell_coeff:expr, $exch:expr,
     $c_amt:expr, $c_vol:expr, $c_amt_today:expr, $c_vol_today:expr) => {
        CatalogueEntry {
            preset: Preset {
                name: $code.to_string(),
                exchange_code: $exch.to_string(),
                unit_table: $unit,
                price_tick: $tick,
                buy_frozen_coeff: $buy_coeff,
                sell_frozen_coeff: $sell_coeff,
                commission_per_amount: $c_amt,
                commission_per_volume: $c_vol,
                commission_today_per_amount: $c_amt_today,
                commission_today_per_volume: $c_vol_today,
            },
        }
    };
}

/// Full hard-coded catalogue ported from `marketpreset.cpp::init_all_presets`.
fn default_catalogue() -> Vec<CatalogueEntry> {
    vec![
        // Shanghai Futures Exchange (SHFE)
        preset!("AG", "Silver", 15, 1.0, 0.1, 0.1, "SHFE", 5e-05, 0.0, 5e-05, 0.0),
        preset!("AL", "Aluminum", 5, 5.0, 0.1, 0.1, "SHFE", 0.0, 3.0, 0.0, 0.0),
        preset!("AU", "Gold", 1000, 0.02, 0.08, 0.08, "SHFE", 0.0, 10.0, 0.0, 0.0),
        preset!("BU", "Bitumen", 10, 2.0, 0.15, 0.15, "SHFE", 0.0001, 0.0, 0.0001, 0.0),
        preset!("CU", "Copper", 5, 10.0, 0.1, 0.1, "SHFE", 5e-05, 0.0, 0.0, 0.0),
        preset!("FU", "Fuel Oil", 10, 1.0, 0.15, 0.15, "SHFE", 5e-05, 0.0, 0.0, 0.0),
        preset!("HC", "Hot Rolled Coil", 10, 1.0, 0.09, 0.09, "SHFE", 0.0001, 0.0, 0.0001, 0.0),
        preset!("NI", "Nickel", 1, 10.0, 0.1, 0.1, "SHFE", 0.0, 6.0, 0.0, 6.0),
        preset!("PB", "Lead", 5, 5.0, 0.1, 0.1, "SHFE", 4e-05, 0.0, 0.0, 0.0),
        preset!("RB", "Rebar", 10, 1.0, 0.09, 0.09, "SHFE", 0.0001, 0.0, 0.0001, 0.0),
        preset!("RU", "Natural Rubber", 10, 5.0, 0.09, 0.09, "SHFE", 4.5e-05, 0.0, 4.5e-05, 0.0),
        preset!("SN", "Tin", 1, 10.0, 0.1, 0.1, "SHFE", 0.0, 1.0, 0.0, 0.0),
        preset!("SP", "Bleached Pulp", 10, 2.0, 0.08, 0.08, "SHFE", 5e-05, 0.0, 0.0, 0.0),
        preset!("WR", "Wire Rod", 10, 1.0, 0.09, 0.09, "SHFE", 4e-05, 0.0, 0.0, 0.0),
        preset!("ZN", "Zinc", 5, 5.0, 0.1, 0.1, "SHFE", 0.0, 3.0, 0.0, 0.0),
        preset!("SS", "Stainless Steel", 5, 5.0, 0.08, 0.08, "SHFE", 0.0001, 0.0, 0.0001, 0.0),
        preset!("AO", "Alumina", 20, 1.0, 0.2, 0.2, "SHFE", 0.000101, 0.0, 0.0, 0.0),
        preset!("BR", "Butadiene Rubber", 5, 1.0, 0.2, 0.2, "SHFE", 0.000101, 0.0, 0.000101, 0.0),
        // Dalian Commodity Exchange (DCE)
        preset!("A", "Soybean No.1", 10, 1.0, 0.05, 0.05, "DCE", 0.0, 2.0, 0.0, 2.0),
        preset!("B", "Soybean No.2", 10, 1.0, 0.05, 0.05, "DCE", 0.0, 1.0, 0.0, 1.0),
        preset!("BB", "Fiberboard", 500, 0.05, 0.2, 0.2, "DCE", 0.0001, 0.0, 5e-05, 0.0),
        preset!("C", "Corn", 10, 1.0, 0.05, 0.05, "DCE", 0.0, 1.2, 0.0, 0.0),
        preset!("CS", "Corn Starch", 10, 1.0, 0.05, 0.05, "DCE", 0.0, 1.5, 0.0, 0.0),
        preset!("EG", "Ethylene Glycol", 10, 1.0, 0.06, 0.06, "DCE", 0.0, 4.0, 0.0, 0.0),
        preset!("FB", "Medium Density Fiberboard", 500, 0.05, 0.2, 0.2, "DCE", 0.0001, 0.0, 5e-05, 0.0),
        preset!("I", "Iron Ore", 100, 0.5, 0.08, 0.08, "DCE", 6e-05, 0.0, 6e-05, 0.0),
        preset!("J", "Coke", 100, 0.5, 0.08, 0.08, "DCE", 0.00018, 0.0, 0.00018, 0.0),
        preset!("JD", "Eggs", 10, 1.0, 0.07, 0.07, "DCE", 0.00015, 0.0, 0.00015, 0.0),
        preset!("JM", "Coking Coal", 60, 0.5, 0.08, 0.08, "DCE", 0.00018, 0.0, 0.00018, 0.0),
        preset!("L", "LLDPE", 5, 5.0, 0.05, 0.05, "DCE", 0.0, 2.0, 0.0, 0.0),
        preset!("M", "Soybean Meal", 10, 1.0, 0.05, 0.05, "DCE", 0.0, 1.5, 0.0, 0.0),
        preset!("P", "Palm Oil", 10, 2.0, 0.08, 0.08, "DCE", 0.0, 2.5, 0.0, 0.0),
        preset!("PP", "Polypropylene", 5, 1.0, 0.05, 0.05, "DCE", 6e-05, 0.0, 3e-05, 0.0),
        preset!("V", "PVC", 5, 5.0, 0.05, 0.05, "DCE", 0.0, 2.0, 0.0, 0.0),
        preset!("Y", "Soybean Oil", 10, 2.0, 0.05, 0.05, "DCE", 0.0, 2.5, 0.0, 0.0),
        preset!("EB", "Styrene", 5, 1.0, 0.05, 0.05, "DCE", 0.0001, 0.0, 0.0001, 0.0),
        preset!("RR", "Japonica Rice", 10, 1.0, 0.05, 0.05, "DCE", 0.0001, 0.0, 0.0001, 0.0),
        preset!("PG", "LPG", 20, 1.0, 0.05, 0.05, "DCE", 0.0001, 0.0, 0.0001, 0.0),
        preset!("LH", "Hogs", 16, 1.0, 0.2, 0.2, "DCE", 0.000201, 0.0, 0.000201, 0.0),
        // Zhengzhou Commodity Exchange (CZCE)
        preset!("AP", "Apples", 10, 1.0, 0.08, 0.08, "CZCE", 0.0, 5.0, 0.0, 5.0),
        preset!("CF", "Cotton No.1", 5, 5.0, 0.05, 0.05, "CZCE", 0.0, 4.3, 0.0, 0.0),
        preset!("CY", "Cotton Yarn", 5, 5.0, 0.05, 0.05, "CZCE", 0.0, 4.0, 0.0, 0.0),
        preset!("FG", "Glass", 20, 1.0, 0.05, 0.05, "CZCE", 0.0, 3.0, 0.0, 6.0),
        preset!("JR", "Japonica Rice (early)", 20, 1.0, 0.05, 0.05, "CZCE", 0.0, 3.0, 0.0, 3.0),
        preset!("LR", "Late Indica Rice", 20, 1.0, 0.05, 0.05, "CZCE", 0.0, 3.0, 0.0, 3.0),
        preset!("MA", "Methanol", 10, 1.0, 0.07, 0.07, "CZCE", 0.0, 2.0, 0.0, 6.0),
        preset!("OI", "Rapeseed Oil", 10, 1.0, 0.05, 0.05, "CZCE", 0.0, 2.0, 0.0, 0.0),
        preset!("PM", "Common Wheat", 50, 1.0, 0.05, 0.05, "CZCE", 0.0, 5.0, 0.0, 5.0),
        preset!("RI", "Early Indica Rice", 20, 1.0, 0.05, 0.05, "CZCE", 0.0, 2.5, 0.0, 2.5),
        preset!("RM", "Rapeseed Meal", 10, 1.0, 0.06, 0.06, "CZCE", 0.0, 1.5, 0.0, 0.0),
        preset!("RS", "Rapeseed", 10, 1.0, 0.2, 0.2, "CZCE", 0.0, 2.0, 0.0, 2.0),
        preset!("SF", "Ferrosilicon", 5, 2.0, 0.07, 0.07, "CZCE", 0.0, 3.0, 0.0, 9.0),
        preset!("SM", "Silicomanganese", 5, 2.0, 0.07, 0.07, "CZCE", 0.0, 3.0, 0.0, 6.0),
        preset!("SR", "White Sugar", 10, 1.0, 0.05, 0.05, "CZCE", 0.0, 3.0, 0.0, 0.0),
        preset!("TA", "PTA", 5, 2.0, 0.06, 0.06, "CZCE", 0.0, 3.0, 0.0, 0.0),
        preset!("WH", "Strong Gluten Wheat", 20, 1.0, 0.2, 0.2, "CZCE", 0.0, 2.5, 0.0, 0.0),
        preset!("ZC", "Thermal Coal", 100, 0.2, 0.06, 0.06, "CZCE", 0.0, 4.0, 0.0, 4.0),
        preset!("SA", "Soda Ash", 20, 1.0, 0.05, 0.05, "CZCE", 0.0001, 0.0, 0.0001, 0.0),
        preset!("CJ", "Jujube", 5, 5.0, 0.07, 0.07, "CZCE", 0.0, 3.0, 0.0, 3.0),
        preset!("UR", "Urea", 20, 1.0, 0.05, 0.05, "CZCE", 0.0001, 0.0, 0.0001, 0.0),
        preset!("PF", "Short Fiber", 5, 1.0, 0.2, 0.2, "CZCE", 0.000001, 3.0, 0.000001, 3.0),
        preset!("PK", "Peanut Kernel", 5, 1.0, 0.2, 0.2, "CZCE", 0.000001, 4.0, 0.0, 4.0),
        preset!("PX", "Paraxylene", 5, 1.0, 0.12, 0.12, "CZCE", 0.000101, 0.0, 0.000101, 0.0),
        preset!("SH", "Caustic Soda", 30, 1.0, 0.12, 0.12, "CZCE", 0.000101, 0.0, 0.000101, 0.0),
        // China Financial Futures Exchange (CFFEX)
        preset!("IC", "CSI 500 Index", 200, 0.2, 0.12, 0.12, "CFFEX", 2.301e-05, 0.0, 0.00023, 0.0),
        preset!("IM", "CSI 1000 Index", 200, 0.2, 0.12, 0.12, "CFFEX", 2.301e-05, 0.0, 0.00023, 0.0),
        preset!("IF", "CSI 300 Index", 300, 0.2, 0.1, 0.1, "CFFEX", 2.301e-05, 0.0, 0.00023, 0.0),
        preset!("IH", "SSE 50 Index", 300, 0.2, 0.05, 0.05, "CFFEX", 2.301e-05, 0.0, 0.00023, 0.0),
        preset!("T", "10Y Treasury", 10000, 0.005, 0.03, 0.03, "CFFEX", 0.0, 3.0, 0.0, 3.0),
        preset!("TF", "5Y Treasury", 10000, 0.005, 0.02, 0.02, "CFFEX", 0.0, 3.0, 0.0, 3.0),
        preset!("TS", "2Y Treasury", 20000, 0.002, 0.01, 0.01, "CFFEX", 0.0, 3.0, 0.0, 3.0),
        preset!("TL", "30Y Treasury", 10000, 0.01, 0.05, 0.05, "CFFEX", 0.0, 3.0, 0.0, 3.0),
        // Shanghai International Energy Exchange (INE)
        preset!("SC", "Crude Oil", 1000, 0.1, 0.1, 0.1, "INE", 0.0, 20.0, 0.0, 0.0),
        preset!("NR", "No.20 Rubber", 10, 5.0, 0.09, 0.09, "INE", 0.0001, 0.0, 0.0001, 0.0),
        preset!("LU", "Low Sulfur Fuel Oil", 10, 1.0, 0.08, 0.08, "INE", 0.0001, 0.0, 0.0001, 0.0),
        preset!("BC", "International Copper", 5, 1.0, 0.2, 0.2, "INE", 0.000011, 0.01, 0.000011, 0.01),
        preset!("EC", "Container Freight Index", 50, 1.0, 0.22, 0.22, "INE", 0.000601, 0.0, 0.000601, 0.0),
        // Guangzhou Futures Exchange (GFEX)
        preset!("SI", "Industrial Silicon", 5, 1.0, 0.2, 0.2, "GFEX", 0.000001, 0.0, 0.0, 0.0),
        preset!("LC", "Lithium Carbonate", 1, 1.0, 0.2, 0.2, "GFEX", 0.000081, 0.0, 0.000081, 0.0),
        // Crypto perpetual
        preset!("BTCUSDT", "BTC/USDT", 1, 0.01, 1.0, 1.0, "BINANCE", 0.001, 0.0, 0.001, 0.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stock_preset_on_miss() {
        let table = PresetTable::new();
        let preset = table.get("SH600000");
        assert_eq!(preset.exchange_code, "STOCK");
        assert_eq!(preset.unit_table, 1);
    }

    #[test]
    fn futures_prefix_lookup() {
        let table = PresetTable::new();
        let preset = table.get("AG2301");
        assert_eq!(preset.name, "AG");
        assert_eq!(preset.unit_table, 15);
        assert_eq!(preset.exchange_code, "SHFE");
    }

    #[test]
    fn continuous_contract_suffix() {
        let table = PresetTable::new();
        let preset = table.get("rbL8");
        assert_eq!(preset.name, "RB");
    }

    #[test]
    fn commission_is_additive() {
        let table = PresetTable::new();
        let preset = table.get("IF2401");
        let c = preset.commission(4000.0, 2.0);
        assert!((c - (2.0 * 0.0 + 2.301e-05 * preset.market_value(4000.0, 2.0))).abs() < 1e-9);
    }

    #[test]
    fn stock_sell_incurs_tax_buy_does_not() {
        let table = PresetTable::new();
        let preset = table.get("SH600000");
        assert_eq!(preset.tax(10.0, 100.0, TradeSign::Buy), 0.0);
        assert!((preset.tax(10.0, 100.0, TradeSign::Sell) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn adjust_market_defaults_to_stock() {
        assert_eq!(adjust_market("unknown-symbol-123"), "stock_cn");
        assert_eq!(adjust_market("AG2301"), "future_cn");
    }
}
