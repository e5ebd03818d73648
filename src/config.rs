//! Ambient configuration: broadcast presets plus the account-level default
//! commission/tax ratios, loaded from environment/`.env` via the `config`
//! crate. Deliberately narrow — this is not a general strategy/backtest
//! configuration loader, only the handful of knobs the core itself needs at
//! startup.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::broadcast::BroadcastConfig;
use crate::error::{CoreError, CoreResult};

fn default_commission_ratio() -> f64 {
    0.00025
}

fn default_tax_ratio() -> f64 {
    0.001
}

fn default_broadcast_preset() -> String {
    "high_performance".to_string()
}

/// Top-level settings for a running core instance. Loaded once at startup
/// by the demo binary, the way the teacher's `main.rs` loads `AppConfig`
/// before constructing any service.
#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastSettings {
    #[serde(default = "default_commission_ratio")]
    pub default_commission_ratio: f64,
    #[serde(default = "default_tax_ratio")]
    pub default_tax_ratio: f64,
    #[serde(default = "default_broadcast_preset")]
    pub broadcast_preset: String,
}

impl Default for BroadcastSettings {
    fn default() -> Self {
        BroadcastSettings {
            default_commission_ratio: default_commission_ratio(),
            default_tax_ratio: default_tax_ratio(),
            broadcast_preset: default_broadcast_preset(),
        }
    }
}

impl BroadcastSettings {
    /// Loads settings layered `defaults < .env < environment`, mirroring the
    /// teacher's `dotenvy::dotenv().ok()` then config-crate load sequence in
    /// `main.rs`. Prefix `CORE_`, e.g. `CORE_BROADCAST_PRESET=low_latency`.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = BroadcastSettings::default();
        let config = Config::builder()
            .set_default("default_commission_ratio", defaults.default_commission_ratio)?
            .set_default("default_tax_ratio", defaults.default_tax_ratio)?
            .set_default("broadcast_preset", defaults.broadcast_preset)?
            .add_source(Environment::with_prefix("CORE"))
            .build()?;
        config.try_deserialize()
    }

    /// Resolves `broadcast_preset` to a concrete, validated `BroadcastConfig`.
    pub fn broadcast_config(&self) -> CoreResult<BroadcastConfig> {
        let config = match self.broadcast_preset.as_str() {
            "high_performance" => BroadcastConfig::high_performance(),
            "low_latency" => BroadcastConfig::low_latency(),
            "massive_scale" => BroadcastConfig::massive_scale(),
            other => {
                return Err(CoreError::Configuration(format!(
                    "unknown broadcast_preset '{other}', expected high_performance, low_latency, or massive_scale"
                )))
            }
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_original_account_constructor_ratios() {
        let settings = BroadcastSettings::default();
        assert_eq!(settings.default_commission_ratio, 0.00025);
        assert_eq!(settings.default_tax_ratio, 0.001);
    }

    #[test]
    fn resolves_named_presets() {
        let mut settings = BroadcastSettings::default();
        settings.broadcast_preset = "low_latency".to_string();
        assert!(settings.broadcast_config().is_ok());
    }

    #[test]
    fn rejects_unknown_preset_name() {
        let mut settings = BroadcastSettings::default();
        settings.broadcast_preset = "nonexistent".to_string();
        assert!(settings.broadcast_config().is_err());
    }
}
