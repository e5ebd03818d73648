//! Broadcast Hub configuration (component H, §6.2).

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastConfig {
    pub max_subscribers: usize,
    pub batch_size: usize,
    pub buffer_depth: usize,
    pub memory_pool_size_mb: usize,
    pub queue_capacity: usize,
    pub heartbeat_interval_ms: u64,
    pub stats_enabled: bool,
    pub zero_copy_enabled: bool,
    pub service_name: String,
    pub instance_name: String,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        BroadcastConfig {
            max_subscribers: 1000,
            batch_size: 10_000,
            buffer_depth: 500,
            memory_pool_size_mb: 1024,
            queue_capacity: 1000,
            heartbeat_interval_ms: 1000,
            stats_enabled: true,
            zero_copy_enabled: true,
            service_name: "qaultra-core".to_string(),
            instance_name: "market_data".to_string(),
        }
    }
}

impl BroadcastConfig {
    /// Favors raw throughput: large batches and a deep buffer.
    pub fn high_performance() -> Self {
        BroadcastConfig {
            max_subscribers: 2000,
            batch_size: 50_000,
            buffer_depth: 2000,
            memory_pool_size_mb: 4096,
            queue_capacity: 5000,
            heartbeat_interval_ms: 500,
            stats_enabled: true,
            zero_copy_enabled: true,
            service_name: "qaultra-core".to_string(),
            instance_name: "high_performance".to_string(),
        }
    }

    /// Favors per-block latency over throughput: small batches, shallow
    /// buffer, tight heartbeat.
    pub fn low_latency() -> Self {
        BroadcastConfig {
            max_subscribers: 100,
            batch_size: 1,
            buffer_depth: 64,
            memory_pool_size_mb: 256,
            queue_capacity: 128,
            heartbeat_interval_ms: 100,
            stats_enabled: true,
            zero_copy_enabled: true,
            service_name: "qaultra-core".to_string(),
            instance_name: "low_latency".to_string(),
        }
    }

    /// Favors fan-out to a very large subscriber count over per-block
    /// latency.
    pub fn massive_scale() -> Self {
        BroadcastConfig {
            max_subscribers: 10_000,
            batch_size: 100_000,
            buffer_depth: 10_000,
            memory_pool_size_mb: 65_536,
            queue_capacity: 20_000,
            heartbeat_interval_ms: 2000,
            stats_enabled: true,
            zero_copy_enabled: false,
            service_name: "qaultra-core".to_string(),
            instance_name: "massive_scale".to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        fn in_range(value: usize, lo: usize, hi: usize, field: &str) -> Result<(), CoreError> {
            if value < lo || value > hi {
                return Err(CoreError::Configuration(format!(
                    "{field} must be in [{lo}, {hi}], got {value}"
                )));
            }
            Ok(())
        }
        in_range(self.max_subscribers, 1, 10_000, "max_subscribers")?;
        in_range(self.batch_size, 1, 1_000_000, "batch_size")?;
        in_range(self.buffer_depth, 1, 10_000, "buffer_depth")?;
        in_range(self.memory_pool_size_mb, 1, 65_536, "memory_pool_size_mb")?;
        if self.queue_capacity == 0 {
            return Err(CoreError::Configuration("queue_capacity must be positive".to_string()));
        }
        if self.service_name.is_empty() || self.instance_name.is_empty() {
            return Err(CoreError::Configuration("service_name/instance_name must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(BroadcastConfig::default().validate().is_ok());
    }

    #[test]
    fn presets_are_all_valid() {
        assert!(BroadcastConfig::high_performance().validate().is_ok());
        assert!(BroadcastConfig::low_latency().validate().is_ok());
        assert!(BroadcastConfig::massive_scale().validate().is_ok());
    }

    #[test]
    fn out_of_range_field_is_rejected() {
        let mut config = BroadcastConfig::default();
        config.max_subscribers = 0;
        assert!(config.validate().is_err());
        config.max_subscribers = 20_000;
        assert!(config.validate().is_err());
    }
}
