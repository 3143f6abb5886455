//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Charging rule configuration.
    #[serde(default)]
    pub charging: ChargingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Charging rule configuration.
///
/// Both limits are whole pence. They are regulatory values rather than
/// tuning knobs, but regimes have changed them before, so they stay
/// configurable.
#[derive(Debug, Clone, Deserialize)]
pub struct ChargingConfig {
    /// The minimum charge a licence must reach per side (credit or debit).
    #[serde(default = "default_minimum_charge_amount")]
    pub minimum_charge_amount: i64,
    /// Net invoice values strictly below this are too small to bill.
    #[serde(default = "default_deminimis_limit")]
    pub deminimis_limit: i64,
}

fn default_minimum_charge_amount() -> i64 {
    2500
}

fn default_deminimis_limit() -> i64 {
    500
}

impl Default for ChargingConfig {
    fn default() -> Self {
        Self {
            minimum_charge_amount: default_minimum_charge_amount(),
            deminimis_limit: default_deminimis_limit(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("AQUABILL").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charging_defaults() {
        let charging = ChargingConfig::default();
        assert_eq!(charging.minimum_charge_amount, 2500);
        assert_eq!(charging.deminimis_limit, 500);
    }
}
