//! Engine configuration loaded from YAML with serde defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid YAML for this schema.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml_bw::Error),

    /// A field value is out of range.
    #[error("invalid config: {field}: {message}")]
    Invalid {
        /// Offending field path.
        field: &'static str,
        /// Human-readable reason.
        message: String,
    },
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Hold lifetime settings.
    #[serde(default)]
    pub reservation: ReservationConfig,
    /// Availability display cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Expired-hold sweeper settings.
    #[serde(default)]
    pub sweeper: SweeperConfig,
    /// Payment resolution settings.
    #[serde(default)]
    pub payment: PaymentConfig,
}

/// Hold lifetime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReservationConfig {
    /// Seconds a hold stays valid after placement.
    #[serde(default = "default_hold_ttl_secs")]
    pub hold_ttl_secs: u64,
}

/// Availability display cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Seconds a cached availability figure may be served. Zero disables
    /// the cache.
    #[serde(default = "default_availability_ttl_secs")]
    pub availability_ttl_secs: u64,
}

/// Expired-hold sweeper settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweeperConfig {
    /// Seconds between sweep passes.
    #[serde(default = "default_sweep_interval_secs")]
    pub interval_secs: u64,
}

/// Payment resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentConfig {
    /// Extra lookups to make when the order row is not yet visible.
    #[serde(default = "default_visibility_retries")]
    pub visibility_retries: u32,
    /// Milliseconds to wait between visibility lookups.
    #[serde(default = "default_visibility_delay_ms")]
    pub visibility_delay_ms: u64,
}

const fn default_hold_ttl_secs() -> u64 {
    120
}

const fn default_availability_ttl_secs() -> u64 {
    5
}

const fn default_sweep_interval_secs() -> u64 {
    30
}

const fn default_visibility_retries() -> u32 {
    1
}

const fn default_visibility_delay_ms() -> u64 {
    1000
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            hold_ttl_secs: default_hold_ttl_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            availability_ttl_secs: default_availability_ttl_secs(),
        }
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            visibility_retries: default_visibility_retries(),
            visibility_delay_ms: default_visibility_delay_ms(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file and validate it.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml_bw::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field ranges.
    ///
    /// # Errors
    ///
    /// Returns error if a value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reservation.hold_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "reservation.hold_ttl_secs",
                message: "hold TTL must be at least 1 second".to_string(),
            });
        }
        if self.sweeper.interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "sweeper.interval_secs",
                message: "sweep interval must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }

    /// Hold lifetime as a duration.
    #[must_use]
    pub const fn hold_ttl(&self) -> Duration {
        Duration::from_secs(self.reservation.hold_ttl_secs)
    }

    /// Availability cache TTL as a duration.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.availability_ttl_secs)
    }

    /// Sweep interval as a duration.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweeper.interval_secs)
    }

    /// Visibility retry delay as a duration.
    #[must_use]
    pub const fn visibility_delay(&self) -> Duration {
        Duration::from_millis(self.payment.visibility_delay_ms)
    }
}
