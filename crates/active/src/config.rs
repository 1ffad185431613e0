//! Framework sizing.

use rtk_core::{Priority, Signal};
use rtk_mem::MAX_POOLS;

use crate::error::ConfigError;

/// Upper bound for [`FrameworkConfig::max_tick_rate`].
pub const MAX_TICK_RATES: u8 = 15;

/// Static sizing of one framework instance.
///
/// Validated once, when the framework is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkConfig {
    pub name: &'static str,
    /// Highest priority an active object may use (1..=63).
    pub max_active: u8,
    /// Number of signals the publish-subscribe table covers; published signals
    /// must be below this value.
    pub max_signal: u16,
    /// Number of independent clock tick rates.
    pub max_tick_rate: u8,
    pub max_event_pools: u8,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            name: "rtk",
            max_active: 32,
            max_signal: 64,
            max_tick_rate: 1,
            max_event_pools: 3,
        }
    }
}

impl FrameworkConfig {
    pub fn builder() -> FrameworkConfigBuilder {
        FrameworkConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_active == 0 || self.max_active > Priority::MAX {
            return Err(ConfigError::MaxActive(self.max_active));
        }
        if self.max_signal <= Signal::USER.raw() {
            return Err(ConfigError::NoUserSignals(self.max_signal));
        }
        if self.max_tick_rate == 0 || self.max_tick_rate > MAX_TICK_RATES {
            return Err(ConfigError::TickRates(self.max_tick_rate));
        }
        if self.max_event_pools as usize > MAX_POOLS {
            return Err(ConfigError::EventPools {
                configured: self.max_event_pools as usize,
                max: MAX_POOLS,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FrameworkConfigBuilder {
    config: FrameworkConfig,
}

impl FrameworkConfigBuilder {
    pub fn name(mut self, name: &'static str) -> Self {
        self.config.name = name;
        self
    }

    pub fn max_active(mut self, max: u8) -> Self {
        self.config.max_active = max;
        self
    }

    pub fn max_signal(mut self, max: u16) -> Self {
        self.config.max_signal = max;
        self
    }

    pub fn max_tick_rate(mut self, max: u8) -> Self {
        self.config.max_tick_rate = max;
        self
    }

    pub fn max_event_pools(mut self, max: u8) -> Self {
        self.config.max_event_pools = max;
        self
    }

    pub fn build(self) -> Result<FrameworkConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
