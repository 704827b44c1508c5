// src/common/config.rs

use core::time::Duration;

use super::timing;

/// Static driver configuration, fixed for the driver's lifetime.
///
/// The host validates this once at construction time (`validate` runs inside
/// [`crate::driver::Tes902Driver::new`]); there is no runtime reconfiguration.
/// The serial rate is not part of the config: the TES902 link is fixed at
/// 9600 baud 8N1 (`timing::BAUD_RATE`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Interval at which the host scheduler invokes the poll tick.
    pub poll_interval: Duration,
    /// Deadline for a complete response frame within one tick. The driver
    /// never blocks a tick for longer than this.
    pub response_timeout: Duration,
    /// Whether the CO2 channel is active. A disabled channel turns the poll
    /// tick into a no-op.
    pub co2_enabled: bool,
    /// Consecutive failed exchanges before the driver reports
    /// [`crate::driver::SensorStatus::Unavailable`].
    pub unavailable_threshold: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            poll_interval: timing::DEFAULT_POLL_INTERVAL,
            response_timeout: timing::DEFAULT_RESPONSE_TIMEOUT,
            co2_enabled: true,
            unavailable_threshold: timing::DEFAULT_UNAVAILABLE_THRESHOLD,
        }
    }
}

impl DriverConfig {
    /// Returns the default configuration: 10 s polls, 500 ms receive
    /// timeout, CO2 channel enabled.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_co2_enabled(mut self, enabled: bool) -> Self {
        self.co2_enabled = enabled;
        self
    }

    pub fn with_unavailable_threshold(mut self, threshold: u32) -> Self {
        self.unavailable_threshold = threshold;
        self
    }

    /// Checks the configuration for internal consistency.
    ///
    /// The receive timeout must leave room inside the poll interval, so one
    /// exchange always finishes (or times out) before the next tick is due.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.response_timeout.is_zero() {
            return Err(ConfigError::ZeroResponseTimeout);
        }
        if self.response_timeout >= self.poll_interval {
            return Err(ConfigError::TimeoutExceedsInterval {
                timeout: self.response_timeout,
                interval: self.poll_interval,
            });
        }
        if self.unavailable_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        Ok(())
    }
}

/// Rejected configuration values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("poll interval must be non-zero")]
    ZeroPollInterval,

    #[error("response timeout must be non-zero")]
    ZeroResponseTimeout,

    #[error("response timeout {timeout:?} must be shorter than poll interval {interval:?}")]
    TimeoutExceedsInterval { timeout: Duration, interval: Duration },

    #[error("unavailable threshold must be non-zero")]
    ZeroThreshold,
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DriverConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.response_timeout, Duration::from_millis(500));
        assert!(config.co2_enabled);
        assert_eq!(config.unavailable_threshold, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = DriverConfig::new()
            .with_poll_interval(Duration::from_secs(30))
            .with_response_timeout(Duration::from_millis(250))
            .with_co2_enabled(false)
            .with_unavailable_threshold(3);
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.response_timeout, Duration::from_millis(250));
        assert!(!config.co2_enabled);
        assert_eq!(config.unavailable_threshold, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_durations() {
        let zero_interval = DriverConfig::new().with_poll_interval(Duration::ZERO);
        assert_eq!(zero_interval.validate(), Err(ConfigError::ZeroPollInterval));

        let zero_timeout = DriverConfig::new().with_response_timeout(Duration::ZERO);
        assert_eq!(zero_timeout.validate(), Err(ConfigError::ZeroResponseTimeout));
    }

    #[test]
    fn test_validate_rejects_timeout_ge_interval() {
        let config = DriverConfig::new()
            .with_poll_interval(Duration::from_millis(500))
            .with_response_timeout(Duration::from_millis(500));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TimeoutExceedsInterval { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let config = DriverConfig::new().with_unavailable_threshold(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroThreshold));
    }
}
