use crate::error::ConfigurationError;
use serde::Deserialize;
use std::time::Duration;

/// Default width of new components.
pub const DEFAULT_BIT_WIDTH: usize = 4;
/// Default maximum width of a component, values are enumerated through [u64]s.
pub const DEFAULT_MAX_BIT_WIDTH: usize = 64;
/// Default number of passes [stabilize](crate::CircuitState::stabilize) callers
/// inside the engine are allowed before giving up.
pub const DEFAULT_STABLE_MAX: usize = 50;
/// Default maximum number of input bits of a truth table, 2^16 rows.
pub const DEFAULT_MAX_TRUTH_TABLE_BITS: usize = 16;
/// Upper bound of [Config::max_truth_table_bits], 2^24 rows.
pub const MAX_TRUTH_TABLE_BITS: usize = 24;
/// Default clock period in milliseconds.
pub const DEFAULT_CLOCK_PERIOD_MS: u64 = 1000;

/// Runtime configuration of a [CircuitState](crate::CircuitState).
///
/// Every field is optional in the json form.
/// ```
/// # use circuitsim::Config;
/// let config = Config::from_json(r#"{ "default_bit_width": 1, "strict_bits": true }"#).unwrap();
///
/// assert_eq!(config.default_bit_width, 1);
/// assert_eq!(config.strict_bits, true);
/// assert_eq!(config, Config { default_bit_width: 1, strict_bits: true, ..Config::default() });
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub default_bit_width: usize,
    pub max_bit_width: usize,
    pub max_stabilize_iterations: usize,
    /// At most [MAX_TRUTH_TABLE_BITS].
    pub max_truth_table_bits: usize,
    pub clock_period_ms: u64,
    /// Reject malformed bit strings instead of normalizing them.
    pub strict_bits: bool,
}

impl Config {
    /// Parses and [validates](Config::validate) a json configuration document.
    pub fn from_json(json: &str) -> Result<Config, ConfigurationError> {
        let config: Config =
            serde_json::from_str(json).map_err(|e| ConfigurationError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the limits are usable.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_bit_width == 0 || self.max_bit_width > DEFAULT_MAX_BIT_WIDTH {
            return Err(ConfigurationError::Invalid(format!(
                "max_bit_width must be in 1..={}",
                DEFAULT_MAX_BIT_WIDTH
            )));
        }
        if self.default_bit_width == 0 || self.default_bit_width > self.max_bit_width {
            return Err(ConfigurationError::Invalid(format!(
                "default_bit_width must be in 1..={}",
                self.max_bit_width
            )));
        }
        if self.max_stabilize_iterations == 0 {
            return Err(ConfigurationError::Invalid(
                "max_stabilize_iterations must be positive".into(),
            ));
        }
        if self.max_truth_table_bits > MAX_TRUTH_TABLE_BITS {
            return Err(ConfigurationError::Invalid(format!(
                "max_truth_table_bits must be at most {}",
                MAX_TRUTH_TABLE_BITS
            )));
        }
        if self.clock_period_ms == 0 {
            return Err(ConfigurationError::Invalid(
                "clock_period_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Returns the default clock period.
    pub fn clock_period(&self) -> Duration {
        Duration::from_millis(self.clock_period_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_bit_width: DEFAULT_BIT_WIDTH,
            max_bit_width: DEFAULT_MAX_BIT_WIDTH,
            max_stabilize_iterations: DEFAULT_STABLE_MAX,
            max_truth_table_bits: DEFAULT_MAX_TRUTH_TABLE_BITS,
            clock_period_ms: DEFAULT_CLOCK_PERIOD_MS,
            strict_bits: false,
        }
    }
}
