//! Attach-time configuration
//!
//! Per-device knobs set before the reset exchange runs. Defaults match the
//! values the boards ship with; `from_env` lets a deployment override them
//! without a rebuild.

use hfa_chip::tuning::DEFAULT_MAX_SEARCH_DIFFICULTY;
use hfa_chip::usb::DEFAULT_BAUD_RATE;

/// Environment variable overriding the control link baud rate
pub const ENV_BAUD_RATE: &str = "HFA_BAUD_RATE";

/// Environment variable overriding the max search difficulty
pub const ENV_MAX_SEARCH_DIFFICULTY: &str = "HFA_MAX_SEARCH_DIFFICULTY";

/// Configuration applied to every device at attach
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachConfig {
    /// Control link baud rate
    pub baud_rate: u32,

    /// Report fan tachometer readings
    pub tacho_enable: bool,

    /// Miner instances driven per board
    pub miner_count: u32,

    /// Highest difficulty the board searches for on its own
    pub max_search_difficulty: u32,
}

impl Default for AttachConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            tacho_enable: true,
            miner_count: 1,
            max_search_difficulty: DEFAULT_MAX_SEARCH_DIFFICULTY,
        }
    }
}

impl AttachConfig {
    /// Defaults, overlaid with `HFA_BAUD_RATE` and
    /// `HFA_MAX_SEARCH_DIFFICULTY` when set
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults, overlaid with whatever `lookup` returns for each variable.
    /// Values that do not parse are ignored with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        let parse = |key: &str| -> Option<u32> {
            let raw = lookup(key)?;
            match raw.trim().parse() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Ignoring {key}={raw:?}: {e}");
                    None
                }
            }
        };

        if let Some(baud) = parse(ENV_BAUD_RATE) {
            config.baud_rate = baud;
        }
        if let Some(diff) = parse(ENV_MAX_SEARCH_DIFFICULTY) {
            config.max_search_difficulty = diff;
        }

        config
    }

    /// Set the control link baud rate
    #[must_use]
    pub const fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the max search difficulty
    #[must_use]
    pub const fn with_max_search_difficulty(mut self, difficulty: u32) -> Self {
        self.max_search_difficulty = difficulty;
        self
    }

    /// Enable or disable tachometer reporting
    #[must_use]
    pub const fn with_tacho(mut self, enable: bool) -> Self {
        self.tacho_enable = enable;
        self
    }
}
