//! Default timeouts applied when a placement omits them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Placement defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Entry fill timeout in seconds.
    #[serde(default = "default_fill_timeout")]
    pub fill_timeout_secs: u64,
    /// Confirmation timeout in seconds.
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            fill_timeout_secs: default_fill_timeout(),
            confirmation_timeout_secs: default_confirmation_timeout(),
        }
    }
}

impl DefaultsConfig {
    /// Default entry fill timeout.
    #[must_use]
    pub const fn fill_timeout(&self) -> Duration {
        Duration::from_secs(self.fill_timeout_secs)
    }

    /// Default confirmation timeout.
    #[must_use]
    pub const fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }
}

const fn default_fill_timeout() -> u64 {
    15
}

const fn default_confirmation_timeout() -> u64 {
    300
}
