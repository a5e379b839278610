//! Clock configuration

use serde::{Deserialize, Serialize};

/// Clock configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Mailbox capacity per subscriber. A publish that finds a mailbox full
    /// forcibly closes that subscription.
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
}

fn default_mailbox_capacity() -> usize {
    16
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 16,
        }
    }
}
