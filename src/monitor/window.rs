use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chain::{NetworkId, Window};

/// How a window's `start`/`length` pair is matched against the block height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    /// Active when `block % length` falls in `[start, start + length)`.
    #[default]
    Cyclic,
    /// Active when `block` itself falls in `[start, start + length)`.
    Absolute,
}

impl fmt::Display for WindowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowMode::Cyclic => write!(f, "cyclic"),
            WindowMode::Absolute => write!(f, "absolute"),
        }
    }
}

impl Window {
    /// Whether this window covers `block`. A zero-length window never does.
    pub fn is_active(&self, block: u64, mode: WindowMode) -> bool {
        if self.length == 0 {
            return false;
        }
        let pos = match mode {
            WindowMode::Cyclic => block % self.length,
            WindowMode::Absolute => block,
        };
        pos >= self.start && pos - self.start < self.length
    }
}

/// First network, in enumeration order, whose window covers `current_block`.
pub fn resolve_active_network(
    current_block: u64,
    networks: &[(NetworkId, Window)],
    mode: WindowMode,
) -> Option<NetworkId> {
    networks
        .iter()
        .find(|(_, window)| window.is_active(current_block, mode))
        .map(|(network, _)| *network)
}
