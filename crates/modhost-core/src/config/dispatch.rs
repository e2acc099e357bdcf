//! Dispatch core configuration.

use serde::{Deserialize, Serialize};

/// Settings for hook chains, forwards and native binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Priority given to host-side hook registrations that do not name one.
    #[serde(default)]
    pub default_hook_priority: i32,
    /// Log a warning for every native left unbound after the bind pass.
    #[serde(default = "default_true")]
    pub log_unbound_natives: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_hook_priority: 0,
            log_unbound_natives: true,
        }
    }
}

fn default_true() -> bool {
    true
}
