//! Plugin loading configuration.

use serde::{Deserialize, Serialize};

/// Plugin loading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Directory containing compiled plugin modules.
    #[serde(default = "default_plugin_directory")]
    pub directory: String,
    /// Whether to run the two-pass load automatically on startup.
    #[serde(default = "default_true")]
    pub auto_load: bool,
    /// Start every plugin in debug status (verbose runtime error reports).
    #[serde(default)]
    pub debug: bool,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: default_plugin_directory(),
            auto_load: true,
            debug: false,
        }
    }
}

fn default_plugin_directory() -> String {
    "./plugins".to_string()
}

fn default_true() -> bool {
    true
}
