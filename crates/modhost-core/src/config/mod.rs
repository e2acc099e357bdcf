//! Host configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field carries a serde default so an empty
//! configuration is valid.

pub mod dispatch;
pub mod logging;
pub mod plugin;

use std::path::Path;

use serde::{Deserialize, Serialize};

use self::dispatch::DispatchConfig;
use self::logging::LoggingConfig;
use self::plugin::PluginConfig;

use crate::error::HostError;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "MODHOST";

/// Root host configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// files (`default.toml` + environment overlay + `MODHOST__*` variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Plugin loading settings.
    #[serde(default)]
    pub plugins: PluginConfig,
    /// Dispatch core settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl HostConfig {
    /// Load configuration from `<dir>/default.toml`, `<dir>/<env>.toml` and
    /// environment variables prefixed with `MODHOST__`.
    ///
    /// Missing files are skipped.
    pub fn load(dir: impl AsRef<Path>, env: &str) -> Result<Self, HostError> {
        let dir = dir.as_ref();
        let default_file = dir.join("default");
        let env_file = dir.join(env);

        tracing::debug!(dir = %dir.display(), env = %env, "Loading host configuration");

        let config = config::Config::builder()
            .add_source(config::File::with_name(&default_file.to_string_lossy()).required(false))
            .add_source(config::File::with_name(&env_file.to_string_lossy()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| HostError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| HostError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_dir_uses_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = HostConfig::load(temp.path(), "development").expect("load");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.plugins.directory, "./plugins");
        assert!(config.plugins.auto_load);
        assert!(config.dispatch.log_unbound_natives);
    }

    #[test]
    fn test_env_file_overrides_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            temp.path().join("default.toml"),
            "[logging]\nlevel = \"warn\"\nformat = \"json\"\n\n[plugins]\ndebug = false\n",
        )
        .expect("write default");
        std::fs::write(
            temp.path().join("staging.toml"),
            "[plugins]\ndebug = true\n\n[dispatch]\ndefault_hook_priority = 7\n",
        )
        .expect("write env");

        let config = HostConfig::load(temp.path(), "staging").expect("load");
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "json");
        assert!(config.plugins.debug);
        assert_eq!(config.dispatch.default_hook_priority, 7);
    }

    #[test]
    fn test_invalid_type_is_configuration_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            temp.path().join("default.toml"),
            "[dispatch]\ndefault_hook_priority = \"high\"\n",
        )
        .expect("write");

        let err = HostConfig::load(temp.path(), "none")
            .expect_err("should fail");
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }
}
