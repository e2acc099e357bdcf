//! Lifecycle forwards created with the host.

use modhost_core::result::HostResult;
use modhost_core::types::ForwardId;

use crate::params::ParamType;

use super::policy::ExecPolicy;
use super::registry::ForwardRegistry;

/// Ids of the built-in forwards, created in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinForwards {
    /// `plugin_natives()`: plugins may register natives.
    pub plugin_natives: ForwardId,
    /// `plugin_precache()`.
    pub plugin_precache: ForwardId,
    /// `plugin_init()`.
    pub plugin_init: ForwardId,
    /// `plugin_cfg()`.
    pub plugin_cfg: ForwardId,
    /// `plugins_loaded()`: every plugin is loaded and bound.
    pub plugins_loaded: ForwardId,
    /// `plugin_end()`.
    pub plugin_end: ForwardId,
    /// `client_connect(client)`.
    pub client_connect: ForwardId,
    /// `client_putinserver(client)`.
    pub client_putinserver: ForwardId,
    /// `client_disconnect(client)`.
    pub client_disconnect: ForwardId,
    /// `client_command(client, command[])`.
    pub client_command: ForwardId,
}

impl BuiltinForwards {
    /// Creates every built-in forward in `registry`.
    pub fn create(registry: &ForwardRegistry) -> HostResult<Self> {
        let lifecycle = |name: &str| registry.create_multi(name, Vec::new(), ExecPolicy::IGNORE);
        let per_client =
            |name: &str| registry.create_multi(name, vec![ParamType::Cell], ExecPolicy::IGNORE);

        Ok(Self {
            plugin_natives: lifecycle("plugin_natives")?,
            plugin_precache: lifecycle("plugin_precache")?,
            plugin_init: lifecycle("plugin_init")?,
            plugin_cfg: lifecycle("plugin_cfg")?,
            plugins_loaded: lifecycle("plugins_loaded")?,
            plugin_end: lifecycle("plugin_end")?,
            client_connect: per_client("client_connect")?,
            client_putinserver: per_client("client_putinserver")?,
            client_disconnect: per_client("client_disconnect")?,
            client_command: registry.create_multi(
                "client_command",
                vec![ParamType::Cell, ParamType::String],
                ExecPolicy::STOP | ExecPolicy::HIGHEST,
            )?,
        })
    }

    /// Every built-in id in creation order.
    pub fn ids(&self) -> [ForwardId; 10] {
        [
            self.plugin_natives,
            self.plugin_precache,
            self.plugin_init,
            self.plugin_cfg,
            self.plugins_loaded,
            self.plugin_end,
            self.client_connect,
            self.client_putinserver,
            self.client_disconnect,
            self.client_command,
        ]
    }

    /// Returns whether `id` is a built-in forward.
    pub fn contains(&self, id: ForwardId) -> bool {
        self.ids().contains(&id)
    }
}
