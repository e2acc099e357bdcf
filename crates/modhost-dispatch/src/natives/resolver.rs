//! Binding of plugin import slots against the native registry.

use serde::{Deserialize, Serialize};

use modhost_core::types::PluginId;

use crate::plugin::LoadedPlugin;

use super::registry::NativeRegistry;

/// Outcome of one resolution attempt for one plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Slots bound by this attempt.
    pub resolved: usize,
    /// Names still unbound afterwards.
    pub unresolved: Vec<String>,
}

/// Attempts every unbound import slot of `plugin` against `natives`.
///
/// Unresolved slots are not an error; they are retried by later passes.
pub fn resolve_plugin(plugin: &LoadedPlugin, natives: &NativeRegistry) -> ResolveReport {
    let resolved = plugin.bind_imports(|name| natives.resolve(name));
    ResolveReport {
        resolved,
        unresolved: plugin.unbound_imports(),
    }
}

/// A native left unbound after the bind pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnboundNative {
    /// Plugin referencing the native.
    pub plugin: PluginId,
    /// Plugin name.
    pub plugin_name: String,
    /// Native name.
    pub native: String,
}

/// Result of the bind pass across every plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindReport {
    /// Slots bound during the bind pass.
    pub resolved: usize,
    /// Slots that stay permanently unbound.
    pub unbound: Vec<UnboundNative>,
}

impl BindReport {
    /// Returns whether every import slot of every plugin is bound.
    pub fn is_complete(&self) -> bool {
        self.unbound.is_empty()
    }
}
