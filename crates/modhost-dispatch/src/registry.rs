//! Plugin registry: loaded plugins in load order.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::info;

use modhost_core::error::HostError;
use modhost_core::result::HostResult;
use modhost_core::types::PluginId;

use crate::plugin::{LoadedPlugin, PluginStatus, PluginSummary};

/// Registry of every loaded plugin.
///
/// Plugin ids equal load-order positions, so iteration order is load order.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    /// Load order → plugin.
    plugins: RefCell<Vec<Rc<LoadedPlugin>>>,
    /// Plugin name → id.
    by_name: RefCell<HashMap<String, PluginId>>,
}

impl PluginRegistry {
    /// Creates an empty plugin registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next registered plugin will receive.
    pub fn next_id(&self) -> PluginId {
        PluginId::new(self.plugins.borrow().len() as u32)
    }

    /// Registers a plugin. Its id must be [`next_id`](Self::next_id).
    pub fn register(&self, plugin: Rc<LoadedPlugin>) -> HostResult<()> {
        let mut by_name = self.by_name.borrow_mut();
        if by_name.contains_key(plugin.name()) {
            return Err(HostError::conflict(format!(
                "Plugin '{}' is already loaded",
                plugin.name()
            )));
        }

        let mut plugins = self.plugins.borrow_mut();
        if plugin.id().index() != plugins.len() {
            return Err(HostError::internal(format!(
                "Plugin '{}' registered with id {} out of load order",
                plugin.name(),
                plugin.id()
            )));
        }

        info!(
            plugin_id = %plugin.id(),
            name = %plugin.name(),
            version = %plugin.info().version,
            "Registering plugin"
        );

        by_name.insert(plugin.name().to_string(), plugin.id());
        plugins.push(plugin);
        Ok(())
    }

    /// Gets a plugin by id.
    pub fn get(&self, id: PluginId) -> Option<Rc<LoadedPlugin>> {
        self.plugins.borrow().get(id.index()).cloned()
    }

    /// Every plugin in load order.
    pub fn all(&self) -> Vec<Rc<LoadedPlugin>> {
        self.plugins.borrow().clone()
    }

    /// Summaries of every plugin in load order.
    pub fn list(&self) -> Vec<PluginSummary> {
        self.plugins.borrow().iter().map(|p| p.summary()).collect()
    }

    /// Returns plugin count.
    pub fn count(&self) -> usize {
        self.plugins.borrow().len()
    }

    /// Changes a plugin's status.
    pub fn set_status(&self, id: PluginId, status: PluginStatus) -> HostResult<()> {
        let plugin = self
            .get(id)
            .ok_or_else(|| HostError::not_found(format!("Plugin {id} not found")))?;
        if plugin.status() == PluginStatus::Stopped {
            return Err(HostError::plugin(format!(
                "Plugin '{}' is stopped",
                plugin.name()
            )));
        }
        plugin.set_status(status);
        info!(plugin_id = %id, name = %plugin.name(), status = ?status, "Plugin status changed");
        Ok(())
    }

    /// Marks every plugin stopped.
    pub fn stop_all(&self) {
        for plugin in self.plugins.borrow().iter() {
            plugin.set_status(PluginStatus::Stopped);
        }
    }
}
