//! A loaded plugin: metadata, run status, module and native import table.

use std::cell::{Cell, RefCell};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use modhost_core::types::PluginId;

use crate::error::ScriptError;
use crate::module::{PublicId, ScriptModule};
use crate::natives::registry::NativeBinding;

/// Metadata about a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Unique plugin name.
    pub name: String,
    /// Plugin version string.
    pub version: String,
    /// Author or maintainer.
    pub author: String,
    /// Module file the plugin came from, if any.
    #[serde(default)]
    pub file: Option<String>,
}

impl PluginInfo {
    /// Creates plugin metadata.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            author: author.into(),
            file: None,
        }
    }

    /// Records the module file name.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// Run status of a loaded plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginStatus {
    /// Receives forwards and serves natives.
    Running,
    /// Running with verbose runtime error reports.
    Debug,
    /// Temporarily skipped by forwards; its natives refuse calls.
    Paused,
    /// Permanently stopped.
    Stopped,
}

impl PluginStatus {
    /// Returns whether the plugin takes part in dispatch.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running | Self::Debug)
    }
}

/// One native import slot.
#[derive(Debug, Clone)]
pub struct NativeImport {
    /// Native name referenced by the call site.
    pub name: String,
    /// Bound provider; `None` until resolution succeeds.
    pub binding: Option<NativeBinding>,
}

/// Serializable view of a loaded plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginSummary {
    /// Plugin id (load order).
    pub id: PluginId,
    /// Metadata.
    pub info: PluginInfo,
    /// Current status.
    pub status: PluginStatus,
    /// Load timestamp.
    pub loaded_at: DateTime<Utc>,
    /// Number of import slots.
    pub imports: usize,
    /// Import names still unbound.
    pub unbound: Vec<String>,
}

/// A plugin module loaded into the host.
pub struct LoadedPlugin {
    id: PluginId,
    info: PluginInfo,
    status: Cell<PluginStatus>,
    loaded_at: DateTime<Utc>,
    module: Box<dyn ScriptModule>,
    imports: RefCell<Vec<NativeImport>>,
}

impl LoadedPlugin {
    /// Wraps a module, creating an unbound import slot per referenced native.
    pub fn new(
        id: PluginId,
        info: PluginInfo,
        module: Box<dyn ScriptModule>,
        status: PluginStatus,
    ) -> Self {
        let imports = module
            .native_imports()
            .into_iter()
            .map(|name| NativeImport {
                name,
                binding: None,
            })
            .collect();

        Self {
            id,
            info,
            status: Cell::new(status),
            loaded_at: Utc::now(),
            module,
            imports: RefCell::new(imports),
        }
    }

    /// Plugin id.
    pub fn id(&self) -> PluginId {
        self.id
    }

    /// Plugin metadata.
    pub fn info(&self) -> &PluginInfo {
        &self.info
    }

    /// Plugin name.
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Current status.
    pub fn status(&self) -> PluginStatus {
        self.status.get()
    }

    /// Changes the status.
    pub fn set_status(&self, status: PluginStatus) {
        self.status.set(status);
    }

    /// Returns whether the plugin takes part in dispatch.
    pub fn is_running(&self) -> bool {
        self.status.get().is_running()
    }

    /// The underlying module.
    pub fn module(&self) -> &dyn ScriptModule {
        self.module.as_ref()
    }

    /// Finds a public function by name.
    pub fn find_public(&self, name: &str) -> Option<PublicId> {
        self.module.find_public(name)
    }

    /// Import slot referencing `name`.
    pub fn import_index(&self, name: &str) -> Option<usize> {
        self.imports.borrow().iter().position(|i| i.name == name)
    }

    /// Name and binding of import slot `index`.
    ///
    /// Unbound slots report [`ScriptError::UnboundNative`].
    pub fn import(&self, index: usize) -> Result<(String, NativeBinding), ScriptError> {
        let imports = self.imports.borrow();
        let import = imports.get(index).ok_or_else(|| {
            ScriptError::Failed(format!(
                "plugin \"{}\" has no native import slot {index}",
                self.info.name
            ))
        })?;
        match &import.binding {
            Some(binding) => Ok((import.name.clone(), binding.clone())),
            None => Err(ScriptError::UnboundNative {
                name: import.name.clone(),
            }),
        }
    }

    /// Names of the unbound import slots.
    pub fn unbound_imports(&self) -> Vec<String> {
        self.imports
            .borrow()
            .iter()
            .filter(|i| i.binding.is_none())
            .map(|i| i.name.clone())
            .collect()
    }

    /// Number of import slots.
    pub fn import_count(&self) -> usize {
        self.imports.borrow().len()
    }

    /// Binds every unbound slot for which `lookup` finds a provider.
    ///
    /// Bound slots are never rebound. Returns the number of slots bound by
    /// this call.
    pub fn bind_imports(&self, mut lookup: impl FnMut(&str) -> Option<NativeBinding>) -> usize {
        let mut bound = 0;
        for import in self.imports.borrow_mut().iter_mut() {
            if import.binding.is_some() {
                continue;
            }
            if let Some(binding) = lookup(&import.name) {
                import.binding = Some(binding);
                bound += 1;
            }
        }
        bound
    }

    /// Serializable summary.
    pub fn summary(&self) -> PluginSummary {
        PluginSummary {
            id: self.id,
            info: self.info.clone(),
            status: self.status(),
            loaded_at: self.loaded_at,
            imports: self.import_count(),
            unbound: self.unbound_imports(),
        }
    }
}

impl fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("id", &self.id)
            .field("name", &self.info.name)
            .field("status", &self.status.get())
            .field("imports", &self.import_count())
            .finish()
    }
}
