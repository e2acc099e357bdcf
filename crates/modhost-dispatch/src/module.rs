//! Boundary to the external script VM.
//!
//! A [`ScriptModule`] stands in for one compiled plugin module. The host
//! only needs to look up public functions, learn which natives the
//! module's call sites import, and execute a public function. Script code
//! reaches back into the host through the [`ScriptEnv`] it is handed.

use std::fmt;

use modhost_core::types::PluginId;

use crate::error::ScriptError;
use crate::manager::PluginHost;
use crate::params::{ParamValue, ScriptCell};

/// Index of a public function inside one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicId(pub usize);

/// A native a module provides statically at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeExport {
    /// Native name call sites use.
    pub native: String,
    /// Public function implementing it.
    pub function: String,
}

impl NativeExport {
    /// Creates an export entry.
    pub fn new(native: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            native: native.into(),
            function: function.into(),
        }
    }
}

/// One compiled plugin module as seen by the host.
pub trait ScriptModule: fmt::Debug {
    /// Finds a public function by name.
    fn find_public(&self, name: &str) -> Option<PublicId>;

    /// Natives referenced by the module's call sites, indexed by import slot.
    fn native_imports(&self) -> Vec<String>;

    /// Natives the module provides without running any code.
    fn exported_natives(&self) -> Vec<NativeExport> {
        Vec::new()
    }

    /// Executes a public function.
    ///
    /// Runtime faults are returned as [`ScriptError`]; they never unwind
    /// into the host.
    fn call_public(
        &self,
        env: &ScriptEnv<'_>,
        public: PublicId,
        args: &[ParamValue],
    ) -> Result<ScriptCell, ScriptError>;
}

/// What running script code can see of the host.
#[derive(Clone, Copy)]
pub struct ScriptEnv<'a> {
    host: &'a PluginHost,
    plugin: PluginId,
}

impl<'a> ScriptEnv<'a> {
    pub(crate) fn new(host: &'a PluginHost, plugin: PluginId) -> Self {
        Self { host, plugin }
    }

    /// Plugin whose code is running.
    pub fn plugin(&self) -> PluginId {
        self.plugin
    }

    /// The host, for dispatch operations such as forwards.
    pub fn host(&self) -> &'a PluginHost {
        self.host
    }

    /// Calls the native bound to import slot `import`.
    pub fn call_native(
        &self,
        import: usize,
        args: &[ParamValue],
    ) -> Result<ScriptCell, ScriptError> {
        self.host.call_native(self.plugin, import, args)
    }

    /// Calls an imported native by name.
    pub fn call_native_by_name(
        &self,
        name: &str,
        args: &[ParamValue],
    ) -> Result<ScriptCell, ScriptError> {
        let import = self
            .host
            .import_index(self.plugin, name)
            .ok_or_else(|| ScriptError::UnboundNative {
                name: name.to_string(),
            })?;
        self.call_native(import, args)
    }
}

impl fmt::Debug for ScriptEnv<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptEnv")
            .field("plugin", &self.plugin)
            .finish()
    }
}
