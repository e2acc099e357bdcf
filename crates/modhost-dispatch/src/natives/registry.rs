//! Process-wide native registry: native name → provider.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use modhost_core::error::HostError;
use modhost_core::result::HostResult;
use modhost_core::types::PluginId;

use crate::error::ScriptError;
use crate::module::PublicId;
use crate::natives::context::NativeContext;
use crate::params::{ParamType, ScriptCell};

/// Host-side native implementation.
pub type NativeFn = Rc<dyn Fn(&NativeContext<'_>) -> Result<ScriptCell, ScriptError>>;

/// A native implemented by the host.
pub struct HostNative {
    name: String,
    /// Declared parameters; `None` accepts any arguments.
    signature: Option<Vec<ParamType>>,
    func: NativeFn,
}

impl HostNative {
    /// Creates a native that accepts any arguments.
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&NativeContext<'_>) -> Result<ScriptCell, ScriptError> + 'static,
    {
        Self {
            name: name.to_string(),
            signature: None,
            func: Rc::new(func),
        }
    }

    /// Declares the parameter types checked before the native runs.
    pub fn with_signature(mut self, signature: Vec<ParamType>) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Native name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameters.
    pub fn signature(&self) -> Option<&[ParamType]> {
        self.signature.as_deref()
    }

    /// Runs the native.
    pub fn call(&self, ctx: &NativeContext<'_>) -> Result<ScriptCell, ScriptError> {
        (self.func)(ctx)
    }
}

impl fmt::Debug for HostNative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostNative")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish()
    }
}

/// Provider a native name is bound to.
#[derive(Debug, Clone)]
pub enum NativeBinding {
    /// Implemented by the host.
    Host(Rc<HostNative>),
    /// Implemented by a public function of a plugin.
    Plugin {
        /// Providing plugin.
        provider: PluginId,
        /// Handler function inside the provider.
        public: PublicId,
    },
}

/// Registry of every native available for binding.
///
/// Registration is monotonic: names are never rebound, and once
/// [`seal`](Self::seal)ed no further names are accepted.
#[derive(Debug, Default)]
pub struct NativeRegistry {
    bindings: RefCell<HashMap<String, NativeBinding>>,
    sealed: Cell<bool>,
}

impl NativeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a host native.
    pub fn register_host(&self, native: HostNative) -> HostResult<()> {
        let name = native.name().to_string();
        self.insert(name, NativeBinding::Host(Rc::new(native)))
    }

    /// Registers a plugin-provided native.
    pub fn register_plugin(
        &self,
        name: &str,
        provider: PluginId,
        public: PublicId,
    ) -> HostResult<()> {
        self.insert(name.to_string(), NativeBinding::Plugin { provider, public })
    }

    fn insert(&self, name: String, binding: NativeBinding) -> HostResult<()> {
        if self.sealed.get() {
            return Err(HostError::resolution(format!(
                "cannot register native \"{name}\": registration is closed"
            )));
        }

        let mut bindings = self.bindings.borrow_mut();
        if bindings.contains_key(&name) {
            return Err(HostError::conflict(format!(
                "native \"{name}\" is already registered"
            )));
        }

        debug!(native = %name, provider = ?binding_provider(&binding), "Native registered");
        bindings.insert(name, binding);
        Ok(())
    }

    /// Looks up the provider of `name`.
    pub fn resolve(&self, name: &str) -> Option<NativeBinding> {
        self.bindings.borrow().get(name).cloned()
    }

    /// Returns whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    /// Closes registration.
    pub fn seal(&self) {
        self.sealed.set(true);
    }

    /// Returns whether registration is closed.
    pub fn is_sealed(&self) -> bool {
        self.sealed.get()
    }

    /// Number of registered natives.
    pub fn len(&self) -> usize {
        self.bindings.borrow().len()
    }

    /// Returns whether no native is registered.
    pub fn is_empty(&self) -> bool {
        self.bindings.borrow().is_empty()
    }
}

fn binding_provider(binding: &NativeBinding) -> Option<PluginId> {
    match binding {
        NativeBinding::Host(_) => None,
        NativeBinding::Plugin { provider, .. } => Some(*provider),
    }
}
