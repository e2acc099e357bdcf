//! Explicit context handed to host natives.

use modhost_core::types::{Handle, PluginId};

use crate::error::ScriptError;
use crate::manager::PluginHost;
use crate::params::{ParamValue, ScriptCell};

/// The caller and arguments of one native invocation.
#[derive(Debug, Clone, Copy)]
pub struct NativeContext<'a> {
    host: &'a PluginHost,
    caller: PluginId,
    name: &'a str,
    args: &'a [ParamValue],
}

impl<'a> NativeContext<'a> {
    pub(crate) fn new(
        host: &'a PluginHost,
        caller: PluginId,
        name: &'a str,
        args: &'a [ParamValue],
    ) -> Self {
        Self {
            host,
            caller,
            name,
            args,
        }
    }

    /// The host.
    pub fn host(&self) -> &'a PluginHost {
        self.host
    }

    /// Plugin whose code called the native.
    pub fn caller(&self) -> PluginId {
        self.caller
    }

    /// Native name as referenced by the call site.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Argument at `index`.
    pub fn arg(&self, index: usize) -> Result<&'a ParamValue, ScriptError> {
        self.args.get(index).ok_or_else(|| {
            ScriptError::bad_arguments(self.name, format!("missing argument {index}"))
        })
    }

    /// Argument at `index` as a cell.
    pub fn cell(&self, index: usize) -> Result<ScriptCell, ScriptError> {
        self.arg(index)?
            .as_cell()
            .ok_or_else(|| self.wrong_type(index, "a cell"))
    }

    /// Argument at `index` as text.
    pub fn string(&self, index: usize) -> Result<String, ScriptError> {
        self.arg(index)?
            .as_string()
            .ok_or_else(|| self.wrong_type(index, "a string"))
    }

    /// Argument at `index` as a handle.
    pub fn handle(&self, index: usize) -> Result<Handle, ScriptError> {
        let cell = self.cell(index)?;
        Handle::from_cell(cell)
            .ok_or(ScriptError::InvalidHandle(cell))
    }

    /// Writes through a writable string argument.
    pub fn set_string(&self, index: usize, text: &str) -> Result<(), ScriptError> {
        match self.arg(index)? {
            ParamValue::StringEx(s) => {
                s.set(text);
                Ok(())
            }
            _ => Err(self.wrong_type(index, "a writable string")),
        }
    }

    fn wrong_type(&self, index: usize, expected: &str) -> ScriptError {
        ScriptError::bad_arguments(self.name, format!("argument {index} is not {expected}"))
    }
}
