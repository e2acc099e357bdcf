//! A script module backed by Rust closures.
//!
//! Used to embed host-side plugins and to drive the dispatch core in tests
//! without a bytecode VM.

use std::fmt;
use std::rc::Rc;

use crate::error::ScriptError;
use crate::module::{NativeExport, PublicId, ScriptEnv, ScriptModule};
use crate::params::{ParamValue, ScriptCell};

/// Body of one public function.
pub type PublicFn = Rc<dyn Fn(&ScriptEnv<'_>, &[ParamValue]) -> Result<ScriptCell, ScriptError>>;

/// Closure-backed [`ScriptModule`].
#[derive(Default)]
pub struct ClosureModule {
    publics: Vec<(String, PublicFn)>,
    imports: Vec<String>,
    exports: Vec<NativeExport>,
}

impl ClosureModule {
    /// Creates an empty module.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a public function. A later definition with the same name
    /// replaces the earlier one.
    pub fn with_public<F>(mut self, name: &str, body: F) -> Self
    where
        F: Fn(&ScriptEnv<'_>, &[ParamValue]) -> Result<ScriptCell, ScriptError> + 'static,
    {
        let body: PublicFn = Rc::new(body);
        match self.publics.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = body,
            None => self.publics.push((name.to_string(), body)),
        }
        self
    }

    /// Declares a native import slot.
    pub fn with_import(mut self, native: &str) -> Self {
        if !self.imports.iter().any(|n| n == native) {
            self.imports.push(native.to_string());
        }
        self
    }

    /// Declares a native this module provides through `function`.
    pub fn with_export(mut self, native: &str, function: &str) -> Self {
        self.exports.push(NativeExport::new(native, function));
        self
    }
}

impl fmt::Debug for ClosureModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let publics: Vec<&str> = self.publics.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("ClosureModule")
            .field("publics", &publics)
            .field("imports", &self.imports)
            .field("exports", &self.exports)
            .finish()
    }
}

impl ScriptModule for ClosureModule {
    fn find_public(&self, name: &str) -> Option<PublicId> {
        self.publics
            .iter()
            .position(|(n, _)| n == name)
            .map(PublicId)
    }

    fn native_imports(&self) -> Vec<String> {
        self.imports.clone()
    }

    fn exported_natives(&self) -> Vec<NativeExport> {
        self.exports.clone()
    }

    fn call_public(
        &self,
        env: &ScriptEnv<'_>,
        public: PublicId,
        args: &[ParamValue],
    ) -> Result<ScriptCell, ScriptError> {
        let (_, body) = self.publics.get(public.0).ok_or_else(|| {
            ScriptError::Failed(format!("no public function at index {}", public.0))
        })?;
        let body = Rc::clone(body);
        body(env, args)
    }
}
