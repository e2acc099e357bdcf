//! Reentrancy guard for plugin-provided natives.
//!
//! A plugin native must not be entered again on behalf of a caller it is
//! already serving. Frames are pushed on entry and popped when the
//! returned [`ActiveNative`] drops, so nested calls to *other* natives or
//! from other callers stay legal.

use std::cell::RefCell;

use tracing::warn;

use modhost_core::types::PluginId;

use crate::error::ScriptError;

/// One active plugin-native invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeFrame {
    /// Native being served.
    pub native: String,
    /// Plugin the call is made for.
    pub caller: PluginId,
}

/// Stack of active plugin-native invocations.
#[derive(Debug, Default)]
pub struct NativeGuard {
    frames: RefCell<Vec<NativeFrame>>,
}

impl NativeGuard {
    /// Creates an idle guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters `native` on behalf of `caller`.
    pub fn enter(&self, native: &str, caller: PluginId) -> Result<ActiveNative<'_>, ScriptError> {
        let mut frames = self.frames.borrow_mut();
        if frames
            .iter()
            .any(|f| f.caller == caller && f.native == native)
        {
            warn!(native = %native, caller = %caller, "Native re-entered for the same caller");
            return Err(ScriptError::NativeReentered {
                name: native.to_string(),
                caller,
            });
        }

        frames.push(NativeFrame {
            native: native.to_string(),
            caller,
        });
        Ok(ActiveNative { guard: self })
    }

    /// The innermost active frame.
    pub fn current(&self) -> Option<NativeFrame> {
        self.frames.borrow().last().cloned()
    }

    /// Number of active frames.
    pub fn depth(&self) -> usize {
        self.frames.borrow().len()
    }
}

/// Pops its frame when dropped.
#[derive(Debug)]
pub struct ActiveNative<'a> {
    guard: &'a NativeGuard,
}

impl Drop for ActiveNative<'_> {
    fn drop(&mut self) {
        self.guard.frames.borrow_mut().pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_caller_reentry_rejected() {
        let guard = NativeGuard::new();
        let _outer = guard.enter("foo", PluginId::new(0)).expect("outer");
        assert!(matches!(
            guard.enter("foo", PluginId::new(0)),
            Err(ScriptError::NativeReentered { .. })
        ));
        assert_eq!(guard.depth(), 1);
    }

    #[test]
    fn test_other_caller_or_native_allowed() {
        let guard = NativeGuard::new();
        let _a = guard.enter("foo", PluginId::new(0)).expect("a");
        let _b = guard.enter("foo", PluginId::new(1)).expect("b");
        let _c = guard.enter("bar", PluginId::new(0)).expect("c");
        assert_eq!(guard.depth(), 3);
        assert_eq!(
            guard.current(),
            Some(NativeFrame {
                native: "bar".into(),
                caller: PluginId::new(0)
            })
        );
    }

    #[test]
    fn test_frame_released_on_drop() {
        let guard = NativeGuard::new();
        {
            let _active = guard.enter("foo", PluginId::new(0)).expect("enter");
        }
        assert_eq!(guard.depth(), 0);
        guard.enter("foo", PluginId::new(0)).expect("enter again");
    }
}
