//! Errors raised through the script VM's runtime-error channel.
//!
//! These never abort the host: the VM reports them against the calling
//! plugin the same way it reports its own runtime faults.

use thiserror::Error;

use modhost_core::error::HostError;
use modhost_core::types::PluginId;

/// A runtime error surfaced to script code.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The call site references a native that no provider ever bound.
    #[error("native \"{name}\" is not bound")]
    UnboundNative {
        /// Native name referenced by the call site.
        name: String,
    },

    /// A plugin native was entered again for the same caller while active.
    #[error("native \"{name}\" re-entered on behalf of plugin {caller}")]
    NativeReentered {
        /// Native name.
        name: String,
        /// Plugin whose call is already active.
        caller: PluginId,
    },

    /// Argument count or types do not match the native's signature.
    #[error("bad arguments for native \"{name}\": {reason}")]
    BadArguments {
        /// Native name.
        name: String,
        /// What was wrong.
        reason: String,
    },

    /// A handle cell does not name a live host object.
    #[error("invalid handle {0}")]
    InvalidHandle(i32),

    /// Natives can no longer be registered.
    #[error("native registration is closed")]
    RegistrationClosed,

    /// The plugin providing or receiving the call is not running.
    #[error("plugin {0} is not running")]
    PluginNotRunning(PluginId),

    /// A host-side operation failed while serving the script.
    #[error(transparent)]
    Host(#[from] HostError),

    /// Any other failure raised by script code or a native.
    #[error("{0}")]
    Failed(String),
}

impl ScriptError {
    /// Create a bad-arguments error.
    pub fn bad_arguments(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BadArguments {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
