//! # modhost-dispatch
//!
//! Dispatch core of the mod host. Provides:
//!
//! - Priority-ordered hook chains around engine entry points
//! - Typed forwards broadcast to plugins with execution policies
//! - Generation-free handle tables for host objects
//! - Two-pass binding of natives referenced by plugin call sites
//! - The [`PluginHost`] tying it together with the plugin lifecycle

pub mod clients;
pub mod closure;
pub mod error;
pub mod forwards;
pub mod handles;
pub mod hooks;
pub mod manager;
pub mod module;
pub mod natives;
pub mod params;
pub mod plugin;
pub mod registry;

pub use closure::ClosureModule;
pub use error::ScriptError;
pub use forwards::{
    ExecOutcome, ExecPolicy, ForwardInfo, PLUGIN_CONTINUE, PLUGIN_HANDLED, PLUGIN_HANDLED_MAIN,
};
pub use handles::HandleTable;
pub use hooks::{EngineHooks, HookChainRegistry, HookCursor, HookPoint};
pub use manager::{HostPhase, PluginHost};
pub use module::{PublicId, ScriptEnv, ScriptModule};
pub use natives::{BindReport, HostNative, NativeContext};
pub use params::{ParamType, ParamValue, ScriptArray, ScriptCell, ScriptString};
pub use plugin::{PluginInfo, PluginStatus, PluginSummary};
pub use registry::PluginRegistry;
