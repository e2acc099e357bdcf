//! Native resolution and binding.
//!
//! Natives are functions script code calls by name without knowing
//! whether the host or another plugin implements them. Binding happens in
//! two passes: while plugins load, each plugin's import slots are tried
//! against the natives registered so far; once every plugin is loaded, the
//! `plugin_natives` forward lets plugins register more natives and all
//! remaining slots are retried. Anything still unbound raises a runtime
//! error only when a call site actually reaches it.

pub mod builtin;
pub mod context;
pub mod guard;
pub mod registry;
pub mod resolver;

pub use context::NativeContext;
pub use guard::{ActiveNative, NativeFrame, NativeGuard};
pub use registry::{HostNative, NativeBinding, NativeFn, NativeRegistry};
pub use resolver::{BindReport, ResolveReport, UnboundNative};
