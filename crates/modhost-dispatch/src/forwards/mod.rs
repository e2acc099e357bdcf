//! Forward dispatch engine: named, typed events delivered to one plugin
//! function or broadcast to every plugin exposing a function of that name.

pub mod builtin;
pub mod forward;
pub mod policy;
pub mod registry;

pub use builtin::BuiltinForwards;
pub use forward::{Forward, ForwardInfo, ForwardTarget};
pub use policy::{
    Aggregator, ExecOutcome, ExecPolicy, PLUGIN_CONTINUE, PLUGIN_HANDLED, PLUGIN_HANDLED_MAIN,
};
pub use registry::ForwardRegistry;
