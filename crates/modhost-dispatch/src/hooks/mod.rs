//! Hook system: generic interception chains and the engine hook points.

pub mod chain;
pub mod definitions;
pub mod engine;

pub use chain::{HookCallback, HookChainRegistry, HookCursor};
pub use definitions::{ClientArgs, CommandArgs, HookPoint, ServerArgs};
pub use engine::EngineHooks;
