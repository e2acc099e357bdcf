//! # modhost-core
//!
//! Core crate for modhost. Contains configuration schemas, integer
//! identifier newtypes and the unified error system shared by the
//! dispatch core and the server binary.
//!
//! This crate has **no** internal dependencies on other modhost crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::HostError;
pub use result::HostResult;
