//! Convenience result type alias for modhost.

use crate::error::HostError;

/// A specialized `Result` type for host operations.
pub type HostResult<T> = Result<T, HostError>;
