//! Core type definitions used across the modhost workspace.

pub mod id;

pub use id::*;
