//! Newtype wrappers around `u32` for every integer identifier that crosses
//! the script boundary.
//!
//! Scripts only ever see these values as plain cells, so distinct types
//! keep a `ForwardId` from being passed where a client `Handle` is
//! expected on the host side.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Macro to define a newtype ID wrapper around `u32`.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Create an identifier from its raw value.
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Return the raw value.
            pub const fn get(self) -> u32 {
                self.0
            }

            /// Return the raw value as a table index.
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            /// Return the value as a script cell.
            pub fn as_cell(self) -> i32 {
                self.0 as i32
            }

            /// Convert a script cell back into an identifier.
            ///
            /// Negative cells never name a valid identifier.
            pub fn from_cell(cell: i32) -> Option<Self> {
                u32::try_from(cell).ok().map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<u32>().map(Self)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> u32 {
                id.0
            }
        }
    };
}

define_id!(
    /// Identifier of a loaded plugin; equal to its load-order position.
    PluginId
);

define_id!(
    /// Identifier of a forward in the forward registry.
    ForwardId
);

define_id!(
    /// Opaque handle to a weakly-held host object.
    Handle
);

define_id!(
    /// Identity of one interceptor inside a hook chain.
    HookId
);
