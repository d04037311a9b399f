//! Opaque ID newtypes for floorplan entities.
//!
//! [`BlockId`] and [`NetId`] are thin `u32` wrappers used as indices into the
//! design's cluster/block and net vectors. They are `Copy`, `Hash`, and
//! `Serialize`/`Deserialize`. Placement blocks are cluster surrogates, so a
//! `BlockId` indexes both the block vector inside an annealer and the cluster
//! vector of the design it was built from.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            /// Returns the index as a `usize` for vector access.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a placeable block (and its source cluster).
    BlockId
);

define_id!(
    /// Opaque, copyable ID for a net.
    NetId
);
