//! Concrete feature generators.

pub mod carve;
pub mod caves;
pub mod pockets;

pub use caves::{CaveGenerator, CaveKind, CaveSeed};
pub use pockets::{PocketGenerator, PocketSeed};
