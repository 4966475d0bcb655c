//! Cube coordinates, the 64-bit coordinate codec, and cube-space geometry.
#![forbid(unsafe_code)]

pub mod codec;
mod coord;
mod cube_box;
mod vec3;

pub use codec::{AXIS_BITS, AXIS_MAX, AXIS_MIN, CoordError};
pub use coord::CubeCoord;
pub use cube_box::CubeBox;
pub use vec3::Vec3d;

/// Edge length of a cube in voxels.
pub const CUBE_SIZE: usize = 16;
pub const CUBE_SIZE_I32: i32 = CUBE_SIZE as i32;
/// `log2(CUBE_SIZE)`, used to turn block coordinates into cube coordinates.
pub const CUBE_SHIFT: u32 = 4;
/// Voxels per cube.
pub const CUBE_VOLUME: usize = CUBE_SIZE * CUBE_SIZE * CUBE_SIZE;
