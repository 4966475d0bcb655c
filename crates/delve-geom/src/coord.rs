use serde::{Deserialize, Serialize};

use crate::codec::{self, CoordError};
use crate::{CUBE_SHIFT, CUBE_SIZE_I32};

/// Identifies one cube of the world. Equality and hashing are by value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CubeCoord {
    pub cx: i32,
    pub cy: i32,
    pub cz: i32,
}

impl CubeCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32, cz: i32) -> Self {
        Self { cx, cy, cz }
    }

    /// Cube containing the world block `(bx, by, bz)`.
    #[inline]
    pub const fn from_block(bx: i32, by: i32, bz: i32) -> Self {
        Self {
            cx: bx >> CUBE_SHIFT,
            cy: by >> CUBE_SHIFT,
            cz: bz >> CUBE_SHIFT,
        }
    }

    #[inline]
    pub const fn from_key(key: u64) -> Self {
        Self {
            cx: codec::unpack_x(key),
            cy: codec::unpack_y(key),
            cz: codec::unpack_z(key),
        }
    }

    /// Compact 64-bit key for this cube. Out-of-range axes are clamped, see [`codec`].
    #[inline]
    pub const fn pack(self) -> u64 {
        codec::pack(self.cx, self.cy, self.cz)
    }

    #[inline]
    pub fn try_pack(self) -> Result<u64, CoordError> {
        codec::try_pack(self.cx, self.cy, self.cz)
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cy: self.cy + dy,
            cz: self.cz + dz,
        }
    }

    /// World coordinates of the cube's lowest corner voxel.
    #[inline]
    pub const fn min_block(self) -> (i32, i32, i32) {
        (
            self.cx * CUBE_SIZE_I32,
            self.cy * CUBE_SIZE_I32,
            self.cz * CUBE_SIZE_I32,
        )
    }

    #[inline]
    pub fn chebyshev(self, other: CubeCoord) -> i32 {
        (self.cx - other.cx)
            .abs()
            .max((self.cy - other.cy).abs())
            .max((self.cz - other.cz).abs())
    }

    /// Every cube within Chebyshev distance `range`, iterated x-major, then y, then z.
    pub fn neighborhood(self, range: i32) -> impl Iterator<Item = CubeCoord> {
        let range = range.max(0);
        (-range..=range).flat_map(move |dx| {
            (-range..=range).flat_map(move |dy| {
                (-range..=range).map(move |dz| self.offset(dx, dy, dz))
            })
        })
    }
}

impl From<(i32, i32, i32)> for CubeCoord {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

impl From<CubeCoord> for (i32, i32, i32) {
    fn from(value: CubeCoord) -> Self {
        (value.cx, value.cy, value.cz)
    }
}
