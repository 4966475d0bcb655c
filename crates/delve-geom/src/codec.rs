//! Packs a signed 3-axis cube coordinate into one `u64` hash key.
//!
//! Each axis is stored as a 21-bit two's complement field, `x` in the high bits:
//!
//! ```text
//!  63 62        42 41        21 20         0
//! | 0 |    x      |     y      |     z      |
//! ```
//!
//! The supported range per axis is `[AXIS_MIN, AXIS_MAX]` (about ±10^6 cubes).
//! [`try_pack`] rejects anything outside it. [`pack`] clamps instead, so two
//! out-of-range coordinates on the same side of an axis share a key rather than
//! wrapping around onto an unrelated cube. Caches that must tell every cube apart key
//! on the full `CubeCoord`.

use thiserror::Error;

pub const AXIS_BITS: u32 = 21;
pub const AXIS_MIN: i32 = -(1 << (AXIS_BITS - 1));
pub const AXIS_MAX: i32 = (1 << (AXIS_BITS - 1)) - 1;

const AXIS_MASK: u64 = (1 << AXIS_BITS) - 1;
const X_SHIFT: u32 = AXIS_BITS * 2;
const Y_SHIFT: u32 = AXIS_BITS;
const SIGN_SHIFT: u32 = 64 - AXIS_BITS;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("cube axis {axis} = {value} is outside [{AXIS_MIN}, {AXIS_MAX}]")]
pub struct CoordError {
    pub axis: char,
    pub value: i32,
}

#[inline]
pub const fn in_range(v: i32) -> bool {
    v >= AXIS_MIN && v <= AXIS_MAX
}

#[inline]
pub const fn clamp_axis(v: i32) -> i32 {
    if v < AXIS_MIN {
        AXIS_MIN
    } else if v > AXIS_MAX {
        AXIS_MAX
    } else {
        v
    }
}

/// Packs `(x, y, z)`, clamping each axis into the supported range.
#[inline]
pub const fn pack(x: i32, y: i32, z: i32) -> u64 {
    pack_in_range(clamp_axis(x), clamp_axis(y), clamp_axis(z))
}

/// Packs `(x, y, z)` or reports the first axis outside the supported range.
pub fn try_pack(x: i32, y: i32, z: i32) -> Result<u64, CoordError> {
    for (axis, value) in [('x', x), ('y', y), ('z', z)] {
        if !in_range(value) {
            return Err(CoordError { axis, value });
        }
    }
    Ok(pack_in_range(x, y, z))
}

#[inline]
const fn pack_in_range(x: i32, y: i32, z: i32) -> u64 {
    (((x as u64) & AXIS_MASK) << X_SHIFT)
        | (((y as u64) & AXIS_MASK) << Y_SHIFT)
        | ((z as u64) & AXIS_MASK)
}

#[inline]
const fn sign_extend(field: u64) -> i32 {
    (((field << SIGN_SHIFT) as i64) >> SIGN_SHIFT) as i32
}

#[inline]
pub const fn unpack_x(key: u64) -> i32 {
    sign_extend((key >> X_SHIFT) & AXIS_MASK)
}

#[inline]
pub const fn unpack_y(key: u64) -> i32 {
    sign_extend((key >> Y_SHIFT) & AXIS_MASK)
}

#[inline]
pub const fn unpack_z(key: u64) -> i32 {
    sign_extend(key & AXIS_MASK)
}
