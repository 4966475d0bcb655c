use core::ops::{Add, AddAssign, Mul, Sub};

/// Double precision point used by feature walkers, in world block units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3d {
    pub const ZERO: Vec3d = Vec3d {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Unit step along `yaw` (around +y, from +x towards +z) and `pitch` (towards +y).
    #[inline]
    pub fn from_angles(yaw: f32, pitch: f32) -> Self {
        let cos_pitch = f64::from(pitch.cos());
        Self {
            x: f64::from(yaw.cos()) * cos_pitch,
            y: f64::from(pitch.sin()),
            z: f64::from(yaw.sin()) * cos_pitch,
        }
    }

    #[inline]
    pub fn floor_i32(self) -> (i32, i32, i32) {
        (
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }
}

impl Add for Vec3d {
    type Output = Vec3d;
    #[inline]
    fn add(self, rhs: Vec3d) -> Vec3d {
        Vec3d::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3d {
    #[inline]
    fn add_assign(&mut self, rhs: Vec3d) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3d {
    type Output = Vec3d;
    #[inline]
    fn sub(self, rhs: Vec3d) -> Vec3d {
        Vec3d::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3d {
    type Output = Vec3d;
    #[inline]
    fn mul(self, rhs: f64) -> Vec3d {
        Vec3d::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}
