use core::ops::Mul;

use nalgebra::Vector4;
#[cfg(not(test))]
use num_traits::Float as _;

use crate::{
    angle::{DEG_PER_RAD, PI_180},
    error::{Error, Result, SampleFault},
    estimate::OrientationEstimate,
};

/// Below this norm a quaternion has no usable direction
pub const DEGENERATE_NORM: f32 = 1e-6;

/// Rotation quaternion, scalar first
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    /// No rotation
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 0.0);

    pub const fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// Builds a rotation from aerospace-sequence angles in degrees, inverse of [`Self::to_euler`]
    pub fn from_euler(roll: f32, pitch: f32, yaw: f32) -> Self {
        let (sr, cr) = (roll * PI_180 * 0.5).sin_cos();
        let (sp, cp) = (pitch * PI_180 * 0.5).sin_cos();
        let (sy, cy) = (yaw * PI_180 * 0.5).sin_cos();

        Self {
            w: cr * cp * cy + sr * sp * sy,
            x: sr * cp * cy - cr * sp * sy,
            y: cr * sp * cy + sr * cp * sy,
            z: cr * cp * sy - sr * sp * cy,
        }
    }

    pub fn norm_squared(&self) -> f32 {
        self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn norm(&self) -> f32 {
        self.norm_squared().sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.w.is_finite() && self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Scales to unit length.
    ///
    /// Fails with [`Error::DegenerateInput`] when the norm is below
    /// [`DEGENERATE_NORM`]; callers usually fall back to [`Self::IDENTITY`].
    /// Components are divided by the largest one first, so large raw
    /// readings do not overflow the sum of squares.
    pub fn normalize(&self) -> Result<Self> {
        if !self.is_finite() {
            return Err(Error::InvalidSample(SampleFault::NonFinite));
        }

        let largest = self
            .w
            .abs()
            .max(self.x.abs())
            .max(self.y.abs())
            .max(self.z.abs());
        if largest < DEGENERATE_NORM / 2.0 {
            return Err(Error::DegenerateInput);
        }

        let scaled = Self::new(
            self.w / largest,
            self.x / largest,
            self.y / largest,
            self.z / largest,
        );
        let scaled_norm = scaled.norm();
        if largest * scaled_norm < DEGENERATE_NORM {
            return Err(Error::DegenerateInput);
        }

        let inv = 1.0 / scaled_norm;
        Ok(Self::new(
            scaled.w * inv,
            scaled.x * inv,
            scaled.y * inv,
            scaled.z * inv,
        ))
    }

    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Roll, pitch and yaw in degrees, yaw shifted into [0, 360).
    ///
    /// Expects a unit quaternion. The pitch argument is clamped before `asin`
    /// since float drift can push it just past ±1.
    pub fn to_euler(&self) -> OrientationEstimate {
        let Self {
            w: q1,
            x: q2,
            y: q3,
            z: q4,
        } = *self;

        let roll = (2.0 * (q1 * q2 + q3 * q4)).atan2(1.0 - 2.0 * (q2 * q2 + q3 * q3));
        let pitch = (2.0 * (q1 * q3 - q4 * q2)).clamp(-1.0, 1.0).asin();
        let yaw = (2.0 * (q1 * q4 + q2 * q3)).atan2(1.0 - 2.0 * (q3 * q3 + q4 * q4));

        let mut yaw = yaw * DEG_PER_RAD;
        if yaw < 0.0 {
            yaw += 360.0;
        }
        // atan2 of -0.0 in the second quadrant lands exactly on 360
        if yaw >= 360.0 {
            yaw -= 360.0;
        }

        OrientationEstimate {
            roll: roll * DEG_PER_RAD,
            pitch: pitch * DEG_PER_RAD,
            yaw,
        }
    }
}

/// Hamilton product
impl Mul for Quaternion {
    type Output = Quaternion;

    fn mul(self, rhs: Self) -> Self::Output {
        let a = self;
        let b = rhs;
        Quaternion {
            w: a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
            x: a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            y: a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            z: a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
        }
    }
}

impl From<Vector4<f32>> for Quaternion {
    /// `[w, x, y, z]` layout
    fn from(v: Vector4<f32>) -> Self {
        let [w, x, y, z] = v.into();
        Self { w, x, y, z }
    }
}

impl From<Quaternion> for Vector4<f32> {
    fn from(q: Quaternion) -> Self {
        Vector4::new(q.w, q.x, q.y, q.z)
    }
}
