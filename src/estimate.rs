use crate::angle::wrap_signed_degrees;

/// Attitude in degrees.
///
/// Yaw in [0, 360), roll in [-180, 180], pitch in [-90, 90].
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct OrientationEstimate {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl OrientationEstimate {
    pub const fn new(roll: f32, pitch: f32, yaw: f32) -> Self {
        Self { roll, pitch, yaw }
    }

    pub fn is_finite(&self) -> bool {
        self.roll.is_finite() && self.pitch.is_finite() && self.yaw.is_finite()
    }
}

/// Heading relative to the first estimate seen, in [-180, 180).
///
/// Power-on heading of gyro-only strategies is arbitrary, so displays
/// usually show rotation since start instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct YawReference {
    reference: Option<f32>,
}

impl YawReference {
    pub const fn new() -> Self {
        Self { reference: None }
    }

    /// Starts from a known heading instead of the first estimate
    pub const fn with_reference(yaw: f32) -> Self {
        Self {
            reference: Some(yaw),
        }
    }

    pub fn reference(&self) -> Option<f32> {
        self.reference
    }

    /// First call latches the reference and reports 0
    pub fn relative(&mut self, estimate: &OrientationEstimate) -> f32 {
        let reference = *self.reference.get_or_insert(estimate.yaw);
        wrap_signed_degrees(estimate.yaw - reference)
    }

    pub fn clear(&mut self) {
        self.reference = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_estimate_becomes_reference() {
        let mut reference = YawReference::new();
        assert_eq!(reference.relative(&OrientationEstimate::new(0.0, 0.0, 350.0)), 0.0);
        assert_eq!(reference.reference(), Some(350.0));

        assert_eq!(reference.relative(&OrientationEstimate::new(0.0, 0.0, 10.0)), 20.0);
        assert_eq!(reference.relative(&OrientationEstimate::new(0.0, 0.0, 300.0)), -50.0);
    }

    #[test]
    fn cleared_reference_latches_again() {
        let mut reference = YawReference::with_reference(90.0);
        assert_eq!(reference.relative(&OrientationEstimate::new(0.0, 0.0, 80.0)), -10.0);

        reference.clear();
        assert_eq!(reference.relative(&OrientationEstimate::new(0.0, 0.0, 80.0)), 0.0);
    }
}
