#[cfg(not(test))]
use num_traits::Float as _;

use crate::{
    angle::DEG_PER_RAD,
    error::{Error, Result, SampleFault},
    estimate::OrientationEstimate,
    quaternion::DEGENERATE_NORM,
    sample::SensorSample,
    strategy::{gyro::YawIntegrator, Strategy, StrategyKind},
};

/// Roll and pitch from the gravity direction, yaw from integrated gyro Z.
///
/// Tilt is only right while the body is not accelerating; nothing tries to
/// compensate for linear acceleration.
#[derive(Debug, Default, Clone, Copy)]
pub struct AccelTiltGyroYaw {
    yaw: YawIntegrator,
}

impl AccelTiltGyroYaw {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_yaw(yaw: f32) -> Self {
        Self {
            yaw: YawIntegrator::new(yaw),
        }
    }
}

/// Roll and pitch in degrees from an accelerometer reading
pub fn tilt(ax: f32, ay: f32, az: f32) -> (f32, f32) {
    let roll = ay.atan2(az);
    let pitch = (-ax).atan2((ay * ay + az * az).sqrt());
    (roll * DEG_PER_RAD, pitch * DEG_PER_RAD)
}

impl Strategy for AccelTiltGyroYaw {
    fn kind(&self) -> StrategyKind {
        StrategyKind::AccelGyroComplementary
    }

    fn update(&mut self, sample: &SensorSample, dt: f32) -> Result<OrientationEstimate> {
        let raw = sample.raw()?;

        if raw.accel.iter().any(|c| !c.is_finite()) {
            return Err(SampleFault::NonFinite.into());
        }
        // No gravity direction in free fall
        if raw.accel.norm() < DEGENERATE_NORM {
            return Err(Error::DegenerateInput);
        }
        let [ax, ay, az] = raw.accel.into();
        let (roll, pitch) = tilt(ax, ay, az);

        let yaw = self.yaw.advance(raw.gyro.z, dt)?;

        Ok(OrientationEstimate { roll, pitch, yaw })
    }

    fn reset(&mut self) {
        self.yaw.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::RawSample;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    fn sample(accel: [f32; 3], gyro_z: f32) -> SensorSample {
        RawSample::new(accel.into(), Vector3::new(0.0, 0.0, gyro_z), 0).into()
    }

    #[test]
    fn level_reads_zero_tilt() {
        let mut strategy = AccelTiltGyroYaw::new();
        let e = strategy.update(&sample([0.0, 0.0, 1.0], 0.0), 0.0).unwrap();
        assert_eq!((e.roll, e.pitch, e.yaw), (0.0, 0.0, 0.0));
    }

    #[test]
    fn rolled_right() {
        let (s, c) = 30.0_f32.to_radians().sin_cos();
        let (roll, pitch) = tilt(0.0, s, c);
        assert_abs_diff_eq!(roll, 30.0, epsilon = 1e-3);
        assert_abs_diff_eq!(pitch, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn nose_up() {
        let (s, c) = 20.0_f32.to_radians().sin_cos();
        let (roll, pitch) = tilt(-s, 0.0, c);
        assert_abs_diff_eq!(roll, 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(pitch, 20.0, epsilon = 1e-3);
    }

    #[test]
    fn upside_down() {
        let (roll, pitch) = tilt(0.0, 0.0, -1.0);
        assert_abs_diff_eq!(roll.abs(), 180.0, epsilon = 1e-3);
        assert_abs_diff_eq!(pitch, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn yaw_integrates_while_tilt_follows_gravity() {
        let mut strategy = AccelTiltGyroYaw::new();
        let mut e = OrientationEstimate::default();
        for _ in 0..100 {
            e = strategy.update(&sample([0.0, 0.0, 1.0], 45.0), 0.02).unwrap();
        }
        assert_abs_diff_eq!(e.yaw, 90.0, epsilon = 1e-2);
        assert_abs_diff_eq!(e.roll, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn failed_update_keeps_heading() {
        let mut strategy = AccelTiltGyroYaw::with_initial_yaw(15.0);
        assert_eq!(
            strategy.update(&sample([0.0, 0.0, 1.0], 10.0), -1.0),
            Err(Error::InvalidSample(SampleFault::NonMonotonic))
        );
        let e = strategy.update(&sample([0.0, 0.0, 1.0], 10.0), 0.0).unwrap();
        assert_eq!(e.yaw, 15.0);
    }

    #[test]
    fn free_fall_is_skipped() {
        let mut strategy = AccelTiltGyroYaw::with_initial_yaw(15.0);
        let (s, c) = 30.0_f32.to_radians().sin_cos();
        strategy.update(&sample([0.0, s, c], 0.0), 0.0).unwrap();

        assert_eq!(
            strategy.update(&sample([0.0, 0.0, 0.0], 40.0), 0.1),
            Err(Error::DegenerateInput)
        );
        // Heading did not pick up the rejected sample's rotation
        let e = strategy.update(&sample([0.0, s, c], 0.0), 0.1).unwrap();
        assert_abs_diff_eq!(e.roll, 30.0, epsilon = 1e-3);
        assert_eq!(e.yaw, 15.0);
    }
}
