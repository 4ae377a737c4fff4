use crate::{
    angle::wrap_degrees,
    error::{Result, SampleFault},
    estimate::OrientationEstimate,
    sample::SensorSample,
    strategy::{check_dt, Strategy, StrategyKind},
};

/// Heading accumulator fed with gyro Z rate.
///
/// No drift correction, zero is wherever the device was pointing at start.
#[derive(Debug, Clone, Copy)]
pub struct YawIntegrator {
    yaw: f32,
    initial: f32,
}

impl Default for YawIntegrator {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl YawIntegrator {
    pub fn new(initial: f32) -> Self {
        let initial = wrap_degrees(initial);
        Self {
            yaw: initial,
            initial,
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Integrates `rate` (deg/s) over `dt` seconds, leaves the heading
    /// untouched if the result would not be finite
    pub fn advance(&mut self, rate: f32, dt: f32) -> Result<f32> {
        check_dt(dt)?;
        let yaw = wrap_degrees(self.yaw + rate * dt);
        if !yaw.is_finite() {
            return Err(SampleFault::NonFinite.into());
        }
        self.yaw = yaw;
        Ok(yaw)
    }

    pub fn reset(&mut self) {
        self.yaw = self.initial;
    }
}

/// Gyro-only heading, roll and pitch stay at zero.
///
/// Useful to look at yaw drift on its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct GyroIntegration {
    yaw: YawIntegrator,
}

impl GyroIntegration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_yaw(yaw: f32) -> Self {
        Self {
            yaw: YawIntegrator::new(yaw),
        }
    }
}

impl Strategy for GyroIntegration {
    fn kind(&self) -> StrategyKind {
        StrategyKind::GyroIntegration
    }

    fn update(&mut self, sample: &SensorSample, dt: f32) -> Result<OrientationEstimate> {
        let raw = sample.raw()?;
        let yaw = self.yaw.advance(raw.gyro.z, dt)?;
        Ok(OrientationEstimate::new(0.0, 0.0, yaw))
    }

    fn reset(&mut self) {
        self.yaw.reset();
    }
}
