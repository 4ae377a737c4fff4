use log::debug;
use nalgebra::{Vector3, Vector4};
#[cfg(not(test))]
use num_traits::Float as _;

use crate::{
    config::{FusionConfig, FusionStep},
    error::{ConfigFault, Error, Result, SampleFault},
    estimate::OrientationEstimate,
    quaternion::{Quaternion, DEGENERATE_NORM},
    sample::SensorSample,
    strategy::{check_dt, Strategy, StrategyKind},
};

/// Madgwick gradient-descent orientation filter.
///
/// Gyro rates in rad/s. Accelerometer and magnetometer only contribute a
/// direction, so any consistent unit works for them.
#[derive(Debug, Clone, Copy)]
pub struct MadgwickFilter {
    q: Quaternion,
    initial: Quaternion,
    beta: f32, // Algorithm gain
}

impl MadgwickFilter {
    pub fn new(beta: f32) -> Self {
        Self::with_initial(beta, Quaternion::IDENTITY)
    }

    pub fn with_initial(beta: f32, initial: Quaternion) -> Self {
        Self {
            q: initial,
            initial,
            beta,
        }
    }

    pub fn beta(&self) -> f32 {
        self.beta
    }

    pub fn quaternion(&self) -> &Quaternion {
        &self.q
    }

    pub fn reset(&mut self) {
        self.q = self.initial;
    }

    /// One filter step with gravity and magnetic field references.
    ///
    /// A magnetometer reading with no usable direction falls back to
    /// [`Self::update_imu`].
    pub fn update(
        &mut self,
        accel: Vector3<f32>,
        gyro: Vector3<f32>,
        mag: Vector3<f32>,
        dt: f32,
    ) -> Result<Quaternion> {
        let Some(mag) = mag.try_normalize(DEGENERATE_NORM) else {
            return self.update_imu(accel, gyro, dt);
        };
        let accel = accel
            .try_normalize(DEGENERATE_NORM)
            .ok_or(Error::DegenerateInput)?;

        let Quaternion {
            w: q1,
            x: q2,
            y: q3,
            z: q4,
        } = self.q;
        let [mx, my, mz] = mag.into();

        // Field direction in the earth frame, h = q * m * q'
        let h = self.q * Quaternion::new(0.0, mx, my, mz) * self.q.conjugate();
        // Reference field only has north and down components
        let two_bx = 2.0 * (h.x * h.x + h.y * h.y).sqrt();
        let two_bz = 2.0 * h.z;
        let four_bx = 2.0 * two_bx;
        let four_bz = 2.0 * two_bz;

        // Field predicted in the sensor frame minus measurement
        let f4 = two_bx * (0.5 - q3 * q3 - q4 * q4) + two_bz * (q2 * q4 - q1 * q3) - mx;
        let f5 = two_bx * (q2 * q3 - q1 * q4) + two_bz * (q1 * q2 + q3 * q4) - my;
        let f6 = two_bx * (q1 * q3 + q2 * q4) + two_bz * (0.5 - q2 * q2 - q3 * q3) - mz;

        // Jacobian transpose of the field objective times its residual
        let field_step = Vector4::new(
            -two_bz * q3 * f4 + (-two_bx * q4 + two_bz * q2) * f5 + two_bx * q3 * f6,
            two_bz * q4 * f4
                + (two_bx * q3 + two_bz * q1) * f5
                + (two_bx * q4 - four_bz * q2) * f6,
            (-four_bx * q3 - two_bz * q1) * f4
                + (two_bx * q2 + two_bz * q4) * f5
                + (two_bx * q1 - four_bz * q3) * f6,
            (-four_bx * q4 + two_bz * q2) * f4
                + (-two_bx * q1 + two_bz * q3) * f5
                + two_bx * q2 * f6,
        );

        let step = self.gravity_step(accel) + field_step;
        self.integrate(gyro, step, dt)
    }

    /// One filter step against gravity only, heading is left to the gyro
    pub fn update_imu(
        &mut self,
        accel: Vector3<f32>,
        gyro: Vector3<f32>,
        dt: f32,
    ) -> Result<Quaternion> {
        let accel = accel
            .try_normalize(DEGENERATE_NORM)
            .ok_or(Error::DegenerateInput)?;

        let step = self.gravity_step(accel);
        self.integrate(gyro, step, dt)
    }

    /// Gradient of the gravity objective, accel already normalized
    fn gravity_step(&self, accel: Vector3<f32>) -> Vector4<f32> {
        let Quaternion {
            w: q1,
            x: q2,
            y: q3,
            z: q4,
        } = self.q;
        let [ax, ay, az] = accel.into();

        // Gravity predicted in the sensor frame minus measurement
        let f1 = 2.0 * (q2 * q4 - q1 * q3) - ax;
        let f2 = 2.0 * (q1 * q2 + q3 * q4) - ay;
        let f3 = 2.0 * (0.5 - q2 * q2 - q3 * q3) - az;

        Vector4::new(
            -2.0 * q3 * f1 + 2.0 * q2 * f2,
            2.0 * q4 * f1 + 2.0 * q1 * f2 - 4.0 * q2 * f3,
            -2.0 * q1 * f1 + 2.0 * q4 * f2 - 4.0 * q3 * f3,
            2.0 * q2 * f1 + 2.0 * q3 * f2,
        )
    }

    /// Blends the gyro rate of change with the normalized corrective step
    /// and integrates over `dt`
    fn integrate(&mut self, gyro: Vector3<f32>, step: Vector4<f32>, dt: f32) -> Result<Quaternion> {
        let [gx, gy, gz] = gyro.into();

        // Rate of change of quaternion from gyroscope
        let mut q_dot: Vector4<f32> = (self.q * Quaternion::new(0.0, gx, gy, gz)).into();
        q_dot *= 0.5;

        // Already at the minimum when the gradient vanishes
        let step_norm_squared = step.norm_squared();
        if step_norm_squared > 0.0 {
            q_dot -= step * (self.beta * micromath::F32Ext::invsqrt(step_norm_squared));
        }

        let q = Vector4::from(self.q) + q_dot * dt;
        let q = Quaternion::from(q).normalize()?;
        if !q.is_finite() {
            return Err(SampleFault::NonFinite.into());
        }

        self.q = q;
        Ok(q)
    }
}

/// Madgwick fusion over raw samples.
///
/// Converts gyro deg/s into rad/s once per sample before the filter step.
/// The step length comes from the nominal rate unless configured otherwise.
#[derive(Debug, Clone, Copy)]
pub struct GradientFusion {
    filter: MadgwickFilter,
    config: FusionConfig,
}

impl GradientFusion {
    pub fn new(config: FusionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            filter: MadgwickFilter::new(config.beta),
            config,
        })
    }

    /// Starts from a known attitude instead of level and north
    pub fn with_initial(config: FusionConfig, initial: Quaternion) -> Result<Self> {
        config.validate()?;
        let initial = initial
            .normalize()
            .map_err(|_| ConfigFault::InitialAttitude)?;
        Ok(Self {
            filter: MadgwickFilter::with_initial(config.beta, initial),
            config,
        })
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn filter(&self) -> &MadgwickFilter {
        &self.filter
    }
}

impl Strategy for GradientFusion {
    fn kind(&self) -> StrategyKind {
        StrategyKind::GradientFusion
    }

    fn update(&mut self, sample: &SensorSample, dt: f32) -> Result<OrientationEstimate> {
        let raw = sample.raw()?;
        check_dt(dt)?;

        let step = match self.config.step {
            FusionStep::Nominal => self.config.sample_period(),
            FusionStep::Measured => dt,
        };
        let gyro = raw.gyro_rad();

        let q = match raw.mag {
            Some(mag) if self.config.use_magnetometer => {
                self.filter.update(raw.accel, gyro, mag, step)?
            }
            _ => self.filter.update_imu(raw.accel, gyro, step)?,
        };

        Ok(q.to_euler())
    }

    fn reset(&mut self) {
        debug!("Fusion filter reset to initial attitude");
        self.filter.reset();
    }

    fn quaternion(&self) -> Option<Quaternion> {
        Some(*self.filter.quaternion())
    }
}
