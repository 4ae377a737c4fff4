use nalgebra::Vector3;
#[cfg(not(test))]
use num_traits::Float as _;

use crate::{
    angle::PI_180,
    error::{ConfigFault, Error, Result, SampleFault},
    quaternion::Quaternion,
};

/// One accelerometer/gyroscope/magnetometer read in sensor-native units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    /// Acceleration in g
    pub accel: Vector3<f32>,
    /// Angular rate in deg/s
    pub gyro: Vector3<f32>,
    /// Magnetic field in device units, if the sensor has a magnetometer
    pub mag: Option<Vector3<f32>>,
    /// Monotonic timestamp, microseconds
    pub timestamp_us: u64,
}

impl RawSample {
    pub fn new(accel: Vector3<f32>, gyro: Vector3<f32>, timestamp_us: u64) -> Self {
        Self {
            accel,
            gyro,
            mag: None,
            timestamp_us,
        }
    }

    pub fn with_mag(mut self, mag: Vector3<f32>) -> Self {
        self.mag = Some(mag);
        self
    }

    /// Gyro readings in rad/s
    pub fn gyro_rad(&self) -> Vector3<f32> {
        self.gyro * PI_180
    }
}

/// Quaternion already fused by the sensor's onboard motion processor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DmpSample {
    pub quaternion: Quaternion,
    pub timestamp_us: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorSample {
    Raw(RawSample),
    Quaternion(DmpSample),
}

impl SensorSample {
    pub fn timestamp_us(&self) -> u64 {
        match self {
            SensorSample::Raw(raw) => raw.timestamp_us,
            SensorSample::Quaternion(dmp) => dmp.timestamp_us,
        }
    }

    pub fn raw(&self) -> Result<&RawSample> {
        match self {
            SensorSample::Raw(raw) => Ok(raw),
            SensorSample::Quaternion(_) => Err(SampleFault::WrongKind.into()),
        }
    }

    pub fn quaternion(&self) -> Result<&DmpSample> {
        match self {
            SensorSample::Quaternion(dmp) => Ok(dmp),
            SensorSample::Raw(_) => Err(SampleFault::WrongKind.into()),
        }
    }
}

impl From<RawSample> for SensorSample {
    fn from(raw: RawSample) -> Self {
        SensorSample::Raw(raw)
    }
}

impl From<DmpSample> for SensorSample {
    fn from(dmp: DmpSample) -> Self {
        SensorSample::Quaternion(dmp)
    }
}

/// Largest magnitude per axis a sample may report before it is treated as garbage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleLimits {
    /// g
    pub max_accel: f32,
    /// deg/s
    pub max_gyro: f32,
}

impl Default for SampleLimits {
    /// Widest full-scale ranges of the ICM-20948 (±16g, ±2000dps)
    fn default() -> Self {
        Self {
            max_accel: 16.0,
            max_gyro: 2000.0,
        }
    }
}

impl SampleLimits {
    pub fn validate(&self) -> Result<()> {
        let ok = |limit: f32| limit.is_finite() && limit > 0.0;
        if ok(self.max_accel) && ok(self.max_gyro) {
            Ok(())
        } else {
            Err(ConfigFault::Limits.into())
        }
    }

    /// Rejects NaN/Inf anywhere and accel/gyro axes past the limits.
    /// Magnetometer units are device specific, so only finiteness is checked there.
    pub fn check(&self, sample: &SensorSample) -> Result<()> {
        match sample {
            SensorSample::Raw(raw) => {
                let finite = |v: &Vector3<f32>| v.iter().all(|c| c.is_finite());
                if !finite(&raw.accel) || !finite(&raw.gyro) || !raw.mag.as_ref().map_or(true, finite)
                {
                    return Err(SampleFault::NonFinite.into());
                }

                let within = |v: &Vector3<f32>, limit: f32| v.iter().all(|c| c.abs() <= limit);
                if !within(&raw.accel, self.max_accel) || !within(&raw.gyro, self.max_gyro) {
                    return Err(SampleFault::OutOfRange.into());
                }
                Ok(())
            }
            SensorSample::Quaternion(dmp) => {
                if !dmp.quaternion.is_finite() {
                    return Err(Error::InvalidSample(SampleFault::NonFinite));
                }
                Ok(())
            }
        }
    }
}
