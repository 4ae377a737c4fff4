pub mod complementary;
pub mod dmp;
pub mod gyro;
pub mod madgwick;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;

use crate::{
    config::EstimatorConfig,
    error::{ConfigFault, Result, SampleFault},
    estimate::OrientationEstimate,
    quaternion::Quaternion,
    sample::SensorSample,
};

pub use complementary::AccelTiltGyroYaw;
pub use dmp::DmpDecoder;
pub use gyro::{GyroIntegration, YawIntegrator};
pub use madgwick::{GradientFusion, MadgwickFilter};

/// Estimation strategy codes, as stored in configuration
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum StrategyKind {
    AccelGyroComplementary = 0,
    GyroIntegration = 1,
    DmpDecomposition = 2,
    GradientFusion = 3,
}

impl StrategyKind {
    pub fn from_code(code: u8) -> Result<Self> {
        Self::from_u8(code).ok_or(ConfigFault::UnknownStrategy(code).into())
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::AccelGyroComplementary => "accel-tilt/gyro-yaw",
            StrategyKind::GyroIntegration => "gyro-integration",
            StrategyKind::DmpDecomposition => "dmp-quaternion",
            StrategyKind::GradientFusion => "madgwick",
        }
    }
}

/// Orientation estimation strategy owning its own filter state.
///
/// `update` must run in bounded time without allocating. When it fails the
/// state must be left as it was before the call.
pub trait Strategy {
    fn kind(&self) -> StrategyKind;

    /// Feeds one sample, `dt` is seconds since the previous one
    fn update(&mut self, sample: &SensorSample, dt: f32) -> Result<OrientationEstimate>;

    /// Back to the state right after construction
    fn reset(&mut self);

    /// Current attitude quaternion, for strategies that keep one
    fn quaternion(&self) -> Option<Quaternion> {
        None
    }
}

/// Validates an integration step
pub(crate) fn check_dt(dt: f32) -> Result<()> {
    if !dt.is_finite() {
        return Err(SampleFault::NonFinite.into());
    }
    if dt < 0.0 {
        return Err(SampleFault::NonMonotonic.into());
    }
    Ok(())
}

/// Any of the built-in strategies, picked at runtime from configuration
#[derive(Debug, Clone, Copy)]
pub enum AnyStrategy {
    Complementary(AccelTiltGyroYaw),
    Gyro(GyroIntegration),
    Dmp(DmpDecoder),
    Fusion(GradientFusion),
}

impl AnyStrategy {
    pub fn from_config(config: &EstimatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(match config.strategy {
            StrategyKind::AccelGyroComplementary => Self::Complementary(AccelTiltGyroYaw::new()),
            StrategyKind::GyroIntegration => Self::Gyro(GyroIntegration::new()),
            StrategyKind::DmpDecomposition => Self::Dmp(DmpDecoder::new()),
            StrategyKind::GradientFusion => Self::Fusion(GradientFusion::new(config.fusion)?),
        })
    }

    fn inner(&self) -> &dyn Strategy {
        match self {
            Self::Complementary(s) => s,
            Self::Gyro(s) => s,
            Self::Dmp(s) => s,
            Self::Fusion(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Strategy {
        match self {
            Self::Complementary(s) => s,
            Self::Gyro(s) => s,
            Self::Dmp(s) => s,
            Self::Fusion(s) => s,
        }
    }
}

impl Strategy for AnyStrategy {
    fn kind(&self) -> StrategyKind {
        self.inner().kind()
    }

    fn update(&mut self, sample: &SensorSample, dt: f32) -> Result<OrientationEstimate> {
        self.inner_mut().update(sample, dt)
    }

    fn reset(&mut self) {
        self.inner_mut().reset()
    }

    fn quaternion(&self) -> Option<Quaternion> {
        self.inner().quaternion()
    }
}

impl From<AccelTiltGyroYaw> for AnyStrategy {
    fn from(s: AccelTiltGyroYaw) -> Self {
        Self::Complementary(s)
    }
}

impl From<GyroIntegration> for AnyStrategy {
    fn from(s: GyroIntegration) -> Self {
        Self::Gyro(s)
    }
}

impl From<DmpDecoder> for AnyStrategy {
    fn from(s: DmpDecoder) -> Self {
        Self::Dmp(s)
    }
}

impl From<GradientFusion> for AnyStrategy {
    fn from(s: GradientFusion) -> Self {
        Self::Fusion(s)
    }
}
