//! Construction-time settings. Nothing here is re-read per sample.

#[cfg(not(test))]
use num_traits::Float as _;

use crate::{
    angle::PI_180,
    error::{ConfigFault, Result},
    sample::SampleLimits,
    strategy::StrategyKind,
};

/// Where the fusion filter takes its integration step from
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FusionStep {
    /// `1 / sample_rate_hz`, fixed at construction
    #[default]
    Nominal,
    /// Measured time between samples
    Measured,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionConfig {
    /// Gradient step gain, rad/s
    pub beta: f32,
    /// Nominal update rate the gain was tuned for
    pub sample_rate_hz: f32,
    /// Use magnetometer readings when a sample carries them
    pub use_magnetometer: bool,
    pub step: FusionStep,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            beta: 0.1,
            sample_rate_hz: 100.0,
            use_magnetometer: false,
            step: FusionStep::Nominal,
        }
    }
}

impl FusionConfig {
    /// Gain for a given gyroscope measurement error in deg/s: `sqrt(3/4) * error`
    pub fn from_gyro_error(error_dps: f32) -> Self {
        Self::default().with_beta((3.0_f32 / 4.0).sqrt() * error_dps * PI_180)
    }

    pub fn with_beta(mut self, beta: f32) -> Self {
        self.beta = beta;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate_hz: f32) -> Self {
        self.sample_rate_hz = sample_rate_hz;
        self
    }

    pub fn with_magnetometer(mut self, use_magnetometer: bool) -> Self {
        self.use_magnetometer = use_magnetometer;
        self
    }

    pub fn with_step(mut self, step: FusionStep) -> Self {
        self.step = step;
        self
    }

    /// Seconds per nominal update
    pub fn sample_period(&self) -> f32 {
        1.0 / self.sample_rate_hz
    }

    pub fn validate(&self) -> Result<()> {
        if !self.sample_rate_hz.is_finite() || self.sample_rate_hz <= 0.0 {
            return Err(ConfigFault::SampleRate.into());
        }
        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(ConfigFault::Gain.into());
        }
        Ok(())
    }
}

/// Everything needed to build an estimator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorConfig {
    pub strategy: StrategyKind,
    /// Only used by [`StrategyKind::GradientFusion`]
    pub fusion: FusionConfig,
    pub limits: SampleLimits,
}

impl EstimatorConfig {
    pub fn new(strategy: StrategyKind) -> Self {
        Self {
            strategy,
            fusion: FusionConfig::default(),
            limits: SampleLimits::default(),
        }
    }

    /// Strategy from a stored configuration byte
    pub fn from_code(code: u8) -> Result<Self> {
        Ok(Self::new(StrategyKind::from_code(code)?))
    }

    pub fn with_fusion(mut self, fusion: FusionConfig) -> Self {
        self.fusion = fusion;
        self
    }

    pub fn with_limits(mut self, limits: SampleLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.limits.validate()?;
        if self.strategy == StrategyKind::GradientFusion {
            self.fusion.validate()?;
        }
        Ok(())
    }
}
