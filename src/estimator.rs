use core::fmt::Debug;

use log::{debug, info, trace, warn};

use crate::{
    clock::TimeStepTracker,
    config::EstimatorConfig,
    error::{Error, Result, SampleFault},
    estimate::OrientationEstimate,
    quaternion::Quaternion,
    sample::{SampleLimits, SensorSample},
    strategy::{AnyStrategy, Strategy, StrategyKind},
};

/// Skipped-sample counts, saturating
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FaultCounters {
    pub degenerate: u32,
    pub invalid: u32,
    pub not_ready: u32,
    pub read_failed: u32,
}

impl FaultCounters {
    /// Samples skipped because of their content
    pub fn skipped(&self) -> u32 {
        self.degenerate.saturating_add(self.invalid)
    }

    fn count(&mut self, error: &Error) {
        let counter = match error {
            Error::DegenerateInput => &mut self.degenerate,
            Error::InvalidSample(_) => &mut self.invalid,
            Error::Misconfiguration(_) => return,
        };
        *counter = counter.saturating_add(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    Ready,
    InitFailed,
}

/// Sensor driver feeding the estimator.
///
/// Bus setup, DMP firmware upload and the retry policy around them live
/// in the driver. The estimator only asks whether it came up.
pub trait SampleSource {
    type Error: Debug;

    fn init(&mut self) -> SourceStatus;

    /// New data available, DMP FIFO packet or data-ready flag
    fn data_ready(&mut self) -> bool;

    fn read(&mut self) -> core::result::Result<SensorSample, Self::Error>;
}

/// Outcome of a single [`OrientationEstimator::poll`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Poll {
    Estimate(OrientationEstimate),
    /// Nothing new, state untouched
    NotReady,
    /// Sample read but rejected, previous estimate kept
    Skipped(Error),
    ReadFailed,
}

/// Single entry point turning sensor samples into attitude.
///
/// Holds one strategy for its whole life. Bad samples are skipped and
/// counted, the previous estimate stays current and the loop goes on.
#[derive(Debug, Clone, Copy)]
pub struct OrientationEstimator<S: Strategy = AnyStrategy> {
    strategy: S,
    clock: TimeStepTracker,
    limits: SampleLimits,
    last: Option<OrientationEstimate>,
    faults: FaultCounters,
}

impl OrientationEstimator<AnyStrategy> {
    pub fn from_config(config: EstimatorConfig) -> Result<Self> {
        let strategy = AnyStrategy::from_config(&config)?;
        if config.strategy == StrategyKind::GradientFusion {
            info!(
                "Estimator: {}, beta {}, {} Hz, magnetometer {}",
                config.strategy.name(),
                config.fusion.beta,
                config.fusion.sample_rate_hz,
                config.fusion.use_magnetometer
            );
        } else {
            info!("Estimator: {}", config.strategy.name());
        }
        Ok(Self::new(strategy).with_valid_limits(config.limits))
    }
}

impl<S: Strategy> OrientationEstimator<S> {
    pub fn new(strategy: S) -> Self {
        Self {
            strategy,
            clock: TimeStepTracker::new(),
            limits: SampleLimits::default(),
            last: None,
            faults: FaultCounters::default(),
        }
    }

    pub fn with_limits(self, limits: SampleLimits) -> Result<Self> {
        limits.validate()?;
        Ok(self.with_valid_limits(limits))
    }

    fn with_valid_limits(mut self, limits: SampleLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Brings the source up, `InitFailed` is logged and passed on to the caller
    pub fn init_source<Src: SampleSource>(&self, source: &mut Src) -> SourceStatus {
        let status = source.init();
        if status == SourceStatus::InitFailed {
            warn!("Sensor initialization failed");
        }
        status
    }

    /// Feeds one sample, surfacing why it was skipped.
    ///
    /// Nothing changes on error: neither the strategy, nor the clock, nor
    /// the last estimate.
    pub fn try_feed(&mut self, sample: &SensorSample) -> Result<OrientationEstimate> {
        match self.step(sample) {
            Ok(estimate) => {
                trace!(
                    "roll {:.2} pitch {:.2} yaw {:.2}",
                    estimate.roll,
                    estimate.pitch,
                    estimate.yaw
                );
                self.last = Some(estimate);
                Ok(estimate)
            }
            Err(err) => {
                self.faults.count(&err);
                warn!("Sample at {}us skipped: {}", sample.timestamp_us(), err);
                Err(err)
            }
        }
    }

    /// Feeds one sample and returns the current estimate, skipping bad input.
    ///
    /// Before any sample is accepted the current estimate is all zeros.
    pub fn feed(&mut self, sample: &SensorSample) -> OrientationEstimate {
        match self.try_feed(sample) {
            Ok(estimate) => estimate,
            Err(_) => self.last.unwrap_or_default(),
        }
    }

    /// Reads a sample if the source has one
    pub fn poll<Src: SampleSource>(&mut self, source: &mut Src) -> Poll {
        if !source.data_ready() {
            self.faults.not_ready = self.faults.not_ready.saturating_add(1);
            return Poll::NotReady;
        }

        let sample = match source.read() {
            Ok(sample) => sample,
            Err(err) => {
                self.faults.read_failed = self.faults.read_failed.saturating_add(1);
                debug!("Sensor read failed: {:?}", err);
                return Poll::ReadFailed;
            }
        };

        match self.try_feed(&sample) {
            Ok(estimate) => Poll::Estimate(estimate),
            Err(err) => Poll::Skipped(err),
        }
    }

    fn step(&mut self, sample: &SensorSample) -> Result<OrientationEstimate> {
        self.limits.check(sample)?;

        let mut clock = self.clock;
        let dt = clock.step(sample.timestamp_us())?;

        let estimate = self.strategy.update(sample, dt)?;
        if !estimate.is_finite() {
            return Err(SampleFault::NonFinite.into());
        }

        self.clock = clock;
        Ok(estimate)
    }

    pub fn last_estimate(&self) -> Option<OrientationEstimate> {
        self.last
    }

    pub fn faults(&self) -> &FaultCounters {
        &self.faults
    }

    pub fn kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Attitude quaternion, for fusion and DMP strategies
    pub fn quaternion(&self) -> Option<Quaternion> {
        self.strategy.quaternion()
    }

    /// Back to construction state. Fault counters are kept.
    pub fn reset(&mut self) {
        debug!("Estimator reset");
        self.strategy.reset();
        self.clock.reset();
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::FusionConfig,
        error::{ConfigFault, SampleFault},
        sample::{DmpSample, RawSample},
        strategy::GyroIntegration,
    };
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    fn spinning(gyro_z: f32, timestamp_us: u64) -> SensorSample {
        RawSample::new(Vector3::z(), Vector3::new(0.0, 0.0, gyro_z), timestamp_us).into()
    }

    #[test]
    fn first_sample_only_primes_the_clock() {
        let mut estimator = OrientationEstimator::new(GyroIntegration::new());
        let e = estimator.feed(&spinning(90.0, 5_000_000));
        assert_eq!(e.yaw, 0.0);
        assert_eq!(estimator.last_estimate(), Some(e));
    }

    #[test]
    fn dt_comes_from_timestamps() {
        let mut estimator = OrientationEstimator::new(GyroIntegration::new());
        estimator.feed(&spinning(90.0, 0));
        let e = estimator.feed(&spinning(90.0, 500_000));
        assert_abs_diff_eq!(e.yaw, 45.0, epsilon = 1e-3);
    }

    #[test]
    fn rejected_sample_does_not_move_the_clock() {
        let mut estimator = OrientationEstimator::new(GyroIntegration::new());
        estimator.feed(&spinning(10.0, 0));
        estimator.feed(&spinning(10.0, 1_000_000));

        assert_eq!(
            estimator.try_feed(&spinning(f32::NAN, 2_000_000)),
            Err(Error::InvalidSample(SampleFault::NonFinite))
        );
        // Integrates over both seconds since the last accepted sample
        let e = estimator.feed(&spinning(10.0, 3_000_000));
        assert_abs_diff_eq!(e.yaw, 30.0, epsilon = 1e-3);
    }

    #[test]
    fn feed_keeps_last_estimate_on_fault() {
        let mut estimator = OrientationEstimator::new(GyroIntegration::new());
        estimator.feed(&spinning(20.0, 0));
        let good = estimator.feed(&spinning(20.0, 1_000_000));

        assert_eq!(estimator.feed(&spinning(5000.0, 2_000_000)), good);
        assert_eq!(estimator.faults().invalid, 1);
        assert_eq!(estimator.faults().skipped(), 1);
    }

    #[test]
    fn feed_before_any_estimate_is_zero() {
        let mut estimator = OrientationEstimator::new(GyroIntegration::new());
        assert_eq!(
            estimator.feed(&spinning(f32::INFINITY, 0)),
            OrientationEstimate::default()
        );
        assert_eq!(estimator.last_estimate(), None);
    }

    #[test]
    fn degenerate_input_counted_separately() {
        let config = EstimatorConfig::new(StrategyKind::DmpDecomposition);
        let mut estimator = OrientationEstimator::from_config(config).unwrap();
        let zero = DmpSample {
            quaternion: Quaternion::new(0.0, 0.0, 0.0, 0.0),
            timestamp_us: 10,
        };

        assert_eq!(estimator.try_feed(&zero.into()), Err(Error::DegenerateInput));
        assert_eq!(
            *estimator.faults(),
            FaultCounters {
                degenerate: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn construction_validates_config() {
        let config = EstimatorConfig::new(StrategyKind::GradientFusion)
            .with_fusion(FusionConfig::default().with_beta(f32::NAN));
        assert_eq!(
            OrientationEstimator::from_config(config).map(|e| e.kind()),
            Err(Error::Misconfiguration(ConfigFault::Gain))
        );

        let limits = SampleLimits {
            max_accel: 0.0,
            max_gyro: 250.0,
        };
        assert_eq!(
            OrientationEstimator::new(GyroIntegration::new())
                .with_limits(limits)
                .map(|e| e.kind()),
            Err(Error::Misconfiguration(ConfigFault::Limits))
        );
    }

    #[test]
    fn tighter_limits_apply() {
        let limits = SampleLimits {
            max_accel: 2.0,
            max_gyro: 250.0,
        };
        let mut estimator = OrientationEstimator::new(GyroIntegration::new())
            .with_limits(limits)
            .unwrap();
        assert_eq!(
            estimator.try_feed(&spinning(300.0, 0)),
            Err(Error::InvalidSample(SampleFault::OutOfRange))
        );
    }

    #[test]
    fn reset_restarts_integration() {
        let mut estimator = OrientationEstimator::new(GyroIntegration::with_initial_yaw(10.0));
        estimator.feed(&spinning(30.0, 0));
        estimator.feed(&spinning(30.0, 1_000_000));
        estimator.reset();

        assert_eq!(estimator.last_estimate(), None);
        let e = estimator.feed(&spinning(30.0, 100));
        assert_eq!(e.yaw, 10.0);
    }

    #[test]
    fn fusion_exposes_quaternion() {
        let config = EstimatorConfig::new(StrategyKind::GradientFusion);
        let mut estimator = OrientationEstimator::from_config(config).unwrap();
        assert_eq!(estimator.quaternion(), Some(Quaternion::IDENTITY));

        for i in 0..10 {
            estimator.feed(&spinning(0.0, i * 10_000));
        }
        let q = estimator.quaternion().unwrap();
        assert_abs_diff_eq!(q.norm(), 1.0, epsilon = 1e-3);
    }
}
