//! Attitude estimation from IMU samples.
//!
//! Feed accelerometer/gyro(/magnetometer) readings or quaternions fused by
//! the sensor's DMP into an [`OrientationEstimator`] and read back roll,
//! pitch and yaw in degrees. Bad samples are skipped and counted instead of
//! poisoning the estimate.
//!
//! ```
//! use imu_attitude::{EstimatorConfig, OrientationEstimator, RawSample, StrategyKind};
//! use nalgebra::Vector3;
//!
//! let config = EstimatorConfig::new(StrategyKind::GyroIntegration);
//! let mut estimator = OrientationEstimator::from_config(config).unwrap();
//!
//! estimator.feed(&RawSample::new(Vector3::z(), Vector3::new(0.0, 0.0, 90.0), 0).into());
//! let e = estimator.feed(&RawSample::new(Vector3::z(), Vector3::new(0.0, 0.0, 90.0), 1_000_000).into());
//! assert!((e.yaw - 90.0).abs() < 1e-3);
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unused_must_use)]

pub mod angle;
pub mod clock;
pub mod config;
pub mod error;
pub mod estimate;
pub mod estimator;
pub mod quaternion;
pub mod sample;
pub mod strategy;

pub use config::{EstimatorConfig, FusionConfig, FusionStep};
pub use error::{ConfigFault, Error, Result, SampleFault};
pub use estimate::{OrientationEstimate, YawReference};
pub use estimator::{FaultCounters, OrientationEstimator, Poll, SampleSource, SourceStatus};
pub use quaternion::Quaternion;
pub use sample::{DmpSample, RawSample, SampleLimits, SensorSample};
pub use strategy::{AnyStrategy, Strategy, StrategyKind};
