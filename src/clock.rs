use crate::error::{Result, SampleFault};

const SECONDS_PER_MICRO: f32 = 1e-6;

/// Integration clock turning monotonic microsecond timestamps into `dt`.
///
/// The first timestamp only primes the clock, so the first step is zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeStepTracker {
    last_us: Option<u64>,
}

impl TimeStepTracker {
    pub const fn new() -> Self {
        Self { last_us: None }
    }

    /// Seconds since the previous timestamp, advancing the clock to `now_us`.
    ///
    /// A timestamp that does not move forward is rejected and leaves the
    /// clock where it was.
    pub fn step(&mut self, now_us: u64) -> Result<f32> {
        let last_us = match self.last_us {
            Some(last_us) if now_us <= last_us => return Err(SampleFault::NonMonotonic.into()),
            Some(last_us) => last_us,
            None => now_us,
        };

        self.last_us = Some(now_us);
        Ok((now_us - last_us) as f32 * SECONDS_PER_MICRO)
    }

    /// Timestamp of the last accepted step
    pub fn last(&self) -> Option<u64> {
        self.last_us
    }

    pub fn reset(&mut self) {
        self.last_us = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use approx::assert_abs_diff_eq;

    #[test]
    fn first_step_is_zero() {
        let mut clock = TimeStepTracker::new();
        assert_eq!(clock.step(123_456_789), Ok(0.0));
        assert_eq!(clock.last(), Some(123_456_789));
    }

    #[test]
    fn steps_are_in_seconds() {
        let mut clock = TimeStepTracker::new();
        clock.step(1_000).unwrap();
        assert_abs_diff_eq!(clock.step(11_000).unwrap(), 0.01, epsilon = 1e-7);
        assert_abs_diff_eq!(clock.step(16_000).unwrap(), 0.005, epsilon = 1e-7);
    }

    #[test]
    fn stale_timestamp_is_rejected_without_moving_clock() {
        let mut clock = TimeStepTracker::new();
        clock.step(5_000).unwrap();
        assert_eq!(
            clock.step(5_000),
            Err(Error::InvalidSample(SampleFault::NonMonotonic))
        );
        assert_eq!(
            clock.step(4_000),
            Err(Error::InvalidSample(SampleFault::NonMonotonic))
        );
        assert_eq!(clock.last(), Some(5_000));
        assert_abs_diff_eq!(clock.step(7_000).unwrap(), 0.002, epsilon = 1e-7);
    }

    #[test]
    fn reset_primes_again() {
        let mut clock = TimeStepTracker::new();
        clock.step(5_000).unwrap();
        clock.reset();
        assert_eq!(clock.step(1_000), Ok(0.0));
    }
}
