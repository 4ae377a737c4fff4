use crate::{
    error::Result,
    estimate::OrientationEstimate,
    quaternion::Quaternion,
    sample::SensorSample,
    strategy::{Strategy, StrategyKind},
};

/// Decodes quaternions fused by the sensor's onboard motion processor.
///
/// The processor integrates on its own, so there is nothing to carry between
/// samples except the last quaternion for inspection. Only call `update`
/// when the sensor reports a new quaternion in its FIFO.
#[derive(Debug, Default, Clone, Copy)]
pub struct DmpDecoder {
    last: Option<Quaternion>,
}

impl DmpDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for DmpDecoder {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DmpDecomposition
    }

    fn update(&mut self, sample: &SensorSample, _dt: f32) -> Result<OrientationEstimate> {
        let q = sample.quaternion()?.quaternion.normalize()?;
        self.last = Some(q);
        Ok(q.to_euler())
    }

    fn reset(&mut self) {
        self.last = None;
    }

    /// Last successfully decoded quaternion, normalized
    fn quaternion(&self) -> Option<Quaternion> {
        self.last
    }
}
