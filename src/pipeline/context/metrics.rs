use indexmap::IndexMap;
use std::time::Duration;

/// Per-stage timings of one frame, in the order the stages ran.
#[derive(Debug, Clone, Default)]
pub struct FrameMetrics {
    stages: IndexMap<&'static str, Duration>,
}

impl FrameMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_stage(&mut self, stage: &'static str, duration: Duration) {
        self.stages.insert(stage, duration);
    }

    pub fn stages(&self) -> impl Iterator<Item = (&'static str, Duration)> + '_ {
        self.stages.iter().map(|(name, duration)| (*name, *duration))
    }

    pub fn total(&self) -> Duration {
        self.stages.values().sum()
    }
}
