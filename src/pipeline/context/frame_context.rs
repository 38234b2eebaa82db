use crate::common::Frame;
use crate::pipeline::context::metrics::FrameMetrics;
use crate::pipeline::context::state::{
    AnalyzedState, AssembledState, ClassifiedState, IngestedState, ProcessingState,
    SegmentedState,
};
use crate::pipeline::domain::{BoardAnalysis, ClassifiedGrid, DetectionSummary, Move, TileGrid};
use crate::pipeline::services::image::{AssemblySummary, Segmentation};
use std::time::{Duration, Instant};

// FrameContext with compile-time state tracking: each stage consumes the
// previous state, so a grid cannot be ranked before it is classified.
pub struct FrameContext<S> {
    frame: Frame,
    metrics: FrameMetrics,
    processing_start: Instant,
    stage_start: Instant,
    state: S,
}

impl<S: ProcessingState> FrameContext<S> {
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }

    pub fn elapsed(&self) -> Duration {
        self.processing_start.elapsed()
    }

    pub fn state_name(&self) -> &'static str {
        S::state_name()
    }

    fn advance<T: ProcessingState>(
        self,
        stage: &'static str,
        next: impl FnOnce(S) -> T,
    ) -> FrameContext<T> {
        let FrameContext {
            frame,
            mut metrics,
            processing_start,
            stage_start,
            state,
        } = self;

        let now = Instant::now();
        metrics.record_stage(stage, now - stage_start);
        tracing::debug!(
            "Frame {} {} -> {} in {:?}",
            frame.frame_id(),
            S::state_name(),
            T::state_name(),
            now - stage_start
        );

        FrameContext {
            frame,
            metrics,
            processing_start,
            stage_start: now,
            state: next(state),
        }
    }
}

impl FrameContext<IngestedState> {
    pub fn new(frame: Frame) -> Self {
        let now = Instant::now();
        Self {
            frame,
            metrics: FrameMetrics::new(),
            processing_start: now,
            stage_start: now,
            state: IngestedState,
        }
    }

    pub fn into_segmented(self, segmentation: Segmentation) -> FrameContext<SegmentedState> {
        self.advance("segmentation", |_| SegmentedState { segmentation })
    }
}

impl FrameContext<SegmentedState> {
    pub fn segmentation(&self) -> &Segmentation {
        &self.state.segmentation
    }

    pub fn into_assembled(self, grid: TileGrid) -> FrameContext<AssembledState> {
        self.advance("assembly", |state| AssembledState {
            detection: DetectionSummary::of(&state.segmentation),
            diagnostics: state.segmentation.diagnostics,
            grid,
        })
    }
}

impl FrameContext<AssembledState> {
    pub fn grid(&self) -> &TileGrid {
        &self.state.grid
    }

    pub fn into_classified(self, grid: ClassifiedGrid) -> FrameContext<ClassifiedState> {
        self.advance("classification", |state| ClassifiedState {
            detection: state.detection,
            diagnostics: state.diagnostics,
            assembly: AssemblySummary::of(&state.grid),
            grid,
        })
    }
}

impl FrameContext<ClassifiedState> {
    pub fn grid(&self) -> &ClassifiedGrid {
        &self.state.grid
    }

    pub fn into_analyzed(self, moves: Vec<Move>) -> FrameContext<AnalyzedState> {
        self.advance("ranking", |state| AnalyzedState {
            analysis: BoardAnalysis::new(
                state.grid,
                moves,
                state.detection,
                state.assembly,
                state.diagnostics,
            ),
        })
    }
}

impl FrameContext<AnalyzedState> {
    pub fn analysis(&self) -> &BoardAnalysis {
        &self.state.analysis
    }

    pub fn into_parts(self) -> (Frame, BoardAnalysis, FrameMetrics) {
        (self.frame, self.state.analysis, self.metrics)
    }
}
