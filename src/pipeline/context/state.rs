use crate::pipeline::domain::{BoardAnalysis, ClassifiedGrid, DetectionSummary, TileGrid};
use crate::pipeline::services::image::{AssemblySummary, Segmentation, SegmentationDiagnostics};
use std::sync::Arc;

// Markers to track how far a frame has moved through the pipeline
pub struct IngestedState;

pub struct SegmentedState {
    pub(super) segmentation: Segmentation,
}

pub struct AssembledState {
    pub(super) detection: DetectionSummary,
    pub(super) diagnostics: Arc<SegmentationDiagnostics>,
    pub(super) grid: TileGrid,
}

pub struct ClassifiedState {
    pub(super) detection: DetectionSummary,
    pub(super) diagnostics: Arc<SegmentationDiagnostics>,
    pub(super) assembly: AssemblySummary,
    pub(super) grid: ClassifiedGrid,
}

pub struct AnalyzedState {
    pub(super) analysis: BoardAnalysis,
}

pub trait ProcessingState: 'static {
    fn state_name() -> &'static str;
}

impl ProcessingState for IngestedState {
    fn state_name() -> &'static str {
        "Ingested"
    }
}

impl ProcessingState for SegmentedState {
    fn state_name() -> &'static str {
        "Segmented"
    }
}

impl ProcessingState for AssembledState {
    fn state_name() -> &'static str {
        "Assembled"
    }
}

impl ProcessingState for ClassifiedState {
    fn state_name() -> &'static str {
        "Classified"
    }
}

impl ProcessingState for AnalyzedState {
    fn state_name() -> &'static str {
        "Analyzed"
    }
}
