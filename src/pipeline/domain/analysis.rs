use super::board::{ClassifiedGrid, DetectionStrategy};
use super::moves::Move;
use crate::pipeline::services::image::{AssemblySummary, Segmentation, SegmentationDiagnostics};
use serde::Serialize;
use std::sync::Arc;

/// How the candidates of a frame were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DetectionSummary {
    pub strategy: DetectionStrategy,
    pub raw_contours: usize,
    pub accepted_contours: usize,
    pub candidates: usize,
}

impl DetectionSummary {
    pub fn of(segmentation: &Segmentation) -> Self {
        Self {
            strategy: segmentation.strategy,
            raw_contours: segmentation.raw_contours,
            accepted_contours: segmentation.accepted_contours,
            candidates: segmentation.candidates.len(),
        }
    }
}

/// Outcome of one analysis cycle: the classified grid and its ranked moves.
#[derive(Debug, Clone)]
pub struct BoardAnalysis {
    grid: ClassifiedGrid,
    moves: Vec<Move>,
    detection: DetectionSummary,
    assembly: AssemblySummary,
    diagnostics: Arc<SegmentationDiagnostics>,
}

impl BoardAnalysis {
    pub fn new(
        grid: ClassifiedGrid,
        moves: Vec<Move>,
        detection: DetectionSummary,
        assembly: AssemblySummary,
        diagnostics: Arc<SegmentationDiagnostics>,
    ) -> Self {
        Self {
            grid,
            moves,
            detection,
            assembly,
            diagnostics,
        }
    }

    pub fn grid(&self) -> &ClassifiedGrid {
        &self.grid
    }

    /// Ranked, best first.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn best_move(&self) -> Option<&Move> {
        self.moves.first()
    }

    pub fn detection(&self) -> DetectionSummary {
        self.detection
    }

    pub fn assembly(&self) -> AssemblySummary {
        self.assembly
    }

    pub fn diagnostics(&self) -> &SegmentationDiagnostics {
        &self.diagnostics
    }
}
