use crate::common::Frame;
use crate::pipeline::context::FrameMetrics;
use crate::pipeline::domain::{
    BoardAnalysis, Category, Cell, DetectionSummary, Move, PixelPoint, Position, Provenance,
};
use crate::pipeline::services::image::AssemblySummary;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct TileReport {
    pub position: Position,
    pub center: PixelPoint,
    pub color: [u8; 3],
    pub category: Category,
    pub provenance: Provenance,
}

/// Machine-readable dump written next to the overlay image.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub frame_id: String,
    pub captured_at: String,
    pub detection: DetectionSummary,
    pub assembly: AssemblySummary,
    pub grid: Vec<String>,
    pub tiles: Vec<TileReport>,
    pub moves: Vec<Move>,
    pub stage_timings_ms: IndexMap<String, f64>,
}

impl AnalysisReport {
    pub fn new(frame: &Frame, analysis: &BoardAnalysis, metrics: &FrameMetrics) -> Self {
        let tiles = analysis
            .grid()
            .iter()
            .filter_map(|(_, cell)| match cell {
                Cell::Occupied(classified) => Some(TileReport {
                    position: classified.tile.position,
                    center: classified.tile.center,
                    color: classified.tile.color.0,
                    category: classified.category,
                    provenance: classified.tile.provenance,
                }),
                Cell::Empty => None,
            })
            .collect();

        Self {
            frame_id: frame.frame_id().to_string(),
            captured_at: frame.captured_at().to_rfc3339(),
            detection: analysis.detection(),
            assembly: analysis.assembly(),
            grid: analysis.grid().render_rows(),
            tiles,
            moves: analysis.moves().to_vec(),
            stage_timings_ms: metrics
                .stages()
                .map(|(stage, duration)| (stage.to_string(), duration.as_secs_f64() * 1000.0))
                .collect(),
        }
    }
}
