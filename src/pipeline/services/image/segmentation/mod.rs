pub mod contours;
pub mod enhance;
pub mod mask;
pub mod strategies;

use self::contours::{find_external_contours, Contour};
use self::strategies::{build_masks, MaskSet};
use super::config::SegmentationConfig;
use super::sampling::sample_color;
use crate::error::PipelineError;
use crate::pipeline::domain::{
    BoardGeometry, Candidate, DetectionStrategy, Position, ShapeEvidence, BOARD_SIZE,
};
use image::RgbImage;
use std::sync::Arc;

/// Candidates for one frame plus how they were found.
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub candidates: Vec<Candidate>,
    pub strategy: DetectionStrategy,
    pub raw_contours: usize,
    pub accepted_contours: usize,
    pub diagnostics: Arc<SegmentationDiagnostics>,
}

/// Intermediate products worth looking at when detection goes wrong: every
/// mask and the contours the candidates were taken from.
#[derive(Debug)]
pub struct SegmentationDiagnostics {
    pub masks: MaskSet,
    pub contours: Vec<Contour>,
}

/// Turns a raw board image into positioned, colored candidates.
///
/// Three masks (adaptive threshold, HSV color ranges, hysteresis edges) are
/// merged and split into blobs. When too few blobs have a plausible tile area
/// the segmenter assumes a regular grid instead.
#[derive(Debug, Clone, Default)]
pub struct BoardSegmenter {
    config: SegmentationConfig,
}

impl BoardSegmenter {
    pub fn new(config: SegmentationConfig) -> Self {
        Self { config }
    }

    pub fn segment(&self, image: &RgbImage) -> Result<Segmentation, PipelineError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(PipelineError::EmptyFrame);
        }
        if (width as usize) < BOARD_SIZE || (height as usize) < BOARD_SIZE {
            return Err(PipelineError::FrameTooSmall { width, height });
        }

        let geometry = BoardGeometry::new(width, height);
        let enhanced = enhance::enhance(image, &self.config);
        let masks = build_masks(&enhanced, &self.config)?;

        let contours = find_external_contours(&masks.combined);
        let raw_contours = contours.len();
        let accepted = self.filter_by_area(contours, &geometry);
        let accepted_contours = accepted.len();

        let (contours, strategy) = self.resolve_contours(accepted, &geometry);
        let candidates = self.extract_candidates(image, &geometry, &contours, strategy);

        tracing::info!(
            "Segmented {} candidates via {:?} ({} raw contours, {} accepted)",
            candidates.len(),
            strategy,
            raw_contours,
            accepted_contours
        );

        Ok(Segmentation {
            candidates,
            strategy,
            raw_contours,
            accepted_contours,
            diagnostics: Arc::new(SegmentationDiagnostics { masks, contours }),
        })
    }

    /// Area window `[min_ratio, max_ratio] × expected`, bounds inclusive.
    fn filter_by_area(&self, contours: Vec<Contour>, geometry: &BoardGeometry) -> Vec<Contour> {
        let expected = geometry.cell_area() * self.config.fill_factor;
        let min_area = (expected * self.config.min_area_ratio) as f64;
        let max_area = (expected * self.config.max_area_ratio) as f64;

        contours
            .into_iter()
            .filter(|c| c.area() >= min_area && c.area() <= max_area)
            .collect()
    }

    /// Keeps the accepted contours, or swaps in one synthetic circle per cell
    /// when there are fewer than `min_contours` of them.
    pub fn resolve_contours(
        &self,
        accepted: Vec<Contour>,
        geometry: &BoardGeometry,
    ) -> (Vec<Contour>, DetectionStrategy) {
        if accepted.len() >= self.config.min_contours {
            return (accepted, DetectionStrategy::Contours);
        }

        tracing::warn!(
            "Only {} plausible contours (need {}), falling back to a synthetic grid",
            accepted.len(),
            self.config.min_contours
        );
        (self.synthetic_contours(geometry), DetectionStrategy::SyntheticGrid)
    }

    pub fn synthetic_contours(&self, geometry: &BoardGeometry) -> Vec<Contour> {
        let radius = (self.config.synthetic_radius_ratio
            * geometry.cell_width().min(geometry.cell_height())) as i32;
        Position::all()
            .map(|position| Contour::circle(geometry.cell_center(position), radius))
            .collect()
    }

    /// Colors are sampled from the original image, not the enhanced one.
    pub fn extract_candidates(
        &self,
        image: &RgbImage,
        geometry: &BoardGeometry,
        contours: &[Contour],
        strategy: DetectionStrategy,
    ) -> Vec<Candidate> {
        contours
            .iter()
            .filter_map(|contour| {
                let center = contour.centroid();
                let color = sample_color(
                    image,
                    center,
                    self.config.sample_radius,
                    self.config.darkness_floor,
                )?;
                Some(Candidate {
                    position: geometry.position_of(center),
                    center,
                    color,
                    evidence: ShapeEvidence {
                        area: contour.area(),
                        strategy,
                    },
                })
            })
            .collect()
    }
}
