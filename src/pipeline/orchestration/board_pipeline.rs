use crate::config::Configuration;
use crate::error::PipelineError;
use crate::pipeline::context::{AnalyzedState, FrameContext, IngestedState};
use crate::pipeline::services::image::{BoardSegmenter, ColorClassifier, GridAssembler};
use crate::pipeline::services::moves::MoveEngine;

/// Synchronous frame analysis; run on the blocking pool by the analyzer service.
pub trait BoardAnalyzer: Send + Sync {
    fn analyze(
        &self,
        context: FrameContext<IngestedState>,
    ) -> Result<FrameContext<AnalyzedState>, PipelineError>;
    fn name(&self) -> &'static str;
}

/// Segment, assemble, classify, rank.
#[derive(Debug, Clone, Default)]
pub struct BoardPipeline {
    segmenter: BoardSegmenter,
    assembler: GridAssembler,
    classifier: ColorClassifier,
    engine: MoveEngine,
}

impl BoardPipeline {
    pub fn new(
        segmenter: BoardSegmenter,
        assembler: GridAssembler,
        classifier: ColorClassifier,
        engine: MoveEngine,
    ) -> Self {
        Self {
            segmenter,
            assembler,
            classifier,
            engine,
        }
    }

    pub fn from_config(configuration: &Configuration) -> Self {
        Self::new(
            BoardSegmenter::new(configuration.segmentation.clone()),
            GridAssembler::new(configuration.assembly.clone()),
            ColorClassifier::with_palette(configuration.palette.clone()),
            MoveEngine::new(),
        )
    }
}

impl BoardAnalyzer for BoardPipeline {
    fn analyze(
        &self,
        context: FrameContext<IngestedState>,
    ) -> Result<FrameContext<AnalyzedState>, PipelineError> {
        let segmentation = self.segmenter.segment(context.frame().image())?;
        let context = context.into_segmented(segmentation);

        let grid = self
            .assembler
            .assemble(&context.segmentation().candidates, context.frame().image());
        let context = context.into_assembled(grid);

        let classified = self.classifier.classify_grid(context.grid());
        let context = context.into_classified(classified);

        let moves = self.engine.enumerate_and_rank(context.grid());
        Ok(context.into_analyzed(moves))
    }

    fn name(&self) -> &'static str {
        "board_pipeline"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::common::Frame;
    use crate::pipeline::domain::{Category, DetectionStrategy, Position, BOARD_SIZE};
    use chrono::Utc;
    use image::{ImageBuffer, Rgb, RgbImage};

    const CELL: u32 = 50;
    const JEWEL_HALF: u32 = 13;

    pub(crate) fn painted_category(position: Position) -> Category {
        Category::ALL[(position.row + 2 * position.col) % Category::ALL.len()]
    }

    fn paint(category: Category) -> Rgb<u8> {
        match category {
            Category::Red => Rgb([200, 40, 40]),
            Category::Blue => Rgb([40, 110, 220]),
            Category::Green => Rgb([100, 200, 100]),
            Category::Yellow => Rgb([200, 200, 50]),
            Category::Purple => Rgb([190, 50, 190]),
        }
    }

    /// Dark 400x400 board with one square jewel centered in every cell.
    pub(crate) fn synthetic_board() -> RgbImage {
        let size = CELL * BOARD_SIZE as u32;
        ImageBuffer::from_fn(size, size, |x, y| {
            let position = Position::new((y / CELL) as usize, (x / CELL) as usize);
            let center = CELL / 2;
            let inside = (x % CELL).abs_diff(center) < JEWEL_HALF
                && (y % CELL).abs_diff(center) < JEWEL_HALF;
            if inside {
                paint(painted_category(position))
            } else {
                Rgb([20, 20, 20])
            }
        })
    }

    #[test]
    fn recovers_every_painted_category() {
        let pipeline = BoardPipeline::default();
        let context = FrameContext::new(Frame::new(synthetic_board(), Utc::now()));
        let analyzed = pipeline.analyze(context).unwrap();
        let analysis = analyzed.analysis();

        for position in Position::all() {
            assert_eq!(
                analysis.grid().category_at(position),
                Some(painted_category(position)),
                "wrong category at {}",
                position
            );
        }
        // every jewel was found as a blob, not assumed from the grid
        assert_eq!(analysis.detection().strategy, DetectionStrategy::Contours);
        assert_eq!(analysis.detection().accepted_contours, 64);
        assert_eq!(analysis.assembly().empty, 0);
        assert!(analysis.moves().iter().all(|m| m.score >= 9));
        assert_eq!(analyzed.metrics().stages().count(), 4);
    }

    #[test]
    fn too_small_frames_fail_the_cycle() {
        let pipeline = BoardPipeline::default();
        let context = FrameContext::new(Frame::new(
            ImageBuffer::from_pixel(4, 4, Rgb([0, 0, 0])),
            Utc::now(),
        ));
        assert!(matches!(
            pipeline.analyze(context),
            Err(PipelineError::FrameTooSmall { .. })
        ));
    }
}
