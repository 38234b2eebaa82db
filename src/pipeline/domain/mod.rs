pub mod analysis;
pub mod board;
pub mod category;
pub mod moves;

pub use analysis::{BoardAnalysis, DetectionSummary};
pub use board::{
    BoardGeometry, Candidate, Cell, ClassifiedGrid, ClassifiedTile, DetectionStrategy, Grid,
    PixelPoint, Position, Provenance, ShapeEvidence, Tile, TileGrid, BOARD_SIZE, CELL_COUNT,
};
pub use category::Category;
pub use moves::{Direction, Move};
