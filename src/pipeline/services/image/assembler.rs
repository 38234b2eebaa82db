use super::config::AssemblyConfig;
use super::sampling::{above_darkness_floor, median_color, window_pixels};
use crate::pipeline::domain::{
    BoardGeometry, Candidate, Cell, PixelPoint, Position, Provenance, Tile, TileGrid, BOARD_SIZE,
};
use image::RgbImage;
use serde::Serialize;

/// Probe points around a cell center used when nothing was detected there.
const GAP_FILL_OFFSETS: [(i32, i32); 9] = [
    (0, 0),
    (-10, 0),
    (10, 0),
    (0, -10),
    (0, 10),
    (-7, -7),
    (7, -7),
    (-7, 7),
    (7, 7),
];

/// How each occupied cell of an assembled grid was obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssemblySummary {
    pub detected: usize,
    pub gap_filled: usize,
    pub corrected: usize,
    pub empty: usize,
}

impl AssemblySummary {
    pub fn of(grid: &TileGrid) -> Self {
        grid.iter().fold(Self::default(), |mut summary, (_, cell)| {
            match cell {
                Cell::Empty => summary.empty += 1,
                Cell::Occupied(tile) => match tile.provenance {
                    Provenance::Detected => summary.detected += 1,
                    Provenance::GapFilled => summary.gap_filled += 1,
                    Provenance::Corrected => summary.corrected += 1,
                },
            }
            summary
        })
    }
}

/// Resolves candidates into one tile per cell and patches the holes.
#[derive(Debug, Clone, Default)]
pub struct GridAssembler {
    config: AssemblyConfig,
}

impl GridAssembler {
    pub fn new(config: AssemblyConfig) -> Self {
        Self { config }
    }

    /// Collision resolution, then gap filling, then first-column correction.
    pub fn assemble(&self, candidates: &[Candidate], image: &RgbImage) -> TileGrid {
        let geometry = BoardGeometry::new(image.width(), image.height());
        let mut grid = self.resolve_collisions(candidates, &geometry);
        self.repair(&mut grid, image);

        let summary = AssemblySummary::of(&grid);
        tracing::info!(
            "Assembled grid: {} detected, {} gap-filled, {} corrected, {} empty",
            summary.detected,
            summary.gap_filled,
            summary.corrected,
            summary.empty
        );
        grid
    }

    /// One candidate per cell, the one nearest the ideal center. Exact ties
    /// keep the candidate seen first.
    pub fn resolve_collisions(&self, candidates: &[Candidate], geometry: &BoardGeometry) -> TileGrid {
        let mut grid = TileGrid::default();
        let mut best: [[Option<f32>; BOARD_SIZE]; BOARD_SIZE] = [[None; BOARD_SIZE]; BOARD_SIZE];

        for candidate in candidates {
            let position = candidate.position;
            let (ideal_x, ideal_y) = geometry.ideal_center(position);
            let distance = candidate.center.distance_squared(ideal_x, ideal_y);

            let slot = &mut best[position.row][position.col];
            if slot.map_or(true, |current| distance < current) {
                *slot = Some(distance);
                grid.set(
                    position,
                    Cell::Occupied(Tile {
                        position,
                        center: candidate.center,
                        color: candidate.color,
                        provenance: Provenance::Detected,
                    }),
                );
            }
        }
        grid
    }

    /// Gap filling followed by first-column correction over an existing grid.
    pub fn repair(&self, grid: &mut TileGrid, image: &RgbImage) {
        let geometry = BoardGeometry::new(image.width(), image.height());
        self.fill_gaps(grid, image, &geometry);
        self.correct_first_column(grid, image, &geometry);
    }

    fn fill_gaps(&self, grid: &mut TileGrid, image: &RgbImage, geometry: &BoardGeometry) {
        let missing: Vec<Position> = grid
            .iter()
            .filter(|(_, cell)| cell.is_empty())
            .map(|(position, _)| position)
            .collect();
        if missing.is_empty() {
            return;
        }
        tracing::warn!("{} cells without a detection, sampling around their centers", missing.len());

        for position in missing {
            let center = geometry.cell_center(position);
            let pooled: Vec<_> = GAP_FILL_OFFSETS
                .iter()
                .flat_map(|&(dx, dy)| {
                    let probe = PixelPoint::new(center.x + dx, center.y + dy);
                    let window = window_pixels(image, probe, self.config.gap_fill_radius);
                    above_darkness_floor(&window, self.config.gap_fill_floor)
                })
                .collect();

            match median_color(&pooled) {
                Some(color) => {
                    tracing::debug!("Gap-filled {} with {:?}", position, color.0);
                    grid.set(
                        position,
                        Cell::Occupied(Tile {
                            position,
                            center,
                            color,
                            provenance: Provenance::GapFilled,
                        }),
                    );
                }
                None => tracing::warn!("Nothing to sample at {}, leaving it empty", position),
            }
        }
    }

    // Column 0 is the one most often cut off by the capture border.
    fn correct_first_column(&self, grid: &mut TileGrid, image: &RgbImage, geometry: &BoardGeometry) {
        let x = (geometry.cell_width() * self.config.correction_x_fraction) as i32;

        for row in 0..BOARD_SIZE {
            let position = Position::new(row, 0);
            let needs_correction = match grid.get(position) {
                Cell::Empty => true,
                Cell::Occupied(tile) => tile.provenance == Provenance::GapFilled,
            };
            if !needs_correction {
                continue;
            }

            let y = ((row as f32 + 0.5) * geometry.cell_height()) as i32;
            let probe = PixelPoint::new(x, y);
            let window = window_pixels(image, probe, self.config.correction_radius);
            let Some(color) = median_color(&above_darkness_floor(&window, self.config.correction_floor))
            else {
                continue;
            };

            match grid.get_mut(position) {
                Cell::Occupied(tile) => {
                    tile.color = color;
                    tile.provenance = Provenance::Corrected;
                }
                Cell::Empty => grid.set(
                    position,
                    Cell::Occupied(Tile {
                        position,
                        center: probe,
                        color,
                        provenance: Provenance::Corrected,
                    }),
                ),
            }
            tracing::debug!("Corrected first-column cell {} to {:?}", position, color.0);
        }
    }
}
