use super::config::{default_palette, CategoryRange};
use crate::pipeline::domain::{Category, Cell, ClassifiedGrid, ClassifiedTile, TileGrid};
use image::Rgb;

/// Maps sampled tile colors onto the fixed category table.
#[derive(Debug, Clone)]
pub struct ColorClassifier {
    palette: Vec<CategoryRange>,
}

impl ColorClassifier {
    pub fn new() -> Self {
        Self::with_palette(default_palette())
    }

    /// Table order is the tie-break order. An empty table falls back to the defaults.
    pub fn with_palette(palette: Vec<CategoryRange>) -> Self {
        let palette = if palette.is_empty() {
            default_palette()
        } else {
            palette
        };
        Self { palette }
    }

    pub fn palette(&self) -> &[CategoryRange] {
        &self.palette
    }

    /// Nearest centroid among the boxes containing the color, or among all
    /// categories when none contains it. Never fails.
    pub fn classify(&self, color: Rgb<u8>) -> Category {
        let containing = self
            .palette
            .iter()
            .filter(|range| range.contains(color.0));

        match Self::nearest(containing, color) {
            Some(category) => category,
            None => Self::nearest(self.palette.iter(), color).unwrap_or(Category::Red),
        }
    }

    fn nearest<'a>(
        ranges: impl Iterator<Item = &'a CategoryRange>,
        color: Rgb<u8>,
    ) -> Option<Category> {
        let mut best: Option<(Category, f32)> = None;
        for range in ranges {
            let distance = distance_squared(color, range.centroid());
            // strict comparison keeps the first category on ties
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((range.category, distance));
            }
        }
        best.map(|(category, _)| category)
    }

    pub fn classify_grid(&self, grid: &TileGrid) -> ClassifiedGrid {
        let classified = grid.map(|_, cell| match cell {
            Cell::Occupied(tile) => Cell::Occupied(ClassifiedTile {
                tile: *tile,
                category: self.classify(tile.color),
            }),
            Cell::Empty => Cell::Empty,
        });

        for line in classified.render_rows() {
            tracing::debug!("{}", line);
        }

        classified
    }
}

impl Default for ColorClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn distance_squared(color: Rgb<u8>, centroid: [f32; 3]) -> f32 {
    color
        .0
        .iter()
        .zip(centroid.iter())
        .map(|(&c, &m)| {
            let d = c as f32 - m;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::domain::{PixelPoint, Position, Provenance, Tile};

    #[test]
    fn classifies_palette_centroids_to_their_own_category() {
        let classifier = ColorClassifier::new();
        for range in classifier.palette() {
            let [r, g, b] = range.centroid();
            let color = Rgb([r as u8, g as u8, b as u8]);
            assert_eq!(classifier.classify(color), range.category);
        }
    }

    #[test]
    fn overlapping_ranges_pick_the_nearest_centroid() {
        // inside both the red and the purple boxes
        let classifier = ColorClassifier::new();
        assert!(classifier.palette()[0].contains([200, 60, 120]));
        assert!(classifier.palette()[4].contains([200, 60, 120]));
        assert_eq!(classifier.classify(Rgb([200, 60, 120])), Category::Red);
        assert_eq!(classifier.classify(Rgb([200, 60, 125])), Category::Purple);
    }

    #[test]
    fn out_of_gamut_colors_fall_back_to_nearest_centroid() {
        let classifier = ColorClassifier::new();
        // black and white are outside every box
        assert_eq!(classifier.classify(Rgb([0, 0, 0])), Category::Red);
        assert_eq!(classifier.classify(Rgb([255, 255, 255])), Category::Yellow);
    }

    #[test]
    fn classify_is_total_over_a_coarse_color_lattice() {
        let classifier = ColorClassifier::new();
        for r in (0..=255u16).step_by(17) {
            for g in (0..=255u16).step_by(17) {
                for b in (0..=255u16).step_by(17) {
                    let category = classifier.classify(Rgb([r as u8, g as u8, b as u8]));
                    assert!(Category::ALL.contains(&category));
                }
            }
        }
    }

    #[test]
    fn ties_go_to_the_first_declared_category() {
        let palette = vec![
            CategoryRange::new(Category::Green, [0, 0, 0], [100, 100, 100]),
            CategoryRange::new(Category::Blue, [0, 0, 0], [100, 100, 100]),
        ];
        let classifier = ColorClassifier::with_palette(palette);
        assert_eq!(classifier.classify(Rgb([50, 50, 50])), Category::Green);
    }

    #[test]
    fn classify_grid_preserves_empty_cells() {
        let classifier = ColorClassifier::new();
        let mut grid = TileGrid::default();
        let position = Position::new(2, 3);
        grid.set(
            position,
            Cell::Occupied(Tile {
                position,
                center: PixelPoint::new(350, 250),
                color: Rgb([60, 110, 200]),
                provenance: Provenance::Detected,
            }),
        );

        let classified = classifier.classify_grid(&grid);
        assert_eq!(classified.category_at(position), Some(Category::Blue));
        assert_eq!(classified.iter().filter(|(_, c)| c.is_empty()).count(), 63);
    }
}
