use super::category::Category;
use image::Rgb;
use serde::Serialize;
use std::fmt;

pub const BOARD_SIZE: usize = 8;
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Row-major index into a flat 64-entry array.
    pub fn index(&self) -> usize {
        self.row * BOARD_SIZE + self.col
    }

    pub fn offset(&self, d_row: isize, d_col: isize) -> Option<Position> {
        let row = self.row as isize + d_row;
        let col = self.col as isize + d_col;
        let limit = BOARD_SIZE as isize;
        if (0..limit).contains(&row) && (0..limit).contains(&col) {
            Some(Position::new(row as usize, col as usize))
        } else {
            None
        }
    }

    pub fn all() -> impl Iterator<Item = Position> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Position::new(row, col)))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// Pixel coordinate inside the captured board image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, x: f32, y: f32) -> f32 {
        let dx = self.x as f32 - x;
        let dy = self.y as f32 - y;
        dx * dx + dy * dy
    }
}

/// Maps between board cells and pixel space for one image size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardGeometry {
    width: u32,
    height: u32,
}

impl BoardGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn cell_width(&self) -> f32 {
        self.width as f32 / BOARD_SIZE as f32
    }

    pub fn cell_height(&self) -> f32 {
        self.height as f32 / BOARD_SIZE as f32
    }

    /// Ideal geometric center of a cell, unrounded.
    pub fn ideal_center(&self, position: Position) -> (f32, f32) {
        (
            (position.col as f32 + 0.5) * self.cell_width(),
            (position.row as f32 + 0.5) * self.cell_height(),
        )
    }

    /// Ideal center truncated to a pixel.
    pub fn cell_center(&self, position: Position) -> PixelPoint {
        let (x, y) = self.ideal_center(position);
        PixelPoint::new(x as i32, y as i32)
    }

    /// Cell containing a pixel, clamped onto the board.
    pub fn position_of(&self, point: PixelPoint) -> Position {
        let clamp = |v: f32| (v.max(0.0) as usize).min(BOARD_SIZE - 1);
        Position::new(
            clamp(point.y as f32 / self.cell_height()),
            clamp(point.x as f32 / self.cell_width()),
        )
    }

    pub fn cell_area(&self) -> f32 {
        self.cell_width() * self.cell_height()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Detected,
    GapFilled,
    Corrected,
}

/// A located tile whose category has not been decided yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub position: Position,
    pub center: PixelPoint,
    pub color: Rgb<u8>,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedTile {
    pub tile: Tile,
    pub category: Category,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<T> {
    Empty,
    Occupied(T),
}

impl<T> Default for Cell<T> {
    fn default() -> Self {
        Cell::Empty
    }
}

impl<T> Cell<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_occupied(&self) -> Option<&T> {
        match self {
            Cell::Occupied(value) => Some(value),
            Cell::Empty => None,
        }
    }
}

/// Fixed 8×8 arena indexed by [`Position`].
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    cells: [[T; BOARD_SIZE]; BOARD_SIZE],
}

impl<T> Grid<T> {
    pub fn from_fn(mut f: impl FnMut(Position) -> T) -> Self {
        Self {
            cells: std::array::from_fn(|row| std::array::from_fn(|col| f(Position::new(row, col)))),
        }
    }

    pub fn get(&self, position: Position) -> &T {
        &self.cells[position.row][position.col]
    }

    pub fn get_mut(&mut self, position: Position) -> &mut T {
        &mut self.cells[position.row][position.col]
    }

    pub fn set(&mut self, position: Position, value: T) {
        self.cells[position.row][position.col] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, &T)> {
        Position::all().map(move |p| (p, self.get(p)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(Position, &T) -> U) -> Grid<U> {
        Grid::from_fn(|p| f(p, self.get(p)))
    }
}

impl<T: Default> Default for Grid<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

pub type TileGrid = Grid<Cell<Tile>>;
pub type ClassifiedGrid = Grid<Cell<ClassifiedTile>>;

impl ClassifiedGrid {
    pub fn category_at(&self, position: Position) -> Option<Category> {
        self.get(position).as_occupied().map(|t| t.category)
    }

    /// One line per row, `.` for empty cells.
    pub fn render_rows(&self) -> Vec<String> {
        (0..BOARD_SIZE)
            .map(|row| {
                (0..BOARD_SIZE)
                    .map(|col| {
                        self.category_at(Position::new(row, col))
                            .map(|c| c.symbol())
                            .unwrap_or('.')
                    })
                    .collect()
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    Contours,
    SyntheticGrid,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeEvidence {
    pub area: f64,
    pub strategy: DetectionStrategy,
}

/// Raw detection before it is assigned to a unique cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub position: Position,
    pub center: PixelPoint,
    pub color: Rgb<u8>,
    pub evidence: ShapeEvidence,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_rejects_positions_off_the_board() {
        let corner = Position::new(0, 7);
        assert_eq!(corner.offset(0, 1), None);
        assert_eq!(corner.offset(-1, 0), None);
        assert_eq!(corner.offset(1, -1), Some(Position::new(1, 6)));
    }

    #[test]
    fn geometry_maps_pixels_to_clamped_cells() {
        let geometry = BoardGeometry::new(800, 800);
        assert_eq!(geometry.position_of(PixelPoint::new(150, 250)), Position::new(2, 1));
        assert_eq!(geometry.position_of(PixelPoint::new(-20, 900)), Position::new(7, 0));
        assert_eq!(geometry.cell_center(Position::new(3, 5)), PixelPoint::new(550, 350));
    }

    #[test]
    fn grid_iterates_in_row_major_order() {
        let grid = Grid::from_fn(|p| p.index());
        let order: Vec<usize> = grid.iter().map(|(_, v)| *v).collect();
        assert_eq!(order, (0..CELL_COUNT).collect::<Vec<_>>());
    }
}
