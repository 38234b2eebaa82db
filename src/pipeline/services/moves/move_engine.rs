use crate::pipeline::domain::{Category, ClassifiedGrid, Direction, Move, Position, CELL_COUNT};

/// Flat category snapshot the swap simulation works on.
type CategoryBoard = [Option<Category>; CELL_COUNT];

const MIN_RUN: usize = 3;

/// Enumerates every adjacent swap that produces a run of three or more and
/// ranks them by score.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveEngine;

impl MoveEngine {
    pub fn new() -> Self {
        Self
    }

    /// Row-major over cells, right/down/left/up per cell. The result is sorted
    /// by score, highest first, with ties in enumeration order.
    pub fn enumerate_and_rank(&self, grid: &ClassifiedGrid) -> Vec<Move> {
        let board = Self::snapshot(grid);
        let mut moves = Vec::new();

        for from in Position::all() {
            for direction in Direction::ORDER {
                let (d_row, d_col) = direction.delta();
                let Some(to) = from.offset(d_row, d_col) else {
                    continue;
                };
                let (Some(a), Some(b)) = (board[from.index()], board[to.index()]) else {
                    continue;
                };
                if a == b {
                    continue;
                }

                let mut swapped = board;
                swapped.swap(from.index(), to.index());

                // a positive score means a run of MIN_RUN passes through one of the two cells
                let score = Self::score_at(&swapped, from) + Self::score_at(&swapped, to);
                if score > 0 {
                    moves.push(Move {
                        from,
                        to,
                        direction,
                        score,
                    });
                }
            }
        }

        moves.sort_by(|a, b| b.score.cmp(&a.score));
        moves
    }

    fn snapshot(grid: &ClassifiedGrid) -> CategoryBoard {
        let mut board = [None; CELL_COUNT];
        for (position, _) in grid.iter() {
            board[position.index()] = grid.category_at(position);
        }
        board
    }

    /// Sum of `len²` over the horizontal and vertical runs through `position`
    /// that are at least three long.
    fn score_at(board: &CategoryBoard, position: Position) -> u32 {
        [(0, 1), (1, 0)]
            .into_iter()
            .map(|axis| Self::run_length(board, position, axis))
            .filter(|&len| len >= MIN_RUN)
            .map(|len| (len * len) as u32)
            .sum()
    }

    fn run_length(board: &CategoryBoard, position: Position, (d_row, d_col): (isize, isize)) -> usize {
        let Some(category) = board[position.index()] else {
            return 0;
        };

        let extend = |sign: isize| {
            let mut len = 0;
            let mut current = position;
            while let Some(next) = current.offset(d_row * sign, d_col * sign) {
                if board[next.index()] != Some(category) {
                    break;
                }
                len += 1;
                current = next;
            }
            len
        };

        1 + extend(1) + extend(-1)
    }

    /// Log lines for the best `n` moves, `#1 (r,c) -> (r,c) right score=9`.
    pub fn summarize(moves: &[Move], n: usize) -> Vec<String> {
        moves
            .iter()
            .take(n)
            .enumerate()
            .map(|(rank, m)| format!("#{} {}", rank + 1, m))
            .collect()
    }
}
