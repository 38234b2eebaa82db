use super::text::{draw_text, fill_rect, text_height, text_width};
use crate::pipeline::domain::{BoardAnalysis, BoardGeometry, Cell, Move, PixelPoint, Provenance};
use crate::pipeline::services::image::segmentation::contours::Contour;
use image::{Rgb, RgbImage};

const DETECTED: Rgb<u8> = Rgb([0, 255, 0]);
const GAP_FILLED: Rgb<u8> = Rgb([255, 0, 0]);
const CORRECTED: Rgb<u8> = Rgb([255, 0, 255]);
const BEST_MOVE: Rgb<u8> = Rgb([255, 255, 0]);
const OTHER_MOVE: Rgb<u8> = Rgb([0, 200, 255]);
const LABEL: Rgb<u8> = Rgb([255, 255, 255]);
const BANNER: Rgb<u8> = Rgb([0, 0, 0]);
const CONTOUR: Rgb<u8> = Rgb([0, 255, 0]);

const LABEL_SCALE: i32 = 2;
const BANNER_PADDING: i32 = 4;

/// Copy of the board with a ring per tile (colored by provenance), an arrow
/// labelled `rank:score` for each of the first `max_moves` ranked moves, and a
/// banner naming the best move.
pub fn render_overlay(image: &RgbImage, analysis: &BoardAnalysis, max_moves: usize) -> RgbImage {
    let mut canvas = image.clone();
    let geometry = BoardGeometry::new(image.width(), image.height());
    let radius = 0.4 * geometry.cell_width().min(geometry.cell_height());

    for (_, cell) in analysis.grid().iter() {
        if let Cell::Occupied(classified) = cell {
            let color = match classified.tile.provenance {
                Provenance::Detected => DETECTED,
                Provenance::GapFilled => GAP_FILLED,
                Provenance::Corrected => CORRECTED,
            };
            draw_ring(&mut canvas, classified.tile.center, radius, color);
        }
    }

    // arrows run between the tiles as they were found, not the ideal cell centers
    let shown: Vec<(usize, &Move, PixelPoint, PixelPoint)> = analysis
        .moves()
        .iter()
        .take(max_moves)
        .enumerate()
        .filter_map(|(rank, m)| {
            let from = analysis.grid().get(m.from).as_occupied()?.tile.center;
            let to = analysis.grid().get(m.to).as_occupied()?.tile.center;
            Some((rank, m, from, to))
        })
        .collect();

    // worst first so the best move ends up on top
    for &(rank, _, from, to) in shown.iter().rev() {
        let (color, thickness) = if rank == 0 {
            (BEST_MOVE, 2)
        } else {
            (OTHER_MOVE, 1)
        };
        draw_arrow(&mut canvas, from, to, color, thickness);
    }
    for &(rank, m, from, to) in shown.iter().rev() {
        let label = format!("{}:{}", rank + 1, m.score);
        let mid = PixelPoint::new((from.x + to.x) / 2, (from.y + to.y) / 2);
        let origin = PixelPoint::new(
            mid.x - text_width(&label, LABEL_SCALE) / 2,
            mid.y - text_height(LABEL_SCALE) / 2,
        );
        draw_text(&mut canvas, origin, &label, LABEL, LABEL_SCALE);
    }

    if let Some(best) = analysis.best_move() {
        draw_banner(&mut canvas, &best_move_banner(best));
    }

    canvas
}

fn best_move_banner(best: &Move) -> String {
    format!("Best Move: {} -> {} Score: {}", best.from, best.to, best.score)
}

fn draw_banner(canvas: &mut RgbImage, text: &str) {
    let width = canvas.width() as i32;
    let height = text_height(LABEL_SCALE) + 2 * BANNER_PADDING;
    fill_rect(canvas, PixelPoint::new(0, 0), width, height, BANNER);
    draw_text(
        canvas,
        PixelPoint::new(BANNER_PADDING, BANNER_PADDING),
        text,
        LABEL,
        LABEL_SCALE,
    );
}

/// Copy of the board with the bounding box and centroid of every contour the
/// candidates were taken from.
pub fn render_contours(image: &RgbImage, contours: &[Contour]) -> RgbImage {
    let mut canvas = image.clone();
    for contour in contours {
        let b = contour.bounds();
        let corners = [
            PixelPoint::new(b.min_x, b.min_y),
            PixelPoint::new(b.max_x, b.min_y),
            PixelPoint::new(b.max_x, b.max_y),
            PixelPoint::new(b.min_x, b.max_y),
        ];
        for i in 0..corners.len() {
            draw_line(&mut canvas, corners[i], corners[(i + 1) % corners.len()], CONTOUR, 1);
        }
        draw_ring(&mut canvas, contour.centroid(), 3.0, CONTOUR);
    }
    canvas
}

fn put(canvas: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
        canvas.put_pixel(x as u32, y as u32, color);
    }
}

pub fn draw_ring(canvas: &mut RgbImage, center: PixelPoint, radius: f32, color: Rgb<u8>) {
    let radius = radius.max(2.0);
    let r_outer = radius.ceil() as i32;
    let r_inner = (radius - 2.0).max(0.0);
    let r_inner_sq = (r_inner * r_inner) as i32;
    let r_outer_sq = (radius * radius) as i32;

    for dy in -r_outer..=r_outer {
        for dx in -r_outer..=r_outer {
            let dist_sq = dx * dx + dy * dy;
            if dist_sq <= r_outer_sq && dist_sq >= r_inner_sq {
                put(canvas, center.x + dx, center.y + dy, color);
            }
        }
    }
}

/// Bresenham line widened to a `2 * thickness - 1` square brush.
pub fn draw_line(canvas: &mut RgbImage, from: PixelPoint, to: PixelPoint, color: Rgb<u8>, thickness: i32) {
    let spread = thickness.max(1) - 1;
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let step_x = if from.x < to.x { 1 } else { -1 };
    let step_y = if from.y < to.y { 1 } else { -1 };
    let (mut x, mut y) = (from.x, from.y);
    let mut err = dx + dy;

    loop {
        for oy in -spread..=spread {
            for ox in -spread..=spread {
                put(canvas, x + ox, y + oy, color);
            }
        }
        if x == to.x && y == to.y {
            break;
        }
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            x += step_x;
        }
        if doubled <= dx {
            err += dx;
            y += step_y;
        }
    }
}

pub fn draw_arrow(canvas: &mut RgbImage, from: PixelPoint, to: PixelPoint, color: Rgb<u8>, thickness: i32) {
    draw_line(canvas, from, to, color, thickness);

    let (vx, vy) = ((to.x - from.x) as f32, (to.y - from.y) as f32);
    let length = (vx * vx + vy * vy).sqrt();
    if length < 1.0 {
        return;
    }
    let head = (length * 0.25).max(3.0);
    let (ux, uy) = (vx / length, vy / length);
    for side in [-1.0f32, 1.0] {
        // 45 degrees either side of the shaft, pointing back
        let hx = -ux * head + side * -uy * head;
        let hy = -uy * head + side * ux * head;
        let tip = PixelPoint::new(to.x + (hx * 0.7) as i32, to.y + (hy * 0.7) as i32);
        draw_line(canvas, to, tip, color, thickness);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::domain::{
        Category, ClassifiedGrid, ClassifiedTile, DetectionStrategy, DetectionSummary, Direction,
        Position, Tile,
    };
    use crate::pipeline::services::image::segmentation::mask::Mask;
    use crate::pipeline::services::image::segmentation::strategies::MaskSet;
    use crate::pipeline::services::image::{AssemblySummary, SegmentationDiagnostics};
    use image::ImageBuffer;
    use std::sync::Arc;

    const BACKGROUND: Rgb<u8> = Rgb([100, 100, 100]);

    fn tile_at(position: Position, center: PixelPoint) -> Cell<ClassifiedTile> {
        Cell::Occupied(ClassifiedTile {
            tile: Tile {
                position,
                center,
                color: Rgb([200, 40, 40]),
                provenance: Provenance::Detected,
            },
            category: Category::Red,
        })
    }

    fn analysis_with(grid: ClassifiedGrid, moves: Vec<Move>) -> BoardAnalysis {
        let empty = || Mask::new(400, 400);
        BoardAnalysis::new(
            grid,
            moves,
            DetectionSummary {
                strategy: DetectionStrategy::Contours,
                raw_contours: 2,
                accepted_contours: 2,
                candidates: 2,
            },
            AssemblySummary::default(),
            Arc::new(SegmentationDiagnostics {
                masks: MaskSet {
                    threshold: empty(),
                    color: empty(),
                    edges: empty(),
                    combined: empty(),
                },
                contours: Vec::new(),
            }),
        )
    }

    #[test]
    fn arrows_start_and_end_on_the_detected_tile_centers() {
        let from = Position::new(2, 0);
        let to = Position::new(2, 1);
        let from_center = PixelPoint::new(10, 112);
        let to_center = PixelPoint::new(70, 115);
        let grid = ClassifiedGrid::from_fn(|position| {
            if position == from {
                tile_at(position, from_center)
            } else if position == to {
                tile_at(position, to_center)
            } else {
                Cell::Empty
            }
        });
        let analysis = analysis_with(
            grid,
            vec![Move {
                from,
                to,
                direction: Direction::Right,
                score: 9,
            }],
        );

        let image: RgbImage = ImageBuffer::from_pixel(400, 400, BACKGROUND);
        let canvas = render_overlay(&image, &analysis, 5);
        assert_eq!(canvas.get_pixel(10, 112), &BEST_MOVE);
        assert_eq!(canvas.get_pixel(70, 115), &BEST_MOVE);
        // the ideal center of (2,0) is untouched by the shaft
        assert_ne!(canvas.get_pixel(25, 125), &BEST_MOVE);
    }

    #[test]
    fn ranked_moves_get_labels_and_a_banner() {
        let from = Position::new(4, 4);
        let to = Position::new(5, 4);
        let grid = ClassifiedGrid::from_fn(|position| {
            if position == from || position == to {
                tile_at(position, BoardGeometry::new(400, 400).cell_center(position))
            } else {
                Cell::Empty
            }
        });
        let best = Move {
            from,
            to,
            direction: Direction::Down,
            score: 9,
        };
        assert_eq!(best_move_banner(&best), "Best Move: (4,4) -> (5,4) Score: 9");

        let image: RgbImage = ImageBuffer::from_pixel(400, 400, BACKGROUND);
        let canvas = render_overlay(&image, &analysis_with(grid, vec![best]), 5);

        let banner_height = (text_height(LABEL_SCALE) + 2 * BANNER_PADDING) as u32;
        assert_eq!(canvas.get_pixel(399, 0), &BANNER);
        assert!((0..banner_height).any(|y| (0..400).any(|x| canvas.get_pixel(x, y) == &LABEL)));

        // "1:9" centered between (225,225) and (225,275)
        let label_area = (240..260).any(|y| (210..240).any(|x| canvas.get_pixel(x, y) == &LABEL));
        assert!(label_area);
    }

    #[test]
    fn no_banner_without_moves() {
        let image: RgbImage = ImageBuffer::from_pixel(400, 400, BACKGROUND);
        let canvas = render_overlay(&image, &analysis_with(ClassifiedGrid::default(), Vec::new()), 5);
        assert_eq!(canvas, image);
    }

    #[test]
    fn contours_are_boxed_around_their_centroid() {
        let image: RgbImage = ImageBuffer::from_pixel(40, 40, BACKGROUND);
        let square = Contour::from_polygon(&[(10, 10), (30, 10), (30, 30), (10, 30)]).unwrap();
        let canvas = render_contours(&image, &[square]);
        assert_eq!(canvas.get_pixel(10, 20), &CONTOUR);
        assert_eq!(canvas.get_pixel(30, 25), &CONTOUR);
        assert_eq!(canvas.get_pixel(23, 20), &CONTOUR);
        assert_eq!(canvas.get_pixel(20, 20), &BACKGROUND);
    }

    #[test]
    fn line_covers_both_endpoints_and_stays_clipped() {
        let mut canvas: RgbImage = ImageBuffer::from_pixel(20, 20, Rgb([0, 0, 0]));
        draw_line(&mut canvas, PixelPoint::new(2, 3), PixelPoint::new(17, 11), BEST_MOVE, 1);
        assert_eq!(canvas.get_pixel(2, 3), &BEST_MOVE);
        assert_eq!(canvas.get_pixel(17, 11), &BEST_MOVE);

        draw_line(&mut canvas, PixelPoint::new(-5, 19), PixelPoint::new(40, 19), OTHER_MOVE, 2);
        assert_eq!(canvas.get_pixel(0, 19), &OTHER_MOVE);
        assert_eq!(canvas.get_pixel(19, 18), &OTHER_MOVE);
    }

    #[test]
    fn ring_leaves_its_center_untouched() {
        let mut canvas: RgbImage = ImageBuffer::from_pixel(40, 40, Rgb([0, 0, 0]));
        draw_ring(&mut canvas, PixelPoint::new(20, 20), 10.0, DETECTED);
        assert_eq!(canvas.get_pixel(30, 20), &DETECTED);
        assert_eq!(canvas.get_pixel(20, 10), &DETECTED);
        assert_eq!(canvas.get_pixel(20, 20), &Rgb([0, 0, 0]));
    }
}
