use super::mask::Mask;
use crate::pipeline::domain::PixelPoint;
use std::collections::VecDeque;

const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl BoundingBox {
    fn around(points: impl Iterator<Item = (i32, i32)>) -> Option<Self> {
        points.fold(None, |acc, (x, y)| {
            Some(match acc {
                None => BoundingBox {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                },
                Some(b) => BoundingBox {
                    min_x: b.min_x.min(x),
                    min_y: b.min_y.min(y),
                    max_x: b.max_x.max(x),
                    max_y: b.max_y.max(y),
                },
            })
        })
    }

    pub fn center(&self) -> PixelPoint {
        PixelPoint::new((self.min_x + self.max_x) / 2, (self.min_y + self.max_y) / 2)
    }
}

/// Outer boundary of one blob, reduced to the moments the segmenter needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    m00: f64,
    m10: f64,
    m01: f64,
    bounds: BoundingBox,
}

impl Contour {
    /// Filled region; every pixel weighs one.
    pub fn from_region(pixels: &[(i32, i32)]) -> Option<Self> {
        let bounds = BoundingBox::around(pixels.iter().copied())?;
        let (m10, m01) = pixels
            .iter()
            .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x as f64, sy + y as f64));
        Some(Self {
            m00: pixels.len() as f64,
            m10,
            m01,
            bounds,
        })
    }

    /// Closed polygon, moments by Green's theorem.
    pub fn from_polygon(points: &[(i32, i32)]) -> Option<Self> {
        let bounds = BoundingBox::around(points.iter().copied())?;
        let (mut a, mut cx, mut cy) = (0.0f64, 0.0f64, 0.0f64);
        for (i, &(x0, y0)) in points.iter().enumerate() {
            let (x1, y1) = points[(i + 1) % points.len()];
            let (x0, y0, x1, y1) = (x0 as f64, y0 as f64, x1 as f64, y1 as f64);
            let cross = x0 * y1 - x1 * y0;
            a += cross;
            cx += (x0 + x1) * cross;
            cy += (y0 + y1) * cross;
        }
        let m00 = a / 2.0;
        Some(Self {
            m00: m00.abs(),
            m10: (cx / 6.0) * m00.signum(),
            m01: (cy / 6.0) * m00.signum(),
            bounds,
        })
    }

    /// Regular 36-gon, the stand-in shape for a cell whose blob was not found.
    pub fn circle(center: PixelPoint, radius: i32) -> Self {
        let points: Vec<(i32, i32)> = (0..360)
            .step_by(10)
            .map(|deg| {
                let theta = (deg as f64).to_radians();
                (
                    center.x + (radius as f64 * theta.cos()) as i32,
                    center.y + (radius as f64 * theta.sin()) as i32,
                )
            })
            .collect();
        Self::from_polygon(&points).unwrap_or(Self {
            m00: 0.0,
            m10: 0.0,
            m01: 0.0,
            bounds: BoundingBox {
                min_x: center.x,
                min_y: center.y,
                max_x: center.x,
                max_y: center.y,
            },
        })
    }

    pub fn area(&self) -> f64 {
        self.m00
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Area-weighted centroid, or the bounding-box center for a degenerate shape.
    pub fn centroid(&self) -> PixelPoint {
        if self.m00.abs() < EPSILON {
            return self.bounds.center();
        }
        PixelPoint::new(
            (self.m10 / self.m00).round() as i32,
            (self.m01 / self.m00).round() as i32,
        )
    }
}

/// Marks background pockets that cannot reach the image border as foreground,
/// so only outer boundaries remain.
pub fn fill_holes(mask: &Mask) -> Mask {
    let (width, height) = (mask.width(), mask.height());
    let mut outside = Mask::new(width, height);
    let mut queue = VecDeque::new();

    let seed = |x: usize, y: usize, outside: &mut Mask, queue: &mut VecDeque<(usize, usize)>| {
        if !mask.get(x, y) && !outside.get(x, y) {
            outside.set(x, y, true);
            queue.push_back((x, y));
        }
    };
    for x in 0..width {
        seed(x, 0, &mut outside, &mut queue);
        if height > 1 {
            seed(x, height - 1, &mut outside, &mut queue);
        }
    }
    for y in 0..height {
        seed(0, y, &mut outside, &mut queue);
        if width > 1 {
            seed(width - 1, y, &mut outside, &mut queue);
        }
    }

    // background is 4-connected against an 8-connected foreground
    while let Some((x, y)) = queue.pop_front() {
        let neighbors = [
            (x.wrapping_sub(1), y),
            (x + 1, y),
            (x, y.wrapping_sub(1)),
            (x, y + 1),
        ];
        for (nx, ny) in neighbors {
            if nx < width && ny < height {
                seed(nx, ny, &mut outside, &mut queue);
            }
        }
    }

    Mask::from_fn(width, height, |x, y| !outside.get(x, y))
}

/// External contours of the 8-connected foreground components.
pub fn find_external_contours(mask: &Mask) -> Vec<Contour> {
    let filled = fill_holes(mask);
    let (width, height) = (filled.width(), filled.height());
    let mut visited = Mask::new(width, height);
    let mut contours = Vec::new();
    let mut queue = VecDeque::new();

    for y in 0..height {
        for x in 0..width {
            if !filled.get(x, y) || visited.get(x, y) {
                continue;
            }

            let mut region = Vec::new();
            visited.set(x, y, true);
            queue.push_back((x, y));
            while let Some((cx, cy)) = queue.pop_front() {
                region.push((cx as i32, cy as i32));
                for ny in cy.saturating_sub(1)..=(cy + 1).min(height - 1) {
                    for nx in cx.saturating_sub(1)..=(cx + 1).min(width - 1) {
                        if filled.get(nx, ny) && !visited.get(nx, ny) {
                            visited.set(nx, ny, true);
                            queue.push_back((nx, ny));
                        }
                    }
                }
            }

            if let Some(contour) = Contour::from_region(&region) {
                contours.push(contour);
            }
        }
    }

    contours
}
