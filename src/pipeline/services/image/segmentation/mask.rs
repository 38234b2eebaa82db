use crate::error::PipelineError;
use image::{GrayImage, Luma};

/// Binary foreground mask, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    width: usize,
    height: usize,
    data: Vec<bool>,
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![false; width * height],
        }
    }

    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> bool) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        let idx = self.idx(x, y);
        self.data[idx] = value;
    }

    /// White foreground on black.
    pub fn to_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            Luma([if self.get(x as usize, y as usize) { 255 } else { 0 }])
        })
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub fn union(&self, other: &Mask) -> Result<Mask, PipelineError> {
        if self.width != other.width || self.height != other.height {
            return Err(PipelineError::MaskMismatch {
                expected: (self.width, self.height),
                actual: (other.width, other.height),
            });
        }
        Ok(Mask {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| a || b)
                .collect(),
        })
    }

    /// Square structuring element of side `2 * radius + 1`.
    pub fn dilate(&self, radius: usize) -> Mask {
        self.sweep(radius, true)
    }

    pub fn erode(&self, radius: usize) -> Mask {
        self.sweep(radius, false)
    }

    pub fn open(&self, radius: usize) -> Mask {
        self.erode(radius).dilate(radius)
    }

    pub fn close(&self, radius: usize) -> Mask {
        self.dilate(radius).erode(radius)
    }

    // Separable square kernel: a row pass then a column pass. Pixels outside
    // the mask never take part.
    fn sweep(&self, radius: usize, dilate: bool) -> Mask {
        if radius == 0 {
            return self.clone();
        }

        let mut rows = Mask::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let lo = x.saturating_sub(radius);
                let hi = (x + radius).min(self.width - 1);
                let value = if dilate {
                    (lo..=hi).any(|nx| self.get(nx, y))
                } else {
                    (lo..=hi).all(|nx| self.get(nx, y))
                };
                rows.set(x, y, value);
            }
        }

        let mut out = Mask::new(self.width, self.height);
        for y in 0..self.height {
            let lo = y.saturating_sub(radius);
            let hi = (y + radius).min(self.height - 1);
            for x in 0..self.width {
                let value = if dilate {
                    (lo..=hi).any(|ny| rows.get(x, ny))
                } else {
                    (lo..=hi).all(|ny| rows.get(x, ny))
                };
                out.set(x, y, value);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: usize, from: usize, to: usize) -> Mask {
        Mask::from_fn(size, size, |x, y| (from..to).contains(&x) && (from..to).contains(&y))
    }

    #[test]
    fn dilate_then_erode_restores_a_solid_square() {
        let mask = square(20, 5, 10);
        assert_eq!(mask.dilate(1).count(), 49);
        assert_eq!(mask.close(2), mask);
    }

    #[test]
    fn opening_removes_isolated_specks() {
        let mut mask = square(20, 5, 12);
        mask.set(17, 17, true);
        let opened = mask.open(1);
        assert!(!opened.get(17, 17));
        assert_eq!(opened.count(), 49);
    }

    #[test]
    fn closing_bridges_a_one_pixel_gap() {
        let mask = Mask::from_fn(20, 20, |x, y| (4..16).contains(&y) && x != 9 && (2..18).contains(&x));
        assert!(!mask.get(9, 8));
        assert!(mask.close(1).get(9, 8));
    }

    #[test]
    fn union_rejects_mismatched_dimensions() {
        let a = Mask::new(4, 4);
        let b = Mask::new(4, 5);
        assert!(matches!(a.union(&b), Err(PipelineError::MaskMismatch { .. })));
    }

    #[test]
    fn image_marks_foreground_white() {
        let image = square(6, 2, 4).to_image();
        assert_eq!(image.dimensions(), (6, 6));
        assert_eq!(image.get_pixel(2, 3).0, [255]);
        assert_eq!(image.get_pixel(0, 0).0, [0]);
        assert_eq!(image.pixels().filter(|p| p.0[0] == 255).count(), 4);
    }
}
