use super::enhance::luminance;
use super::mask::Mask;
use crate::error::PipelineError;
use crate::pipeline::services::image::config::{HsvRange, SegmentationConfig};
use image::{imageops, GrayImage, Luma, Rgb, RgbImage};
use std::collections::VecDeque;

const SOBEL_GX: [[i32; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];
const SOBEL_GY: [[i32; 3]; 3] = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];

/// 3×3 and 5×5 square kernels.
const SMALL_KERNEL: usize = 1;
const LARGE_KERNEL: usize = 2;

/// The three independent masks and the closed union contours are traced on.
#[derive(Debug, Clone)]
pub struct MaskSet {
    pub threshold: Mask,
    pub color: Mask,
    pub edges: Mask,
    pub combined: Mask,
}

pub fn build_masks(enhanced: &RgbImage, config: &SegmentationConfig) -> Result<MaskSet, PipelineError> {
    let gray = GrayImage::from_fn(enhanced.width(), enhanced.height(), |x, y| {
        Luma([luminance(enhanced.get_pixel(x, y))])
    });

    let threshold = adaptive_threshold_mask(&gray, config.threshold_sigma, config.threshold_offset)
        .open(SMALL_KERNEL)
        .close(LARGE_KERNEL);
    let color = color_range_mask(enhanced, &config.hsv_ranges)
        .open(SMALL_KERNEL)
        .close(LARGE_KERNEL);
    let edges = edge_mask(&gray, config.edge_low, config.edge_high).dilate(SMALL_KERNEL);

    let combined = threshold
        .union(&color)?
        .union(&edges)?
        .close(LARGE_KERNEL);

    tracing::debug!(
        "Mask coverage: threshold={}, color={}, edges={}, combined={}",
        threshold.count(),
        color.count(),
        edges.count(),
        combined.count()
    );

    Ok(MaskSet {
        threshold,
        color,
        edges,
        combined,
    })
}

/// Foreground where a pixel is at or below its Gaussian-weighted local mean minus `offset`.
pub fn adaptive_threshold_mask(gray: &GrayImage, sigma: f32, offset: f32) -> Mask {
    let local_mean = imageops::blur(gray, sigma);
    Mask::from_fn(gray.width() as usize, gray.height() as usize, |x, y| {
        let value = gray.get_pixel(x as u32, y as u32).0[0] as f32;
        let mean = local_mean.get_pixel(x as u32, y as u32).0[0] as f32;
        value <= mean - offset
    })
}

/// Union of the per-category HSV range masks.
pub fn color_range_mask(image: &RgbImage, ranges: &[HsvRange]) -> Mask {
    Mask::from_fn(image.width() as usize, image.height() as usize, |x, y| {
        let hsv = rgb_to_hsv(image.get_pixel(x as u32, y as u32));
        ranges.iter().any(|range| range.contains(hsv))
    })
}

/// HSV on the 8-bit scale used by the segmentation ranges: H in 0..=180.
pub fn rgb_to_hsv(pixel: &Rgb<u8>) -> [u8; 3] {
    let [r, g, b] = pixel.0.map(|c| c as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max > 0.0 { delta / max * 255.0 } else { 0.0 };
    let mut hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if hue < 0.0 {
        hue += 360.0;
    }

    [
        (hue / 2.0).round().min(180.0) as u8,
        saturation.round() as u8,
        max as u8,
    ]
}

/// Sobel magnitude with weak/strong hysteresis: weak edges survive only when
/// 8-connected to a strong one.
pub fn edge_mask(gray: &GrayImage, low: f32, high: f32) -> Mask {
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    let mut magnitude = vec![0f32; width * height];

    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let mut gx = 0i32;
            let mut gy = 0i32;
            for (ky, (row_x, row_y)) in SOBEL_GX.iter().zip(SOBEL_GY.iter()).enumerate() {
                for kx in 0..3 {
                    let v = gray.get_pixel((x + kx - 1) as u32, (y + ky - 1) as u32).0[0] as i32;
                    gx += row_x[kx] * v;
                    gy += row_y[kx] * v;
                }
            }
            magnitude[y * width + x] = (gx.abs() + gy.abs()) as f32;
        }
    }

    let mut edges = Mask::new(width, height);
    let mut queue = VecDeque::new();
    for y in 0..height {
        for x in 0..width {
            if magnitude[y * width + x] >= high {
                edges.set(x, y, true);
                queue.push_back((x, y));
            }
        }
    }

    while let Some((x, y)) = queue.pop_front() {
        for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                if !edges.get(nx, ny) && magnitude[ny * width + nx] >= low {
                    edges.set(nx, ny, true);
                    queue.push_back((nx, ny));
                }
            }
        }
    }

    edges
}
