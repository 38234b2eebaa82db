use crate::pipeline::services::image::config::SegmentationConfig;
use image::{GrayImage, Luma, Rgb, RgbImage};

/// Gain/bias stretch followed by tile-wise equalization of luminance.
pub fn enhance(image: &RgbImage, config: &SegmentationConfig) -> RgbImage {
    let stretched = scale_abs(image, config.contrast_gain, config.brightness_bias);
    equalize_luminance(&stretched, config.clahe_tiles, config.clahe_clip_limit)
}

fn scale_abs(image: &RgbImage, gain: f32, bias: f32) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for c in pixel.0.iter_mut() {
            *c = (*c as f32 * gain + bias).abs().round().min(255.0) as u8;
        }
    }
    out
}

pub fn luminance(pixel: &Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0;
    (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32)
        .round()
        .min(255.0) as u8
}

/// Contrast-limited adaptive equalization of the luminance channel. Chroma is
/// kept by scaling each pixel with its luminance ratio.
fn equalize_luminance(image: &RgbImage, tiles: u32, clip_limit: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let luma = GrayImage::from_fn(width, height, |x, y| Luma([luminance(image.get_pixel(x, y))]));
    let equalized = clahe(&luma, tiles, clip_limit);

    let mut out = image.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let before = luma.get_pixel(x, y).0[0];
        let after = equalized.get_pixel(x, y).0[0];
        if before == 0 {
            *pixel = Rgb([after, after, after]);
            continue;
        }
        let ratio = after as f32 / before as f32;
        for c in pixel.0.iter_mut() {
            *c = (*c as f32 * ratio).round().min(255.0) as u8;
        }
    }
    out
}

pub fn clahe(gray: &GrayImage, tiles: u32, clip_limit: f32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let tiles_x = tiles.clamp(1, width.max(1));
    let tiles_y = tiles.clamp(1, height.max(1));

    // proportional bounds, so every tile is non-empty whenever tiles <= size
    let span = |index: u32, count: u32, size: u32| (index * size / count, (index + 1) * size / count);

    let mut luts = vec![[0u8; 256]; (tiles_x * tiles_y) as usize];
    for ty in 0..tiles_y {
        let (y0, y1) = span(ty, tiles_y, height);
        for tx in 0..tiles_x {
            let (x0, x1) = span(tx, tiles_x, width);
            luts[(ty * tiles_x + tx) as usize] = tile_lut(gray, (x0, y0, x1, y1), clip_limit);
        }
    }

    let tile_w = width as f32 / tiles_x as f32;
    let tile_h = height as f32 / tiles_y as f32;
    let lookup = |tx: u32, ty: u32, v: u8| luts[(ty * tiles_x + tx) as usize][v as usize] as f32;

    GrayImage::from_fn(width, height, |x, y| {
        let v = gray.get_pixel(x, y).0[0];

        let fx = (x as f32 + 0.5) / tile_w - 0.5;
        let fy = (y as f32 + 0.5) / tile_h - 0.5;
        let tx0 = fx.floor().clamp(0.0, (tiles_x - 1) as f32) as u32;
        let ty0 = fy.floor().clamp(0.0, (tiles_y - 1) as f32) as u32;
        let tx1 = (tx0 + 1).min(tiles_x - 1);
        let ty1 = (ty0 + 1).min(tiles_y - 1);
        let wx = (fx - tx0 as f32).clamp(0.0, 1.0);
        let wy = (fy - ty0 as f32).clamp(0.0, 1.0);

        let top = lookup(tx0, ty0, v) * (1.0 - wx) + lookup(tx1, ty0, v) * wx;
        let bottom = lookup(tx0, ty1, v) * (1.0 - wx) + lookup(tx1, ty1, v) * wx;
        Luma([(top * (1.0 - wy) + bottom * wy).round().clamp(0.0, 255.0) as u8])
    })
}

fn tile_lut(gray: &GrayImage, (x0, y0, x1, y1): (u32, u32, u32, u32), clip_limit: f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    let total = x1.saturating_sub(x0) * y1.saturating_sub(y0);
    if total == 0 {
        for (v, slot) in lut.iter_mut().enumerate() {
            *slot = v as u8;
        }
        return lut;
    }

    let mut histogram = [0u32; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            histogram[gray.get_pixel(x, y).0[0] as usize] += 1;
        }
    }

    // clip and hand the excess back evenly
    let limit = ((clip_limit * total as f32 / 256.0) as u32).max(1);
    let mut excess = 0u32;
    for bin in histogram.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }
    let share = excess / 256;
    let remainder = (excess % 256) as usize;
    for (i, bin) in histogram.iter_mut().enumerate() {
        *bin += share + u32::from(i < remainder);
    }

    let mut cumulative = 0u32;
    for (bin, slot) in histogram.iter().zip(lut.iter_mut()) {
        cumulative += bin;
        *slot = ((cumulative as f32 * 255.0 / total as f32).round()).min(255.0) as u8;
    }
    lut
}
