use crate::pipeline::domain::PixelPoint;
use image::{Rgb, RgbImage};

/// Pixels of the square window `[c - radius, c + radius)` clipped to the image.
pub fn window_pixels(image: &RgbImage, center: PixelPoint, radius: i32) -> Vec<Rgb<u8>> {
    let (width, height) = image.dimensions();
    let x_start = (center.x - radius).max(0);
    let y_start = (center.y - radius).max(0);
    let x_end = (center.x + radius).min(width as i32);
    let y_end = (center.y + radius).min(height as i32);

    if x_start >= x_end || y_start >= y_end {
        return Vec::new();
    }

    let mut pixels = Vec::with_capacity(((x_end - x_start) * (y_end - y_start)) as usize);
    for y in y_start..y_end {
        for x in x_start..x_end {
            pixels.push(*image.get_pixel(x as u32, y as u32));
        }
    }
    pixels
}

/// Drops background pixels whose channel sum is at or below `floor`.
pub fn above_darkness_floor(pixels: &[Rgb<u8>], floor: u32) -> Vec<Rgb<u8>> {
    pixels
        .iter()
        .filter(|p| channel_sum(p) > floor)
        .copied()
        .collect()
}

pub fn channel_sum(pixel: &Rgb<u8>) -> u32 {
    pixel.0.iter().map(|&c| c as u32).sum()
}

/// Per-channel median; even counts average the two middle values, rounding down.
pub fn median_color(pixels: &[Rgb<u8>]) -> Option<Rgb<u8>> {
    if pixels.is_empty() {
        return None;
    }

    let mut channel = Vec::with_capacity(pixels.len());
    let mut median = [0u8; 3];
    for (i, slot) in median.iter_mut().enumerate() {
        channel.clear();
        channel.extend(pixels.iter().map(|p| p.0[i]));
        channel.sort_unstable();

        let mid = channel.len() / 2;
        *slot = if channel.len() % 2 == 1 {
            channel[mid]
        } else {
            ((channel[mid - 1] as u16 + channel[mid] as u16) / 2) as u8
        };
    }
    Some(Rgb(median))
}

/// Median of the bright pixels in the window, or of the whole window when
/// every pixel is below the floor. `None` only for a window outside the image.
pub fn sample_color(
    image: &RgbImage,
    center: PixelPoint,
    radius: i32,
    floor: u32,
) -> Option<Rgb<u8>> {
    let pixels = window_pixels(image, center, radius);
    let bright = above_darkness_floor(&pixels, floor);
    median_color(&bright).or_else(|| median_color(&pixels))
}
