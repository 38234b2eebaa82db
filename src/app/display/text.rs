use crate::pipeline::domain::PixelPoint;
use image::{Rgb, RgbImage};

const GLYPH_WIDTH: i32 = 3;
const GLYPH_HEIGHT: i32 = 5;

/// 3×5 bitmap glyphs, one row per byte, most significant of the low three bits on the left.
fn glyph(c: char) -> Option<[u8; 5]> {
    let rows = match c.to_ascii_uppercase() {
        '0' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '>' => [0b100, 0b010, 0b001, 0b010, 0b100],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        ' ' => [0; 5],
        _ => return None,
    };
    Some(rows)
}

/// Width in pixels of `text` drawn at `scale`.
pub fn text_width(text: &str, scale: i32) -> i32 {
    let count = text.chars().filter(|&c| glyph(c).is_some()).count() as i32;
    if count == 0 {
        return 0;
    }
    (count * (GLYPH_WIDTH + 1) - 1) * scale
}

pub fn text_height(scale: i32) -> i32 {
    GLYPH_HEIGHT * scale
}

/// Draws `text` with its top-left corner at `origin`. Characters without a glyph are skipped.
pub fn draw_text(canvas: &mut RgbImage, origin: PixelPoint, text: &str, color: Rgb<u8>, scale: i32) {
    let scale = scale.max(1);
    let mut cursor = origin.x;
    for rows in text.chars().filter_map(glyph) {
        for (gy, bits) in rows.iter().enumerate() {
            for gx in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - gx)) == 0 {
                    continue;
                }
                fill_rect(
                    canvas,
                    PixelPoint::new(cursor + gx * scale, origin.y + gy as i32 * scale),
                    scale,
                    scale,
                    color,
                );
            }
        }
        cursor += (GLYPH_WIDTH + 1) * scale;
    }
}

/// Clipped to the canvas.
pub fn fill_rect(canvas: &mut RgbImage, top_left: PixelPoint, width: i32, height: i32, color: Rgb<u8>) {
    let x0 = top_left.x.max(0);
    let y0 = top_left.y.max(0);
    let x1 = (top_left.x + width).min(canvas.width() as i32);
    let y1 = (top_left.y + height).min(canvas.height() as i32);
    for y in y0..y1 {
        for x in x0..x1 {
            canvas.put_pixel(x as u32, y as u32, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageBuffer;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    #[test]
    fn digits_are_drawn_at_scale() {
        let mut canvas: RgbImage = ImageBuffer::from_pixel(20, 12, BLACK);
        draw_text(&mut canvas, PixelPoint::new(1, 1), "1", WHITE, 2);
        // top row of "1" is the middle column only
        assert_eq!(canvas.get_pixel(1, 1), &BLACK);
        assert_eq!(canvas.get_pixel(3, 1), &WHITE);
        assert_eq!(canvas.get_pixel(4, 2), &WHITE);
        // bottom row spans all three columns
        assert_eq!(canvas.get_pixel(1, 9), &WHITE);
        assert_eq!(canvas.get_pixel(6, 10), &WHITE);
        assert_eq!(canvas.get_pixel(1, 11), &BLACK);
    }

    #[test]
    fn width_counts_only_drawable_characters() {
        assert_eq!(text_width("1:9", 1), 11);
        assert_eq!(text_width("1:9", 2), 22);
        assert_eq!(text_width("~", 3), 0);
        assert_eq!(text_height(2), 10);
    }

    #[test]
    fn text_off_the_canvas_is_clipped() {
        let mut canvas: RgbImage = ImageBuffer::from_pixel(4, 4, BLACK);
        draw_text(&mut canvas, PixelPoint::new(-2, -2), "BEST MOVE", WHITE, 1);
        draw_text(&mut canvas, PixelPoint::new(3, 3), "88", WHITE, 3);
        assert_eq!(canvas.get_pixel(3, 3), &WHITE);
    }
}
