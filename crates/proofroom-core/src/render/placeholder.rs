//! Labeled placeholder synthesis.
//!
//! Exists for legacy caller compatibility only: when no preview can be
//! extracted, placeholder mode still writes a rendition set. The synthetic
//! image is a fixed solid background carrying a short uppercase label that
//! names the media category, rasterized from a built-in 5x7 pixel font.
//! Distinguishability from genuine previews is guaranteed twice over: the
//! writer applies a `_placeholder` file-name marker and the result records
//! a placeholder flag.

use crate::decode::DecodedBitmap;

const BACKGROUND: [u8; 4] = [58, 61, 66, 255];
const FOREGROUND: [u8; 4] = [214, 216, 220, 255];

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
// One blank column between glyphs
const GLYPH_ADVANCE: u32 = GLYPH_WIDTH + 1;
const MAX_LABEL_CHARS: usize = 8;

/// 5x7 glyphs, one 5-bit row pattern per scanline, MSB leftmost.
const FONT: &[(char, [u8; 7])] = &[
    ('A', [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
    ('B', [0b11110, 0b10001, 0b11110, 0b10001, 0b10001, 0b10001, 0b11110]),
    ('C', [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110]),
    ('D', [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100]),
    ('E', [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b11111]),
    ('F', [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b10000]),
    ('G', [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111]),
    ('H', [0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001, 0b10001]),
    ('I', [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    ('J', [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100]),
    ('K', [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001]),
    ('L', [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111]),
    ('M', [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001]),
    ('N', [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001]),
    ('O', [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
    ('P', [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000]),
    ('Q', [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101]),
    ('R', [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001]),
    ('S', [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110]),
    ('T', [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
    ('U', [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
    ('V', [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100]),
    ('W', [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b11011, 0b10001]),
    ('X', [0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b01010, 0b10001]),
    ('Y', [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100]),
    ('Z', [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111]),
    ('0', [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110]),
    ('1', [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    ('2', [0b01110, 0b10001, 0b00001, 0b00110, 0b01000, 0b10000, 0b11111]),
    ('3', [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110]),
    ('4', [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010]),
    ('5', [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110]),
    ('6', [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110]),
    ('7', [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000]),
    ('8', [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110]),
    ('9', [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100]),
];

fn glyph(c: char) -> Option<&'static [u8; 7]> {
    FONT.iter().find(|(g, _)| *g == c).map(|(_, rows)| rows)
}

/// Synthesize a labeled placeholder bitmap.
///
/// The label is uppercased, limited to characters the built-in font covers,
/// and truncated. A label that ends up empty still produces the solid
/// background. The output never carries alpha.
pub fn placeholder_bitmap(label: &str, width: u32, height: u32) -> DecodedBitmap {
    let width = width.max(1);
    let height = height.max(1);

    let mut pixels = Vec::with_capacity((width as usize) * (height as usize) * 4);
    for _ in 0..(width as usize) * (height as usize) {
        pixels.extend_from_slice(&BACKGROUND);
    }

    let label: Vec<[u8; 7]> = label
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .filter_map(|c| glyph(c).copied())
        .take(MAX_LABEL_CHARS)
        .collect();

    if !label.is_empty() {
        let text_width = label.len() as u32 * GLYPH_ADVANCE - 1;

        // Integer scale keeping the label inside roughly half the canvas
        let scale = (width / (text_width * 2))
            .min(height / (GLYPH_HEIGHT * 2))
            .max(1);

        let origin_x = (width.saturating_sub(text_width * scale)) / 2;
        let origin_y = (height.saturating_sub(GLYPH_HEIGHT * scale)) / 2;

        for (i, rows) in label.iter().enumerate() {
            let glyph_x = origin_x + i as u32 * GLYPH_ADVANCE * scale;
            for (row, bits) in rows.iter().enumerate() {
                let bits = *bits as u32;
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    fill_block(
                        &mut pixels,
                        width,
                        height,
                        glyph_x + col * scale,
                        origin_y + row as u32 * scale,
                        scale,
                    );
                }
            }
        }
    }

    DecodedBitmap::new(width, height, false, pixels)
}

/// Paint one scaled font pixel, clipping at the canvas edge.
fn fill_block(pixels: &mut [u8], width: u32, height: u32, x: u32, y: u32, scale: u32) {
    for dy in 0..scale {
        for dx in 0..scale {
            let (px, py) = (x + dx, y + dy);
            if px >= width || py >= height {
                continue;
            }
            let idx = ((py as usize * width as usize) + px as usize) * 4;
            pixels[idx..idx + 4].copy_from_slice(&FOREGROUND);
        }
    }
}
