//! On-frame text overlay.
//!
//! Text is drawn with the 8x8 bitmap glyphs from `font8x8`, scaled by an
//! integer factor. Positions are baseline-left, like most text APIs, and
//! anything falling outside the frame is clipped rather than grown into.

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};

use crate::assert_invariant;
use crate::types::CameraFrame;

const GLYPH_SIZE: u32 = 8;
const LEFT_MARGIN: i64 = 20;
const BOTTOM_MARGIN: i64 = 20;

pub const TITLE_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
pub const INSTRUCTION_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
pub const COUNTER_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// One line of overlay text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    /// Baseline-left corner in frame pixels. May lie outside the frame.
    pub origin: (i64, i64),
    pub scale: u32,
    pub color: Rgb<u8>,
}

impl TextLine {
    fn new(text: impl Into<String>, origin: (i64, i64), scale: u32, color: Rgb<u8>) -> Self {
        Self {
            text: text.into(),
            origin,
            scale,
            color,
        }
    }
}

/// Lay out the booth overlay for a frame of `frame_height` rows: title and
/// two instruction lines at the top, photo counter near the bottom edge.
pub fn compose(title: &str, photo_count: u32, frame_height: u32) -> Vec<TextLine> {
    vec![
        TextLine::new(title, (LEFT_MARGIN, 30), 3, TITLE_COLOR),
        TextLine::new(
            "Press SPACE to take photo",
            (LEFT_MARGIN, 60),
            2,
            INSTRUCTION_COLOR,
        ),
        TextLine::new("Press 'q' to quit", (LEFT_MARGIN, 85), 2, INSTRUCTION_COLOR),
        TextLine::new(
            format!("Photos taken: {}", photo_count),
            (LEFT_MARGIN, frame_height as i64 - BOTTOM_MARGIN),
            2,
            COUNTER_COLOR,
        ),
    ]
}

/// Draw the booth overlay onto `frame` in place.
pub fn apply(frame: &mut CameraFrame, title: &str, photo_count: u32) {
    let lines = compose(title, photo_count, frame.height());
    render(&mut frame.image, &lines);
}

pub fn render(image: &mut RgbImage, lines: &[TextLine]) {
    let before = image.dimensions();
    for line in lines {
        draw_text(image, &line.text, line.origin, line.scale, line.color);
    }
    assert_invariant!(
        image.dimensions() == before,
        "Overlay rendering never changes frame dimensions",
        "overlay::render"
    );
}

pub fn draw_text(image: &mut RgbImage, text: &str, origin: (i64, i64), scale: u32, color: Rgb<u8>) {
    let scale = scale.max(1);
    let advance = (GLYPH_SIZE * scale) as i64;
    let top = origin.1 - advance;

    for (i, ch) in text.chars().enumerate() {
        let Some(glyph) = BASIC_FONTS.get(ch) else {
            continue;
        };
        let left = origin.0 + i as i64 * advance;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                if bits & (1 << col) != 0 {
                    fill_block(
                        image,
                        left + (col * scale) as i64,
                        top + row as i64 * scale as i64,
                        scale,
                        color,
                    );
                }
            }
        }
    }
}

fn fill_block(image: &mut RgbImage, x: i64, y: i64, size: u32, color: Rgb<u8>) {
    let (width, height) = (image.width() as i64, image.height() as i64);
    let x_range = x.max(0)..(x + size as i64).min(width);
    let y_range = y.max(0)..(y + size as i64).min(height);
    for py in y_range {
        for px in x_range.clone() {
            image.put_pixel(px as u32, py as u32, color);
        }
    }
}
