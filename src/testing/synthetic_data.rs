//! Synthetic frames for offline testing.

use crate::types::CameraFrame;
use image::{Rgb, RgbImage};

/// Gradient frame whose content shifts with `frame_number`, so consecutive
/// frames differ and mirroring is observable.
pub fn synthetic_video_frame(frame_number: u64, width: u32, height: u32) -> CameraFrame {
    let base = (frame_number % 256) as u8;
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            base.wrapping_add((x % 256) as u8),
            base.wrapping_add((y % 256) as u8),
            base.wrapping_add(((x + y) % 256) as u8),
        ])
    });

    CameraFrame::new(image, frame_number, "synthetic")
}

/// Single-colour frame, handy for checking exactly which pixels the overlay touched.
pub fn uniform_frame(width: u32, height: u32, rgb: [u8; 3]) -> CameraFrame {
    CameraFrame::new(
        RgbImage::from_pixel(width, height, Rgb(rgb)),
        0,
        "synthetic",
    )
}
