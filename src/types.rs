use chrono::{DateTime, Local};
use image::RgbImage;

/// Requested capture format. Devices may substitute the nearest supported one.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CaptureFormat {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl CaptureFormat {
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        Self { width, height, fps }
    }

    /// 640x480 @ 30fps, the booth's default request.
    pub fn vga() -> Self {
        Self::new(640, 480, 30)
    }
}

impl Default for CaptureFormat {
    fn default() -> Self {
        Self::vga()
    }
}

/// One RGB8 frame read from a camera.
///
/// The pixel grid keeps its dimensions for its whole life: mirroring and
/// overlay rendering work in place.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub image: RgbImage,
    pub sequence: u64,
    pub device_id: String,
    pub timestamp: DateTime<Local>,
}

impl CameraFrame {
    pub fn new(image: RgbImage, sequence: u64, device_id: impl Into<String>) -> Self {
        Self {
            image,
            sequence,
            device_id: device_id.into(),
            timestamp: Local::now(),
        }
    }

    /// Build a frame from packed RGB bytes. Returns `None` when the buffer
    /// length does not match `width * height * 3`.
    pub fn from_rgb(
        data: Vec<u8>,
        width: u32,
        height: u32,
        sequence: u64,
        device_id: impl Into<String>,
    ) -> Option<Self> {
        RgbImage::from_raw(width, height, data).map(|image| Self::new(image, sequence, device_id))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Flip left-to-right in place, the usual selfie-preview orientation.
    pub fn mirror(&mut self) {
        image::imageops::flip_horizontal_in_place(&mut self.image);
    }
}
