use crate::device::CameraDevice;
use crate::errors::BoothError;
use crate::types::{CameraFrame, CaptureFormat};
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution},
    Camera,
};

/// Physical camera opened through nokhwa's native backend
/// (V4L2 on Linux, AVFoundation on macOS, Media Foundation on Windows).
pub struct NokhwaCamera {
    camera: Camera,
    device_id: String,
    resolution: (u32, u32),
    sequence: u64,
}

impl NokhwaCamera {
    /// Open the camera at `index` and start streaming.
    ///
    /// The requested format is a hint: nokhwa picks the closest mode the
    /// device supports, and whatever it picks is accepted.
    pub fn open(index: u32, format: &CaptureFormat) -> Result<Self, BoothError> {
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            nokhwa::utils::CameraFormat::new(
                Resolution::new(format.width, format.height),
                FrameFormat::MJPEG,
                format.fps,
            ),
        ));

        let mut camera = Camera::new(CameraIndex::Index(index), requested).map_err(|e| {
            BoothError::DeviceUnavailable(format!("Failed to open camera {}: {}", index, e))
        })?;

        camera.open_stream().map_err(|e| {
            BoothError::DeviceUnavailable(format!("Failed to start stream: {}", e))
        })?;

        let actual = camera.resolution();
        let resolution = (actual.width(), actual.height());
        if resolution != (format.width, format.height) {
            log::info!(
                "Camera {} substituted {}x{} for requested {}x{}",
                index,
                resolution.0,
                resolution.1,
                format.width,
                format.height
            );
        }

        Ok(Self {
            camera,
            device_id: index.to_string(),
            resolution,
            sequence: 0,
        })
    }
}

impl CameraDevice for NokhwaCamera {
    fn read_frame(&mut self) -> Result<CameraFrame, BoothError> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| BoothError::FrameReadFailure(format!("Failed to capture frame: {}", e)))?;

        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| BoothError::FrameReadFailure(format!("Failed to decode frame: {}", e)))?;

        let (width, height) = (decoded.width(), decoded.height());
        self.sequence += 1;

        CameraFrame::from_rgb(
            decoded.into_raw(),
            width,
            height,
            self.sequence,
            self.device_id.clone(),
        )
        .ok_or_else(|| {
            BoothError::FrameReadFailure(format!(
                "Decoded frame does not match {}x{} RGB",
                width, height
            ))
        })
    }

    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    fn device_id(&self) -> String {
        self.device_id.clone()
    }

    fn release(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            log::warn!("Failed to stop camera stream: {}", e);
        }
    }
}
