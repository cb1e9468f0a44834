//! Camera device seam and scoped ownership.
//!
//! A [`ScopedDevice`] owns a [`CameraDevice`] for one session and releases it
//! exactly once: either when [`ScopedDevice::release`] is called on the normal
//! termination path, or from `Drop` if the session unwinds before getting there.

use crate::errors::BoothError;
use crate::types::CameraFrame;

/// A source of frames with an explicit release step.
pub trait CameraDevice {
    /// Block until the next frame is available.
    ///
    /// An error means the device is gone; callers must not retry.
    fn read_frame(&mut self) -> Result<CameraFrame, BoothError>;

    /// Resolution the device actually delivers, which may differ from the request.
    fn resolution(&self) -> (u32, u32);

    /// Human readable identifier used in status lines and logs.
    fn device_id(&self) -> String;

    /// Stop streaming and give the hardware back.
    fn release(&mut self);
}

impl<D: CameraDevice + ?Sized> CameraDevice for Box<D> {
    fn read_frame(&mut self) -> Result<CameraFrame, BoothError> {
        (**self).read_frame()
    }

    fn resolution(&self) -> (u32, u32) {
        (**self).resolution()
    }

    fn device_id(&self) -> String {
        (**self).device_id()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

pub struct ScopedDevice<D: CameraDevice> {
    device: Option<D>,
}

impl<D: CameraDevice> ScopedDevice<D> {
    pub fn new(device: D) -> Self {
        Self {
            device: Some(device),
        }
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    pub fn read_frame(&mut self) -> Result<CameraFrame, BoothError> {
        match self.device.as_mut() {
            Some(device) => device.read_frame(),
            None => Err(BoothError::FrameReadFailure(
                "device already released".to_string(),
            )),
        }
    }

    pub fn device_id(&self) -> Option<String> {
        self.device.as_ref().map(|d| d.device_id())
    }

    /// Negotiated resolution, `None` once released.
    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.device.as_ref().map(|d| d.resolution())
    }

    /// Release the device. Later calls are no-ops.
    pub fn release(&mut self) {
        if let Some(mut device) = self.device.take() {
            log::debug!("Releasing camera {}", device.device_id());
            device.release();
        }
    }
}

impl<D: CameraDevice> Drop for ScopedDevice<D> {
    fn drop(&mut self) {
        if self.device.is_some() {
            log::warn!("Camera still held at scope exit, releasing");
            self.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedCamera;

    #[test]
    fn test_release_runs_once() {
        let camera = ScriptedCamera::endless(4, 4);
        let releases = camera.release_counter();

        let mut scoped = ScopedDevice::new(camera);
        assert!(scoped.is_open());
        scoped.release();
        scoped.release();
        drop(scoped);

        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_drop_releases_unreleased_device() {
        let camera = ScriptedCamera::endless(4, 4);
        let releases = camera.release_counter();
        {
            let _scoped = ScopedDevice::new(camera);
        }
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_read_after_release_fails() {
        let mut scoped = ScopedDevice::new(ScriptedCamera::endless(4, 4));
        assert!(scoped.read_frame().is_ok());
        assert_eq!(scoped.resolution(), Some((4, 4)));
        scoped.release();
        assert_eq!(scoped.resolution(), None);
        assert!(matches!(
            scoped.read_frame(),
            Err(BoothError::FrameReadFailure(_))
        ));
    }
}
