//! CrabBooth: a camera photo booth for the terminal
//!
//! Reads frames from the first camera, mirrors them, draws instructions and a
//! photo counter on top, and shows the result as a live preview in the
//! controlling terminal. Space saves the current frame as a JPEG; `q` or Esc
//! quits. The camera is released exactly once on every exit path.
//!
//! The crate also ships `health-monitor`, a small periodic system health
//! reporter that shares the configuration file.
//!
//! # Usage
//! ```rust,ignore
//! use crabbooth::{BoothConfig, CaptureSession, NokhwaCamera, SessionSettings, TerminalPreview};
//! use std::sync::atomic::AtomicBool;
//!
//! let config = BoothConfig::default();
//! let session = CaptureSession::open(
//!     || NokhwaCamera::open(config.camera.index, &config.camera.capture_format()),
//!     SessionSettings::from_config(&config),
//! )?;
//! let mut preview = TerminalPreview::open()?;
//! let summary = session.run(&mut preview, &AtomicBool::new(false));
//! println!("{}", summary);
//! ```
pub mod config;
pub mod device;
pub mod errors;
pub mod health;
pub mod input;
pub mod invariant_ppt;
pub mod overlay;
pub mod platform;
pub mod preview;
pub mod session;
pub mod storage;
pub mod types;

// Testing utilities - scripted devices for offline testing
pub mod testing;

// Re-exports for convenience
pub use config::BoothConfig;
pub use device::{CameraDevice, ScopedDevice};
pub use errors::BoothError;
pub use input::BoothCommand;
pub use platform::NokhwaCamera;
pub use preview::{PreviewSurface, TerminalPreview};
pub use session::{
    CaptureOutcome, CaptureSession, SessionSettings, SessionState, SessionSummary, TerminationReason,
};
pub use types::{CameraFrame, CaptureFormat};

/// Initialize logging. `default_filter` applies only when `RUST_LOG` is unset.
pub fn init_logging(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_info() {
        assert_eq!(NAME, "crabbooth");
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging("crabbooth=warn");
        init_logging("crabbooth=debug");
    }
}
