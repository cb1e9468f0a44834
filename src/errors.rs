use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoothError {
    /// The camera could not be opened at startup. Fatal.
    #[error("Camera unavailable: {0}")]
    DeviceUnavailable(String),
    /// A frame could not be read mid-session. Ends the session.
    #[error("Frame read failure: {0}")]
    FrameReadFailure(String),
    /// A photo could not be written. The session keeps running.
    #[error("Failed to save photo {}: {reason}", path.display())]
    PhotoSaveFailure { path: PathBuf, reason: String },
    #[error("Display error: {0}")]
    Display(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
