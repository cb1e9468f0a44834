//! Configuration for CrabBooth
//!
//! Settings are read from a TOML file. Every section and field is optional;
//! anything missing falls back to the defaults below. The file is only ever
//! read, never written back.

use crate::errors::BoothError;
use crate::types::CaptureFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BoothConfig {
    pub camera: CameraConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
    pub overlay: OverlayConfig,
    pub health: HealthConfig,
}

/// Camera-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Logical camera index
    pub index: u32,
    /// Requested resolution [width, height]; the device may pick the nearest it supports
    pub resolution: [u32; 2],
    /// Requested frames per second
    pub fps: u32,
}

/// Where and how photos are written
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub output_directory: String,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// File name prefix, e.g. `photo` gives `photo_001_20240101_120000.jpg`
    pub filename_prefix: String,
}

/// Capture loop timing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Pause after each capture so the user sees the confirmation
    pub capture_pause_ms: u64,
    /// Key poll timeout per frame
    pub poll_interval_ms: u64,
    /// Mirror the preview (and the saved photo) left-to-right
    pub mirror: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OverlayConfig {
    pub title: String,
}

/// Health monitor settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HealthConfig {
    pub interval_secs: u64,
    /// Temperature sensor label prefix to report as the CPU temperature
    pub sensor_label: String,
    /// Mount point whose usage is reported
    pub disk_mount: String,
    pub cpu_temp_warn_c: f32,
    pub cpu_usage_warn_percent: f32,
    pub memory_warn_percent: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            resolution: [640, 480],
            fps: 30,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_directory: "photos".to_string(),
            jpeg_quality: 95,
            filename_prefix: "photo".to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capture_pause_ms: 500,
            poll_interval_ms: 1,
            mirror: true,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            title: "PI PHOTO BOOTH".to_string(),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            sensor_label: "cpu_thermal".to_string(),
            disk_mount: "/".to_string(),
            cpu_temp_warn_c: 70.0,
            cpu_usage_warn_percent: 80.0,
            memory_warn_percent: 80.0,
        }
    }
}

impl CameraConfig {
    pub fn capture_format(&self) -> CaptureFormat {
        CaptureFormat::new(self.resolution[0], self.resolution[1], self.fps)
    }
}

impl SessionConfig {
    pub fn capture_pause(&self) -> Duration {
        Duration::from_millis(self.capture_pause_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl BoothConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, BoothError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| BoothError::Config(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_toml(&contents)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, BoothError> {
        toml::from_str(contents)
            .map_err(|e| BoothError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn to_toml(&self) -> Result<String, BoothError> {
        toml::to_string_pretty(self)
            .map_err(|e| BoothError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("crabbooth.toml")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.camera.resolution[0] == 0 || self.camera.resolution[1] == 0 {
            return Err("Invalid camera resolution".to_string());
        }
        if self.camera.fps == 0 || self.camera.fps > 240 {
            return Err("Invalid camera FPS (must be 1-240)".to_string());
        }

        if self.storage.jpeg_quality == 0 || self.storage.jpeg_quality > 100 {
            return Err("JPEG quality must be between 1 and 100".to_string());
        }
        if self.storage.output_directory.trim().is_empty() {
            return Err("Output directory must not be empty".to_string());
        }
        if self.storage.filename_prefix.is_empty()
            || self.storage.filename_prefix.contains(['/', '\\'])
        {
            return Err("Filename prefix must be a non-empty plain name".to_string());
        }

        if self.health.interval_secs == 0 {
            return Err("Health interval must be at least 1 second".to_string());
        }

        Ok(())
    }
}
