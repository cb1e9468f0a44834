//! Photo naming and persistence.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::errors::BoothError;

/// Second-resolution timestamp embedded in photo filenames.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// `<prefix>_<counter:03>_<YYYYMMDD_HHMMSS>.jpg`
///
/// Pure function of its inputs; the counter alone keeps names unique within a session.
pub fn photo_filename(prefix: &str, counter: u32, timestamp: &NaiveDateTime) -> String {
    format!(
        "{}_{:03}_{}.jpg",
        prefix,
        counter,
        timestamp.format(TIMESTAMP_FORMAT)
    )
}

/// Writes photos into one output directory.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    directory: PathBuf,
    prefix: String,
    jpeg_quality: u8,
}

impl PhotoStore {
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>, jpeg_quality: u8) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Create the output directory if it is missing. Returns `true` when it was created.
    pub fn ensure_directory(&self) -> Result<bool, BoothError> {
        if self.directory.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(&self.directory)?;
        log::info!("Created output directory {:?}", self.directory);
        Ok(true)
    }

    pub fn path_for(&self, counter: u32, timestamp: &NaiveDateTime) -> PathBuf {
        self.directory
            .join(photo_filename(&self.prefix, counter, timestamp))
    }

    /// Encode `image` as JPEG and move it into place.
    ///
    /// The encoder writes to a hidden `.part` file next to the target which is
    /// renamed on success and removed on failure, so a photo is either fully
    /// present or absent.
    pub fn save(
        &self,
        image: &RgbImage,
        counter: u32,
        timestamp: &NaiveDateTime,
    ) -> Result<PathBuf, BoothError> {
        let path = self.path_for(counter, timestamp);
        let partial = partial_path(&path);

        match self.write_jpeg(image, &partial).and_then(|()| {
            fs::rename(&partial, &path).map_err(|e| format!("rename failed: {}", e))
        }) {
            Ok(()) => {
                log::info!("Photo saved to {:?}", path);
                Ok(path)
            }
            Err(reason) => {
                let _ = fs::remove_file(&partial);
                log::debug!("Failed to save photo {:?}: {}", path, reason);
                Err(BoothError::PhotoSaveFailure { path, reason })
            }
        }
    }

    fn write_jpeg(&self, image: &RgbImage, target: &Path) -> Result<(), String> {
        let file = File::create(target).map_err(|e| e.to_string())?;
        let mut writer = BufWriter::new(file);

        let encoder = JpegEncoder::new_with_quality(&mut writer, self.jpeg_quality);
        image::DynamicImage::ImageRgb8(image.clone())
            .write_with_encoder(encoder)
            .map_err(|e| e.to_string())?;

        writer.flush().map_err(|e| e.to_string())?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| e.to_string())
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.part", name))
}
