//! Testing utilities for CrabBooth
//!
//! Synthetic frames plus scripted stand-ins for the camera and the preview
//! surface, so whole sessions can run without hardware or a terminal.

pub mod scripted;
pub mod synthetic_data;

pub use scripted::{ReleaseCounter, ScriptStep, ScriptedCamera, ScriptedPreview};
pub use synthetic_data::{synthetic_video_frame, uniform_frame};
