//! Scripted camera and preview for driving sessions in tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::device::CameraDevice;
use crate::errors::BoothError;
use crate::input::BoothCommand;
use crate::preview::PreviewSurface;
use crate::types::CameraFrame;

use super::synthetic_data::synthetic_video_frame;

/// Shared count of `release` calls, readable after the camera moved into a session.
#[derive(Debug, Clone, Default)]
pub struct ReleaseCounter(Arc<AtomicUsize>);

impl ReleaseCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Camera that serves synthetic frames, optionally failing after a fixed number of reads.
pub struct ScriptedCamera {
    width: u32,
    height: u32,
    frames_before_failure: Option<u64>,
    served: u64,
    releases: ReleaseCounter,
}

impl ScriptedCamera {
    pub fn endless(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frames_before_failure: None,
            served: 0,
            releases: ReleaseCounter::default(),
        }
    }

    /// Serve `frames` reads successfully, then fail every read after that.
    pub fn failing_after(frames: u64, width: u32, height: u32) -> Self {
        Self {
            frames_before_failure: Some(frames),
            ..Self::endless(width, height)
        }
    }

    pub fn release_counter(&self) -> ReleaseCounter {
        self.releases.clone()
    }

    pub fn frames_served(&self) -> u64 {
        self.served
    }
}

impl CameraDevice for ScriptedCamera {
    fn read_frame(&mut self) -> Result<CameraFrame, BoothError> {
        if let Some(limit) = self.frames_before_failure {
            if self.served >= limit {
                return Err(BoothError::FrameReadFailure(
                    "scripted camera disconnected".to_string(),
                ));
            }
        }
        self.served += 1;
        Ok(synthetic_video_frame(self.served, self.width, self.height))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn device_id(&self) -> String {
        "scripted".to_string()
    }

    fn release(&mut self) {
        self.releases.bump();
    }
}

/// One scripted answer to `poll_command`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStep {
    Key(BoothCommand),
    Idle,
    /// Raise the external interrupt flag, as a signal handler would, and report no key.
    RaiseInterrupt,
}

/// Preview that records what it was shown and answers polls from a script.
///
/// Once the script runs out every poll answers `Quit`, so a session can never spin forever.
pub struct ScriptedPreview {
    script: VecDeque<ScriptStep>,
    interrupt: Option<Arc<AtomicBool>>,
    fail_present: bool,
    pub presented: Vec<CameraFrame>,
    pub statuses: Vec<String>,
    pub close_calls: usize,
    pub polls: usize,
}

impl ScriptedPreview {
    pub fn new(script: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            script: script.into_iter().collect(),
            interrupt: None,
            fail_present: false,
            presented: Vec::new(),
            statuses: Vec::new(),
            close_calls: 0,
            polls: 0,
        }
    }

    /// Script made only of key presses.
    pub fn keys(keys: impl IntoIterator<Item = BoothCommand>) -> Self {
        Self::new(keys.into_iter().map(ScriptStep::Key))
    }

    /// Empty script: the first poll quits.
    pub fn empty() -> Self {
        Self::new(Vec::<ScriptStep>::new())
    }

    /// Flag set by [`ScriptStep::RaiseInterrupt`].
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Make every `present` call fail, as if the terminal went away.
    pub fn failing_present(mut self) -> Self {
        self.fail_present = true;
        self
    }

    pub fn has_status_containing(&self, needle: &str) -> bool {
        self.statuses.iter().any(|s| s.contains(needle))
    }
}

impl PreviewSurface for ScriptedPreview {
    fn present(&mut self, frame: &CameraFrame) -> Result<(), BoothError> {
        if self.fail_present {
            return Err(BoothError::Display("scripted display failure".to_string()));
        }
        self.presented.push(frame.clone());
        Ok(())
    }

    fn poll_command(&mut self, _timeout: Duration) -> Result<Option<BoothCommand>, BoothError> {
        self.polls += 1;
        match self.script.pop_front() {
            Some(ScriptStep::Key(command)) => Ok(Some(command)),
            Some(ScriptStep::Idle) => Ok(None),
            Some(ScriptStep::RaiseInterrupt) => {
                if let Some(flag) = &self.interrupt {
                    flag.store(true, Ordering::SeqCst);
                }
                Ok(None)
            }
            None => Ok(Some(BoothCommand::Quit)),
        }
    }

    fn status(&mut self, line: &str) {
        self.statuses.push(line.to_string());
    }

    fn close(&mut self) {
        self.close_calls += 1;
    }
}
