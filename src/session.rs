//! The photo booth session: one camera, one preview, one synchronous loop.
//!
//! States move `Initializing -> Live <-> Capturing -> Terminated`. The state
//! changes themselves are the pure [`transition`] function; [`CaptureSession`]
//! feeds it events from the camera, the preview and the interrupt flag, and
//! performs the effects it asks for.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::assert_invariant;
use crate::config::BoothConfig;
use crate::device::{CameraDevice, ScopedDevice};
use crate::errors::BoothError;
use crate::input::BoothCommand;
use crate::overlay;
use crate::preview::PreviewSurface;
use crate::storage::PhotoStore;
use crate::types::CameraFrame;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Initializing,
    Live,
    Capturing,
    Terminated(TerminationReason),
}

impl SessionState {
    pub fn is_terminated(&self) -> bool {
        matches!(self, SessionState::Terminated(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    Quit,
    Interrupted,
    FrameReadFailure(String),
    DisplayFailure(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Opened,
    FrameFailed(String),
    DisplayFailed(String),
    /// Result of one key poll; `None` when nothing bound was pressed.
    Command(Option<BoothCommand>),
    Interrupted,
    CaptureDone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    SavePhoto,
}

pub fn transition(state: &SessionState, event: SessionEvent) -> (SessionState, Option<Effect>) {
    use SessionEvent as E;
    use SessionState as S;

    match (state, event) {
        (S::Terminated(_), _) => (state.clone(), None),
        (_, E::Interrupted) => (S::Terminated(TerminationReason::Interrupted), None),
        (_, E::FrameFailed(cause)) => (
            S::Terminated(TerminationReason::FrameReadFailure(cause)),
            None,
        ),
        (_, E::DisplayFailed(cause)) => (
            S::Terminated(TerminationReason::DisplayFailure(cause)),
            None,
        ),
        (S::Initializing, E::Opened) => (S::Live, None),
        (S::Live, E::Command(Some(BoothCommand::Capture))) => {
            (S::Capturing, Some(Effect::SavePhoto))
        }
        (S::Live, E::Command(Some(BoothCommand::Quit))) => {
            (S::Terminated(TerminationReason::Quit), None)
        }
        (S::Live, E::Command(Some(BoothCommand::Interrupt))) => {
            (S::Terminated(TerminationReason::Interrupted), None)
        }
        (S::Capturing, E::CaptureDone) => (S::Live, None),
        (state, _) => (state.clone(), None),
    }
}

/// Everything the loop needs besides the camera.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub output_directory: PathBuf,
    pub filename_prefix: String,
    pub jpeg_quality: u8,
    pub title: String,
    pub capture_pause: Duration,
    pub poll_interval: Duration,
    pub mirror: bool,
}

impl SessionSettings {
    pub fn from_config(config: &BoothConfig) -> Self {
        Self {
            output_directory: PathBuf::from(&config.storage.output_directory),
            filename_prefix: config.storage.filename_prefix.clone(),
            jpeg_quality: config.storage.jpeg_quality,
            title: config.overlay.title.clone(),
            capture_pause: config.session.capture_pause(),
            poll_interval: config.session.poll_interval(),
            mirror: config.session.mirror,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&BoothConfig::default())
    }
}

pub struct CaptureSession<D: CameraDevice> {
    device: ScopedDevice<D>,
    store: PhotoStore,
    settings: SessionSettings,
    state: SessionState,
    photo_count: u32,
    captures: Vec<CaptureOutcome>,
    directory_created: bool,
}

impl<D: CameraDevice> CaptureSession<D> {
    /// Acquire the camera, then make sure the output directory exists.
    ///
    /// The camera comes first so a missing device leaves the filesystem untouched.
    pub fn open<F>(open_device: F, settings: SessionSettings) -> Result<Self, BoothError>
    where
        F: FnOnce() -> Result<D, BoothError>,
    {
        let device = ScopedDevice::new(open_device()?);

        let store = PhotoStore::new(
            settings.output_directory.clone(),
            settings.filename_prefix.clone(),
            settings.jpeg_quality,
        );
        // On failure `device` drops here and releases the camera
        let directory_created = store.ensure_directory()?;

        Ok(Self {
            device,
            store,
            settings,
            state: SessionState::Initializing,
            photo_count: 0,
            captures: Vec::new(),
            directory_created,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn photo_count(&self) -> u32 {
        self.photo_count
    }

    /// Whether opening the session had to create the output directory.
    pub fn directory_created(&self) -> bool {
        self.directory_created
    }

    pub fn output_directory(&self) -> &Path {
        self.store.directory()
    }

    /// Run until quit, interrupt or device loss, then release the camera and
    /// close the preview. `interrupt` is checked once per frame.
    pub fn run<P: PreviewSurface>(mut self, preview: &mut P, interrupt: &AtomicBool) -> SessionSummary {
        self.apply(SessionEvent::Opened);
        if let (Some(id), Some((width, height))) =
            (self.device.device_id(), self.device.resolution())
        {
            log::info!("Session live on camera {} at {}x{}", id, width, height);
        }

        while !self.state.is_terminated() {
            if interrupt.load(Ordering::SeqCst) {
                self.apply(SessionEvent::Interrupted);
                break;
            }
            self.step(preview);
        }

        self.terminate(preview)
    }

    fn step<P: PreviewSurface>(&mut self, preview: &mut P) {
        let mut frame = match self.device.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::debug!("Frame read failed: {}", e);
                preview.status("Could not read from camera");
                self.apply(SessionEvent::FrameFailed(e.to_string()));
                return;
            }
        };

        if self.settings.mirror {
            frame.mirror();
        }
        overlay::apply(&mut frame, &self.settings.title, self.photo_count);

        let polled = preview
            .present(&frame)
            .and_then(|()| preview.poll_command(self.settings.poll_interval));
        let command = match polled {
            Ok(command) => command,
            Err(e) => {
                log::debug!("Preview failed: {}", e);
                self.apply(SessionEvent::DisplayFailed(e.to_string()));
                return;
            }
        };

        if let Some(Effect::SavePhoto) = self.apply(SessionEvent::Command(command)) {
            self.capture(&frame, preview);
            self.apply(SessionEvent::CaptureDone);
        }
    }

    fn apply(&mut self, event: SessionEvent) -> Option<Effect> {
        let (next, effect) = transition(&self.state, event);
        if next != self.state {
            log::debug!("Session {:?} -> {:?}", self.state, next);
        }
        self.state = next;
        effect
    }

    /// Save the overlaid frame under the frame's own timestamp. The counter
    /// counts attempts, so a failed write still uses up its number.
    fn capture<P: PreviewSurface>(&mut self, frame: &CameraFrame, preview: &mut P) {
        let previous = self.photo_count;
        self.photo_count = self.photo_count.saturating_add(1);
        assert_invariant!(
            self.photo_count > previous,
            "Photo counter strictly increases",
            "session::capture"
        );

        preview.status("Taking photo");
        log::debug!(
            "Capturing frame {} from camera {}",
            frame.sequence,
            frame.device_id
        );
        let timestamp = frame.timestamp.naive_local();
        let outcome = match self.store.save(&frame.image, self.photo_count, &timestamp) {
            Ok(path) => CaptureOutcome::Saved(path),
            Err(BoothError::PhotoSaveFailure { path, reason }) => {
                CaptureOutcome::Failed(format!("{}: {}", path.display(), reason))
            }
            Err(e) => CaptureOutcome::Failed(e.to_string()),
        };
        preview.status(&outcome.to_string());
        self.captures.push(outcome);

        if !self.settings.capture_pause.is_zero() {
            thread::sleep(self.settings.capture_pause);
        }
    }

    fn terminate<P: PreviewSurface>(&mut self, preview: &mut P) -> SessionSummary {
        self.device.release();
        preview.close();

        let termination = match &self.state {
            SessionState::Terminated(reason) => reason.clone(),
            _ => TerminationReason::Quit,
        };
        log::info!(
            "Session ended ({:?}) with {} photo(s)",
            termination,
            self.photo_count
        );

        SessionSummary {
            photo_count: self.photo_count,
            captures: std::mem::take(&mut self.captures),
            output_directory: self.store.directory().to_path_buf(),
            termination,
        }
    }
}

/// Result of one capture attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Saved(PathBuf),
    Failed(String),
}

impl fmt::Display for CaptureOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureOutcome::Saved(path) => write!(f, "Photo saved: {}", path.display()),
            CaptureOutcome::Failed(cause) => write!(f, "Error saving photo: {}", cause),
        }
    }
}

/// One line of console output, either printed or announced through [`say`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    Text(String),
    Spoken(String),
}

impl ConsoleLine {
    fn text(line: impl Into<String>) -> Self {
        ConsoleLine::Text(line.into())
    }

    pub fn emit(&self) {
        match self {
            ConsoleLine::Text(line) => println!("{}", line),
            ConsoleLine::Spoken(message) => say(message),
        }
    }
}

impl fmt::Display for ConsoleLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleLine::Text(line) => f.write_str(line),
            ConsoleLine::Spoken(message) => f.write_str(&announcement(message)),
        }
    }
}

/// Outcome of one session, printed once the preview is gone.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub photo_count: u32,
    /// Every capture attempt, in order.
    pub captures: Vec<CaptureOutcome>,
    pub output_directory: PathBuf,
    pub termination: TerminationReason,
}

impl SessionSummary {
    pub fn saved(&self) -> Vec<&Path> {
        self.captures
            .iter()
            .filter_map(|c| match c {
                CaptureOutcome::Saved(path) => Some(path.as_path()),
                CaptureOutcome::Failed(_) => None,
            })
            .collect()
    }

    pub fn failed_saves(&self) -> usize {
        self.captures
            .iter()
            .filter(|c| matches!(c, CaptureOutcome::Failed(_)))
            .count()
    }

    pub fn console_lines(&self) -> Vec<ConsoleLine> {
        let mut lines = Vec::new();
        match &self.termination {
            TerminationReason::Quit => {}
            TerminationReason::Interrupted => lines.push(ConsoleLine::text("Booth stopped by user")),
            TerminationReason::FrameReadFailure(cause) => {
                lines.push(ConsoleLine::text(format!("Could not read from camera: {}", cause)))
            }
            TerminationReason::DisplayFailure(cause) => {
                lines.push(ConsoleLine::text(format!("Preview failed: {}", cause)))
            }
        }

        lines.extend(self.captures.iter().map(|c| ConsoleLine::text(c.to_string())));

        lines.push(ConsoleLine::text("Photo Booth Session Complete!"));
        lines.push(ConsoleLine::text(format!(
            "Total photos taken: {}",
            self.photo_count
        )));
        let failed = self.failed_saves();
        if failed > 0 {
            lines.push(ConsoleLine::text(format!(
                "Photos that failed to save: {}",
                failed
            )));
        }

        if self.photo_count > 0 {
            lines.push(ConsoleLine::text(format!(
                "Photos saved in: {}/",
                self.output_directory.display()
            )));
            lines.push(ConsoleLine::Spoken(format!(
                "Session complete! You took {} amazing photos!",
                self.photo_count
            )));
        } else {
            lines.push(ConsoleLine::Spoken(
                "Thanks for trying the photo booth!".to_string(),
            ));
        }

        lines.push(ConsoleLine::text("Thanks for using Pi Photo Booth!"));
        lines
    }

    /// Console lines as rendered text.
    pub fn lines(&self) -> Vec<String> {
        self.console_lines().iter().map(ToString::to_string).collect()
    }

    pub fn print(&self) {
        for line in self.console_lines() {
            line.emit();
        }
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines().join("\n"))
    }
}

/// Startup banner printed before the preview takes over the terminal.
pub fn banner() -> Vec<ConsoleLine> {
    let rule = "=".repeat(40);
    vec![
        ConsoleLine::text("Starting Pi Photo Booth"),
        ConsoleLine::text(rule.clone()),
        ConsoleLine::Spoken("Welcome to the Pi Photo Booth".to_string()),
        ConsoleLine::text("Controls:"),
        ConsoleLine::text(" Space = Take Photo"),
        ConsoleLine::text(" Q or ESC = Quit"),
        ConsoleLine::text(rule),
    ]
}

/// Text of a spoken announcement. There is no audio output; it is printed.
pub fn announcement(message: &str) -> String {
    format!("🔊 {}", message)
}

pub fn say(message: &str) {
    println!("{}", announcement(message));
}
