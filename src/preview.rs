//! Live preview surface.
//!
//! [`TerminalPreview`] draws frames into the controlling terminal's alternate
//! screen using upper-half-block cells (two pixels per cell, foreground over
//! background, 24-bit colour) and keeps one status row at the bottom.

use std::io::{self, Stdout, Write};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{
    self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use image::imageops::{self, FilterType};
use image::Rgb;

use crate::errors::BoothError;
use crate::input::{command_for_key, BoothCommand};
use crate::types::CameraFrame;

/// Where frames are shown and keys are read.
pub trait PreviewSurface {
    fn present(&mut self, frame: &CameraFrame) -> Result<(), BoothError>;

    /// Wait at most `timeout` for one key and translate it.
    fn poll_command(&mut self, timeout: Duration) -> Result<Option<BoothCommand>, BoothError>;

    /// Show a one-line status message next to the preview.
    fn status(&mut self, line: &str);

    /// Dismiss the surface. Must be safe to call more than once.
    fn close(&mut self);
}

static SCREEN_ACTIVE: AtomicBool = AtomicBool::new(false);

pub struct TerminalPreview {
    out: Stdout,
    active: bool,
    status: String,
    needs_clear: bool,
}

impl TerminalPreview {
    /// Take over the terminal: raw mode, alternate screen, hidden cursor.
    pub fn open() -> Result<Self, BoothError> {
        install_panic_hook();

        enable_raw_mode().map_err(display_err("enable raw mode"))?;
        SCREEN_ACTIVE.store(true, Ordering::SeqCst);

        let mut out = io::stdout();
        if let Err(e) = execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All)) {
            restore_terminal();
            return Err(display_err("enter alternate screen")(e));
        }

        Ok(Self {
            out,
            active: true,
            status: String::new(),
            needs_clear: false,
        })
    }

    fn draw(&mut self, frame: &CameraFrame) -> io::Result<()> {
        let (cols, rows) = terminal::size()?;
        if cols == 0 || rows < 2 {
            return Ok(());
        }

        if self.needs_clear {
            queue!(self.out, ResetColor, Clear(ClearType::All))?;
            self.needs_clear = false;
        }

        let bounds = (u32::from(cols), u32::from(rows - 1) * 2);
        let (width, height) = fit_within(frame.dimensions(), bounds);
        let scaled = imageops::resize(&frame.image, width, height, FilterType::Nearest);

        let mut last: Option<(Rgb<u8>, Rgb<u8>)> = None;
        for cell_row in 0..height.div_ceil(2) {
            queue!(self.out, MoveTo(0, cell_row as u16))?;
            let y = cell_row * 2;
            for x in 0..width {
                let top = *scaled.get_pixel(x, y);
                let bottom = if y + 1 < height {
                    *scaled.get_pixel(x, y + 1)
                } else {
                    Rgb([0, 0, 0])
                };
                if last != Some((top, bottom)) {
                    queue!(
                        self.out,
                        SetForegroundColor(to_color(top)),
                        SetBackgroundColor(to_color(bottom))
                    )?;
                    last = Some((top, bottom));
                }
                queue!(self.out, Print('▀'))?;
            }
        }

        let status: String = self.status.chars().take(cols as usize).collect();
        queue!(
            self.out,
            ResetColor,
            MoveTo(0, rows - 1),
            Clear(ClearType::CurrentLine),
            Print(status)
        )?;
        self.out.flush()
    }
}

impl PreviewSurface for TerminalPreview {
    fn present(&mut self, frame: &CameraFrame) -> Result<(), BoothError> {
        if !self.active {
            return Err(BoothError::Display("preview already closed".to_string()));
        }
        self.draw(frame).map_err(display_err("draw frame"))
    }

    fn poll_command(&mut self, timeout: Duration) -> Result<Option<BoothCommand>, BoothError> {
        if !event::poll(timeout).map_err(display_err("poll input"))? {
            return Ok(None);
        }
        match event::read().map_err(display_err("read input"))? {
            Event::Key(key) => Ok(command_for_key(key)),
            Event::Resize(_, _) => {
                self.needs_clear = true;
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn status(&mut self, line: &str) {
        log::info!("{}", line);
        self.status = line.to_string();
    }

    fn close(&mut self) {
        if self.active {
            self.active = false;
            restore_terminal();
        }
    }
}

impl Drop for TerminalPreview {
    fn drop(&mut self) {
        self.close();
    }
}

/// Largest size with the source aspect ratio that fits inside `bounds`.
pub fn fit_within(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (sw, sh) = source;
    let (bw, bh) = bounds;
    if sw == 0 || sh == 0 || bw == 0 || bh == 0 {
        return (0, 0);
    }

    let (sw, sh, bw, bh) = (sw as u64, sh as u64, bw as u64, bh as u64);
    let (width, height) = if sw * bh >= bw * sh {
        (bw, sh * bw / sw)
    } else {
        (sw * bh / sh, bh)
    };
    (
        width.clamp(1, bw) as u32,
        height.clamp(1, bh) as u32,
    )
}

fn to_color(pixel: Rgb<u8>) -> Color {
    let [r, g, b] = pixel.0;
    Color::Rgb { r, g, b }
}

fn display_err(action: &'static str) -> impl Fn(io::Error) -> BoothError {
    move |e| BoothError::Display(format!("Failed to {}: {}", action, e))
}

fn restore_terminal() {
    if SCREEN_ACTIVE.swap(false, Ordering::SeqCst) {
        // Best-effort: the terminal may already be gone
        let _ = execute!(io::stdout(), ResetColor, Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Restore the terminal before the default panic output is printed.
fn install_panic_hook() {
    static HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);
    if HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }

    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        restore_terminal();
        original_hook(info);
    }));
}
