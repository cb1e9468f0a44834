//! Keyboard bindings.
//!
//! - Space: take a photo
//! - `q` or Esc: quit
//! - Ctrl+C: interrupt (raw mode swallows the signal, so it arrives as a key)

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoothCommand {
    Capture,
    Quit,
    Interrupt,
}

/// Map a key event to a booth command. Unbound keys and key releases yield `None`.
pub fn command_for_key(event: KeyEvent) -> Option<BoothCommand> {
    if event.kind == KeyEventKind::Release {
        return None;
    }

    if event.modifiers.contains(KeyModifiers::CONTROL) {
        return match event.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(BoothCommand::Interrupt),
            _ => None,
        };
    }

    match event.code {
        KeyCode::Char(' ') => Some(BoothCommand::Capture),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(BoothCommand::Quit),
        _ => None,
    }
}
