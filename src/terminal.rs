use crossterm::{
    cursor::{Hide, Show},
    event::{poll, read, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::io::{self, stdout};
use std::time::Duration;

/// Raw-mode terminal session for the render loop.
///
/// Raw mode keeps keypresses from echoing into the frame and lets the loop
/// see Ctrl+C as a key; the cursor is hidden while frames are drawn. Both
/// are restored on drop.
pub struct Terminal {
    _private: (),
}

impl Terminal {
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        if let Err(e) = execute!(stdout(), Hide) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        Ok(Self { _private: () })
    }

    /// Current terminal size as (cols, rows)
    pub fn size() -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }

    /// Check for keypress (non-blocking), returns (code, modifiers)
    pub fn check_key(&self) -> io::Result<Option<(KeyCode, KeyModifiers)>> {
        while poll(Duration::from_millis(0))? {
            if let Event::Key(key_event) = read()? {
                if key_event.kind != KeyEventKind::Release {
                    return Ok(Some((key_event.code, key_event.modifiers)));
                }
            }
        }
        Ok(None)
    }

    /// Drain pending input; true if any of it asks to quit
    pub fn quit_requested(&self) -> io::Result<bool> {
        while let Some((code, mods)) = self.check_key()? {
            if is_quit_key(code, mods) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = execute!(stdout(), Show);
        let _ = disable_raw_mode();
    }
}

/// q, Esc or Ctrl+C
pub fn is_quit_key(code: KeyCode, modifiers: KeyModifiers) -> bool {
    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => true,
        KeyCode::Char('c') | KeyCode::Char('C') => modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_keys() {
        assert!(is_quit_key(KeyCode::Char('q'), KeyModifiers::NONE));
        assert!(is_quit_key(KeyCode::Esc, KeyModifiers::NONE));
        assert!(is_quit_key(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!is_quit_key(KeyCode::Char('c'), KeyModifiers::NONE));
        assert!(!is_quit_key(KeyCode::Char(' '), KeyModifiers::NONE));
    }
}
