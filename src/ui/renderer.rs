//! Terminal surface using crossterm
//!
//! Draws experiment screens centered in the console and reads keys from the
//! crossterm event queue.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event},
    execute, queue,
    style::{Attribute, Print, ResetColor, SetAttribute},
    terminal::{
        self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use tracing::debug;
use unicode_width::UnicodeWidthStr;

use crate::config::Tone;
use crate::ui::keymapper::KeyMapper;
use crate::ui::surface::{Flow, Key, Screen, Surface};

/// Rows between the screen center and the answer board
const ANSWER_OFFSET: u16 = 4;

/// Full-screen terminal surface
pub struct TerminalSurface {
    /// Whether the terminal has been initialized
    initialized: bool,
}

impl Default for TerminalSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self { initialized: false }
    }

    /// Initialize the terminal for the experiment
    pub fn init(&mut self) -> io::Result<()> {
        self.enter(terminal::enable_raw_mode, &mut io::stdout())?;
        debug!("terminal initialized");
        Ok(())
    }

    /// Raw mode first, then screen setup on `out`. Once raw mode is on the
    /// surface counts as initialized, so a failed setup is still undone.
    fn enter<W: Write>(
        &mut self,
        enable_raw_mode: impl FnOnce() -> io::Result<()>,
        out: &mut W,
    ) -> io::Result<()> {
        enable_raw_mode()?;
        self.initialized = true;

        execute!(
            out,
            EnterAlternateScreen,
            DisableLineWrap,
            Hide,
            Clear(ClearType::All),
            MoveTo(0, 0)
        )?;
        out.flush()
    }

    /// Cleanup the terminal
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;

        let mut stdout = io::stdout();

        // Reset all attributes first
        let _ = execute!(stdout, ResetColor, SetAttribute(Attribute::Reset));
        let _ = execute!(stdout, Show);
        let _ = execute!(stdout, EnableLineWrap);
        let _ = execute!(stdout, LeaveAlternateScreen);
        let _ = stdout.flush();

        // Disable raw mode - this is the most important part
        terminal::disable_raw_mode()?;
        debug!("terminal restored");
        Ok(())
    }

    /// Get terminal size
    pub fn size() -> io::Result<(u16, u16)> {
        terminal::size()
    }

    /// Draw `text` centered, with its block shifted down by `offset` rows
    fn draw_centered(&self, text: &str, offset: u16) -> io::Result<()> {
        let (cols, rows) = Self::size()?;
        let lines: Vec<&str> = text.lines().collect();
        let height = lines.len() as u16;
        let top = (rows.saturating_sub(height) / 2).saturating_add(offset);

        let mut stdout = io::stdout();
        queue!(stdout, Clear(ClearType::All))?;
        for (i, line) in lines.iter().enumerate() {
            let width = UnicodeWidthStr::width(*line) as u16;
            let left = cols.saturating_sub(width) / 2;
            queue!(stdout, MoveTo(left, top.saturating_add(i as u16)), Print(line))?;
        }
        stdout.flush()
    }

    /// Wrap long message lines to fit 90% of the terminal width
    fn wrap(text: &str, max_width: usize) -> String {
        let mut out = Vec::new();
        for paragraph in text.split('\n') {
            let mut line = String::new();
            for word in paragraph.split_whitespace() {
                let needed = UnicodeWidthStr::width(line.as_str())
                    + UnicodeWidthStr::width(word)
                    + usize::from(!line.is_empty());
                if !line.is_empty() && needed > max_width {
                    out.push(std::mem::take(&mut line));
                }
                if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(word);
            }
            out.push(line);
        }
        out.join("\n")
    }

    /// Read one key event, if it maps to a key
    fn read_key() -> io::Result<Option<Key>> {
        match event::read()? {
            Event::Key(key_event) => Ok(KeyMapper::map(&key_event)),
            _ => Ok(None),
        }
    }
}

impl Surface for TerminalSurface {
    fn display(&mut self, screen: &Screen) -> io::Result<()> {
        match screen {
            Screen::Blank => {
                let mut stdout = io::stdout();
                execute!(stdout, Clear(ClearType::All))
            }
            Screen::Grid(text) | Screen::Mask(text) => self.draw_centered(text, 0),
            Screen::Answer(text) => self.draw_centered(text, ANSWER_OFFSET),
            Screen::Message(text) => {
                let (cols, _) = Self::size()?;
                let width = (cols as usize * 9 / 10).max(1);
                self.draw_centered(&Self::wrap(text, width), 0)
            }
        }
    }

    fn play_tone(&mut self, tone: &Tone) -> io::Result<()> {
        // Terminal bell; pitch is carried by the tone map for audio-capable surfaces
        debug!("tone {} for {:?}", tone, tone.duration);
        let mut stdout = io::stdout();
        write!(stdout, "\x07")?;
        stdout.flush()
    }

    fn wait(&mut self, duration: Duration) -> io::Result<Flow> {
        let deadline = Instant::now() + duration;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(Flow::Continue);
            }
            if event::poll(remaining)? && Self::read_key()? == Some(Key::Escape) {
                return Ok(Flow::Cancelled);
            }
        }
    }

    fn poll_keys(&mut self) -> io::Result<Vec<Key>> {
        let mut keys = Vec::new();
        // Block for the first key, then take whatever else is already queued
        while keys.is_empty() {
            if let Some(key) = Self::read_key()? {
                keys.push(key);
            }
        }
        while event::poll(Duration::ZERO)? {
            if let Some(key) = Self::read_key()? {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
