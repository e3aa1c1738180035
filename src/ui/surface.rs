//! Presentation surface abstraction
//!
//! The experiment core only talks to a [`Surface`]: it shows a screen,
//! plays a tone, waits, and reads keys. The terminal implementation lives in
//! `renderer`; tests use the scripted one.

use std::io;
use std::time::Duration;

use crate::config::Tone;

/// What is currently shown to the participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Nothing displayed
    Blank,
    /// The stimulus grid
    Grid(String),
    /// The mask shown after the grid
    Mask(String),
    /// The recall board being filled in
    Answer(String),
    /// Instructions or other text
    Message(String),
}

/// A key as seen by the experiment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    Backspace,
    Return,
    Space,
    /// A single printable character
    Char(char),
    /// Any other named key (arrows, function keys, chords)
    Named(String),
}

impl Key {
    /// Parse a key name: `escape`, `backspace`, `return`, `space`, or a
    /// single character
    #[allow(dead_code)]
    pub fn from_name(name: &str) -> Self {
        match name {
            "escape" => Key::Escape,
            "backspace" => Key::Backspace,
            "return" => Key::Return,
            "space" => Key::Space,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(' '), None) => Key::Space,
                    (Some(ch), None) => Key::Char(ch),
                    _ => Key::Named(name.to_string()),
                }
            }
        }
    }
}

/// Whether a timed phase ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Cancelled,
}

/// Display, audio and input for one participant.
///
/// All calls block the single control thread.
pub trait Surface {
    /// Replace whatever is shown with `screen`
    fn display(&mut self, screen: &Screen) -> io::Result<()>;

    /// Start a tone; returns without waiting for it to finish
    fn play_tone(&mut self, tone: &Tone) -> io::Result<()>;

    /// Block for `duration`. Returns `Flow::Cancelled` as soon as escape is
    /// pressed; other keys pressed meanwhile are discarded.
    fn wait(&mut self, duration: Duration) -> io::Result<Flow>;

    /// Block until at least one key is available, then return every key
    /// pending at that moment, oldest first
    fn poll_keys(&mut self) -> io::Result<Vec<Key>>;
}
