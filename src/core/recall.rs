//! Recall input editor
//!
//! The participant fills a fixed number of blanks, one character per slot,
//! and may step back with backspace. Enter is accepted only once every slot
//! is filled; escape abandons the trial.
//!
//! Keys arrive in batches (everything pending at one poll). Within a batch,
//! escape wins over backspace, backspace over enter; otherwise only the
//! first key is used and the rest of the batch is dropped.

use tracing::debug;

use crate::core::Result;
use crate::ui::{Key, Screen, Surface};

/// Placeholder drawn for an empty slot
const EMPTY_SLOT: char = '_';

/// Fixed-width answer being typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerBuffer {
    slots: Vec<Option<char>>,
    cursor: usize,
}

impl AnswerBuffer {
    pub fn new(width: usize) -> Self {
        Self {
            slots: vec![None; width],
            cursor: 0,
        }
    }

    /// Index of the next slot to fill
    #[allow(dead_code)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[allow(dead_code)]
    pub fn slots(&self) -> &[Option<char>] {
        &self.slots
    }

    pub fn is_full(&self) -> bool {
        self.cursor == self.slots.len()
    }

    fn push(&mut self, ch: char) -> bool {
        if self.is_full() {
            return false;
        }
        self.slots[self.cursor] = Some(ch);
        self.cursor += 1;
        true
    }

    fn pop(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.slots[self.cursor] = None;
        true
    }

    /// Filled slots as a string, without separators
    pub fn text(&self) -> String {
        self.slots.iter().flatten().collect()
    }

    /// Slots separated by spaces, `_` for empty ones
    pub fn render(&self) -> String {
        self.slots
            .iter()
            .map(|slot| slot.unwrap_or(EMPTY_SLOT).to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of feeding one batch of keys to the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed
    Ignored,
    /// The buffer changed and must be redrawn
    Edited,
    Submitted,
    Cancelled,
}

/// How recall ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recall {
    Submitted(String),
    Cancelled,
}

/// Keystroke-driven fill-in-the-blank editor
#[derive(Debug, Clone)]
pub struct RecallEditor {
    buffer: AnswerBuffer,
}

impl RecallEditor {
    pub fn new(width: usize) -> Self {
        Self {
            buffer: AnswerBuffer::new(width),
        }
    }

    #[allow(dead_code)]
    pub fn buffer(&self) -> &AnswerBuffer {
        &self.buffer
    }

    /// Apply one poll's worth of keys
    pub fn apply(&mut self, keys: &[Key]) -> Transition {
        let Some(first) = keys.first() else {
            return Transition::Ignored;
        };

        if keys.contains(&Key::Escape) {
            return Transition::Cancelled;
        }
        if keys.contains(&Key::Backspace) {
            return if self.buffer.pop() {
                Transition::Edited
            } else {
                Transition::Ignored
            };
        }
        if keys.contains(&Key::Return) {
            return if self.buffer.is_full() {
                Transition::Submitted
            } else {
                Transition::Ignored
            };
        }

        match first {
            Key::Char(ch) if !ch.is_control() => {
                if self.buffer.push(uppercase(*ch)) {
                    Transition::Edited
                } else {
                    Transition::Ignored
                }
            }
            _ => Transition::Ignored,
        }
    }

    /// Drive the editor from `surface` until the answer is submitted or
    /// escape is pressed
    pub fn run<S: Surface>(mut self, surface: &mut S) -> Result<Recall> {
        surface.display(&Screen::Answer(self.buffer.render()))?;
        loop {
            let keys = surface.poll_keys()?;
            match self.apply(&keys) {
                Transition::Ignored => {}
                Transition::Edited => {
                    debug!("answer buffer: {}", self.buffer.render());
                    surface.display(&Screen::Answer(self.buffer.render()))?;
                }
                Transition::Submitted => return Ok(Recall::Submitted(self.buffer.text())),
                Transition::Cancelled => return Ok(Recall::Cancelled),
            }
        }
    }
}

/// Uppercase a character, keeping it as-is when the uppercase form is not a
/// single character
fn uppercase(ch: char) -> char {
    let mut upper = ch.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => ch,
    }
}
