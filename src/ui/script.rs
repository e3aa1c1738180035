//! Scripted surface for tests
//!
//! Replays prepared key batches and records everything the experiment asks
//! the surface to do, without touching the terminal.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crate::config::Tone;
use crate::ui::surface::{Flow, Key, Screen, Surface};

/// One recorded surface call
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Display(Screen),
    Tone(Tone),
    Wait(Duration),
}

#[derive(Default)]
pub struct ScriptedSurface {
    batches: VecDeque<Vec<Key>>,
    /// Every call in order
    pub log: Vec<Recorded>,
    cancel_at_wait: Option<usize>,
    waits: usize,
}

impl ScriptedSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// One batch per key name
    pub fn with_keys(names: &[&str]) -> Self {
        let mut surface = Self::new();
        for name in names {
            surface.push_batch(&[*name]);
        }
        surface
    }

    /// Queue keys that arrive together in a single poll
    pub fn push_batch(&mut self, names: &[&str]) {
        self.batches
            .push_back(names.iter().map(|n| Key::from_name(n)).collect());
    }

    /// Make the `index`-th wait (zero-based) report escape
    pub fn cancel_on_wait(mut self, index: usize) -> Self {
        self.cancel_at_wait = Some(index);
        self
    }

    pub fn screens(&self) -> Vec<&Screen> {
        self.log
            .iter()
            .filter_map(|r| match r {
                Recorded::Display(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn tones(&self) -> Vec<&Tone> {
        self.log
            .iter()
            .filter_map(|r| match r {
                Recorded::Tone(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.log
            .iter()
            .filter_map(|r| match r {
                Recorded::Wait(d) => Some(*d),
                _ => None,
            })
            .collect()
    }

    pub fn pending_batches(&self) -> usize {
        self.batches.len()
    }
}

impl Surface for ScriptedSurface {
    fn display(&mut self, screen: &Screen) -> io::Result<()> {
        self.log.push(Recorded::Display(screen.clone()));
        Ok(())
    }

    fn play_tone(&mut self, tone: &Tone) -> io::Result<()> {
        self.log.push(Recorded::Tone(tone.clone()));
        Ok(())
    }

    fn wait(&mut self, duration: Duration) -> io::Result<Flow> {
        self.log.push(Recorded::Wait(duration));
        let index = self.waits;
        self.waits += 1;
        if self.cancel_at_wait == Some(index) {
            return Ok(Flow::Cancelled);
        }
        Ok(Flow::Continue)
    }

    fn poll_keys(&mut self) -> io::Result<Vec<Key>> {
        self.batches
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "key script exhausted"))
    }
}
