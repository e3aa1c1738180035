//! Core experiment logic.
//!
//! This module contains the trial state machine:
//!
//! - **stimulus**: grid generation and cue selection
//! - **clock**: timed phase sequencing within a trial
//! - **recall**: keystroke-driven answer editor
//! - **trial**: one trial end-to-end, with scoring
//! - **session**: N trials, cancellation and aggregation
//!
//! # Architecture
//!
//! ```text
//! SessionController
//! └── TrialRunner
//!     ├── StimulusGenerator (grid + cue)
//!     ├── TrialClock (expose, mask, tone, gaps)
//!     └── RecallEditor (answer buffer)
//! ```
//!
//! Everything runs on one thread against a `Surface`; escape travels back up
//! as a `Cancelled` value, never as an error.

pub mod stimulus;
pub mod clock;
pub mod recall;
pub mod trial;
pub mod session;

use std::io;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum ExperimentError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The experiment's tone map has fewer rows than its grid. `validate`
    /// never builds one, but `Experiment` fields are public.
    #[error("No tone configured for row {0}")]
    NoTone(usize),

    #[error("Presentation surface failed: {0}")]
    Surface(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ExperimentError>;
