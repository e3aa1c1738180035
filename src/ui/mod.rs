//! Presentation and input handling.
//!
//! This module provides everything that touches the participant:
//!
//! - **surface**: the `Surface` trait, screens and keys
//! - **renderer**: crossterm terminal surface
//! - **keymapper**: crossterm key events to experiment keys
//! - **script**: recorded surface driven by scripted keys (tests only)

pub mod surface;
pub mod renderer;
pub mod keymapper;
#[cfg(test)]
pub mod script;

pub use surface::{Flow, Key, Screen, Surface};
pub use renderer::TerminalSurface;
