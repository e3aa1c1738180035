//! Trial phase sequencing
//!
//! A trial runs through fixed phases, one after the other:
//!
//! ```text
//! expose -> onset gap -> mask/blank -> pre-cue gap -> tone -> post-cue gap
//!        -> (recall) -> inter-trial interval
//! ```
//!
//! The blank shown in place of a disabled mask lasts exactly as long as the
//! mask would, and the onset gap applies either way, so the time from grid
//! onset to the tone does not depend on the mask setting.

use std::time::Duration;

use tracing::debug;

use crate::config::{Timing, Tone};
use crate::core::stimulus::Grid;
use crate::core::Result;
use crate::ui::{Flow, Screen, Surface};

/// One step of a trial
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Show the grid
    Expose(Duration),
    /// Blank between grid and mask
    OnsetGap(Duration),
    /// Show the mask
    Mask(Duration),
    /// Blank in place of the mask
    Blank(Duration),
    /// Blank before the tone
    PreCueGap(Duration),
    /// Play the row tone; takes no phase time
    Cue(Tone),
    /// Blank after the tone
    PostCueGap(Duration),
}

impl Phase {
    /// Time this phase blocks for
    pub fn duration(&self) -> Duration {
        match self {
            Phase::Expose(d)
            | Phase::OnsetGap(d)
            | Phase::Mask(d)
            | Phase::Blank(d)
            | Phase::PreCueGap(d)
            | Phase::PostCueGap(d) => *d,
            Phase::Cue(_) => Duration::ZERO,
        }
    }
}

/// Sequences the timed phases of a trial
#[derive(Debug, Clone)]
pub struct TrialClock {
    timing: Timing,
    mask_enabled: bool,
}

impl TrialClock {
    pub fn new(timing: Timing, mask_enabled: bool) -> Self {
        Self {
            timing,
            mask_enabled,
        }
    }

    /// Phases up to and including the post-cue gap. Zero-length phases are
    /// left out.
    pub fn plan(&self, tone: &Tone) -> Vec<Phase> {
        let t = &self.timing;
        let masking = if self.mask_enabled {
            Phase::Mask(t.mask)
        } else {
            Phase::Blank(t.mask)
        };
        [
            Phase::Expose(t.exposure),
            Phase::OnsetGap(t.onset_gap),
            masking,
            Phase::PreCueGap(t.pre_cue),
            Phase::Cue(tone.clone()),
            Phase::PostCueGap(t.post_cue),
        ]
        .into_iter()
        .filter(|phase| matches!(phase, Phase::Cue(_)) || !phase.duration().is_zero())
        .collect()
    }

    /// Total wait from grid onset to the tone
    #[allow(dead_code)]
    pub fn time_to_cue(plan: &[Phase]) -> Duration {
        plan.iter()
            .take_while(|phase| !matches!(phase, Phase::Cue(_)))
            .map(Phase::duration)
            .sum()
    }

    /// Run every phase before recall
    pub fn run_presentation<S: Surface>(
        &self,
        surface: &mut S,
        grid: &Grid,
        tone: &Tone,
    ) -> Result<Flow> {
        let mut shown: Option<Screen> = None;
        for phase in self.plan(tone) {
            debug!("phase {:?}", phase);
            // the tone and everything after it run on a blank screen, even
            // when the pre-cue gap is zero
            let screen = match &phase {
                Phase::Expose(_) => Screen::Grid(grid.render()),
                Phase::Mask(_) => Screen::Mask(grid.render_mask()),
                Phase::OnsetGap(_)
                | Phase::Blank(_)
                | Phase::PreCueGap(_)
                | Phase::Cue(_)
                | Phase::PostCueGap(_) => Screen::Blank,
            };
            if shown.as_ref() != Some(&screen) {
                surface.display(&screen)?;
                shown = Some(screen);
            }
            if let Phase::Cue(tone) = &phase {
                surface.play_tone(tone)?;
                continue;
            }
            if surface.wait(phase.duration())? == Flow::Cancelled {
                return Ok(Flow::Cancelled);
            }
        }
        Ok(Flow::Continue)
    }

    /// Blank pause after a scored trial
    pub fn run_inter_trial<S: Surface>(&self, surface: &mut S) -> Result<Flow> {
        pause(surface, self.timing.inter_trial)
    }
}

/// Show a blank screen for `duration`; zero skips the phase entirely
pub fn pause<S: Surface>(surface: &mut S, duration: Duration) -> Result<Flow> {
    if duration.is_zero() {
        return Ok(Flow::Continue);
    }
    surface.display(&Screen::Blank)?;
    Ok(surface.wait(duration)?)
}
