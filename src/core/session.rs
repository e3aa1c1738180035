//! Session: instructions, then N trials, then the aggregate result.

use tracing::info;

use crate::config::Experiment;
use crate::core::clock;
use crate::core::trial::{TrialOutcome, TrialResult, TrialRunner};
use crate::core::Result;
use crate::ui::{Flow, Key, Screen, Surface};

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running(usize),
    Completed,
    CancelledEarly,
}

/// Trials of a session with at least one scored trial
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    /// Scored trials in the order they ran
    pub trials: Vec<TrialResult>,
    /// Escape ended the session before all trials ran
    pub cancelled: bool,
}

impl SessionResult {
    pub fn trials_completed(&self) -> usize {
        self.trials.len()
    }

    pub fn trials_correct(&self) -> usize {
        self.trials.iter().filter(|t| t.correct).count()
    }

    pub fn letters_correct(&self) -> usize {
        self.trials.iter().map(|t| t.characters_matched).sum()
    }

    /// Whole-number percentage of correct trials, rounded down
    pub fn percent_correct(&self) -> usize {
        if self.trials.is_empty() {
            return 0;
        }
        self.trials_correct() * 100 / self.trials_completed()
    }
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Finished(SessionResult),
    /// Cancelled before any trial was scored
    NoData,
}

/// Runs a whole session
pub struct SessionController<'a> {
    experiment: &'a Experiment,
    runner: TrialRunner<'a>,
    state: SessionState,
}

impl<'a> SessionController<'a> {
    pub fn new(experiment: &'a Experiment, seed: u64) -> Self {
        Self {
            experiment,
            runner: TrialRunner::new(experiment, seed),
            state: SessionState::Idle,
        }
    }

    #[allow(dead_code)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Show the instructions, wait for space, then run the trials
    pub fn run<S: Surface>(&mut self, surface: &mut S) -> Result<SessionOutcome> {
        let mut trials = Vec::new();

        if self.introduce(surface)? == Flow::Continue {
            for index in 0..self.experiment.n_trials {
                self.state = SessionState::Running(index);
                match self.runner.run_trial(surface, index)? {
                    TrialOutcome::Completed { result, stop } => {
                        trials.push(result);
                        if stop {
                            // escape after the last trial skips nothing
                            if index + 1 < self.experiment.n_trials {
                                self.state = SessionState::CancelledEarly;
                            }
                            break;
                        }
                    }
                    TrialOutcome::Cancelled => {
                        self.state = SessionState::CancelledEarly;
                        break;
                    }
                }
            }
        } else {
            self.state = SessionState::CancelledEarly;
        }

        let cancelled = self.state == SessionState::CancelledEarly;
        if !cancelled {
            self.state = SessionState::Completed;
        }
        info!(
            "session ended: {} of {} trials completed{}",
            trials.len(),
            self.experiment.n_trials,
            if cancelled { " (cancelled)" } else { "" }
        );

        if trials.is_empty() {
            return Ok(SessionOutcome::NoData);
        }
        Ok(SessionOutcome::Finished(SessionResult { trials, cancelled }))
    }

    /// Instruction screen and initial gap
    fn introduce<S: Surface>(&self, surface: &mut S) -> Result<Flow> {
        surface.display(&Screen::Message(self.experiment.instructions.clone()))?;
        loop {
            let keys = surface.poll_keys()?;
            if keys.contains(&Key::Escape) {
                info!("session cancelled at instructions");
                return Ok(Flow::Cancelled);
            }
            if keys.contains(&Key::Space) {
                break;
            }
        }
        clock::pause(surface, self.experiment.timing.initial_gap)
    }
}
