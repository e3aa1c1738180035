//! Single trial: present, cue, recall, score.

use tracing::{debug, info};

use crate::config::Experiment;
use crate::core::clock::TrialClock;
use crate::core::recall::{Recall, RecallEditor};
use crate::core::stimulus::StimulusGenerator;
use crate::core::{ExperimentError, Result};
use crate::ui::{Flow, Surface};

/// Score of one completed trial
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialResult {
    /// Zero-based trial index within the session
    pub index: usize,
    /// Row that was cued
    pub cue: usize,
    /// Characters of the cued row
    pub ground_truth: String,
    /// What the participant typed
    pub response: String,
    /// Response equals the cued row
    pub correct: bool,
    /// Positions where response and cued row agree
    pub characters_matched: usize,
}

/// How a trial ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialOutcome {
    /// Scored; `stop` is set when escape was pressed during the
    /// inter-trial interval
    Completed { result: TrialResult, stop: bool },
    /// Escape before the answer was submitted; nothing is scored
    Cancelled,
}

/// Compare a response to the ground truth position by position
pub fn score(response: &str, ground_truth: &str) -> (bool, usize) {
    let matched = response
        .chars()
        .zip(ground_truth.chars())
        .filter(|(a, b)| a == b)
        .count();
    (response == ground_truth, matched)
}

/// Runs trials for one experiment
pub struct TrialRunner<'a> {
    experiment: &'a Experiment,
    generator: StimulusGenerator,
    clock: TrialClock,
}

impl<'a> TrialRunner<'a> {
    pub fn new(experiment: &'a Experiment, seed: u64) -> Self {
        Self {
            experiment,
            generator: StimulusGenerator::from_seed(seed),
            clock: TrialClock::new(experiment.timing, experiment.mask_enabled),
        }
    }

    /// Run trial `index` from grid onset through the inter-trial interval
    pub fn run_trial<S: Surface>(&mut self, surface: &mut S, index: usize) -> Result<TrialOutcome> {
        let exp = self.experiment;
        let stimulus = self.generator.generate(&exp.alphabet, exp.rows, exp.cols)?;
        debug!(
            "trial {}: cue row {}, grid {:?}",
            index,
            stimulus.cue,
            stimulus.grid.render()
        );

        let tone = exp
            .tones
            .tone_for(stimulus.cue)
            .ok_or(ExperimentError::NoTone(stimulus.cue))?;

        if self.clock.run_presentation(surface, &stimulus.grid, tone)? == Flow::Cancelled {
            info!("trial {} cancelled during presentation", index);
            return Ok(TrialOutcome::Cancelled);
        }

        let response = match RecallEditor::new(exp.cols).run(surface)? {
            Recall::Submitted(response) => response,
            Recall::Cancelled => {
                info!("trial {} cancelled during recall", index);
                return Ok(TrialOutcome::Cancelled);
            }
        };

        let (correct, characters_matched) = score(&response, &stimulus.ground_truth);
        info!(
            "trial {}: cue {} expected {} got {} ({}, {} matched)",
            index,
            stimulus.cue,
            stimulus.ground_truth,
            response,
            if correct { "correct" } else { "wrong" },
            characters_matched
        );

        let result = TrialResult {
            index,
            cue: stimulus.cue,
            ground_truth: stimulus.ground_truth,
            response,
            correct,
            characters_matched,
        };

        let stop = self.clock.run_inter_trial(surface)? == Flow::Cancelled;
        if stop {
            info!("session cancelled during inter-trial interval after trial {}", index);
        }
        Ok(TrialOutcome::Completed { result, stop })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ToneConfig, ToneMap};
    use crate::core::stimulus::StimulusGenerator;
    use crate::ui::script::ScriptedSurface;
    use crate::ui::Screen;

    fn experiment() -> Experiment {
        Config {
            rows: 3,
            cols: 3,
            ..Config::default()
        }
        .validate()
        .unwrap()
    }

    /// The stimulus a runner seeded with `seed` will draw first
    fn first_stimulus(exp: &Experiment, seed: u64) -> crate::core::stimulus::Stimulus {
        StimulusGenerator::from_seed(seed)
            .generate(&exp.alphabet, exp.rows, exp.cols)
            .unwrap()
    }

    fn type_answer(answer: &str) -> Vec<String> {
        let mut names: Vec<String> = answer.chars().map(|c| c.to_string()).collect();
        names.push("return".to_string());
        names
    }

    fn surface_typing(answer: &str) -> ScriptedSurface {
        let names = type_answer(answer);
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        ScriptedSurface::with_keys(&refs)
    }

    #[test]
    fn test_score_examples() {
        assert_eq!(score("BDF", "BDF"), (true, 3));
        assert_eq!(score("BDX", "BDF"), (false, 2));
        assert_eq!(score("XXX", "BDF"), (false, 0));
        assert_eq!(score("DBF", "BDF"), (false, 1));
    }

    #[test]
    fn test_correct_trial() {
        let exp = experiment();
        let stimulus = first_stimulus(&exp, 11);
        let mut surface = surface_typing(&stimulus.ground_truth.to_lowercase());

        let outcome = TrialRunner::new(&exp, 11).run_trial(&mut surface, 0).unwrap();
        match outcome {
            TrialOutcome::Completed { result, stop } => {
                assert!(!stop);
                assert!(result.correct);
                assert_eq!(result.characters_matched, 3);
                assert_eq!(result.cue, stimulus.cue);
                assert_eq!(result.response, stimulus.ground_truth);
            }
            other => panic!("expected completed trial, got {:?}", other),
        }

        // grid first, tone for the cued row, inter-trial pause last
        assert_eq!(surface.screens()[0], &Screen::Grid(stimulus.grid.render()));
        let tones = surface.tones();
        assert_eq!(tones.len(), 1);
        assert_eq!(tones[0], exp.tones.tone_for(stimulus.cue).unwrap());
        assert_eq!(surface.waits().last(), Some(&exp.timing.inter_trial));
    }

    #[test]
    fn test_partial_credit() {
        let exp = experiment();
        let stimulus = first_stimulus(&exp, 12);
        // first two characters right, last one replaced by a symbol outside the alphabet
        let mut answer: String = stimulus.ground_truth.chars().take(2).collect();
        answer.push('9');
        let mut surface = surface_typing(&answer);

        match TrialRunner::new(&exp, 12).run_trial(&mut surface, 0).unwrap() {
            TrialOutcome::Completed { result, .. } => {
                assert!(!result.correct);
                assert_eq!(result.characters_matched, 2);
            }
            other => panic!("expected completed trial, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_tone_fails_before_presentation() {
        let mut exp = experiment();
        exp.tones = ToneMap::new(0, &ToneConfig::default(), exp.timing.tone).unwrap();
        let cue = first_stimulus(&exp, 7).cue;
        let mut surface = ScriptedSurface::new();

        let err = TrialRunner::new(&exp, 7).run_trial(&mut surface, 0).unwrap_err();
        assert!(matches!(err, ExperimentError::NoTone(row) if row == cue));
        assert!(surface.log.is_empty());
    }

    #[test]
    fn test_cancel_during_recall_skips_inter_trial() {
        let exp = experiment();
        let mut surface = ScriptedSurface::with_keys(&["a", "escape"]);
        let outcome = TrialRunner::new(&exp, 1).run_trial(&mut surface, 0).unwrap();
        assert_eq!(outcome, TrialOutcome::Cancelled);
        assert!(!surface.waits().contains(&exp.timing.inter_trial));
    }

    #[test]
    fn test_cancel_during_presentation() {
        let exp = experiment();
        let mut surface = ScriptedSurface::new().cancel_on_wait(0);
        let outcome = TrialRunner::new(&exp, 1).run_trial(&mut surface, 0).unwrap();
        assert_eq!(outcome, TrialOutcome::Cancelled);
        // recall never started
        assert!(!surface
            .screens()
            .iter()
            .any(|s| matches!(s, Screen::Answer(_))));
    }

    #[test]
    fn test_cancel_during_inter_trial_keeps_result() {
        let exp = experiment();
        // exposure, mask, pre-cue, post-cue, then the inter-trial wait
        let mut surface = surface_typing("ABC").cancel_on_wait(4);
        match TrialRunner::new(&exp, 3).run_trial(&mut surface, 0).unwrap() {
            TrialOutcome::Completed { stop, .. } => assert!(stop),
            other => panic!("expected completed trial, got {:?}", other),
        }
    }
}
