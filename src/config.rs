//! Experiment configuration for sperling.
//!
//! This module provides:
//! - TOML configuration file loading from `~/.sperling/config.toml`
//! - Validation of the raw file into a typed [`Experiment`]
//! - The fixed row-to-tone mapping used to cue a row
//!
//! # Configuration File
//!
//! The configuration file is located at `~/.sperling/config.toml`
//! (or wherever `SPERLING_CONFIG` points):
//!
//! ```toml
//! alphabet = "ABCDEFGHIJKLMNOPQRSTUVWXYZ"
//! rows = 3
//! cols = 4
//! n_trials = 10
//! mask_enabled = true
//! seed = 42
//!
//! [timing]
//! exposure = 0.5
//! onset_gap = 0.0
//! mask = 0.5
//!
//! [tones]
//! note = "C"
//! lowest_octave = 3
//!
//! [participant]
//! id = "P01"
//! ```
//!
//! All durations are in seconds. Missing keys fall back to the defaults of
//! the classic 3x4 letter experiment.

use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::stimulus::Alphabet;

/// Environment variable overriding the configuration file location
pub const CONFIG_ENV: &str = "SPERLING_CONFIG";

const DEFAULT_INSTRUCTIONS: &str = "You will be shown boards with letters. \
After that you will hear one of three tones: high, medium or low.\n\
The tone tells you which row to recall: high for the top row, \
low for the bottom row.\n\
Type the letters of that row and press Enter.\n\n\
Press space if you are ready";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Alphabet has {available} symbols but a {rows}x{cols} grid needs {needed}")]
    AlphabetTooSmall {
        available: usize,
        rows: usize,
        cols: usize,
        needed: usize,
    },

    #[error("Alphabet contains '{0}' more than once")]
    DuplicateSymbol(char),

    #[error("Alphabet contains a whitespace character")]
    WhitespaceSymbol,

    #[error("Grid must have at least one row and one column (got {rows}x{cols})")]
    EmptyGrid { rows: usize, cols: usize },

    #[error("Number of trials must be at least 1")]
    NoTrials,

    #[error("Duration for phase '{phase}' must be a finite non-negative number of seconds (got {value})")]
    InvalidDuration { phase: &'static str, value: f64 },

    #[error("Cannot assign tones to {rows} rows starting at octave {lowest_octave}")]
    ToneOutOfRange { rows: usize, lowest_octave: u8 },
}

/// Raw configuration as read from `config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Symbols the grid is drawn from
    pub alphabet: String,
    /// Grid rows
    pub rows: usize,
    /// Grid columns
    pub cols: usize,
    /// Trials per session
    pub n_trials: usize,
    /// Show the mask after the grid (a blank is shown otherwise)
    pub mask_enabled: bool,
    /// Random seed; drawn at startup when absent
    pub seed: Option<u64>,
    /// Results file; defaults to `~/.sperling/results.csv`
    pub results_path: Option<PathBuf>,
    /// Instruction text shown before the first trial
    pub instructions: Option<String>,
    /// Phase durations
    pub timing: TimingConfig,
    /// Cue tones
    pub tones: ToneConfig,
    /// Participant metadata copied into the result record
    pub participant: Participant,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alphabet: "ABCDEFGHIJKLMNOPQRSTUVWXYZ".to_string(),
            rows: 3,
            cols: 4,
            n_trials: 10,
            mask_enabled: true,
            seed: None,
            results_path: None,
            instructions: None,
            timing: TimingConfig::default(),
            tones: ToneConfig::default(),
            participant: Participant::default(),
        }
    }
}

/// Phase durations in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Gap after the instructions, before the first grid
    pub initial_gap: f64,
    /// Grid exposure
    pub exposure: f64,
    /// Stimulus-onset asynchrony between grid and mask
    pub onset_gap: f64,
    /// Mask (or blank) exposure
    pub mask: f64,
    /// Blank before the tone
    pub pre_cue: f64,
    /// Tone length
    pub tone: f64,
    /// Blank after the tone, before recall
    pub post_cue: f64,
    /// Inter-trial interval
    pub inter_trial: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            initial_gap: 1.0,
            exposure: 0.5,
            onset_gap: 0.0,
            mask: 0.5,
            pre_cue: 0.5,
            tone: 0.5,
            post_cue: 0.5,
            inter_trial: 1.0,
        }
    }
}

/// Cue tone configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneConfig {
    /// Note name played for every row
    pub note: String,
    /// Octave of the bottom row; each row above is one octave higher
    pub lowest_octave: u8,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            note: "C".to_string(),
            lowest_octave: 3,
        }
    }
}

/// Participant metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Participant {
    pub id: Option<String>,
    pub age: Option<u32>,
    pub sex: Option<String>,
}

impl Participant {
    /// Fields in record order, empty when absent
    pub fn fields(&self) -> Vec<String> {
        vec![
            self.id.clone().unwrap_or_default(),
            self.age.map(|a| a.to_string()).unwrap_or_default(),
            self.sex.clone().unwrap_or_default(),
        ]
    }
}

impl Config {
    /// Load configuration from the config file.
    ///
    /// A missing file yields the defaults; a file that exists but cannot be
    /// read or parsed is an error.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::get_config_path() {
            Some(path) if path.exists() => Self::load_from(path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        data_dir().map(|dir| dir.join("config.toml"))
    }

    /// Results file path, explicit or in the data directory
    pub fn results_path(&self) -> PathBuf {
        if let Some(ref path) = self.results_path {
            return path.clone();
        }
        data_dir()
            .map(|dir| dir.join("results.csv"))
            .unwrap_or_else(|| PathBuf::from("results.csv"))
    }

    /// Validate into a runnable experiment
    pub fn validate(&self) -> Result<Experiment, ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::EmptyGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.n_trials == 0 {
            return Err(ConfigError::NoTrials);
        }

        let alphabet = Alphabet::new(&self.alphabet)?;
        alphabet.check_fits(self.rows, self.cols)?;

        let timing = Timing::from_config(&self.timing)?;
        let tones = ToneMap::new(self.rows, &self.tones, timing.tone)?;

        Ok(Experiment {
            alphabet,
            rows: self.rows,
            cols: self.cols,
            n_trials: self.n_trials,
            mask_enabled: self.mask_enabled,
            timing,
            tones,
            instructions: self
                .instructions
                .clone()
                .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string()),
        })
    }

    /// Settings in record order
    pub fn settings_fields(&self, seed: u64) -> Vec<String> {
        let t = &self.timing;
        vec![
            self.rows.to_string(),
            self.cols.to_string(),
            self.alphabet.clone(),
            self.n_trials.to_string(),
            self.mask_enabled.to_string(),
            seed.to_string(),
            t.initial_gap.to_string(),
            t.exposure.to_string(),
            t.onset_gap.to_string(),
            t.mask.to_string(),
            t.pre_cue.to_string(),
            t.tone.to_string(),
            t.post_cue.to_string(),
            t.inter_trial.to_string(),
            self.tones.note.clone(),
            self.tones.lowest_octave.to_string(),
        ]
    }
}

/// Validated experiment parameters
#[derive(Debug, Clone)]
pub struct Experiment {
    pub alphabet: Alphabet,
    pub rows: usize,
    pub cols: usize,
    pub n_trials: usize,
    pub mask_enabled: bool,
    pub timing: Timing,
    pub tones: ToneMap,
    pub instructions: String,
}

/// Phase durations
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Timing {
    pub initial_gap: Duration,
    pub exposure: Duration,
    pub onset_gap: Duration,
    pub mask: Duration,
    pub pre_cue: Duration,
    pub tone: Duration,
    pub post_cue: Duration,
    pub inter_trial: Duration,
}

impl Timing {
    fn from_config(t: &TimingConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            initial_gap: seconds("initial_gap", t.initial_gap)?,
            exposure: seconds("exposure", t.exposure)?,
            onset_gap: seconds("onset_gap", t.onset_gap)?,
            mask: seconds("mask", t.mask)?,
            pre_cue: seconds("pre_cue", t.pre_cue)?,
            tone: seconds("tone", t.tone)?,
            post_cue: seconds("post_cue", t.post_cue)?,
            inter_trial: seconds("inter_trial", t.inter_trial)?,
        })
    }
}

fn seconds(phase: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidDuration { phase, value })
}

/// A cue tone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tone {
    pub note: String,
    pub octave: u8,
    pub duration: Duration,
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.note, self.octave)
    }
}

/// Row index to tone, highest pitch first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToneMap {
    tones: Vec<Tone>,
}

impl ToneMap {
    /// Build the map for `rows` rows; the bottom row gets `lowest_octave`
    pub fn new(rows: usize, config: &ToneConfig, duration: Duration) -> Result<Self, ConfigError> {
        let out_of_range = ConfigError::ToneOutOfRange {
            rows,
            lowest_octave: config.lowest_octave,
        };
        let top = u8::try_from(rows.saturating_sub(1))
            .ok()
            .and_then(|span| config.lowest_octave.checked_add(span))
            .ok_or(out_of_range)?;

        let tones = (0..rows)
            .map(|row| Tone {
                note: config.note.clone(),
                // row < rows, so the subtraction stays within [lowest_octave, top]
                octave: top - row as u8,
                duration,
            })
            .collect();
        Ok(Self { tones })
    }

    /// Tone for a row
    pub fn tone_for(&self, row: usize) -> Option<&Tone> {
        self.tones.get(row)
    }
}

/// Per-user data directory (`~/.sperling`), created on demand
pub fn data_dir() -> Option<PathBuf> {
    home_dir().map(|home| {
        let dir = home.join(".sperling");
        if !dir.exists() {
            let _ = fs::create_dir_all(&dir);
        }
        dir
    })
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let experiment = Config::default().validate().unwrap();
        assert_eq!(experiment.rows, 3);
        assert_eq!(experiment.cols, 4);
        assert_eq!(experiment.n_trials, 10);
        assert!(experiment.mask_enabled);
        assert_eq!(experiment.timing.exposure, Duration::from_millis(500));
        assert_eq!(experiment.timing.onset_gap, Duration::ZERO);
        assert_eq!(experiment.alphabet.len(), 26);
    }

    #[test]
    fn test_parse_partial_file() {
        let config: Config = toml::from_str(
            r#"
            alphabet = "1234567890"
            rows = 2
            cols = 3
            seed = 7

            [timing]
            exposure = 0.05

            [participant]
            id = "P01"
            age = 31
            "#,
        )
        .unwrap();

        assert_eq!(config.rows, 2);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.timing.exposure, 0.05);
        // untouched keys keep their defaults
        assert_eq!(config.timing.mask, 0.5);
        assert_eq!(config.n_trials, 10);
        assert_eq!(
            config.participant.fields(),
            vec!["P01".to_string(), "31".to_string(), String::new()]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_alphabet_too_small() {
        let config = Config {
            alphabet: "ABCDEFGHIJK".to_string(),
            ..Config::default()
        };
        match config.validate() {
            Err(ConfigError::AlphabetTooSmall { available, needed, .. }) => {
                assert_eq!(available, 11);
                assert_eq!(needed, 12);
            }
            other => panic!("expected AlphabetTooSmall, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        let config = Config {
            alphabet: "ABCDEFGHIJKLMA".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateSymbol('A'))));
    }

    #[test]
    fn test_invalid_durations() {
        let mut config = Config::default();
        config.timing.mask = -0.1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDuration { phase: "mask", .. })
        ));

        let mut config = Config::default();
        config.timing.pre_cue = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDuration { phase: "pre_cue", .. })
        ));
    }

    #[test]
    fn test_empty_grid_and_no_trials() {
        let config = Config {
            rows: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyGrid { .. })));

        let config = Config {
            n_trials: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoTrials)));
    }

    #[test]
    fn test_tone_map_descends_by_row() {
        let tones = ToneMap::new(3, &ToneConfig::default(), Duration::from_millis(500)).unwrap();
        let octaves: Vec<u8> = (0..3).map(|r| tones.tone_for(r).unwrap().octave).collect();
        assert_eq!(octaves, vec![5, 4, 3]);
        assert_eq!(tones.tone_for(0).unwrap().to_string(), "C5");
        assert!(tones.tone_for(3).is_none());
    }

    #[test]
    fn test_tone_map_overflow() {
        let config = ToneConfig {
            note: "A".to_string(),
            lowest_octave: 250,
        };
        assert!(matches!(
            ToneMap::new(10, &config, Duration::ZERO),
            Err(ConfigError::ToneOutOfRange { .. })
        ));
    }

    #[test]
    fn test_settings_fields_order() {
        let fields = Config::default().settings_fields(99);
        assert_eq!(fields.len(), 16);
        assert_eq!(fields[0], "3");
        assert_eq!(fields[1], "4");
        assert_eq!(fields[2], "ABCDEFGHIJKLMNOPQRSTUVWXYZ");
        assert_eq!(fields[4], "true");
        assert_eq!(fields[5], "99");
        assert_eq!(fields[7], "0.5");
        assert_eq!(&fields[14..], &["C", "3"]);
    }

    #[test]
    fn test_settings_fields_include_tones() {
        let config = Config {
            tones: ToneConfig {
                note: "A".to_string(),
                lowest_octave: 2,
            },
            ..Config::default()
        };
        let fields = config.settings_fields(1);
        assert_eq!(&fields[fields.len() - 2..], &["A", "2"]);
    }
}
