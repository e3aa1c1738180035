//! Session result records
//!
//! One CSV row per session, appended to the results file:
//!
//! ```text
//! timeCode, lettersCorrect, trialsCorrect, <settings...>, <participant...>, <trials...>, <letters...>
//! ```

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::config::Config;
use crate::core::session::SessionResult;

/// Time code format used to tag a session
const TIME_CODE_FORMAT: &str = "%Y%m%d%H%M";

/// Current local time as a session time code
pub fn time_code() -> String {
    Local::now().format(TIME_CODE_FORMAT).to_string()
}

/// A finished session, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub time_code: String,
    pub letters_correct: usize,
    pub trials_correct: usize,
    pub settings: Vec<String>,
    pub participant: Vec<String>,
    /// 1 for a correct trial, 0 otherwise
    pub trials: Vec<u8>,
    /// Matched characters per trial
    pub letters: Vec<usize>,
}

impl ResultRecord {
    pub fn new(time_code: String, result: &SessionResult, config: &Config, seed: u64) -> Self {
        Self {
            time_code,
            letters_correct: result.letters_correct(),
            trials_correct: result.trials_correct(),
            settings: config.settings_fields(seed),
            participant: config.participant.fields(),
            trials: result.trials.iter().map(|t| u8::from(t.correct)).collect(),
            letters: result.trials.iter().map(|t| t.characters_matched).collect(),
        }
    }

    /// Fields in column order
    pub fn fields(&self) -> Vec<String> {
        let mut fields = vec![
            self.time_code.clone(),
            self.letters_correct.to_string(),
            self.trials_correct.to_string(),
        ];
        fields.extend(self.settings.iter().cloned());
        fields.extend(self.participant.iter().cloned());
        fields.extend(self.trials.iter().map(|t| t.to_string()));
        fields.extend(self.letters.iter().map(|l| l.to_string()));
        fields
    }

    /// Comma-separated row, without line terminator
    pub fn to_csv(&self) -> String {
        self.fields()
            .iter()
            .map(|f| escape_field(f))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Quote a field if it contains a separator, quote or line break
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Append-only results file
pub struct ResultsFile {
    path: PathBuf,
}

impl ResultsFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a new line
    pub fn append(&self, record: &ResultRecord) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", record.to_csv())?;
        file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::trial::TrialResult;

    fn trial(index: usize, correct: bool, matched: usize) -> TrialResult {
        TrialResult {
            index,
            cue: 0,
            ground_truth: "ABCD".to_string(),
            response: "ABCD".to_string(),
            correct,
            characters_matched: matched,
        }
    }

    fn session() -> SessionResult {
        SessionResult {
            trials: vec![trial(0, true, 4), trial(1, false, 2), trial(2, false, 0)],
            cancelled: false,
        }
    }

    #[test]
    fn test_column_order() {
        let mut config = Config::default();
        config.participant.id = Some("P07".to_string());
        config.participant.age = Some(29);

        let record = ResultRecord::new("202601011230".to_string(), &session(), &config, 5);
        let fields = record.fields();

        assert_eq!(&fields[..3], &["202601011230", "6", "1"]);
        let settings = config.settings_fields(5);
        assert_eq!(&fields[3..3 + settings.len()], settings.as_slice());
        let rest = &fields[3 + settings.len()..];
        assert_eq!(rest, &["P07", "29", "", "1", "0", "0", "4", "2", "0"]);
    }

    #[test]
    fn test_csv_quoting() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("A,B"), "\"A,B\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");

        let config = Config {
            alphabet: "ABCDEFGHIJKL,".to_string(),
            ..Config::default()
        };
        let record = ResultRecord::new("t".to_string(), &session(), &config, 1);
        assert!(record.to_csv().contains(",\"ABCDEFGHIJKL,\","));
    }

    #[test]
    fn test_time_code_shape() {
        let code = time_code();
        assert_eq!(code.len(), 12);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_append_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results.csv");
        let file = ResultsFile::new(path.clone());
        let config = Config::default();

        let first = ResultRecord::new("202601010000".to_string(), &session(), &config, 1);
        let second = ResultRecord::new("202601010100".to_string(), &session(), &config, 2);
        file.append(&first).unwrap();
        file.append(&second).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], first.to_csv());
        assert_eq!(lines[1], second.to_csv());
        assert_eq!(file.path(), path.as_path());
    }
}
