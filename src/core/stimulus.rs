//! Stimulus generation
//!
//! Draws a fresh grid of distinct symbols for every trial and picks the row
//! to be recalled.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::ConfigError;

/// Character shown in every mask cell
pub const MASK_SYMBOL: char = '#';

/// Ordered set of distinct symbols a grid is drawn from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<char>,
}

impl Alphabet {
    pub fn new(symbols: &str) -> Result<Self, ConfigError> {
        let mut seen = Vec::new();
        for ch in symbols.chars() {
            if ch.is_whitespace() {
                return Err(ConfigError::WhitespaceSymbol);
            }
            if seen.contains(&ch) {
                return Err(ConfigError::DuplicateSymbol(ch));
            }
            seen.push(ch);
        }
        Ok(Self { symbols: seen })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check that a `rows` x `cols` grid can be filled without repeats
    pub fn check_fits(&self, rows: usize, cols: usize) -> Result<(), ConfigError> {
        if rows == 0 || cols == 0 {
            return Err(ConfigError::EmptyGrid { rows, cols });
        }
        let needed = rows.saturating_mul(cols);
        if self.symbols.len() < needed {
            return Err(ConfigError::AlphabetTooSmall {
                available: self.symbols.len(),
                rows,
                cols,
                needed,
            });
        }
        Ok(())
    }
}

/// A `rows` x `cols` matrix of symbols, stored row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<char>,
    rows: usize,
    cols: usize,
}

impl Grid {
    /// Symbols of one row, left to right
    pub fn row(&self, index: usize) -> &[char] {
        let start = index * self.cols;
        &self.cells[start..start + self.cols]
    }

    #[cfg(test)]
    pub fn cells(&self) -> &[char] {
        &self.cells
    }

    /// Rows on separate lines, cells separated by a space
    pub fn render(&self) -> String {
        (0..self.rows)
            .map(|r| join_spaced(self.row(r).iter().copied()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Mask with the same layout as the grid
    pub fn render_mask(&self) -> String {
        let line = join_spaced(std::iter::repeat(MASK_SYMBOL).take(self.cols));
        vec![line; self.rows].join("\n")
    }
}

fn join_spaced(chars: impl Iterator<Item = char>) -> String {
    chars.map(String::from).collect::<Vec<_>>().join(" ")
}

/// One trial's stimulus: the grid, the cued row and the expected answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stimulus {
    pub grid: Grid,
    pub cue: usize,
    pub ground_truth: String,
}

/// Seeded grid and cue generator
pub struct StimulusGenerator {
    rng: ChaCha8Rng,
}

impl StimulusGenerator {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Draw a new grid and cue.
    ///
    /// The whole alphabet is shuffled and the first `rows * cols` symbols
    /// fill the grid row by row, so no symbol repeats and no earlier grid
    /// influences the next. The cue is drawn independently and may repeat
    /// the previous trial's row.
    pub fn generate(
        &mut self,
        alphabet: &Alphabet,
        rows: usize,
        cols: usize,
    ) -> Result<Stimulus, ConfigError> {
        alphabet.check_fits(rows, cols)?;

        let mut pool = alphabet.symbols.clone();
        pool.shuffle(&mut self.rng);
        pool.truncate(rows * cols);

        let grid = Grid {
            cells: pool,
            rows,
            cols,
        };
        let cue = self.rng.gen_range(0..rows);
        let ground_truth = grid.row(cue).iter().collect();

        Ok(Stimulus {
            grid,
            cue,
            ground_truth,
        })
    }
}
