use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::LibraryError;

/// Tolerance for comparing interval edges that should coincide.
pub const EDGE_EPSILON: f64 = 1e-9;

/// Half-open `[start, end)` interval in line-timeline seconds.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct TokenSpan {
    pub start: f64,
    pub end: f64,
}

impl TokenSpan {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// `start <= t < end`, the rule used for the active-token highlight.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }

    pub fn contains_strictly(&self, time: f64) -> bool {
        time > self.start && time < self.end
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LyricToken {
    pub surface: String,
    #[serde(default)]
    pub reading: String,
    #[serde(default)]
    pub romaji: String,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub part_of_speech: String,
}

impl LyricToken {
    pub fn new(surface: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            surface: surface.into(),
            reading: String::new(),
            romaji: String::new(),
            start_time,
            end_time,
            part_of_speech: String::new(),
        }
    }

    pub fn span(&self) -> TokenSpan {
        TokenSpan::new(self.start_time, self.end_time)
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub(crate) fn set_span(&mut self, span: TokenSpan) {
        self.start_time = span.start;
        self.end_time = span.end;
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LyricLine {
    #[serde(default)]
    pub id: String,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(default)]
    pub tokens: Vec<LyricToken>,
}

/// A broken sequence invariant, reported by [`LyricLine::check_invariants`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    #[error("token {index} starts before token {previous}")]
    Ordering { previous: usize, index: usize },
    #[error("token {index} overlaps token {previous} by {overlap:.3}s")]
    Overlap {
        previous: usize,
        index: usize,
        overlap: f64,
    },
    #[error("token {index} lasts {duration:.3}s, below the minimum")]
    MinDuration { index: usize, duration: f64 },
    #[error("token {index} lies outside the line bounds")]
    Containment { index: usize },
}

impl LyricLine {
    pub fn new(start_time: f64, end_time: f64, tokens: Vec<LyricToken>) -> Self {
        Self {
            id: String::new(),
            start_time,
            end_time,
            text: String::new(),
            translation: None,
            tokens,
        }
    }

    pub fn span(&self) -> TokenSpan {
        TokenSpan::new(self.start_time, self.end_time)
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Index of the token whose `[start, end)` contains `time`.
    pub fn active_token_index(&self, time: f64) -> Option<usize> {
        self.tokens.iter().position(|t| t.span().contains(time))
    }

    /// Lists every ordering, overlap, minimum-duration and containment
    /// violation without touching the tokens.
    pub fn check_invariants(&self, min_duration: f64) -> Vec<InvariantViolation> {
        check_sequence(&self.tokens, self.span(), min_duration)
    }

    pub fn load(json_str: &str) -> Result<Self, LibraryError> {
        let line: LyricLine = serde_json::from_str(json_str)?;
        line.ensure_bounds()?;
        Ok(line)
    }

    pub fn save(&self) -> Result<String, LibraryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn ensure_bounds(&self) -> Result<(), LibraryError> {
        if !self.start_time.is_finite() || !self.end_time.is_finite() {
            return Err(LibraryError::Line(format!(
                "Line '{}' has non-finite bounds",
                self.id
            )));
        }
        if self.end_time < self.start_time {
            return Err(LibraryError::Line(format!(
                "Line '{}' ends at {:.3}s before it starts at {:.3}s",
                self.id, self.end_time, self.start_time
            )));
        }
        if self
            .tokens
            .iter()
            .any(|t| !t.start_time.is_finite() || !t.end_time.is_finite())
        {
            return Err(LibraryError::Line(format!(
                "Line '{}' has a token with non-finite times",
                self.id
            )));
        }
        Ok(())
    }
}

pub fn check_sequence(
    tokens: &[LyricToken],
    bounds: TokenSpan,
    min_duration: f64,
) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        if token.duration() < min_duration - EDGE_EPSILON {
            violations.push(InvariantViolation::MinDuration {
                index,
                duration: token.duration(),
            });
        }
        if token.start_time < bounds.start - EDGE_EPSILON
            || token.end_time > bounds.end + EDGE_EPSILON
        {
            violations.push(InvariantViolation::Containment { index });
        }
    }

    for (previous, pair) in tokens.windows(2).enumerate() {
        let index = previous + 1;
        if pair[1].start_time < pair[0].start_time {
            violations.push(InvariantViolation::Ordering { previous, index });
        }
        let overlap = pair[0].end_time - pair[1].start_time;
        if overlap > EDGE_EPSILON {
            violations.push(InvariantViolation::Overlap {
                previous,
                index,
                overlap,
            });
        }
    }

    violations
}

/// Index of the line whose `[start, end)` contains `time`.
pub fn active_line_index(lines: &[LyricLine], time: f64) -> Option<usize> {
    lines.iter().position(|l| l.span().contains(time))
}

pub fn load_lines(json_str: &str) -> Result<Vec<LyricLine>, LibraryError> {
    let lines: Vec<LyricLine> = serde_json::from_str(json_str)?;
    for line in &lines {
        line.ensure_bounds()?;
    }
    Ok(lines)
}

pub fn save_lines(lines: &[LyricLine]) -> Result<String, LibraryError> {
    Ok(serde_json::to_string_pretty(lines)?)
}
