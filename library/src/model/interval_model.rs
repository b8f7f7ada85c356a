use log::error;

use super::line::{LyricLine, LyricToken, check_sequence};
use super::repair::{effective_min_duration, repair_sequence, sort_tokens};

/// Canonical working copy of one line.
///
/// [`IntervalModel::replace`] is the only way the token sequence changes:
/// editors compute a candidate sequence and hand the whole thing over, so a
/// reader never observes a half-applied edit.
#[derive(Clone, Debug)]
pub struct IntervalModel {
    line: LyricLine,
    min_duration: f64,
    revision: u64,
}

impl IntervalModel {
    /// Takes the line as delivered. It is not validated here; the first
    /// commit that goes through the token handler repairs it.
    pub fn new(line: LyricLine, min_duration: f64) -> Self {
        Self {
            line,
            min_duration,
            revision: 0,
        }
    }

    pub fn line(&self) -> &LyricLine {
        &self.line
    }

    pub fn tokens(&self) -> &[LyricToken] {
        &self.line.tokens
    }

    pub fn min_duration(&self) -> f64 {
        self.min_duration
    }

    /// Bumped on every commit.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn into_line(self) -> LyricLine {
        self.line
    }

    /// Replace the whole token sequence.
    ///
    /// The candidate is re-sorted first. A candidate that still breaks an
    /// invariant after sorting is a bug in the caller: debug builds panic,
    /// release builds log it and clamp the sequence back into shape.
    pub fn replace(&mut self, mut tokens: Vec<LyricToken>) {
        sort_tokens(&mut tokens);

        let bounds = self.line.span();
        let min = effective_min_duration(bounds, tokens.len(), self.min_duration);
        let violations = check_sequence(&tokens, bounds, min);
        debug_assert!(
            violations.is_empty(),
            "replace received a sequence that breaks invariants: {:?}",
            violations
        );
        if !violations.is_empty() {
            error!(
                "Line '{}': clamping {} invariant violation(s) on commit",
                self.line.id,
                violations.len()
            );
            repair_sequence(&mut tokens, bounds, self.min_duration);
        }

        self.line.tokens = tokens;
        self.revision += 1;
    }
}
