use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::model::repair::{effective_min_duration, repair_sequence};
use crate::model::{EDGE_EPSILON, LyricLine, LyricToken, TokenSpan};

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "kebab-case")]
pub enum EditKind {
    Move,
    ResizeLeft,
    ResizeRight,
}

/// A proposed new placement for one token.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EditOperation {
    pub index: usize,
    pub kind: EditKind,
    pub proposed_start: f64,
    pub proposed_end: f64,
}

impl EditOperation {
    pub fn new(index: usize, kind: EditKind, proposed_start: f64, proposed_end: f64) -> Self {
        Self {
            index,
            kind,
            proposed_start,
            proposed_end,
        }
    }

    /// Move `current` so that it starts at `new_start`.
    pub fn move_to(index: usize, current: TokenSpan, new_start: f64) -> Self {
        Self::new(
            index,
            EditKind::Move,
            new_start,
            new_start + current.duration(),
        )
    }

    pub fn resize_left(index: usize, current: TokenSpan, new_start: f64) -> Self {
        Self::new(index, EditKind::ResizeLeft, new_start, current.end)
    }

    pub fn resize_right(index: usize, current: TokenSpan, new_end: f64) -> Self {
        Self::new(index, EditKind::ResizeRight, current.start, new_end)
    }
}

/// Text payload fields of a token. The engine never interprets them.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub enum TokenField {
    Surface,
    Reading,
    Romaji,
    PartOfSpeech,
}

/// Computes invariant-preserving token sequences for single edits.
///
/// Every function takes the current line and returns the complete candidate
/// sequence for [`crate::model::IntervalModel::replace`], or `None` when the
/// edit is rejected and nothing should be committed.
pub struct TokenHandler;

impl TokenHandler {
    pub fn apply_edit(
        line: &LyricLine,
        op: EditOperation,
        min_duration: f64,
    ) -> Option<Vec<LyricToken>> {
        let Some(current) = line.tokens.get(op.index).map(LyricToken::span) else {
            warn!(
                "Edit on token {} ignored: line '{}' has {} tokens",
                op.index,
                line.id,
                line.tokens.len()
            );
            return None;
        };
        if !op.proposed_start.is_finite() || !op.proposed_end.is_finite() {
            warn!("Edit on token {} ignored: non-finite times", op.index);
            return None;
        }

        let bounds = line.span();
        let mut tokens = line.tokens.clone();
        let min = effective_min_duration(bounds, tokens.len(), min_duration);
        let prev = op
            .index
            .checked_sub(1)
            .and_then(|i| tokens.get(i))
            .map(LyricToken::span);
        let next = tokens.get(op.index + 1).map(LyricToken::span);

        match op.kind {
            EditKind::Move => {
                let span = resolve_move(current, op.proposed_start, prev, next, bounds, min);
                tokens[op.index].set_span(span);
            }
            EditKind::ResizeRight => {
                let (span, eroded) =
                    resolve_resize_right(current, op.proposed_end, next, bounds, min);
                tokens[op.index].set_span(span);
                if let Some(eroded) = eroded {
                    tokens[op.index + 1].set_span(eroded);
                }
            }
            EditKind::ResizeLeft => {
                let (span, eroded) =
                    resolve_resize_left(current, op.proposed_start, prev, bounds, min);
                tokens[op.index].set_span(span);
                if let Some(eroded) = eroded {
                    tokens[op.index - 1].set_span(eroded);
                }
            }
        }

        let repaired = repair_sequence(&mut tokens, bounds, min_duration);
        debug!(
            "{:?} token {}: [{:.3}, {:.3}) -> [{:.3}, {:.3}) ({} span(s) touched by repair)",
            op.kind,
            op.index,
            current.start,
            current.end,
            tokens[op.index].start_time,
            tokens[op.index].end_time,
            repaired
        );
        Some(tokens)
    }

    /// Insert a placeholder token at `time`.
    ///
    /// Rejected when `time` is outside the line, strictly inside an existing
    /// token, or when the free space from `time` is shorter than the
    /// minimum duration. Touching a neighbour is allowed.
    pub fn insert_token(
        line: &LyricLine,
        time: f64,
        config: &EditorConfig,
    ) -> Option<(Vec<LyricToken>, usize)> {
        if !time.is_finite() || time < line.start_time || time >= line.end_time {
            debug!("Insert at {:.3} ignored: outside line '{}'", time, line.id);
            return None;
        }
        if line.tokens.iter().any(|t| t.span().contains_strictly(time)) {
            debug!("Insert at {:.3} ignored: span is occupied", time);
            return None;
        }

        let next_start = line
            .tokens
            .iter()
            .map(|t| t.start_time)
            .filter(|start| *start >= time)
            .fold(f64::INFINITY, f64::min);
        let end = (time + config.default_span)
            .min(line.end_time)
            .min(next_start);
        if end - time < config.min_duration - EDGE_EPSILON {
            debug!(
                "Insert at {:.3} ignored: only {:.3}s free",
                time,
                (end - time).max(0.0)
            );
            return None;
        }

        let mut token = LyricToken::new(config.new_token_text.clone(), time, end);
        token.reading = config.new_token_text.clone();
        token.romaji = config.new_token_text.clone();
        token.part_of_speech = config.default_part_of_speech.clone();

        let mut tokens = line.tokens.clone();
        let index = tokens
            .iter()
            .position(|t| t.start_time > time)
            .unwrap_or(tokens.len());
        tokens.insert(index, token);
        repair_sequence(&mut tokens, line.span(), config.min_duration);
        debug!("Inserted token {} at [{:.3}, {:.3})", index, time, end);
        Some((tokens, index))
    }

    /// Remove a token. Neighbours keep their spans; the gap stays.
    pub fn delete_token(
        line: &LyricLine,
        index: usize,
        min_duration: f64,
    ) -> Option<Vec<LyricToken>> {
        if index >= line.tokens.len() {
            warn!("Delete of token {} ignored: out of range", index);
            return None;
        }
        let mut tokens = line.tokens.clone();
        let removed = tokens.remove(index);
        repair_sequence(&mut tokens, line.span(), min_duration);
        debug!("Deleted token {} ('{}')", index, removed.surface);
        Some(tokens)
    }

    /// Text edit on one token. Timing is untouched apart from the usual
    /// repair pass, so a line loaded in a bad state still commits cleanly.
    pub fn set_field(
        line: &LyricLine,
        index: usize,
        field: TokenField,
        value: &str,
        min_duration: f64,
    ) -> Option<Vec<LyricToken>> {
        let mut tokens = line.tokens.clone();
        let token = tokens.get_mut(index)?;
        let slot = match field {
            TokenField::Surface => &mut token.surface,
            TokenField::Reading => &mut token.reading,
            TokenField::Romaji => &mut token.romaji,
            TokenField::PartOfSpeech => &mut token.part_of_speech,
        };
        if slot.as_str() == value {
            return None;
        }
        *slot = value.to_string();
        repair_sequence(&mut tokens, line.span(), min_duration);
        Some(tokens)
    }
}

/// Duration is kept; the token is clamped between its neighbours.
fn resolve_move(
    current: TokenSpan,
    proposed_start: f64,
    prev: Option<TokenSpan>,
    next: Option<TokenSpan>,
    bounds: TokenSpan,
    min: f64,
) -> TokenSpan {
    let duration = current.duration().max(min);
    let lower = prev.map_or(bounds.start, |p| p.end.max(bounds.start));
    let upper = next.map_or(bounds.end, |n| n.start.min(bounds.end));

    let mut start = proposed_start.max(lower);
    let mut end = start + duration;
    if end > upper {
        end = upper;
        start = end - duration;
    }
    if start < lower {
        // Gap narrower than the token; only reachable with unrepaired input.
        start = lower;
        end = start + duration;
    }
    TokenSpan::new(start, end)
}

/// Returns the resized span and, when the next token was invaded, its
/// eroded span. The next token never drops below `min`.
fn resolve_resize_right(
    current: TokenSpan,
    proposed_end: f64,
    next: Option<TokenSpan>,
    bounds: TokenSpan,
    min: f64,
) -> (TokenSpan, Option<TokenSpan>) {
    let floor = current.start + min;
    let ceiling = next
        .map_or(bounds.end, |n| (n.end - min).max(n.start))
        .min(bounds.end)
        .max(floor);
    let end = proposed_end.max(floor).min(ceiling);

    let eroded = next
        .filter(|n| end > n.start)
        .map(|n| TokenSpan::new(end, n.end));
    (TokenSpan::new(current.start, end), eroded)
}

fn resolve_resize_left(
    current: TokenSpan,
    proposed_start: f64,
    prev: Option<TokenSpan>,
    bounds: TokenSpan,
    min: f64,
) -> (TokenSpan, Option<TokenSpan>) {
    let ceiling = current.end - min;
    let floor = prev
        .map_or(bounds.start, |p| (p.start + min).min(p.end))
        .max(bounds.start)
        .min(ceiling);
    let start = proposed_start.min(ceiling).max(floor);

    let eroded = prev
        .filter(|p| start < p.end)
        .map(|p| TokenSpan::new(p.start, start));
    (TokenSpan::new(start, current.end), eroded)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: TokenSpan = TokenSpan {
        start: 0.0,
        end: 10.0,
    };

    #[test]
    fn move_is_blocked_by_next_neighbour() {
        let span = resolve_move(
            TokenSpan::new(2.0, 4.0),
            5.0,
            Some(TokenSpan::new(0.0, 2.0)),
            Some(TokenSpan::new(4.0, 6.0)),
            LINE,
            0.05,
        );
        assert_eq!(span, TokenSpan::new(2.0, 4.0));
    }

    #[test]
    fn move_into_a_gap_keeps_duration() {
        let span = resolve_move(
            TokenSpan::new(2.0, 3.0),
            3.5,
            Some(TokenSpan::new(0.0, 2.0)),
            Some(TokenSpan::new(6.0, 7.0)),
            LINE,
            0.05,
        );
        assert_eq!(span, TokenSpan::new(3.5, 4.5));
    }

    #[test]
    fn move_stops_at_line_edges() {
        let left = resolve_move(TokenSpan::new(2.0, 3.0), -4.0, None, None, LINE, 0.05);
        assert_eq!(left, TokenSpan::new(0.0, 1.0));
        let right = resolve_move(TokenSpan::new(2.0, 3.0), 9.5, None, None, LINE, 0.05);
        assert_eq!(right, TokenSpan::new(9.0, 10.0));
    }

    #[test]
    fn resize_right_erodes_next_but_keeps_its_minimum() {
        let (span, eroded) = resolve_resize_right(
            TokenSpan::new(2.0, 4.0),
            9.0,
            Some(TokenSpan::new(4.0, 6.0)),
            LINE,
            0.5,
        );
        assert_eq!(span, TokenSpan::new(2.0, 5.5));
        assert_eq!(eroded, Some(TokenSpan::new(5.5, 6.0)));
    }

    #[test]
    fn resize_right_below_minimum_pushes_end_out() {
        let (span, eroded) =
            resolve_resize_right(TokenSpan::new(2.0, 4.0), 1.0, None, LINE, 0.5);
        assert_eq!(span, TokenSpan::new(2.0, 2.5));
        assert_eq!(eroded, None);
    }

    #[test]
    fn resize_left_erodes_previous_from_the_right() {
        let (span, eroded) = resolve_resize_left(
            TokenSpan::new(2.0, 4.0),
            1.0,
            Some(TokenSpan::new(0.0, 2.0)),
            LINE,
            0.5,
        );
        assert_eq!(span, TokenSpan::new(1.0, 4.0));
        assert_eq!(eroded, Some(TokenSpan::new(0.0, 1.0)));
    }

    #[test]
    fn resize_left_past_previous_start_is_limited() {
        let (span, eroded) = resolve_resize_left(
            TokenSpan::new(2.0, 4.0),
            -3.0,
            Some(TokenSpan::new(0.0, 2.0)),
            LINE,
            0.5,
        );
        assert_eq!(span, TokenSpan::new(0.5, 4.0));
        assert_eq!(eroded, Some(TokenSpan::new(0.0, 0.5)));
    }

    #[test]
    fn resize_left_below_minimum_pushes_start_out() {
        let (span, _) = resolve_resize_left(TokenSpan::new(2.0, 4.0), 3.9, None, LINE, 0.5);
        assert_eq!(span, TokenSpan::new(3.5, 4.0));
    }
}
