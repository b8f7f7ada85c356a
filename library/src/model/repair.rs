//! Final normalisation pass applied to every candidate token sequence.
//!
//! Re-sorts by start time, snaps edges that are within [`EDGE_EPSILON`] of
//! touching, and pushes tokens apart until no overlap, minimum-duration or
//! containment violation is left.

use log::warn;

use super::line::{EDGE_EPSILON, LyricToken, TokenSpan};

/// The minimum duration that can actually be honoured for `count` tokens
/// inside `bounds`. Only smaller than `min_duration` for overcrowded lines.
pub fn effective_min_duration(bounds: TokenSpan, count: usize, min_duration: f64) -> f64 {
    if count == 0 {
        return min_duration;
    }
    let capacity = bounds.duration().max(0.0) / count as f64;
    min_duration.min(capacity)
}

/// Sort by start time, breaking ties with the end time.
pub fn sort_tokens(tokens: &mut [LyricToken]) {
    tokens.sort_by(|a, b| {
        a.start_time
            .total_cmp(&b.start_time)
            .then(a.end_time.total_cmp(&b.end_time))
    });
}

/// Returns the number of tokens whose span had to change.
pub fn repair_sequence(tokens: &mut [LyricToken], bounds: TokenSpan, min_duration: f64) -> usize {
    sort_tokens(tokens);
    if tokens.is_empty() {
        return 0;
    }

    let min = effective_min_duration(bounds, tokens.len(), min_duration);
    if min < min_duration {
        warn!(
            "{} tokens do not fit a {:.3}s line at {:.3}s each; packing at {:.3}s",
            tokens.len(),
            bounds.duration(),
            min_duration,
            min
        );
    }

    let before: Vec<TokenSpan> = tokens.iter().map(LyricToken::span).collect();

    // Forward: no token starts before the previous one ends or the line starts.
    let mut cursor = bounds.start;
    for token in tokens.iter_mut() {
        let mut start = token.start_time.max(cursor);
        if start - cursor < EDGE_EPSILON {
            start = cursor;
        }
        let end = token.end_time.max(start + min);
        token.set_span(TokenSpan::new(start, end));
        cursor = end;
    }

    // Backward: pull anything that ran past the line end back inside.
    let mut limit = bounds.end;
    for token in tokens.iter_mut().rev() {
        let mut span = token.span();
        if span.end > limit {
            span.end = limit;
        }
        if span.start > span.end - min + EDGE_EPSILON {
            span.start = span.end - min;
        }
        if span.start < bounds.start {
            span.start = bounds.start;
        }
        token.set_span(span);
        limit = span.start;
    }

    tokens
        .iter()
        .zip(before)
        .filter(|(token, span)| token.span() != *span)
        .count()
}
