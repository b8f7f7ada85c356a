//! Per-token playback highlight.
//!
//! While a token is active its highlighter runs a frame loop and reports how
//! far playback has got through the token's span. Two strategies exist:
//! sampling the media clock every frame, or extrapolating from wall time
//! after an anchor sample and re-anchoring on drift.

use log::{debug, trace};

use super::clock::MediaClock;
use super::frame_loop::{FrameLoop, FrameRequestId, FrameScheduler};
use crate::config::{EditorConfig, ProgressStrategy};
use crate::model::{LyricLine, TokenSpan};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum HighlightTone {
    #[default]
    Normal,
    Hovered,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ProgressFrame {
    /// In `[0, 1]`.
    pub progress: f64,
    pub active: bool,
    pub tone: HighlightTone,
}

impl ProgressFrame {
    pub fn width_percent(&self) -> f64 {
        self.progress * 100.0
    }
}

/// Fraction of `span` covered at `time`, clamped to `[0, 1]`.
pub fn progress_at(span: TokenSpan, time: f64) -> f64 {
    let duration = span.duration();
    if !(duration > 0.0) {
        return if time >= span.end { 1.0 } else { 0.0 };
    }
    ((time - span.start) / duration).clamp(0.0, 1.0)
}

/// Clock sample the extrapolation runs from.
#[derive(Clone, Copy, Debug)]
struct Anchor {
    clock_time: f64,
    wall_ms: f64,
    rate: f64,
}

impl Anchor {
    fn time_at(&self, now_ms: f64) -> f64 {
        self.clock_time + (now_ms - self.wall_ms) / 1000.0 * self.rate
    }
}

#[derive(Debug)]
pub struct ProgressHighlighter {
    strategy: ProgressStrategy,
    resync_threshold: f64,
    span: Option<TokenSpan>,
    anchor: Option<Anchor>,
    frame_loop: FrameLoop,
    progress: f64,
    hovered: bool,
}

impl ProgressHighlighter {
    pub fn new(strategy: ProgressStrategy, resync_threshold: f64) -> Self {
        Self {
            strategy,
            resync_threshold,
            span: None,
            anchor: None,
            frame_loop: FrameLoop::default(),
            progress: 0.0,
            hovered: false,
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.progress_strategy, config.resync_threshold)
    }

    pub fn span(&self) -> Option<TokenSpan> {
        self.span
    }

    pub fn is_active(&self) -> bool {
        self.span.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.frame_loop.is_running()
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Hover only changes the tone, never the progress.
    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    pub fn frame(&self) -> ProgressFrame {
        ProgressFrame {
            progress: self.progress,
            active: self.is_active(),
            tone: if self.hovered {
                HighlightTone::Hovered
            } else {
                HighlightTone::Normal
            },
        }
    }

    /// The token just became active.
    pub fn activate(
        &mut self,
        span: TokenSpan,
        clock: &dyn MediaClock,
        now_ms: f64,
        scheduler: &mut dyn FrameScheduler,
    ) -> ProgressFrame {
        self.frame_loop.stop(scheduler);
        self.span = Some(span);
        self.anchor = None;
        trace!("Highlight activated for [{:.3}, {:.3})", span.start, span.end);
        self.tick(clock, now_ms, scheduler)
    }

    /// Frame callback from the host scheduler. `None` for a frame this
    /// highlighter no longer waits for.
    pub fn on_frame(
        &mut self,
        id: FrameRequestId,
        clock: &dyn MediaClock,
        now_ms: f64,
        scheduler: &mut dyn FrameScheduler,
    ) -> Option<ProgressFrame> {
        if !self.frame_loop.take(id) {
            return None;
        }
        let frame = self.tick(clock, now_ms, scheduler);
        trace!("Frame {:?}: {:.1}%", id, frame.width_percent());
        Some(frame)
    }

    /// Recompute progress and decide whether another frame is needed.
    pub fn tick(
        &mut self,
        clock: &dyn MediaClock,
        now_ms: f64,
        scheduler: &mut dyn FrameScheduler,
    ) -> ProgressFrame {
        let Some(span) = self.span else {
            self.frame_loop.stop(scheduler);
            return self.frame();
        };
        let Some(time) = clock.current_time() else {
            self.progress = 0.0;
            self.frame_loop.stop(scheduler);
            return self.frame();
        };

        self.progress = match self.strategy {
            ProgressStrategy::ClockSampling => progress_at(span, time),
            ProgressStrategy::TimestampExtrapolation => {
                let rate = clock.playback_rate();
                let stale = match self.anchor {
                    None => true,
                    Some(anchor) => {
                        anchor.rate != rate
                            || (anchor.time_at(now_ms) - time).abs() > self.resync_threshold
                    }
                };
                if stale {
                    self.anchor_at(time, rate, now_ms);
                }
                // The clock sample is authoritative whenever it is ahead.
                match self.anchor {
                    Some(anchor) if clock.is_playing() => {
                        progress_at(span, anchor.time_at(now_ms).max(time))
                    }
                    _ => progress_at(span, time),
                }
            }
        };

        if clock.is_playing() && span.contains(time) && self.progress < 1.0 {
            self.frame_loop.start(scheduler);
        } else {
            self.frame_loop.stop(scheduler);
        }
        self.frame()
    }

    /// Playback paused: keep the bar where it is, stop the loop.
    pub fn on_pause(&mut self, scheduler: &mut dyn FrameScheduler) {
        self.frame_loop.stop(scheduler);
    }

    /// Playback resumed, seeked or changed rate.
    pub fn on_resume(
        &mut self,
        clock: &dyn MediaClock,
        now_ms: f64,
        scheduler: &mut dyn FrameScheduler,
    ) -> ProgressFrame {
        self.anchor = None;
        self.tick(clock, now_ms, scheduler)
    }

    pub fn deactivate(&mut self, scheduler: &mut dyn FrameScheduler) {
        self.frame_loop.stop(scheduler);
        self.span = None;
        self.anchor = None;
        self.progress = 0.0;
    }

    /// The rendering surface is going away; no frame may be left behind.
    pub fn unmount(&mut self, scheduler: &mut dyn FrameScheduler) {
        self.deactivate(scheduler);
        self.hovered = false;
    }

    fn anchor_at(&mut self, clock_time: f64, rate: f64, now_ms: f64) {
        if self.anchor.is_some() {
            debug!("Re-anchoring highlight at {:.3}s (rate {})", clock_time, rate);
        }
        self.anchor = Some(Anchor {
            clock_time,
            wall_ms: now_ms,
            rate,
        });
    }
}

/// Tracks which token of a line is playing and keeps exactly one
/// highlighter running for it.
#[derive(Debug)]
pub struct LineProgress {
    highlighter: ProgressHighlighter,
    active: Option<usize>,
}

impl LineProgress {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            highlighter: ProgressHighlighter::from_config(config),
            active: None,
        }
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn highlighter(&self) -> &ProgressHighlighter {
        &self.highlighter
    }

    pub fn highlighter_mut(&mut self) -> &mut ProgressHighlighter {
        &mut self.highlighter
    }

    /// Sample the clock against `line`. Switching tokens tears down the old
    /// loop before the new one is started; an edited span restarts it too.
    pub fn update(
        &mut self,
        line: &LyricLine,
        clock: &dyn MediaClock,
        now_ms: f64,
        scheduler: &mut dyn FrameScheduler,
    ) -> Option<(usize, ProgressFrame)> {
        let index = clock
            .current_time()
            .and_then(|time| line.active_token_index(time));
        let span = index.and_then(|i| line.tokens.get(i)).map(|t| t.span());

        match (index, span) {
            (Some(index), Some(span)) => {
                let frame = if self.active != Some(index) || self.highlighter.span() != Some(span) {
                    self.highlighter.deactivate(scheduler);
                    self.active = Some(index);
                    self.highlighter.activate(span, clock, now_ms, scheduler)
                } else {
                    self.highlighter.tick(clock, now_ms, scheduler)
                };
                Some((index, frame))
            }
            _ => {
                if self.active.take().is_some() {
                    self.highlighter.deactivate(scheduler);
                }
                None
            }
        }
    }

    pub fn unmount(&mut self, scheduler: &mut dyn FrameScheduler) {
        self.active = None;
        self.highlighter.unmount(scheduler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LyricToken;
    use crate::playback::clock::ManualClock;
    use crate::playback::frame_loop::ManualScheduler;

    fn sampling() -> ProgressHighlighter {
        ProgressHighlighter::new(ProgressStrategy::ClockSampling, 0.25)
    }

    fn extrapolating() -> ProgressHighlighter {
        ProgressHighlighter::new(ProgressStrategy::TimestampExtrapolation, 0.25)
    }

    #[test]
    fn progress_is_linear_and_clamped() {
        let span = TokenSpan::new(4.0, 6.0);
        assert_eq!(progress_at(span, 4.5), 0.25);
        assert_eq!(progress_at(span, 3.0), 0.0);
        assert_eq!(progress_at(span, 7.0), 1.0);
    }

    #[test]
    fn starts_at_zero_and_runs_while_playing() {
        let mut scheduler = ManualScheduler::new();
        let mut clock = ManualClock::at(4.0);
        clock.play();
        let mut highlighter = sampling();

        let frame = highlighter.activate(TokenSpan::new(4.0, 6.0), &clock, 0.0, &mut scheduler);
        assert_eq!(frame.progress, 0.0);
        assert!(highlighter.is_running());

        clock.advance(1.5);
        let id = scheduler.take_due()[0];
        let frame = highlighter
            .on_frame(id, &clock, 1500.0, &mut scheduler)
            .unwrap();
        assert_eq!(frame.width_percent(), 75.0);
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn loop_stops_when_the_token_is_finished() {
        let mut scheduler = ManualScheduler::new();
        let mut clock = ManualClock::at(4.0);
        clock.play();
        let mut highlighter = sampling();
        highlighter.activate(TokenSpan::new(4.0, 6.0), &clock, 0.0, &mut scheduler);

        clock.advance(2.5);
        let id = scheduler.take_due()[0];
        let frame = highlighter
            .on_frame(id, &clock, 2500.0, &mut scheduler)
            .unwrap();
        assert_eq!(frame.progress, 1.0);
        assert!(!highlighter.is_running());
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn missing_media_reads_as_zero() {
        let mut scheduler = ManualScheduler::new();
        let clock = ManualClock::unloaded();
        let mut highlighter = sampling();
        let frame = highlighter.activate(TokenSpan::new(4.0, 6.0), &clock, 0.0, &mut scheduler);
        assert_eq!(frame.progress, 0.0);
        assert!(!highlighter.is_running());
    }

    #[test]
    fn hover_changes_tone_only() {
        let mut scheduler = ManualScheduler::new();
        let clock = ManualClock::at(5.0);
        let mut highlighter = sampling();
        let before = highlighter.activate(TokenSpan::new(4.0, 6.0), &clock, 0.0, &mut scheduler);
        highlighter.set_hovered(true);
        let after = highlighter.frame();
        assert_eq!(before.progress, after.progress);
        assert_eq!(after.tone, HighlightTone::Hovered);
    }

    #[test]
    fn extrapolation_resyncs_after_a_jump() {
        let mut scheduler = ManualScheduler::new();
        let mut clock = ManualClock::at(4.0);
        clock.play();
        let mut highlighter = extrapolating();
        highlighter.activate(TokenSpan::new(4.0, 8.0), &clock, 0.0, &mut scheduler);

        // Wall time runs ahead of the clock sample; extrapolation follows it.
        let frame = highlighter.tick(&clock, 100.0, &mut scheduler);
        assert!((frame.progress - 0.025).abs() < 1e-9);

        clock.seek(6.0);
        let frame = highlighter.tick(&clock, 200.0, &mut scheduler);
        assert_eq!(frame.progress, 0.5);
    }

    #[test]
    fn pause_cancels_the_loop_and_resume_restarts_it() {
        let mut scheduler = ManualScheduler::new();
        let mut clock = ManualClock::at(4.0);
        clock.play();
        let mut highlighter = sampling();
        highlighter.activate(TokenSpan::new(4.0, 6.0), &clock, 0.0, &mut scheduler);
        clock.advance(0.5);
        highlighter.tick(&clock, 500.0, &mut scheduler);

        clock.pause();
        highlighter.on_pause(&mut scheduler);
        assert_eq!(scheduler.pending_count(), 0);
        assert!(!highlighter.is_running());
        assert_eq!(highlighter.progress(), 0.25);

        // 一時停止中はバーが止まったまま
        clock.advance(1.0);
        let frame = highlighter.tick(&clock, 1500.0, &mut scheduler);
        assert_eq!(frame.progress, 0.25);
        assert_eq!(scheduler.pending_count(), 0);

        clock.play();
        let frame = highlighter.on_resume(&clock, 1500.0, &mut scheduler);
        assert_eq!(frame.progress, 0.25);
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn extrapolation_starts_from_the_clock_mid_token() {
        let mut scheduler = ManualScheduler::new();
        let mut clock = ManualClock::at(5.0);
        clock.play();
        let mut highlighter = extrapolating();

        let frame = highlighter.activate(TokenSpan::new(4.0, 6.0), &clock, 0.0, &mut scheduler);
        assert_eq!(frame.progress, 0.5);

        clock.advance(0.25);
        let frame = highlighter.tick(&clock, 250.0, &mut scheduler);
        assert_eq!(frame.progress, 0.625);

        // A seek backwards is taken as-is once the anchor is dropped.
        clock.seek(4.5);
        let frame = highlighter.on_resume(&clock, 300.0, &mut scheduler);
        assert_eq!(frame.progress, 0.25);
        assert!(highlighter.is_running());
    }

    #[test]
    fn extrapolation_follows_a_rate_change() {
        let mut scheduler = ManualScheduler::new();
        let mut clock = ManualClock::at(4.0);
        clock.play();
        let mut highlighter = extrapolating();
        highlighter.activate(TokenSpan::new(4.0, 6.0), &clock, 0.0, &mut scheduler);

        clock.advance(0.5);
        assert_eq!(highlighter.tick(&clock, 500.0, &mut scheduler).progress, 0.25);

        clock.set_playback_rate(2.0);
        assert_eq!(highlighter.tick(&clock, 500.0, &mut scheduler).progress, 0.25);

        // 0.6 s of wall time at double speed, ahead of the last clock sample.
        clock.advance(0.5);
        let frame = highlighter.tick(&clock, 1100.0, &mut scheduler);
        assert!((frame.progress - 0.85).abs() < 1e-9);
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn line_progress_pause_leaves_no_frame() {
        let line = LyricLine::new(0.0, 10.0, vec![LyricToken::new("a", 0.0, 2.0)]);
        let mut scheduler = ManualScheduler::new();
        let mut clock = ManualClock::at(1.0);
        clock.play();
        let mut progress = LineProgress::new(&EditorConfig::default());
        progress.update(&line, &clock, 0.0, &mut scheduler);
        assert_eq!(scheduler.pending_count(), 1);

        clock.pause();
        progress.highlighter_mut().on_pause(&mut scheduler);
        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!(progress.active_index(), Some(0));
        assert!(!progress.highlighter().is_running());
    }

    #[test]
    fn switching_tokens_leaves_one_loop() {
        let line = LyricLine::new(
            0.0,
            10.0,
            vec![LyricToken::new("a", 0.0, 2.0), LyricToken::new("b", 2.0, 4.0)],
        );
        let config = EditorConfig::default();
        let mut scheduler = ManualScheduler::new();
        let mut clock = ManualClock::at(1.0);
        clock.play();
        let mut progress = LineProgress::new(&config);

        let (index, _) = progress.update(&line, &clock, 0.0, &mut scheduler).unwrap();
        assert_eq!(index, 0);
        clock.advance(1.5);
        let (index, frame) = progress
            .update(&line, &clock, 1500.0, &mut scheduler)
            .unwrap();
        assert_eq!(index, 1);
        assert_eq!(frame.progress, 0.25);
        assert_eq!(scheduler.pending_count(), 1);

        clock.advance(3.0);
        assert_eq!(progress.update(&line, &clock, 4500.0, &mut scheduler), None);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn unmount_cancels_outstanding_frame() {
        let mut scheduler = ManualScheduler::new();
        let mut clock = ManualClock::at(4.0);
        clock.play();
        let mut highlighter = sampling();
        highlighter.activate(TokenSpan::new(4.0, 6.0), &clock, 0.0, &mut scheduler);
        highlighter.unmount(&mut scheduler);
        highlighter.unmount(&mut scheduler);
        assert_eq!(scheduler.pending_count(), 0);
        assert!(!highlighter.is_active());
    }
}
