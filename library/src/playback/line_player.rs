use log::debug;

use super::clock::MediaClock;
use crate::config::EditorConfig;
use crate::model::TokenSpan;

/// Plays a single line of the media: starts from the line when the clock
/// is elsewhere, stops and rewinds at its end, and drives the scrub bar.
#[derive(Clone, Debug)]
pub struct LinePlayer {
    bounds: TokenSpan,
    scrubbing: bool,
    resume_after_scrub: bool,
}

impl LinePlayer {
    pub fn new(bounds: TokenSpan) -> Self {
        Self {
            bounds,
            scrubbing: false,
            resume_after_scrub: false,
        }
    }

    pub fn bounds(&self) -> TokenSpan {
        self.bounds
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrubbing
    }

    pub fn play(&mut self, clock: &mut dyn MediaClock) {
        let inside = clock
            .current_time()
            .is_some_and(|time| self.bounds.contains(time));
        if !inside {
            clock.seek(self.bounds.start);
        }
        clock.play();
    }

    pub fn pause(&mut self, clock: &mut dyn MediaClock) {
        clock.pause();
    }

    pub fn toggle(&mut self, clock: &mut dyn MediaClock) {
        if clock.is_playing() {
            self.pause(clock);
        } else {
            self.play(clock);
        }
    }

    /// Snap to the nearest configured rate and apply it.
    pub fn set_rate(&mut self, clock: &mut dyn MediaClock, requested: f64, config: &EditorConfig) -> f64 {
        let rate = config.nearest_playback_rate(requested);
        clock.set_playback_rate(rate);
        rate
    }

    /// Per-frame follow. Returns the playhead position; playback that runs
    /// off the end of the line is paused and rewound.
    pub fn tick(&mut self, clock: &mut dyn MediaClock) -> Option<f64> {
        let time = clock.current_time()?;
        if self.scrubbing || !clock.is_playing() {
            return Some(time);
        }
        if time >= self.bounds.end {
            debug!("Line playback reached {:.3}s; rewinding", self.bounds.end);
            clock.pause();
            clock.seek(self.bounds.start);
            return Some(self.bounds.start);
        }
        Some(time)
    }

    /// Pointer went down on the scrub bar. Playback is held until release.
    pub fn begin_scrub(&mut self, clock: &mut dyn MediaClock) {
        if self.scrubbing {
            return;
        }
        self.scrubbing = true;
        self.resume_after_scrub = clock.is_playing();
        clock.pause();
    }

    /// Seek within the line; `time` is clamped to its bounds.
    pub fn scrub_to(&mut self, clock: &mut dyn MediaClock, time: f64) {
        if !time.is_finite() {
            return;
        }
        clock.seek(time.clamp(self.bounds.start, self.bounds.end));
    }

    pub fn end_scrub(&mut self, clock: &mut dyn MediaClock) {
        if !self.scrubbing {
            return;
        }
        self.scrubbing = false;
        if self.resume_after_scrub {
            clock.play();
        }
    }
}
