/// Authoritative playback time, owned outside the engine.
///
/// The engine reads `current_time`/`playback_rate` and only seeks in
/// response to its own controls (scrub bar, line playback).
pub trait MediaClock {
    /// `None` while no media is loaded.
    fn current_time(&self) -> Option<f64>;
    fn playback_rate(&self) -> f64;
    fn is_playing(&self) -> bool;
    fn seek(&mut self, time: f64);
    fn play(&mut self);
    fn pause(&mut self);
    fn set_playback_rate(&mut self, rate: f64);
}

/// Clock advanced by explicit wall-clock steps, with an optional A-B loop.
/// Used headless and in tests.
#[derive(Clone, Debug, PartialEq)]
pub struct ManualClock {
    loaded: bool,
    time: f64,
    rate: f64,
    playing: bool,
    duration: Option<f64>,
    loop_a: Option<f64>,
    loop_b: Option<f64>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            loaded: true,
            time: 0.0,
            rate: 1.0,
            playing: false,
            duration: None,
            loop_a: None,
            loop_b: None,
        }
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(time: f64) -> Self {
        Self {
            time,
            ..Self::default()
        }
    }

    /// A clock with no media behind it.
    pub fn unloaded() -> Self {
        Self {
            loaded: false,
            ..Self::default()
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Advance by `wall_seconds` of real time, scaled by the playback rate.
    pub fn advance(&mut self, wall_seconds: f64) {
        if !self.loaded || !self.playing || !(wall_seconds > 0.0) {
            return;
        }
        self.time += wall_seconds * self.rate;

        if let (Some(a), Some(b)) = (self.loop_a, self.loop_b) {
            if self.time >= b {
                self.time = a;
            }
        }
        if let Some(duration) = self.duration {
            if self.time >= duration {
                self.time = duration;
                self.playing = false;
            }
        }
    }

    /// Mark A at the current time; any previous B is dropped.
    pub fn set_loop_a(&mut self) {
        self.loop_a = Some(self.time);
        self.loop_b = None;
    }

    /// Mark B at the current time. Ignored unless it lies after A.
    pub fn set_loop_b(&mut self) {
        if let Some(a) = self.loop_a {
            if self.time > a {
                self.loop_b = Some(self.time);
            }
        }
    }

    pub fn clear_loop(&mut self) {
        self.loop_a = None;
        self.loop_b = None;
    }

    pub fn loop_region(&self) -> Option<(f64, f64)> {
        self.loop_a.zip(self.loop_b)
    }
}

impl MediaClock for ManualClock {
    fn current_time(&self) -> Option<f64> {
        self.loaded.then_some(self.time)
    }

    fn playback_rate(&self) -> f64 {
        self.rate
    }

    fn is_playing(&self) -> bool {
        self.loaded && self.playing
    }

    fn seek(&mut self, time: f64) {
        if !self.loaded || !time.is_finite() {
            return;
        }
        let upper = self.duration.unwrap_or(f64::INFINITY);
        self.time = time.clamp(0.0, upper);
    }

    fn play(&mut self) {
        if self.loaded {
            self.playing = true;
        }
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn set_playback_rate(&mut self, rate: f64) {
        if rate > 0.0 {
            self.rate = rate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_only_while_playing_and_scales_by_rate() {
        let mut clock = ManualClock::new();
        clock.advance(1.0);
        assert_eq!(clock.current_time(), Some(0.0));

        clock.play();
        clock.set_playback_rate(0.5);
        clock.advance(2.0);
        assert_eq!(clock.current_time(), Some(1.0));
    }

    #[test]
    fn unloaded_clock_reports_no_time() {
        let mut clock = ManualClock::unloaded();
        clock.play();
        clock.seek(3.0);
        assert_eq!(clock.current_time(), None);
        assert!(!clock.is_playing());
    }

    #[test]
    fn loop_b_requires_a_and_jumps_back() {
        let mut clock = ManualClock::at(2.0);
        clock.set_loop_b();
        assert_eq!(clock.loop_region(), None);

        clock.set_loop_a();
        clock.seek(4.0);
        clock.set_loop_b();
        assert_eq!(clock.loop_region(), Some((2.0, 4.0)));

        clock.seek(3.5);
        clock.play();
        clock.advance(1.0);
        assert_eq!(clock.current_time(), Some(2.0));

        clock.set_loop_a();
        assert_eq!(clock.loop_region(), None);
    }

    #[test]
    fn cleared_loop_no_longer_jumps() {
        let mut clock = ManualClock::at(1.0);
        clock.set_loop_a();
        clock.seek(2.0);
        clock.set_loop_b();
        clock.clear_loop();
        assert_eq!(clock.loop_region(), None);

        clock.play();
        clock.advance(1.5);
        assert_eq!(clock.current_time(), Some(3.5));
    }

    #[test]
    fn playback_stops_at_media_end() {
        let mut clock = ManualClock::at(9.0).with_duration(10.0);
        clock.play();
        clock.advance(5.0);
        assert_eq!(clock.current_time(), Some(10.0));
        assert!(!clock.is_playing());
    }
}
