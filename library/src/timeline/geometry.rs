use crate::model::{LyricLine, TokenSpan};

/// Horizontal extent of a token block in timeline pixels.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct PixelSpan {
    pub x: f64,
    pub width: f64,
}

impl PixelSpan {
    pub fn new(x: f64, width: f64) -> Self {
        Self { x, width }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn contains(&self, px: f64) -> bool {
        px >= self.x && px <= self.right()
    }
}

/// Maps line-relative time to pixel offsets and back for a timeline of a
/// known width.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineGeometry {
    pub line_start: f64,
    pub line_duration: f64,
    pub pixel_width: f64,
    /// Pointer positions are shifted left by this much before mapping.
    pub inset_px: f64,
}

impl TimelineGeometry {
    pub fn new(line_start: f64, line_duration: f64, pixel_width: f64) -> Self {
        Self {
            line_start,
            line_duration,
            pixel_width,
            inset_px: 0.0,
        }
    }

    pub fn for_line(line: &LyricLine, pixel_width: f64) -> Self {
        Self::new(line.start_time, line.duration(), pixel_width)
    }

    /// Geometry for a widget whose usable width loses `thumb_width` to the
    /// scrub thumb, half on each side.
    pub fn for_widget(line: &LyricLine, widget_width: f64, thumb_width: f64) -> Self {
        Self {
            inset_px: thumb_width / 2.0,
            ..Self::new(line.start_time, line.duration(), widget_width - thumb_width)
        }
    }

    /// A zero-width timeline or an empty line cannot be edited yet.
    pub fn is_interactive(&self) -> bool {
        self.line_duration.is_finite()
            && self.pixel_width.is_finite()
            && self.line_duration > 0.0
            && self.pixel_width > 0.0
    }

    pub fn time_to_pixel(&self, time: f64) -> f64 {
        if !self.is_interactive() {
            return 0.0;
        }
        ((time - self.line_start) / self.line_duration) * self.pixel_width
    }

    /// `None` when the geometry is degenerate.
    pub fn pixel_to_time(&self, px: f64) -> Option<f64> {
        if !self.is_interactive() {
            return None;
        }
        Some(self.line_start + (px / self.pixel_width) * self.line_duration)
    }

    pub fn pixel_delta_to_time(&self, delta_px: f64) -> Option<f64> {
        if !self.is_interactive() {
            return None;
        }
        Some((delta_px / self.pixel_width) * self.line_duration)
    }

    /// Time under a pointer given in widget coordinates.
    pub fn pointer_to_time(&self, pointer_x: f64) -> Option<f64> {
        self.pixel_to_time(pointer_x - self.inset_px)
    }

    pub fn span_to_pixels(&self, span: TokenSpan) -> PixelSpan {
        let x = self.time_to_pixel(span.start);
        PixelSpan::new(x, self.time_to_pixel(span.end) - x)
    }

    /// Playhead position as a percentage of the line, 0 when degenerate.
    pub fn playhead_percent(&self, time: f64) -> f64 {
        if !self.is_interactive() {
            return 0.0;
        }
        ((time - self.line_start) / self.line_duration) * 100.0
    }
}
