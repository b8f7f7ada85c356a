pub mod geometry;

pub use geometry::{PixelSpan, TimelineGeometry};
