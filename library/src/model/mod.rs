pub mod interval_model;
pub mod line;
pub mod repair;

pub use interval_model::IntervalModel;
pub use line::{
    EDGE_EPSILON, InvariantViolation, LyricLine, LyricToken, TokenSpan, active_line_index,
    check_sequence, load_lines, save_lines,
};
