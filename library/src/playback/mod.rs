pub mod clock;
pub mod frame_loop;
pub mod line_player;
pub mod progress;

pub use clock::{ManualClock, MediaClock};
pub use frame_loop::{FrameLoop, FrameRequestId, FrameScheduler, ManualScheduler};
pub use line_player::LinePlayer;
pub use progress::{HighlightTone, LineProgress, ProgressFrame, ProgressHighlighter, progress_at};
