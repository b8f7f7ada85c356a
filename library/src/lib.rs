pub mod config;
pub mod error;
pub mod interaction;
pub mod model;
pub mod playback;
pub mod service;
pub mod timeline;

pub use config::{CommitMode, EditorConfig, ProgressStrategy, load_config};
pub use error::LibraryError;
pub use model::{IntervalModel, LyricLine, LyricToken, TokenSpan, load_lines, save_lines};
pub use service::EditorSession;
pub use service::handlers::{EditKind, EditOperation, TokenField, TokenHandler};

/// Parse one line from its JSON form.
pub fn load_line(json_str: &str) -> Result<LyricLine, LibraryError> {
    LyricLine::load(json_str)
}
