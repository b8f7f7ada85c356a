pub mod editor_session;
pub mod handlers;

pub use editor_session::EditorSession;
