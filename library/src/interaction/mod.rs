pub mod drag;
pub mod selection;

pub use drag::{DragState, GrabZone, TokenDragController, hit_test};
pub use selection::{ClickAction, ClickTarget, SelectionState, ToolMode};
