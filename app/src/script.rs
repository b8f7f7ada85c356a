use anyhow::{Context, Result};
use log::{debug, warn};
use lyric_timing::interaction::{ClickTarget, GrabZone, ToolMode};
use lyric_timing::service::EditorSession;
use lyric_timing::service::handlers::{EditOperation, TokenField};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One scripted editor interaction. Times are in seconds, pixels are
/// token-track pixels.
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum ScriptCommand {
    Move { index: usize, start: f64 },
    ResizeLeft { index: usize, start: f64 },
    ResizeRight { index: usize, end: f64 },
    Insert { time: f64 },
    Delete { index: usize },
    #[serde(rename_all = "camelCase")]
    Drag {
        index: usize,
        zone: GrabZone,
        deltas_px: Vec<f64>,
        #[serde(default)]
        cancel: bool,
    },
    Click { x: f64 },
    Mode { mode: ToolMode },
    SetField { index: usize, field: TokenField, value: String },
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptCommand>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Invalid script {}", path.display()))
}

/// Replays `commands` and returns how many of them changed the line.
pub fn run_script(session: &mut EditorSession, commands: &[ScriptCommand]) -> usize {
    let mut changed = 0;
    for (step, command) in commands.iter().enumerate() {
        let revision = session.model().revision();
        run_command(session, command);
        if session.model().revision() != revision {
            changed += 1;
        } else {
            debug!("Step {} ({:?}) left the line unchanged", step, command);
        }
    }
    changed
}

fn run_command(session: &mut EditorSession, command: &ScriptCommand) {
    match command {
        ScriptCommand::Move { index, start } => {
            if let Some(current) = span_of(session, *index) {
                session.apply(EditOperation::move_to(*index, current, *start));
            }
        }
        ScriptCommand::ResizeLeft { index, start } => {
            session.set_start_time(*index, *start);
        }
        ScriptCommand::ResizeRight { index, end } => {
            session.set_end_time(*index, *end);
        }
        ScriptCommand::Insert { time } => {
            session.insert_at(*time);
        }
        ScriptCommand::Delete { index } => {
            session.delete(*index);
        }
        ScriptCommand::Drag {
            index,
            zone,
            deltas_px,
            cancel,
        } => {
            // Handles only appear on a selected token.
            session.click(ClickTarget::Token(*index));
            if !session.begin_drag(*index, *zone) {
                warn!("Drag on token {} could not start", index);
                return;
            }
            for delta in deltas_px {
                session.drag(*delta);
            }
            if *cancel {
                session.cancel_drag();
            } else {
                session.end_drag();
            }
        }
        ScriptCommand::Click { x } => {
            session.pointer_down(*x);
            session.end_drag();
        }
        ScriptCommand::Mode { mode } => session.set_tool_mode(*mode),
        ScriptCommand::SetField {
            index,
            field,
            value,
        } => {
            session.set_field(*index, *field, value);
        }
    }
}

fn span_of(session: &EditorSession, index: usize) -> Option<lyric_timing::TokenSpan> {
    session.tokens().get(index).map(|t| t.span())
}
