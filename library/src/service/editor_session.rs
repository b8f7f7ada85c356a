use log::{debug, info};

use crate::config::EditorConfig;
use crate::interaction::{
    ClickAction, ClickTarget, GrabZone, SelectionState, TokenDragController, ToolMode, hit_test,
};
use crate::model::{IntervalModel, LyricLine, LyricToken};
use crate::playback::{LinePlayer, MediaClock};
use crate::service::handlers::{EditOperation, TokenField, TokenHandler};
use crate::timeline::{PixelSpan, TimelineGeometry};

/// Editing state for one line: the model, a pristine copy for cancel,
/// the selection, one drag controller per token block and line playback.
///
/// Pointer positions are in token-track pixels unless a method says it
/// takes widget coordinates.
#[derive(Debug)]
pub struct EditorSession {
    model: IntervalModel,
    pristine: LyricLine,
    config: EditorConfig,
    geometry: TimelineGeometry,
    widget_width: f64,
    selection: SelectionState,
    drags: Vec<TokenDragController>,
    player: LinePlayer,
}

impl EditorSession {
    pub fn new(line: LyricLine, config: EditorConfig, widget_width: f64) -> Self {
        let geometry = track_geometry(&line, &config, widget_width);
        let player = LinePlayer::new(line.span());
        let mut session = Self {
            model: IntervalModel::new(line.clone(), config.min_duration),
            pristine: line,
            config,
            geometry,
            widget_width,
            selection: SelectionState::default(),
            drags: Vec::new(),
            player,
        };
        session.rebuild_drag_controllers();
        session
    }

    pub fn line(&self) -> &LyricLine {
        self.model.line()
    }

    pub fn tokens(&self) -> &[LyricToken] {
        self.model.tokens()
    }

    pub fn model(&self) -> &IntervalModel {
        &self.model
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn geometry(&self) -> &TimelineGeometry {
        &self.geometry
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn player(&self) -> &LinePlayer {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut LinePlayer {
        &mut self.player
    }

    /// Layout changed. Width 0 makes the timeline inert until measured.
    pub fn set_widget_width(&mut self, widget_width: f64) {
        self.widget_width = widget_width;
        self.geometry = track_geometry(self.model.line(), &self.config, widget_width);
    }

    pub fn set_tool_mode(&mut self, mode: ToolMode) {
        self.selection.set_mode(mode);
    }

    pub fn toggle_add_mode(&mut self) {
        self.selection.toggle_add_mode();
    }

    pub fn toggle_delete_mode(&mut self) {
        self.selection.toggle_delete_mode();
    }

    /// Where token `index` is drawn, including any drag in progress.
    pub fn token_block(&self, index: usize) -> Option<PixelSpan> {
        let token = self.model.tokens().get(index)?;
        let drag = self.drags.get(index)?;
        Some(drag.visual_span(token.span(), &self.geometry))
    }

    /// Touching blocks share a pixel; the selected block is tried first so
    /// its handles win that pixel.
    pub fn hit_test(&self, pointer_x: f64) -> Option<(usize, GrabZone)> {
        let edge = self.config.edge_handle_width_px;
        let try_block = |index: usize| {
            let block = self.token_block(index)?;
            let selected = self.selection.is_selected(index);
            hit_test(block, pointer_x, edge, selected).map(|zone| (index, zone))
        };
        self.selection
            .selected()
            .and_then(try_block)
            .or_else(|| (0..self.model.tokens().len()).find_map(try_block))
    }

    /// Pointer pressed on the track. Starts a drag on a selected token,
    /// otherwise behaves as a click. Returns `true` when a drag started.
    pub fn pointer_down(&mut self, pointer_x: f64) -> bool {
        match self.hit_test(pointer_x) {
            Some((index, zone)) => {
                if self.selection.mode() != ToolMode::Delete && self.begin_drag(index, zone) {
                    return true;
                }
                self.click(ClickTarget::Token(index));
            }
            None => {
                if let Some(time) = self.geometry.pixel_to_time(pointer_x) {
                    self.click(ClickTarget::Timeline(time));
                }
            }
        }
        false
    }

    pub fn click(&mut self, target: ClickTarget) -> ClickAction {
        let action = self.selection.click_action(target);
        match action {
            ClickAction::Select(index) => {
                if index < self.model.tokens().len() {
                    self.selection.select(index);
                }
            }
            ClickAction::Delete(index) => {
                self.delete(index);
            }
            ClickAction::Insert(time) => {
                self.insert_at(time);
            }
            ClickAction::ClearSelection => self.selection.clear(),
            ClickAction::DoNothing => {}
        }
        action
    }

    pub fn dragging_index(&self) -> Option<usize> {
        self.drags.iter().position(TokenDragController::is_dragging)
    }

    pub fn begin_drag(&mut self, index: usize, zone: GrabZone) -> bool {
        if self.dragging_index().is_some() {
            return false;
        }
        let Some(origin) = self.model.tokens().get(index).map(LyricToken::span) else {
            return false;
        };
        let selected = self.selection.is_selected(index);
        match self.drags.get_mut(index) {
            Some(drag) => drag.begin(zone, origin, selected, &self.geometry),
            None => false,
        }
    }

    /// Pointer moved by `delta_px`. Returns `true` if the model changed.
    pub fn drag(&mut self, delta_px: f64) -> bool {
        let Some(index) = self.dragging_index() else {
            return false;
        };
        let op = self.drags[index].drag_by(index, delta_px, &self.geometry);
        op.is_some_and(|op| self.apply(op))
    }

    pub fn end_drag(&mut self) -> bool {
        let Some(index) = self.dragging_index() else {
            return false;
        };
        let op = self.drags[index].end(index, &self.geometry);
        op.is_some_and(|op| self.apply(op))
    }

    pub fn cancel_drag(&mut self) -> bool {
        let Some(index) = self.dragging_index() else {
            return false;
        };
        let op = self.drags[index].cancel(index, &self.geometry);
        op.is_some_and(|op| self.apply(op))
    }

    /// Resolve and commit one timing edit. `false` when it was rejected or
    /// changed nothing.
    pub fn apply(&mut self, op: EditOperation) -> bool {
        match TokenHandler::apply_edit(self.model.line(), op, self.model.min_duration()) {
            Some(tokens) => self.commit(tokens),
            None => false,
        }
    }

    /// Insert a placeholder at `time`; returns its index.
    pub fn insert_at(&mut self, time: f64) -> Option<usize> {
        let (tokens, index) = TokenHandler::insert_token(self.model.line(), time, &self.config)?;
        self.commit(tokens);
        self.selection.on_inserted(index);
        self.rebuild_drag_controllers();
        Some(index)
    }

    pub fn delete(&mut self, index: usize) -> bool {
        let Some(tokens) =
            TokenHandler::delete_token(self.model.line(), index, self.model.min_duration())
        else {
            return false;
        };
        self.commit(tokens);
        self.selection.on_deleted(index);
        self.rebuild_drag_controllers();
        true
    }

    pub fn set_field(&mut self, index: usize, field: TokenField, value: &str) -> bool {
        match TokenHandler::set_field(
            self.model.line(),
            index,
            field,
            value,
            self.model.min_duration(),
        ) {
            Some(tokens) => self.commit(tokens),
            None => false,
        }
    }

    /// Typed start time; handled as a left-edge resize.
    pub fn set_start_time(&mut self, index: usize, start: f64) -> bool {
        let Some(current) = self.model.tokens().get(index).map(LyricToken::span) else {
            return false;
        };
        self.apply(EditOperation::resize_left(index, current, start))
    }

    /// Typed end time; handled as a right-edge resize.
    pub fn set_end_time(&mut self, index: usize, end: f64) -> bool {
        let Some(current) = self.model.tokens().get(index).map(LyricToken::span) else {
            return false;
        };
        self.apply(EditOperation::resize_right(index, current, end))
    }

    pub fn active_token_index(&self, clock: &dyn MediaClock) -> Option<usize> {
        clock
            .current_time()
            .and_then(|time| self.model.line().active_token_index(time))
    }

    /// Seek from a pointer on the scrub bar, in widget coordinates.
    pub fn scrub_to_pointer(&mut self, clock: &mut dyn MediaClock, widget_x: f64) -> Option<f64> {
        let geometry = TimelineGeometry::for_widget(
            self.model.line(),
            self.widget_width,
            self.config.thumb_width_px,
        );
        let time = geometry.pointer_to_time(widget_x)?;
        self.player.scrub_to(clock, time);
        clock.current_time()
    }

    pub fn is_dirty(&self) -> bool {
        self.model.line() != &self.pristine
    }

    /// Accept the edits; the returned line is what the caller persists.
    pub fn save(&mut self) -> LyricLine {
        let line = self.model.line().clone();
        info!(
            "Saved line '{}' with {} tokens (revision {})",
            line.id,
            line.tokens.len(),
            self.model.revision()
        );
        self.pristine = line.clone();
        line
    }

    /// Throw away every edit since the last save.
    pub fn cancel(&mut self) {
        debug!("Discarding edits on line '{}'", self.pristine.id);
        self.model = IntervalModel::new(self.pristine.clone(), self.config.min_duration);
        self.selection = SelectionState::default();
        self.rebuild_drag_controllers();
    }

    fn commit(&mut self, tokens: Vec<LyricToken>) -> bool {
        if tokens.as_slice() == self.model.tokens() {
            return false;
        }
        self.model.replace(tokens);
        true
    }

    /// Structural edits renumber the blocks, which drops any gesture.
    fn rebuild_drag_controllers(&mut self) {
        self.drags = (0..self.model.tokens().len())
            .map(|_| TokenDragController::new(self.config.commit_mode))
            .collect();
    }
}

fn track_geometry(line: &LyricLine, config: &EditorConfig, widget_width: f64) -> TimelineGeometry {
    TimelineGeometry::for_line(line, (widget_width - config.thumb_width_px).max(0.0))
}
