//! Pointer-gesture state machine for a single token block.
//!
//! A block has three grab zones. While a zone is dragged the pointer deltas
//! pile up in a local pixel offset that drives the on-screen position
//! directly; nothing reaches the model until the gesture ends (or on every
//! move in [`CommitMode::Continuous`]). The offset is converted to times
//! through [`TimelineGeometry`] and handed out as one [`EditOperation`].

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::config::CommitMode;
use crate::model::TokenSpan;
use crate::service::handlers::{EditKind, EditOperation};
use crate::timeline::{PixelSpan, TimelineGeometry};

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub enum GrabZone {
    Body,
    LeftEdge,
    RightEdge,
}

impl GrabZone {
    pub fn edit_kind(self) -> EditKind {
        match self {
            GrabZone::Body => EditKind::Move,
            GrabZone::LeftEdge => EditKind::ResizeLeft,
            GrabZone::RightEdge => EditKind::ResizeRight,
        }
    }
}

/// Zone of `block` under `pointer_px`. Edge zones only exist on a selected
/// block, and never eat more than a third of it each.
pub fn hit_test(
    block: PixelSpan,
    pointer_px: f64,
    edge_width: f64,
    selected: bool,
) -> Option<GrabZone> {
    if !block.contains(pointer_px) {
        return None;
    }
    if selected {
        let edge = edge_width.min(block.width / 3.0);
        if pointer_px <= block.x + edge {
            return Some(GrabZone::LeftEdge);
        }
        if pointer_px >= block.right() - edge {
            return Some(GrabZone::RightEdge);
        }
    }
    Some(GrabZone::Body)
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum DragState {
    Idle,
    Dragging {
        zone: GrabZone,
        /// Committed span when the gesture began.
        origin: TokenSpan,
        offset_px: f64,
    },
}

#[derive(Clone, Debug)]
pub struct TokenDragController {
    state: DragState,
    commit_mode: CommitMode,
}

impl TokenDragController {
    pub fn new(commit_mode: CommitMode) -> Self {
        Self {
            state: DragState::Idle,
            commit_mode,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Start a gesture. Refused while another gesture is running, on a
    /// timeline that is not interactive yet, and for any zone of an
    /// unselected token.
    pub fn begin(
        &mut self,
        zone: GrabZone,
        origin: TokenSpan,
        selected: bool,
        geometry: &TimelineGeometry,
    ) -> bool {
        if self.is_dragging() || !selected || !geometry.is_interactive() {
            return false;
        }
        self.state = DragState::Dragging {
            zone,
            origin,
            offset_px: 0.0,
        };
        trace!("Drag started on {:?}", zone);
        true
    }

    /// Accumulate a pointer delta. In continuous mode the resulting
    /// operation is returned for an immediate commit.
    pub fn drag_by(
        &mut self,
        index: usize,
        delta_px: f64,
        geometry: &TimelineGeometry,
    ) -> Option<EditOperation> {
        let DragState::Dragging { offset_px, .. } = &mut self.state else {
            return None;
        };
        if delta_px.is_finite() {
            *offset_px += delta_px;
        }
        match self.commit_mode {
            CommitMode::Continuous => self.proposed_operation(index, geometry),
            CommitMode::OnRelease => None,
        }
    }

    /// Pointer released: hand out the accumulated edit and go idle.
    pub fn end(&mut self, index: usize, geometry: &TimelineGeometry) -> Option<EditOperation> {
        let op = self.proposed_operation(index, geometry);
        self.state = DragState::Idle;
        op
    }

    /// Gesture interrupted, e.g. the pointer left the document. The last
    /// known offset is still committed rather than thrown away.
    pub fn cancel(&mut self, index: usize, geometry: &TimelineGeometry) -> Option<EditOperation> {
        if self.is_dragging() {
            debug!("Drag on token {} interrupted; committing last offset", index);
        }
        self.end(index, geometry)
    }

    /// Where the block should be drawn right now.
    pub fn visual_span(&self, committed: TokenSpan, geometry: &TimelineGeometry) -> PixelSpan {
        match self.state {
            DragState::Idle => geometry.span_to_pixels(committed),
            DragState::Dragging {
                zone,
                origin,
                offset_px,
            } => {
                let base = geometry.span_to_pixels(origin);
                let (x, width) = match zone {
                    GrabZone::Body => (base.x + offset_px, base.width),
                    GrabZone::LeftEdge => (base.x + offset_px, base.width - offset_px),
                    GrabZone::RightEdge => (base.x, base.width + offset_px),
                };
                PixelSpan::new(x, width.max(0.0))
            }
        }
    }

    fn proposed_operation(&self, index: usize, geometry: &TimelineGeometry) -> Option<EditOperation> {
        let DragState::Dragging {
            zone,
            origin,
            offset_px,
        } = self.state
        else {
            return None;
        };
        if offset_px == 0.0 {
            return None;
        }

        let base = geometry.span_to_pixels(origin);
        let op = match zone {
            GrabZone::Body => {
                EditOperation::move_to(index, origin, geometry.pixel_to_time(base.x + offset_px)?)
            }
            GrabZone::LeftEdge => EditOperation::resize_left(
                index,
                origin,
                geometry.pixel_to_time(base.x + offset_px)?,
            ),
            GrabZone::RightEdge => EditOperation::resize_right(
                index,
                origin,
                geometry.pixel_to_time(base.right() + offset_px)?,
            ),
        };
        Some(op)
    }
}
