use serde::{Deserialize, Serialize};

/// What a click on the timeline does. Add and delete are one-shot: they
/// fall back to `Select` after they have been used once.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub enum ToolMode {
    #[default]
    Select,
    Add,
    Delete,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ClickTarget {
    Token(usize),
    /// Empty timeline, already mapped to line time.
    Timeline(f64),
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ClickAction {
    Select(usize),
    Delete(usize),
    Insert(f64),
    ClearSelection,
    DoNothing,
}

/// Single-token selection plus the current tool mode.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionState {
    selected: Option<usize>,
    mode: ToolMode,
}

impl SelectionState {
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected == Some(index)
    }

    pub fn select(&mut self, index: usize) {
        self.selected = Some(index);
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ToolMode) {
        self.mode = mode;
    }

    pub fn toggle_add_mode(&mut self) {
        self.mode = if self.mode == ToolMode::Add {
            ToolMode::Select
        } else {
            ToolMode::Add
        };
    }

    pub fn toggle_delete_mode(&mut self) {
        self.mode = if self.mode == ToolMode::Delete {
            ToolMode::Select
        } else {
            ToolMode::Delete
        };
    }

    pub fn click_action(&self, target: ClickTarget) -> ClickAction {
        match (self.mode, target) {
            (ToolMode::Delete, ClickTarget::Token(index)) => ClickAction::Delete(index),
            (_, ClickTarget::Token(index)) => ClickAction::Select(index),
            (ToolMode::Add, ClickTarget::Timeline(time)) => ClickAction::Insert(time),
            (ToolMode::Select, ClickTarget::Timeline(_)) => ClickAction::ClearSelection,
            (ToolMode::Delete, ClickTarget::Timeline(_)) => ClickAction::DoNothing,
        }
    }

    /// Keep the selection on the same token after an insert at `index`.
    pub fn on_inserted(&mut self, index: usize) {
        if let Some(selected) = self.selected {
            if selected >= index {
                self.selected = Some(selected + 1);
            }
        }
        self.mode = ToolMode::Select;
    }

    pub fn on_deleted(&mut self, index: usize) {
        self.selected = match self.selected {
            Some(selected) if selected == index => None,
            Some(selected) if selected > index => Some(selected - 1),
            other => other,
        };
        self.mode = ToolMode::Select;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_are_mutually_exclusive() {
        let mut state = SelectionState::default();
        state.toggle_add_mode();
        assert_eq!(state.mode(), ToolMode::Add);
        state.toggle_delete_mode();
        assert_eq!(state.mode(), ToolMode::Delete);
        state.toggle_delete_mode();
        assert_eq!(state.mode(), ToolMode::Select);
    }

    #[test]
    fn clicks_are_routed_by_mode() {
        let mut state = SelectionState::default();
        assert_eq!(
            state.click_action(ClickTarget::Token(2)),
            ClickAction::Select(2)
        );
        assert_eq!(
            state.click_action(ClickTarget::Timeline(7.0)),
            ClickAction::ClearSelection
        );

        state.set_mode(ToolMode::Add);
        assert_eq!(
            state.click_action(ClickTarget::Timeline(7.0)),
            ClickAction::Insert(7.0)
        );
        assert_eq!(
            state.click_action(ClickTarget::Token(1)),
            ClickAction::Select(1)
        );

        state.set_mode(ToolMode::Delete);
        assert_eq!(
            state.click_action(ClickTarget::Token(1)),
            ClickAction::Delete(1)
        );
        assert_eq!(
            state.click_action(ClickTarget::Timeline(7.0)),
            ClickAction::DoNothing
        );
    }

    #[test]
    fn selection_follows_its_token_across_structural_edits() {
        let mut state = SelectionState::default();
        state.select(2);
        state.set_mode(ToolMode::Add);
        state.on_inserted(1);
        assert_eq!(state.selected(), Some(3));
        assert_eq!(state.mode(), ToolMode::Select);

        state.on_deleted(0);
        assert_eq!(state.selected(), Some(2));
        state.on_deleted(2);
        assert_eq!(state.selected(), None);
    }
}
