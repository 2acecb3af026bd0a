//! Central UI state for the linker panel.
//!
//! `PanelModel` is the view the session manager renders into: it implements
//! `PanelView` by storing what it is told, and the ratatui renderer draws from it
//! on the next `Render` tick. No ratatui drawing happens here, and no session
//! logic: everything that changes the session goes through the manager.

use std::collections::BTreeSet;

use ratatui::layout::Rect;
use ratatui::widgets::ListState;

use linker_core::{Context, NativeSessionManager, PanelState, PanelView, Suggestion};

/// Which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Full-screen help overlay is shown above the panel.
    HelpOverlay,
}

/// Status line text, errors taking precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Notice(String),
    Error(String),
}

#[derive(Default)]
pub struct PanelModel {
    pub mode: Mode,
    /// Filtered suggestions as last rendered by the session, in service order.
    pub suggestions: Vec<Suggestion>,
    /// Cursor over `suggestions`.
    pub list_state: ListState,
    pub notice: Option<String>,
    pub error: Option<String>,
    /// Mirrors the session's state for the status line.
    pub state: PanelState,
    pub help_scroll: u16,
    /// Inner height of the suggestion list, cached after each render.
    pub list_viewport_height: u16,
    /// Outer rect of the suggestion list, cached for mouse hit-testing.
    pub list_rect: Rect,
}

impl PanelView for PanelModel {
    fn render(&mut self, suggestions: &[Suggestion]) {
        self.suggestions = suggestions.to_vec();
        self.notice = None;
        let last = self.suggestions.len().checked_sub(1);
        let cursor = match (self.list_state.selected(), last) {
            (_, None) => None,
            (Some(index), Some(last)) => Some(index.min(last)),
            (None, Some(_)) => Some(0),
        };
        self.list_state.select(cursor);
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_owned());
    }

    fn show_notice(&mut self, message: &str) {
        self.notice = Some(message.to_owned());
    }

    fn state_changed(&mut self, state: PanelState) {
        self.state = state;
        self.error = None;
    }
}

impl PanelModel {
    /// What the status line should say, if anything.
    pub fn message(&self) -> Option<Message> {
        match (&self.error, &self.notice) {
            (Some(error), _) => Some(Message::Error(error.clone())),
            (None, Some(notice)) => Some(Message::Notice(notice.clone())),
            (None, None) => None,
        }
    }

    /// The suggestion under the cursor.
    pub fn highlighted(&self) -> Option<&Suggestion> {
        self.list_state.selected().and_then(|i| self.suggestions.get(i))
    }

    pub fn move_down(&mut self, rows: u16) {
        let Some(last) = self.suggestions.len().checked_sub(1) else {
            return;
        };
        let next = self
            .list_state
            .selected()
            .map_or(0, |i| i.saturating_add(usize::from(rows)))
            .min(last);
        self.list_state.select(Some(next));
    }

    pub fn move_up(&mut self, rows: u16) {
        if self.suggestions.is_empty() {
            return;
        }
        let next = self
            .list_state
            .selected()
            .map_or(0, |i| i.saturating_sub(usize::from(rows)));
        self.list_state.select(Some(next));
    }

    pub fn move_top(&mut self) {
        if !self.suggestions.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn move_bottom(&mut self) {
        let last = self.suggestions.len().checked_sub(1);
        if last.is_some() {
            self.list_state.select(last);
        }
    }

    /// Half the cached viewport height, at least one row.
    pub fn half_page(&self) -> u16 {
        (self.list_viewport_height / 2).max(1)
    }

    /// Puts the GitHub URL of the highlighted suggestion on the status line.
    pub fn show_link(&mut self) {
        let message = match self.highlighted() {
            Some(suggestion) => suggestion.url(),
            None => "No suggestion highlighted.".to_owned(),
        };
        self.error = None;
        self.notice = Some(message);
    }
}

/// Session facts the renderer needs besides the model, copied out per frame so
/// the model can be borrowed mutably while drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: PanelState,
    pub connected: bool,
    pub page: Option<Context>,
    pub selected: BTreeSet<String>,
    pub threshold_percent: u32,
    pub max_percent: u32,
}

impl SessionSnapshot {
    pub fn of<V: PanelView>(manager: &NativeSessionManager<V>) -> Self {
        let session = manager.session();
        Self {
            state: manager.state(),
            connected: manager.is_connected(),
            page: manager.page().cloned(),
            selected: session.selection.ids().clone(),
            threshold_percent: session.thresholds.value_percent(),
            max_percent: session.thresholds.max_percent(),
        }
    }
}

/// Formats the threshold control for the status line, e.g. `"≥ 25% (max 40%)"`.
pub fn format_threshold(threshold_percent: u32, max_percent: u32) -> String {
    format!("≥ {threshold_percent}% (max {max_percent}%)")
}
