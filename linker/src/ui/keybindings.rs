//! Keybinding dispatcher for the linker panel.
//!
//! Translates raw crossterm events into `PanelModel` cursor/overlay mutations
//! and returns a `KeyAction` naming the session operation, if any, the event
//! loop should run. The dispatcher never talks to the session itself: session
//! calls are async and owned by the loop.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;

use crate::app::{Mode, PanelModel};

/// What the event loop should do after a key or mouse event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Nothing beyond redrawing.
    Continue,
    Quit,
    /// Open the native channel (also the retry after a failure).
    Connect,
    RequestPrediction,
    RequestModelUpdate,
    /// Toggle selection of the suggestion with this id.
    Toggle(String),
    RecordSelections,
    /// Move the threshold by this many percentage points.
    StepThreshold(i32),
}

/// Dispatches a key event to the handler matching the current mode.
pub fn handle_key(key: KeyEvent, model: &mut PanelModel) -> KeyAction {
    match model.mode {
        Mode::HelpOverlay => handle_help(key, model),
        Mode::Normal => handle_normal(key, model),
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, model: &mut PanelModel) -> KeyAction {
    if let Some(action) = handle_movement_key(key, model) {
        return action;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => KeyAction::Quit,
        KeyCode::Char('c') => KeyAction::Connect,
        KeyCode::Char('p') => KeyAction::RequestPrediction,
        KeyCode::Char('u') => KeyAction::RequestModelUpdate,
        KeyCode::Char('r') => KeyAction::RecordSelections,
        KeyCode::Char(' ') => match model.highlighted() {
            Some(suggestion) => KeyAction::Toggle(suggestion.id.clone()),
            None => KeyAction::Continue,
        },
        KeyCode::Char('+') | KeyCode::Char('=') => KeyAction::StepThreshold(1),
        KeyCode::Char('-') | KeyCode::Char('_') => KeyAction::StepThreshold(-1),
        KeyCode::Char('o') => {
            model.show_link();
            KeyAction::Continue
        }
        KeyCode::Char('?') => {
            model.help_scroll = 0;
            model.mode = Mode::HelpOverlay;
            KeyAction::Continue
        }
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        _ => KeyAction::Continue,
    }
}

/// Cursor keys: j / k / g / G, arrows, and Ctrl-d / Ctrl-u.
///
/// Returns `None` when the key should fall through to the rest of the Normal
/// handler (plain `u` is a session request, Ctrl-u is movement).
fn handle_movement_key(key: KeyEvent, model: &mut PanelModel) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => model.move_down(1),
        KeyCode::Char('k') | KeyCode::Up => model.move_up(1),
        KeyCode::Char('g') | KeyCode::Home => model.move_top(),
        KeyCode::Char('G') | KeyCode::End => model.move_bottom(),
        KeyCode::Char('d') if ctrl => model.move_down(model.half_page()),
        KeyCode::Char('u') if ctrl => model.move_up(model.half_page()),
        KeyCode::PageDown => model.move_down(model.list_viewport_height.max(1)),
        KeyCode::PageUp => model.move_up(model.list_viewport_height.max(1)),
        _ => return None,
    }
    Some(KeyAction::Continue)
}

// ---------------------------------------------------------------------------
// HelpOverlay mode
// ---------------------------------------------------------------------------

/// `?`, `Esc`, or `q` dismisses the overlay; j/k/g/G scroll it.
fn handle_help(key: KeyEvent, model: &mut PanelModel) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => model.help_scroll = model.help_scroll.saturating_add(1),
        KeyCode::Char('k') | KeyCode::Up => model.help_scroll = model.help_scroll.saturating_sub(1),
        KeyCode::Char('g') => model.help_scroll = 0,
        KeyCode::Char('G') => model.help_scroll = u16::MAX,
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => model.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Left click moves the cursor to the clicked row; the wheel moves it by 3.
/// In the help overlay the wheel scrolls the overlay instead.
pub fn handle_mouse(mouse: MouseEvent, model: &mut PanelModel) -> KeyAction {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) if model.mode == Mode::Normal => {
            handle_mouse_click(mouse.column, mouse.row, model);
        }
        MouseEventKind::ScrollUp if model.mode == Mode::HelpOverlay => {
            model.help_scroll = model.help_scroll.saturating_sub(3);
        }
        MouseEventKind::ScrollDown if model.mode == Mode::HelpOverlay => {
            model.help_scroll = model.help_scroll.saturating_add(3);
        }
        MouseEventKind::ScrollUp => model.move_up(3),
        MouseEventKind::ScrollDown => model.move_down(3),
        _ => {}
    }
    KeyAction::Continue
}

/// Selects the row under the click, accounting for the border and list offset.
fn handle_mouse_click(col: u16, row: u16, model: &mut PanelModel) {
    let area = model.list_rect;
    if !area.contains(Position { x: col, y: row }) || row <= area.y {
        return;
    }
    let index = usize::from(row - area.y - 1) + model.list_state.offset();
    if index < model.suggestions.len() {
        model.list_state.select(Some(index));
    }
}
