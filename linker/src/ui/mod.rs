//! UI rendering for the linker panel.
//!
//! `render()` is the single entry point called by the event loop's
//! `terminal.draw()` closure. Layout arithmetic lives in `layout.rs` and the
//! suggestion list in `suggestion_list.rs`; the detail panel is small enough to
//! live here.

mod layout;
pub mod help;
pub mod keybindings;
pub mod suggestion_list;

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
};

use crate::app::{Mode, PanelModel, SessionSnapshot};
use crate::theme::Theme;
use layout::{compute_layout, inner_rect, panel_block, render_header, render_status_bar};

/// Renders one complete frame.
///
/// Called exactly once per `AppEvent::Render`. The list's viewport height and
/// rect are cached into `model` for the next keypress (half-page moves, mouse
/// hit-testing); the one-frame lag is imperceptible.
pub fn render(frame: &mut Frame, model: &mut PanelModel, snapshot: &SessionSnapshot, theme: &Theme) {
    let [header, list, detail, status_bar] = compute_layout(frame);

    model.list_viewport_height = inner_rect(list).height;
    model.list_rect = list;

    render_header(frame, header, snapshot, theme);
    suggestion_list::render_suggestions(frame, list, model, snapshot, theme);
    if detail.width > 0 {
        render_detail(frame, detail, model, snapshot, theme);
    }
    render_status_bar(frame, status_bar, model, snapshot, theme);

    // Rendered last so it sits on top.
    if model.mode == Mode::HelpOverlay {
        help::render_help_overlay(frame, theme, model.help_scroll);
    }
}

/// Details of the highlighted suggestion.
fn render_detail(
    frame: &mut Frame,
    area: Rect,
    model: &PanelModel,
    snapshot: &SessionSnapshot,
    theme: &Theme,
) {
    let block = panel_block("Details", false, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let Some(suggestion) = model.highlighted() else {
        return;
    };

    let label = Style::default().fg(theme.border_inactive);
    let selected = if snapshot.selected.contains(&suggestion.id) { "yes" } else { "no" };
    let text = Text::from(vec![
        Line::styled(
            suggestion.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::from(""),
        Line::from(vec![
            Span::styled("Reference    ", label),
            Span::styled(
                format!("{}#{}", suggestion.repository, suggestion.id),
                Style::default().fg(theme.reference),
            ),
        ]),
        Line::from(vec![
            Span::styled("Probability  ", label),
            Span::styled(
                format!("{:.1}%", suggestion.probability * 100.0),
                Style::default().fg(theme.probability(suggestion.probability)),
            ),
        ]),
        Line::from(vec![Span::styled("Selected     ", label), Span::raw(selected)]),
        Line::from(""),
        Line::from(Span::styled(suggestion.url(), label)),
    ]);
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), inner);
}
