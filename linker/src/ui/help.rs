//! Help overlay renderer.
//!
//! Draws a centred modal over the panel using ratatui's `Clear` widget to erase
//! the background first, inside the same `terminal.draw()` closure as the panels.

use ratatui::{
    Frame,
    layout::Constraint,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::theme::Theme;

/// Renders the help overlay as a centred modal, scrolled by `help_scroll` rows.
///
/// Skipped on terminals narrower than 50 columns to avoid a zero-height `Rect`.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 50 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));

    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help  — j/k scroll, ? or Esc to dismiss ")
        .border_style(ratatui::style::Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(build_help_text())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn build_help_text() -> Text<'static> {
    Text::from(vec![
        Line::from("Suggestions"),
        Line::from("  j / k         Move down / up"),
        Line::from("  g / G         Jump to first / last"),
        Line::from("  Ctrl-d / u    Move half a page down / up"),
        Line::from("  Space         Select / unselect the highlighted suggestion"),
        Line::from("  o             Show the GitHub link of the highlighted suggestion"),
        Line::from(""),
        Line::from("Threshold"),
        Line::from("  + / -         Raise / lower the confidence threshold by 1%"),
        Line::from(""),
        Line::from("Prediction host"),
        Line::from("  c             Connect (or retry after a failure)"),
        Line::from("  p             Ask for suggestions again"),
        Line::from("  r             Record the selected links"),
        Line::from("  u             Ask the host to update its model"),
        Line::from(""),
        Line::from("General"),
        Line::from("  ?             Open / close this help overlay"),
        Line::from("  q / Esc       Quit"),
    ])
}
