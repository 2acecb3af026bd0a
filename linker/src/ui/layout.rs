//! Responsive layout for the linker panel.
//!
//! Pure layout arithmetic, recomputed inside `terminal.draw()` on every render
//! so each frame reflects the current terminal size.
//!
//! # Panel geometry
//!
//! A one-row header names the page, a one-row status bar sits at the bottom, and
//! the middle is split between the suggestion list and a detail panel for the
//! highlighted suggestion. Below 100 columns the detail panel collapses and the
//! list fills the full width.
//!
//! `Spacing::Overlap(1)` combined with `Block::merge_borders(MergeStrategy::Fuzzy)`
//! makes the two panels share a single border column.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};

use crate::app::{format_threshold, Message, PanelModel, SessionSnapshot};
use crate::theme::Theme;

/// Returns `[header, list, detail, status_bar]` for the current frame.
///
/// `detail` has zero width on narrow terminals.
pub fn compute_layout(frame: &Frame) -> [Rect; 4] {
    let term_width = frame.area().width;

    let [header, main_area, status_bar] = frame.area().layout(&Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ]));

    let horizontal = if term_width >= 100 {
        Layout::horizontal([Constraint::Percentage(62), Constraint::Percentage(38)])
    } else {
        Layout::horizontal([Constraint::Fill(1), Constraint::Length(0)])
    }
    .spacing(Spacing::Overlap(1));

    let [list, detail] = main_area.layout(&horizontal);
    [header, list, detail, status_bar]
}

/// Returns the inner `Rect` of a panel after removing the 1-cell border.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Builds a bordered `Block` for a panel.
///
/// The focused panel gets a thick border. `MergeStrategy::Fuzzy` is used because
/// `Exact` produces incorrect junctions when mixing `Thick` and `Plain` borders.
pub fn panel_block<'a>(title: &'a str, is_focused: bool, theme: &'a Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

/// Renders the one-row header naming the page the panel is for.
pub fn render_header(frame: &mut Frame, area: Rect, snapshot: &SessionSnapshot, theme: &Theme) {
    let line = match &snapshot.page {
        Some(page) => Line::from(vec![
            Span::styled(" linker ", Style::default().fg(theme.border_active).add_modifier(Modifier::BOLD)),
            Span::raw(format!("{} ", page.kind.as_str())),
            Span::styled(format!("{}#{}", page.repository, page.local_id), Style::default().fg(theme.reference)),
        ]),
        None => Line::from(vec![
            Span::styled(" linker ", Style::default().fg(theme.border_active).add_modifier(Modifier::BOLD)),
            Span::styled("no GitHub issue or pull request", Style::default().fg(theme.border_inactive)),
        ]),
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Renders the status bar: state badge, connection, threshold, last message.
pub fn render_status_bar(
    frame: &mut Frame,
    area: Rect,
    model: &PanelModel,
    snapshot: &SessionSnapshot,
    theme: &Theme,
) {
    let state_span = Span::styled(
        format!(" {} ", snapshot.state.label().to_uppercase()),
        Style::default().fg(theme.state(snapshot.state)).add_modifier(Modifier::BOLD),
    );
    let connection = if snapshot.connected { "● host" } else { "○ host" };
    let mut spans = vec![
        state_span,
        Span::raw(format!(" {connection} ")),
        Span::raw(format!(
            " {} ",
            format_threshold(snapshot.threshold_percent, snapshot.max_percent)
        )),
    ];
    if !snapshot.selected.is_empty() {
        spans.push(Span::styled(
            format!(" {} selected ", snapshot.selected.len()),
            Style::default().fg(theme.selection_mark),
        ));
    }
    match model.message() {
        Some(Message::Error(text)) => spans.push(Span::styled(format!(" {text}"), Style::default().fg(theme.error))),
        Some(Message::Notice(text)) => spans.push(Span::styled(format!(" {text}"), Style::default().fg(theme.notice))),
        None => {}
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}
