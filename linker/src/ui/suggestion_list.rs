//! Suggestion list panel.
//!
//! Renders the filtered suggestions from `PanelModel.suggestions`. Each entry
//! shows a selection checkbox, the issue/PR number, its probability, and the
//! title. When the list is empty, a placeholder explains why.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
};

use linker_core::{PanelState, Suggestion};

use crate::app::{PanelModel, SessionSnapshot};
use crate::theme::Theme;
use crate::ui::layout::panel_block;

/// Renders the list with `render_stateful_widget` so the cursor is highlighted.
pub fn render_suggestions(
    frame: &mut Frame,
    area: Rect,
    model: &mut PanelModel,
    snapshot: &SessionSnapshot,
    theme: &Theme,
) {
    let count = model.suggestions.len();
    let title = if count > 0 {
        format!("Suggestions ({count})")
    } else {
        "Suggestions".to_owned()
    };
    let block = panel_block(&title, true, theme);

    let items: Vec<ListItem> = if model.suggestions.is_empty() {
        vec![ListItem::new(Line::styled(
            placeholder(snapshot),
            Style::default().fg(theme.border_inactive),
        ))]
    } else {
        model
            .suggestions
            .iter()
            .map(|s| suggestion_item(s, snapshot.selected.contains(&s.id), theme))
            .collect()
    };

    let list = List::new(items)
        .block(block)
        .style(Style::default().bg(theme.background))
        .highlight_style(Style::default().fg(theme.border_active).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut model.list_state);
}

fn placeholder(snapshot: &SessionSnapshot) -> &'static str {
    match snapshot.state {
        _ if snapshot.page.is_none() => "Open a GitHub issue or pull request",
        PanelState::Disconnected => "Not connected (c to connect)",
        PanelState::Connecting => "Connecting...",
        PanelState::AwaitingPrediction => "Waiting for suggestions...",
        PanelState::RecordingSelections => "Recording links...",
        PanelState::Connected | PanelState::ShowingSuggestions | PanelState::ShowingError => {
            "No suggestions"
        }
    }
}

/// Format: `[x] #42   78%  Fix the flaky test`.
fn suggestion_item(s: &Suggestion, selected: bool, theme: &Theme) -> ListItem<'static> {
    let mark = if selected {
        Span::styled("[x] ", Style::default().fg(theme.selection_mark))
    } else {
        Span::styled("[ ] ", Style::default().fg(theme.border_inactive))
    };
    let number = Span::styled(format!("#{:<6}", s.id), Style::default().fg(theme.reference));
    let probability = Span::styled(
        format!("{:>4.0}%  ", s.probability * 100.0),
        Style::default().fg(theme.probability(s.probability)),
    );
    let title = if s.title.is_empty() { Span::raw("(untitled)") } else { Span::raw(s.title.clone()) };
    ListItem::new(Line::from(vec![mark, number, probability, title]))
}
