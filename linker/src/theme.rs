//! Color theme system for the linker panel.
//!
//! A `Theme` holds named `ratatui::style::Color` fields covering every surface the
//! panel renders. Two built-in themes are provided:
//!
//! - `dark` — uses ANSI 16 colors so it works on any terminal, including
//!   256-color SSH sessions with no truecolor support.
//! - `catppuccin_mocha` — Catppuccin Mocha palette in RGB; requires truecolor.

use ratatui::style::Color;

use linker_core::PanelState;

#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    pub border_active: Color,
    pub border_inactive: Color,

    // Suggestion list
    /// Checkbox of a suggestion selected for recording.
    pub selection_mark: Color,
    /// Probability at or above 70%.
    pub probability_high: Color,
    /// Probability at or above 40%.
    pub probability_mid: Color,
    pub probability_low: Color,
    /// Repository / id prefix of each row.
    pub reference: Color,

    // Messages
    pub notice: Color,
    pub error: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    /// State badge while a channel is open and idle.
    pub status_ready: Color,
    /// State badge while a request is in flight.
    pub status_busy: Color,
    /// State badge while disconnected or showing an error.
    pub status_down: Color,

    pub background: Color,
}

impl Theme {
    /// Returns the built-in dark theme using ANSI 16 colors.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            selection_mark: Color::Green,
            probability_high: Color::Green,
            probability_mid: Color::Yellow,
            probability_low: Color::DarkGray,
            reference: Color::Blue,

            notice: Color::Cyan,
            error: Color::Red,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_ready: Color::Green,
            status_busy: Color::Yellow,
            status_down: Color::Red,

            background: Color::Reset,
        }
    }

    /// Returns the Catppuccin Mocha theme using RGB truecolor values.
    ///
    /// Palette source: <https://github.com/catppuccin/catppuccin> Mocha variant.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161); // #a6e3a1
        let red = Color::Rgb(243, 139, 168); // #f38ba8
        let yellow = Color::Rgb(249, 226, 175); // #f9e2af
        let blue = Color::Rgb(137, 180, 250); // #89b4fa
        let teal = Color::Rgb(148, 226, 213); // #94e2d5
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface1 = Color::Rgb(69, 71, 90); // #45475a
        let base = Color::Rgb(30, 30, 46); // #1e1e2e
        let text = Color::Rgb(205, 214, 244); // #cdd6f4
        let peach = Color::Rgb(250, 179, 135); // #fab387

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            selection_mark: green,
            probability_high: green,
            probability_mid: peach,
            probability_low: overlay1,
            reference: blue,

            notice: teal,
            error: red,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_ready: green,
            status_busy: yellow,
            status_down: red,

            background: base,
        }
    }

    /// Resolves a theme name from config. Unknown names fall back to `dark()`
    /// so a typo never prevents startup.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }

    pub fn probability(&self, probability: f64) -> Color {
        if probability >= 0.7 {
            self.probability_high
        } else if probability >= 0.4 {
            self.probability_mid
        } else {
            self.probability_low
        }
    }

    pub fn state(&self, state: PanelState) -> Color {
        match state {
            PanelState::Connected | PanelState::ShowingSuggestions => self.status_ready,
            PanelState::Connecting
            | PanelState::AwaitingPrediction
            | PanelState::RecordingSelections => self.status_busy,
            PanelState::Disconnected | PanelState::ShowingError => self.status_down,
        }
    }
}
