//! Color palette and style helpers for the dashboard.

use ratatui::style::{Color, Modifier, Style};

use dockwatch_core::state::PALETTE_LEN;

/// Colors handed out to services in first-seen order.
pub const SERVICE_COLORS: [Color; PALETTE_LEN] = [
    Color::Yellow,
    Color::Cyan,
    Color::Magenta,
    Color::Green,
    Color::Blue,
    Color::Red,
    Color::Rgb(0, 139, 139),
    Color::Rgb(139, 0, 139),
    Color::Rgb(128, 128, 0),
    Color::Rgb(0, 128, 128),
];

#[derive(Clone, Debug)]
pub struct Palette {
    /// Panel border color
    pub panel_border: Color,
    /// Primary text color
    pub text: Color,
    /// Dimmed text (secondary info)
    pub text_dim: Color,
    /// Muted text (placeholders)
    pub text_muted: Color,
    pub accent: Color,
    /// Running containers
    pub success: Color,
    /// Stale data marker
    pub warn: Color,
    /// Stopped containers, stderr marker
    pub error: Color,
    pub key_hint: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self::dark()
    }
}

impl Palette {
    pub fn dark() -> Self {
        Self {
            panel_border: Color::Rgb(60, 60, 60),
            text: Color::Rgb(212, 212, 212),
            text_dim: Color::Rgb(150, 150, 150),
            text_muted: Color::Rgb(100, 100, 100),
            accent: Color::Rgb(79, 193, 255),
            success: Color::Rgb(78, 201, 176),
            warn: Color::Rgb(220, 180, 100),
            error: Color::Rgb(244, 135, 113),
            key_hint: Color::Rgb(206, 145, 120),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Theme {
    pub palette: Palette,
}

impl Theme {
    /// Color for a registry slot; unregistered services fall back to text.
    pub fn service_color(&self, slot: Option<usize>) -> Color {
        match slot {
            Some(i) => SERVICE_COLORS[i % PALETTE_LEN],
            None => self.palette.text,
        }
    }

    pub fn service_style(&self, slot: Option<usize>) -> Style {
        Style::default()
            .fg(self.service_color(slot))
            .add_modifier(Modifier::BOLD)
    }

    /// Green for running, red for anything else.
    pub fn state_style(&self, running: bool) -> Style {
        if running {
            Style::default().fg(self.palette.success)
        } else {
            Style::default().fg(self.palette.error)
        }
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.palette.panel_border)
    }

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.palette.text)
    }

    pub fn text_dim_style(&self) -> Style {
        Style::default().fg(self.palette.text_dim)
    }

    pub fn placeholder_style(&self) -> Style {
        Style::default()
            .fg(self.palette.text_muted)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(self.palette.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.palette.text)
            .add_modifier(Modifier::BOLD)
    }

    pub fn key_hint_style(&self) -> Style {
        Style::default().fg(self.palette.key_hint)
    }

    pub fn warn_style(&self) -> Style {
        Style::default()
            .fg(self.palette.warn)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.palette.error)
    }
}

static DEFAULT_THEME: std::sync::OnceLock<Theme> = std::sync::OnceLock::new();

pub fn theme() -> &'static Theme {
    DEFAULT_THEME.get_or_init(Theme::default)
}

pub mod styles {
    use super::*;

    pub fn service(slot: Option<usize>) -> Style {
        theme().service_style(slot)
    }

    pub fn state(running: bool) -> Style {
        theme().state_style(running)
    }

    pub fn border() -> Style {
        theme().border_style()
    }

    pub fn text() -> Style {
        theme().text_style()
    }

    pub fn text_dim() -> Style {
        theme().text_dim_style()
    }

    pub fn placeholder() -> Style {
        theme().placeholder_style()
    }

    pub fn header() -> Style {
        theme().header_style()
    }

    pub fn title() -> Style {
        theme().title_style()
    }

    pub fn key_hint() -> Style {
        theme().key_hint_style()
    }

    pub fn warn() -> Style {
        theme().warn_style()
    }

    pub fn error() -> Style {
        theme().error_style()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_color_wraps_and_falls_back() {
        let theme = Theme::default();
        assert_eq!(theme.service_color(Some(0)), Color::Yellow);
        assert_eq!(theme.service_color(Some(PALETTE_LEN + 1)), Color::Cyan);
        assert_eq!(theme.service_color(None), theme.palette.text);
    }
}
