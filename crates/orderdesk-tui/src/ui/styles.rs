use orderdesk_core::Theme;
use ratatui::style::{Color, Modifier, Style};

/// Colours for one theme
pub struct Palette {
    pub primary: Color,
    pub secondary: Color,
    pub accent: Color,
    pub error: Color,
    pub muted: Color,
    pub text: Color,
    pub highlight: Color,
    pub status_bg: Color,
}

const DARK: Palette = Palette {
    primary: Color::Rgb(64, 128, 192),
    secondary: Color::Rgb(96, 160, 96),
    accent: Color::Rgb(192, 160, 64),
    error: Color::Rgb(192, 64, 64),
    muted: Color::Rgb(128, 128, 128),
    text: Color::White,
    highlight: Color::Rgb(48, 48, 64),
    status_bg: Color::Rgb(32, 32, 40),
};

const LIGHT: Palette = Palette {
    primary: Color::Rgb(24, 88, 160),
    secondary: Color::Rgb(40, 120, 40),
    accent: Color::Rgb(160, 96, 0),
    error: Color::Rgb(176, 32, 32),
    muted: Color::Rgb(110, 110, 110),
    text: Color::Black,
    highlight: Color::Rgb(208, 220, 240),
    status_bg: Color::Rgb(225, 225, 230),
};

pub fn palette(theme: Theme) -> &'static Palette {
    match theme {
        Theme::Dark => &DARK,
        Theme::Light => &LIGHT,
    }
}

impl Palette {
    pub fn title(&self) -> Style {
        Style::default().fg(self.primary).add_modifier(Modifier::BOLD)
    }

    pub fn selected(&self) -> Style {
        Style::default()
            .bg(self.highlight)
            .fg(self.text)
            .add_modifier(Modifier::BOLD)
    }

    pub fn item(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn highlight(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn success(&self) -> Style {
        Style::default().fg(self.secondary)
    }

    pub fn error(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn tab(&self, selected: bool) -> Style {
        if selected {
            Style::default()
                .fg(self.primary)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(self.muted)
        }
    }

    pub fn border(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.primary)
        } else {
            Style::default().fg(self.muted)
        }
    }

    pub fn status_bar(&self) -> Style {
        Style::default().bg(self.status_bg).fg(self.text)
    }

    pub fn help_key(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn help_desc(&self) -> Style {
        Style::default().fg(self.text)
    }
}
