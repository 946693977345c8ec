use ratatui::style::{Color, Modifier, Style};

/// Colors for the booking form
#[derive(Debug, Clone)]
pub struct Theme {
    // Background colors
    pub bg_primary: Color,
    pub bg_secondary: Color,
    pub bg_input: Color,

    // Foreground colors
    pub fg_primary: Color,
    pub fg_secondary: Color,
    pub fg_label: Color,
    pub fg_accent: Color,

    // Semantic colors
    pub success: Color,
    pub warning: Color,
    pub error: Color,

    pub border: Color,
    pub selection: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            bg_primary: Color::Rgb(11, 18, 32),
            bg_secondary: Color::Rgb(17, 24, 39),
            bg_input: Color::Rgb(15, 23, 42),

            fg_primary: Color::Rgb(229, 231, 235),
            fg_secondary: Color::Rgb(156, 163, 175),
            fg_label: Color::Rgb(199, 210, 254),
            fg_accent: Color::Rgb(37, 99, 235),

            success: Color::Rgb(34, 197, 94),
            warning: Color::Rgb(251, 191, 36),
            error: Color::Rgb(248, 81, 73),

            border: Color::Rgb(31, 41, 51),
            selection: Color::Rgb(48, 65, 94),
        }
    }

    pub fn background_style(&self) -> Style {
        Style::default().bg(self.bg_primary).fg(self.fg_primary)
    }

    pub fn block_style(&self) -> Style {
        Style::default().bg(self.bg_secondary).fg(self.fg_primary)
    }

    pub fn block_border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn focused_border_style(&self) -> Style {
        Style::default().fg(self.fg_accent).add_modifier(Modifier::BOLD)
    }

    pub fn title_style(&self) -> Style {
        Style::default().fg(self.fg_primary).add_modifier(Modifier::BOLD)
    }

    pub fn subtitle_style(&self) -> Style {
        Style::default().fg(self.fg_secondary)
    }

    pub fn label_style(&self) -> Style {
        Style::default().fg(self.fg_label)
    }

    pub fn input_style(&self) -> Style {
        Style::default().bg(self.bg_input).fg(self.fg_primary)
    }

    pub fn header_style(&self) -> Style {
        Style::default()
            .bg(self.border)
            .fg(self.fg_primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selected_style(&self) -> Style {
        Style::default().bg(self.selection).fg(self.fg_primary)
    }

    pub fn button_style(&self, enabled: bool) -> Style {
        if enabled {
            Style::default()
                .bg(self.fg_accent)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.fg_secondary).add_modifier(Modifier::DIM)
        }
    }

    pub fn status_style(&self, warn: bool) -> Style {
        let color = if warn { self.warning } else { self.success };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error).add_modifier(Modifier::BOLD)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
