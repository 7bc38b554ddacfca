use ratatui::style::{Color, Modifier, Style};

/// Color scheme for the filter header and the results table.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,

    pub background: Color,
    pub foreground: Color,

    // Table colors
    pub header_fg: Color,
    pub header_bg: Color,
    pub row_alt_bg: Color, // For zebra striping

    // Filter button glyphs
    pub filter_idle: Color,
    pub filter_active: Color,

    pub warning: Color,
    pub info: Color,
}

impl Default for Theme {
    /// Dark theme
    fn default() -> Self {
        Self {
            name: "Default Dark".to_string(),
            background: Color::Reset,
            foreground: Color::Gray,
            header_fg: Color::Cyan,
            header_bg: Color::Reset,
            row_alt_bg: Color::Rgb(25, 25, 35),
            filter_idle: Color::DarkGray,
            filter_active: Color::Yellow,
            warning: Color::Yellow,
            info: Color::Blue,
        }
    }
}

impl Theme {
    pub fn light() -> Self {
        Self {
            name: "Light".to_string(),
            background: Color::White,
            foreground: Color::Black,
            header_fg: Color::Blue,
            header_bg: Color::Rgb(240, 240, 240),
            row_alt_bg: Color::Rgb(250, 250, 250),
            filter_idle: Color::Gray,
            filter_active: Color::Rgb(200, 150, 0), // Darker yellow for light bg
            warning: Color::Rgb(200, 150, 0),
            info: Color::Blue,
        }
    }

    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(self.header_fg)
            .bg(self.header_bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Style of a column's filter button.
    pub fn filter_marker_style(&self, active: bool) -> Style {
        if active {
            Style::default()
                .fg(self.filter_active)
                .bg(self.header_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.filter_idle).bg(self.header_bg)
        }
    }

    pub fn normal_style(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.background)
    }

    pub fn alt_row_style(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.row_alt_bg)
    }

    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn info_style(&self) -> Style {
        Style::default().fg(self.info)
    }
}
