//! ResultsTable: renders a [`FilterView`]'s header, visible rows and status
//! line into a ratatui buffer.

use ratatui::prelude::*;

use crate::core::TabularSource;
use crate::services::filter_view::FilterView;

pub struct ResultsTable<'a, S: TabularSource> {
    view: &'a FilterView<S>,
    offset: usize,
    show_status: bool,
}

impl<'a, S: TabularSource> ResultsTable<'a, S> {
    pub fn new(view: &'a FilterView<S>) -> Self {
        Self {
            view,
            offset: 0,
            show_status: true,
        }
    }

    /// First visible row to draw.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn show_status(mut self, show: bool) -> Self {
        self.show_status = show;
        self
    }
}

impl<S: TabularSource> Widget for ResultsTable<'_, S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        let header = self.view.header();
        let theme = header.theme();
        let status_height = u16::from(self.show_status && area.height > 1);

        let header_area = Rect::new(area.x, area.y, area.width, 1);
        header.render(header_area, buf);
        let sections = header.sections(header_area);

        let body_height = area.height.saturating_sub(1 + status_height);
        let rows = self.view.visible_rows().iter().skip(self.offset).take(body_height as usize);
        for (i, &row) in rows.enumerate() {
            let y = area.y + 1 + i as u16;
            let style = if i % 2 == 1 { theme.alt_row_style() } else { theme.normal_style() };
            buf.set_style(Rect::new(area.x, y, area.width, 1), style);
            for section in &sections {
                let text = self.view.source().cell(row, section.column).as_text();
                let room = section.area.width.saturating_sub(1) as usize;
                buf.set_stringn(section.area.x, y, text, room, style);
            }
        }

        if status_height == 1 {
            let y = area.bottom() - 1;
            let style = if self.view.last_pass().diagnostics.is_clean() {
                theme.info_style()
            } else {
                theme.warning_style()
            };
            buf.set_stringn(area.x, y, self.view.status_line(), area.width as usize, style);
        }
    }
}

/// Draw `widget` into an off-screen buffer and return its rows as plain
/// text with trailing blanks removed.
pub fn render_to_lines(widget: impl Widget, width: u16, height: u16) -> Vec<String> {
    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);
    widget.render(area, &mut buf);
    if width == 0 {
        return Vec::new();
    }
    buf.content
        .chunks(width as usize)
        .map(|row| {
            let line: String = row.iter().map(|cell| cell.symbol()).collect();
            line.trim_end().to_string()
        })
        .collect()
}
