//! FilterHeader: column header row with a filter button per filterable column.
//!
//! Layout is a pure function of the column widths and the render area, so the
//! same [`FilterHeader::sections`] call that draws the header also answers
//! mouse hit tests.

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

use crate::services::sort::{SortDirection, SortKey};
use crate::tui::theme::Theme;

pub const FILTER_GLYPH_IDLE: &str = "▽";
pub const FILTER_GLYPH_ACTIVE: &str = "▼";

const MIN_COLUMN_WIDTH: u16 = 6;
const MAX_COLUMN_WIDTH: u16 = 40;
/// Glyph plus one blank cell.
const BUTTON_WIDTH: u16 = 2;

/// Which part of a header cell was clicked, and with which button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderInteraction {
    FilterButton(MouseButton),
    Label(MouseButton),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderEvent {
    pub column: usize,
    pub interaction: HeaderInteraction,
}

/// Screen placement of one column's header cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSection {
    pub column: usize,
    pub area: Rect,
    /// Present when the column is filterable and fully visible.
    pub button: Option<Rect>,
}

#[derive(Debug, Clone, Default)]
pub struct FilterHeader {
    labels: Vec<String>,
    widths: Vec<u16>,
    filterable: BTreeSet<usize>,
    active: BTreeSet<usize>,
    sort_marks: BTreeMap<usize, SortDirection>,
    theme: Theme,
}

/// `len` terminal cells plus a one-cell gap, saturating at `u16::MAX`.
fn padded_cells(len: usize) -> u16 {
    u16::try_from(len).unwrap_or(u16::MAX).saturating_add(1)
}

fn default_width(label: &str) -> u16 {
    let natural = padded_cells(label.chars().count()).saturating_add(BUTTON_WIDTH);
    natural.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
}

impl FilterHeader {
    pub fn new(labels: Vec<String>, filterable: impl IntoIterator<Item = usize>) -> Self {
        let widths = labels.iter().map(|l| default_width(l)).collect();
        Self {
            labels,
            widths,
            filterable: filterable.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Swap in a new column layout. Filter markers are kept; markers for
    /// columns that no longer exist are never drawn.
    pub fn set_columns(&mut self, labels: Vec<String>, filterable: impl IntoIterator<Item = usize>) {
        self.widths = labels.iter().map(|l| default_width(l)).collect();
        self.labels = labels;
        self.filterable = filterable.into_iter().collect();
    }

    pub fn is_filterable(&self, column: usize) -> bool {
        self.filterable.contains(&column)
    }

    pub fn column_width(&self, column: usize) -> u16 {
        self.widths.get(column).copied().unwrap_or(MIN_COLUMN_WIDTH)
    }

    /// Widen columns to fit their content. `content_widths[i]` is the widest
    /// value shown in column `i`.
    pub fn fit_widths(&mut self, content_widths: &[usize]) {
        for (column, label) in self.labels.iter().enumerate() {
            let content = padded_cells(content_widths.get(column).copied().unwrap_or(0));
            self.widths[column] = default_width(label).max(content).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
        }
    }

    /// Mirror which columns carry filters.
    pub fn write_filters(&mut self, active: impl IntoIterator<Item = usize>) {
        self.active = active.into_iter().collect();
    }

    pub fn clear_filters(&mut self) {
        self.active.clear();
    }

    pub fn is_filter_active(&self, column: usize) -> bool {
        self.active.contains(&column)
    }

    pub fn set_sort_marks(&mut self, keys: &[SortKey]) {
        self.sort_marks = keys.iter().map(|k| (k.column, k.direction)).collect();
    }

    /// Lay the header out left to right inside `area`'s first row.
    pub fn sections(&self, area: Rect) -> Vec<HeaderSection> {
        let mut sections = Vec::with_capacity(self.labels.len());
        let mut x = area.x;
        for column in 0..self.labels.len() {
            if x >= area.right() || area.height == 0 {
                break;
            }
            let width = self.column_width(column);
            let visible = width.min(area.right() - x);
            let button = (self.is_filterable(column) && visible == width)
                .then(|| Rect::new(x + width - BUTTON_WIDTH, area.y, BUTTON_WIDTH, 1));
            sections.push(HeaderSection {
                column,
                area: Rect::new(x, area.y, visible, 1),
                button,
            });
            x = x.saturating_add(width + 1);
        }
        sections
    }

    /// Column and whether the filter button was hit.
    pub fn hit_test(&self, area: Rect, x: u16, y: u16) -> Option<(usize, bool)> {
        let position = Position::new(x, y);
        self.sections(area).into_iter().find_map(|section| {
            if section.button.is_some_and(|b| b.contains(position)) {
                Some((section.column, true))
            } else if section.area.contains(position) {
                Some((section.column, false))
            } else {
                None
            }
        })
    }

    /// Translate a mouse press inside the header row into a [`HeaderEvent`].
    pub fn handle_mouse_event(&self, mouse: MouseEvent, area: Rect) -> Option<HeaderEvent> {
        let MouseEventKind::Down(button) = mouse.kind else {
            return None;
        };
        let (column, on_button) = self.hit_test(area, mouse.column, mouse.row)?;
        let interaction = if on_button {
            HeaderInteraction::FilterButton(button)
        } else {
            HeaderInteraction::Label(button)
        };
        Some(HeaderEvent { column, interaction })
    }
}

impl Widget for &FilterHeader {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let header_style = self.theme.header_style();
        for section in self.sections(area) {
            buf.set_style(section.area, header_style);
            let mut label = self.labels[section.column].clone();
            if let Some(direction) = self.sort_marks.get(&section.column) {
                label.push_str(direction.glyph());
            }
            let room = match section.button {
                Some(_) => section.area.width.saturating_sub(BUTTON_WIDTH),
                None => section.area.width,
            };
            buf.set_stringn(section.area.x, section.area.y, &label, room as usize, header_style);

            if let Some(button) = section.button {
                let active = self.is_filter_active(section.column);
                let glyph = if active { FILTER_GLYPH_ACTIVE } else { FILTER_GLYPH_IDLE };
                buf.set_string(button.x, button.y, glyph, self.theme.filter_marker_style(active));
            }
        }
    }
}
