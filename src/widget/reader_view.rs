use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, LineGauge, Paragraph},
};

use crate::layout::DocumentLayout;
use crate::scroll_tracker::ScrollState;
use crate::theme::Base16Palette;
use crate::widget::hud_message::HudMessage;

/// Scrolling viewport over the laid-out document.
#[derive(Debug, Default)]
pub struct ReaderView {
    content_area: Rect,
}

/// Per-frame inputs of the reader.
pub struct ReaderFrame<'a> {
    pub layout: &'a DocumentLayout,
    pub offset: usize,
    pub state: &'a ScrollState,
    pub title: &'a str,
    pub is_focused: bool,
    pub margin: u16,
    pub hud: Option<&'a HudMessage>,
}

impl ReaderView {
    pub fn content_area(&self) -> Rect {
        self.content_area
    }

    /// Text width and height available inside `area` once borders, the
    /// progress gauge and the margin are taken out.
    pub fn inner_size(area: Rect, margin: u16) -> (u16, u16) {
        let width = area.width.saturating_sub(2 + margin * 2);
        let height = area.height.saturating_sub(3);
        (width, height)
    }

    /// Document row under a terminal cell, if the cell is inside the text.
    pub fn row_at(&self, column: u16, row: u16, offset: usize) -> Option<usize> {
        let area = self.content_area;
        let inside = column >= area.x
            && column < area.x + area.width
            && row >= area.y
            && row < area.y + area.height;
        inside.then(|| offset + (row - area.y) as usize)
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, palette: &Base16Palette, frame: ReaderFrame<'_>) {
        let (text_color, border_color, _) = palette.get_panel_colors(frame.is_focused);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(Line::from(Span::styled(
                format!(" {} ", frame.title),
                Style::default().fg(text_color).add_modifier(Modifier::BOLD),
            )))
            .title(
                Line::from(Span::styled(
                    format!(" {:.0}% ", frame.state.progress_percent),
                    Style::default().fg(palette.base_04),
                ))
                .alignment(Alignment::Right),
            )
            .style(Style::default().bg(palette.base_00));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(inner);

        let gauge = LineGauge::default()
            .filled_style(Style::default().fg(palette.base_0d))
            .unfilled_style(Style::default().fg(palette.base_02))
            .label("")
            .ratio((frame.state.progress_percent / 100.0).clamp(0.0, 1.0));
        f.render_widget(gauge, chunks[0]);

        let text_area = Rect {
            x: chunks[1].x + frame.margin,
            width: chunks[1].width.saturating_sub(frame.margin * 2),
            ..chunks[1]
        };
        self.content_area = text_area;

        let visible: Vec<Line> = frame
            .layout
            .lines
            .iter()
            .skip(frame.offset)
            .take(text_area.height as usize)
            .cloned()
            .collect();
        f.render_widget(Paragraph::new(visible), text_area);

        if text_area.height == 0 {
            return;
        }
        let bottom = Rect {
            y: text_area.y + text_area.height - 1,
            height: 1,
            ..text_area
        };

        if frame.state.show_scroll_top {
            let hint = Paragraph::new(Line::from(Span::styled(
                " ↑ Top (gg) ",
                Style::default()
                    .fg(palette.base_00)
                    .bg(palette.base_0d)
                    .add_modifier(Modifier::BOLD),
            )))
            .alignment(Alignment::Right);
            f.render_widget(hint, bottom);
        }

        if let Some(hud) = frame.hud {
            f.render_widget(Paragraph::new(hud.styled_line(palette)), bottom);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_mapping() {
        let view = ReaderView {
            content_area: Rect::new(10, 2, 40, 20),
        };
        assert_eq!(view.row_at(12, 2, 100), Some(100));
        assert_eq!(view.row_at(12, 5, 100), Some(103));
        assert_eq!(view.row_at(9, 5, 100), None);
        assert_eq!(view.row_at(12, 22, 100), None);
    }

    #[test]
    fn test_inner_size_accounts_for_chrome() {
        assert_eq!(ReaderView::inner_size(Rect::new(0, 0, 80, 24), 2), (74, 21));
        assert_eq!(ReaderView::inner_size(Rect::new(0, 0, 3, 2), 4), (0, 0));
    }
}
