use crate::theme::current_theme;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

pub enum HelpPopupAction {
    Close,
}

pub struct HelpPopup {
    content: &'static str,
    scroll_offset: usize,
    last_popup_area: Option<Rect>,
}

impl Default for HelpPopup {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpPopup {
    pub fn new() -> Self {
        HelpPopup {
            content: include_str!("../../assets/help.txt"),
            scroll_offset: 0,
            last_popup_area: None,
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        let palette = current_theme();
        let max_content_width = self
            .content
            .lines()
            .map(UnicodeWidthStr::width)
            .max()
            .unwrap_or(60);

        // two columns of margin on each side plus borders
        let desired_width = (max_content_width + 6).min(area.width as usize);

        let popup_area = content_sized_rect(desired_width as u16, 80, area);
        self.last_popup_area = Some(popup_area);

        f.render_widget(Clear, popup_area);

        let lines: Vec<Line> = self
            .content
            .lines()
            .skip(self.scroll_offset)
            .map(|line| {
                Line::from(Span::styled(
                    format!("  {line}"),
                    Style::default().fg(palette.base_05),
                ))
            })
            .collect();

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(" Help - Press ? or ESC to close ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.base_0c))
                    .style(Style::default().bg(palette.base_00)),
            )
            .wrap(Wrap { trim: false });

        f.render_widget(paragraph, popup_area);
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn scroll_down(&mut self) {
        let max_lines = self.content.lines().count();
        if self.scroll_offset < max_lines.saturating_sub(1) {
            self.scroll_offset += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    fn page_size(&self) -> usize {
        self.last_popup_area
            .map_or(10, |area| (area.height as usize / 2).max(1))
    }

    pub fn handle_key(&mut self, key: crossterm::event::KeyEvent) -> Option<HelpPopupAction> {
        use crossterm::event::{KeyCode, KeyModifiers};

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.scroll_down(),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_up(),
            KeyCode::Char('g') | KeyCode::Home => self.scroll_offset = 0,
            KeyCode::Char('G') | KeyCode::End => {
                self.scroll_offset = self.content.lines().count().saturating_sub(1);
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                let max_lines = self.content.lines().count();
                self.scroll_offset =
                    (self.scroll_offset + self.page_size()).min(max_lines.saturating_sub(1));
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.scroll_offset = self.scroll_offset.saturating_sub(self.page_size());
            }
            KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                return Some(HelpPopupAction::Close);
            }
            _ => {}
        }
        None
    }
}

fn content_sized_rect(width: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    let available_width = r.width;
    let width = width.min(available_width);
    let margin = (available_width.saturating_sub(width)) / 2;

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(width),
            Constraint::Length(margin),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_source::{Event, SimulatedEventSource};

    fn key(event: Event) -> crossterm::event::KeyEvent {
        match event {
            Event::Key(key) => key,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_help_scrolls_and_closes() {
        let mut popup = HelpPopup::new();
        assert!(popup.handle_key(key(SimulatedEventSource::char_key('j'))).is_none());
        assert_eq!(popup.scroll_offset(), 1);
        popup.handle_key(key(SimulatedEventSource::char_key('k')));
        popup.handle_key(key(SimulatedEventSource::char_key('k')));
        assert_eq!(popup.scroll_offset(), 0);
        assert!(matches!(
            popup.handle_key(key(SimulatedEventSource::char_key('?'))),
            Some(HelpPopupAction::Close)
        ));
    }
}
