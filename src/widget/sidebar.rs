use crate::book::Book;
use crate::checklist::Progress;
use crate::navigation::{self, SidebarEntry};
use crate::theme::{Base16Palette, ThemeMode};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

/// Chapter list with the active chapter highlighted, plus the theme toggle
/// and overall checklist progress underneath.
pub struct Sidebar {
    pub selected: usize,
    pub list_state: ListState,
    entries: Vec<SidebarEntry>,
    last_list_area: Option<Rect>,
}

impl Sidebar {
    pub fn new(book: &Book) -> Self {
        let entries = navigation::sidebar_entries(book);
        let mut list_state = ListState::default();
        if !entries.is_empty() {
            list_state.select(Some(0));
        }
        Self {
            selected: 0,
            list_state,
            entries,
            last_list_area: None,
        }
    }

    pub fn entries(&self) -> &[SidebarEntry] {
        &self.entries
    }

    pub fn move_selection_down(&mut self) {
        if self.selected < self.entries.len().saturating_sub(1) {
            self.selected += 1;
            self.list_state.select(Some(self.selected));
        }
    }

    pub fn move_selection_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.list_state.select(Some(self.selected));
        }
    }

    pub fn set_selection_to_index(&mut self, index: usize) {
        if index < self.entries.len() {
            self.selected = index;
            self.list_state.select(Some(index));
        }
    }

    /// Moves the selection onto the entry for `active_id`, if there is one.
    pub fn follow_active(&mut self, active_id: &str) {
        if let Some(index) = self.entries.iter().position(|entry| entry.id == active_id) {
            self.set_selection_to_index(index);
        }
    }

    pub fn selected_entry(&self) -> Option<&SidebarEntry> {
        self.entries.get(self.selected)
    }

    /// Title of the chapter that owns `active_id`.
    pub fn chapter_title_for(&self, active_id: &str) -> Option<&str> {
        let chapter_id = self
            .entries
            .iter()
            .find(|entry| entry.id == active_id)
            .map(|entry| entry.chapter_id.as_str())?;
        self.entries
            .iter()
            .find(|entry| !entry.is_section && entry.id == chapter_id)
            .map(|entry| entry.title.as_str())
    }

    /// Selects the entry under a click. Returns true if an entry was hit.
    pub fn handle_mouse_click(&mut self, _x: u16, y: u16) -> bool {
        let Some(area) = self.last_list_area else {
            return false;
        };
        if y > area.y && y < area.y + area.height.saturating_sub(1) {
            let relative_y = y - area.y - 1;
            let index = self.list_state.offset() + relative_y as usize;
            if index < self.entries.len() {
                self.set_selection_to_index(index);
                return true;
            }
        }
        false
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        f: &mut Frame,
        area: Rect,
        is_focused: bool,
        palette: &Base16Palette,
        active_id: &str,
        theme_mode: ThemeMode,
        overall: Progress,
    ) {
        let (text_color, border_color, _bg_color) = palette.get_panel_colors(is_focused);
        let (selection_bg, selection_fg) = palette.get_selection_colors(is_focused);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(4)])
            .split(area);
        self.last_list_area = Some(chunks[0]);

        let highlighted = navigation::highlighted(&self.entries, active_id);
        let items: Vec<ListItem> = self
            .entries
            .iter()
            .zip(highlighted)
            .map(|(entry, is_active)| {
                let accent = if entry.is_appendix {
                    palette.base_09
                } else {
                    palette.base_0d
                };
                let marker = if is_active {
                    Span::styled("▍", Style::default().fg(accent))
                } else {
                    Span::raw(" ")
                };

                let line = if entry.is_section {
                    let style = if is_active {
                        Style::default().fg(accent)
                    } else {
                        Style::default().fg(palette.base_03)
                    };
                    Line::from(vec![
                        marker,
                        Span::raw("   "),
                        Span::styled(entry.title.clone(), style),
                    ])
                } else {
                    let title_style = if is_active {
                        Style::default().fg(accent).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(text_color)
                    };
                    let mut spans = vec![marker, Span::raw(" ")];
                    if let Some(label) = &entry.label {
                        spans.push(Span::styled(
                            format!("{label} "),
                            Style::default().fg(palette.base_04),
                        ));
                    }
                    spans.push(Span::styled(entry.title.clone(), title_style));
                    Line::from(spans)
                };
                ListItem::new(line)
            })
            .collect();

        let mut list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Contents ")
                    .border_style(Style::default().fg(border_color))
                    .style(Style::default().bg(palette.base_00)),
            )
            .style(Style::default().bg(palette.base_00));
        if is_focused {
            list = list.highlight_style(Style::default().bg(selection_bg).fg(selection_fg));
        }
        f.render_stateful_widget(list, chunks[0], &mut self.list_state);

        let footer = Paragraph::new(vec![
            Line::from(vec![
                Span::styled(" Checklists ", Style::default().fg(palette.base_04)),
                Span::styled(
                    format!("{}/{} ({}%)", overall.checked, overall.total, overall.percent),
                    Style::default().fg(if overall.is_complete() {
                        palette.base_0b
                    } else {
                        palette.base_05
                    }),
                ),
            ]),
            Line::from(vec![
                Span::styled(" [d] ", Style::default().fg(palette.base_03)),
                Span::styled(
                    theme_mode.toggle_label(),
                    Style::default().fg(palette.base_0e),
                ),
            ]),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .style(Style::default().bg(palette.base_00)),
        );
        f.render_widget(footer, chunks[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_active_and_titles() {
        let book = Book::sample().unwrap();
        let mut sidebar = Sidebar::new(&book);
        sidebar.follow_active("part1-2");
        assert_eq!(
            sidebar.selected_entry().map(|e| e.id.as_str()),
            Some("part1-2")
        );
        assert_eq!(sidebar.chapter_title_for("part1-2"), Some("Getting Started"));
        assert_eq!(sidebar.chapter_title_for("nope"), None);

        sidebar.follow_active("nope");
        assert_eq!(
            sidebar.selected_entry().map(|e| e.id.as_str()),
            Some("part1-2")
        );
    }

    #[test]
    fn test_selection_bounds() {
        let book = Book::sample().unwrap();
        let mut sidebar = Sidebar::new(&book);
        sidebar.move_selection_up();
        assert_eq!(sidebar.selected, 0);
        for _ in 0..100 {
            sidebar.move_selection_down();
        }
        assert_eq!(sidebar.selected, sidebar.entries().len() - 1);
    }
}
