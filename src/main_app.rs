use std::collections::HashSet;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use log::{debug, info};
use ratatui::{
    Terminal,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

use crate::book::Book;
use crate::checklist::ChecklistStore;
use crate::clipboard::{self, ClipboardSink, CopyIndicator};
use crate::content_renderer::ContentRenderer;
use crate::event_source::{Event, EventSource};
use crate::layout::{DocumentLayout, LayoutContext, TargetAction};
use crate::navigation::{NavigationController, ScrollCommand, SmoothScroll, TOC_ANCHOR_ID};
use crate::scroll_tracker::{ScrollState, ScrollThrottle, ScrollTracker};
use crate::settings::Settings;
use crate::storage::StateStore;
use crate::theme::{ThemeMode, current_theme, set_theme_mode};
use crate::widget::help_popup::{HelpPopup, HelpPopupAction};
use crate::widget::hud_message::{HudMessage, HudMode};
use crate::widget::reader_view::{ReaderFrame, ReaderView};
use crate::widget::sidebar::Sidebar;

const SIDEBAR_WIDTH: u16 = 34;
const MOUSE_SCROLL_LINES: usize = 3;
const HUD_DURATION: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum FocusedPanel {
    Sidebar,
    Content,
    Help,
}

pub struct App {
    book: Book,
    storage: StateStore,
    checklists: ChecklistStore,
    renderer: ContentRenderer,
    layout: DocumentLayout,
    layout_dirty: bool,
    layout_width: u16,
    tracker: ScrollTracker,
    throttle: ScrollThrottle,
    navigation: NavigationController,
    smooth_scroll: SmoothScroll,
    smooth_scroll_enabled: bool,
    sidebar: Sidebar,
    reader: ReaderView,
    theme_mode: ThemeMode,
    clipboard: Box<dyn ClipboardSink>,
    copy_indicator: Option<CopyIndicator>,
    hud_message: Option<HudMessage>,
    expanded: HashSet<String>,
    selected_target: Option<usize>,
    scroll_offset: usize,
    viewport_height: usize,
    margin: u16,
    pub focused_panel: FocusedPanel,
    help_popup: Option<HelpPopup>,
    pending_g: bool,
    sidebar_area: Rect,
}

impl App {
    pub fn new(book: Book, storage: StateStore, clipboard: Box<dyn ClipboardSink>) -> Self {
        Self::with_settings(book, storage, clipboard, &crate::settings::current(), None)
    }

    /// `theme_override` wins over both the stored and the configured theme.
    pub fn with_settings(
        book: Book,
        storage: StateStore,
        clipboard: Box<dyn ClipboardSink>,
        settings: &Settings,
        theme_override: Option<ThemeMode>,
    ) -> Self {
        let theme_mode = theme_override
            .unwrap_or_else(|| ThemeMode::load(&storage, settings.default_theme.resolve()));
        set_theme_mode(theme_mode);

        let tracker = ScrollTracker::new(
            Vec::new(),
            book.first_chapter_id(),
            settings.scroll_config(),
        );
        let sidebar = Sidebar::new(&book);
        info!(
            "Opened '{}' with {} chapters, theme {}",
            book.title,
            book.chapters.len(),
            theme_mode.as_str()
        );

        Self {
            book,
            storage,
            checklists: ChecklistStore::new(),
            renderer: ContentRenderer::default(),
            layout: DocumentLayout::default(),
            layout_dirty: true,
            layout_width: 80,
            tracker,
            throttle: ScrollThrottle::new(settings.scroll_throttle()),
            navigation: NavigationController::new(settings.header_clearance),
            smooth_scroll: SmoothScroll::default(),
            smooth_scroll_enabled: settings.smooth_scroll,
            sidebar,
            reader: ReaderView::default(),
            theme_mode,
            clipboard,
            copy_indicator: None,
            hud_message: None,
            expanded: HashSet::new(),
            selected_target: None,
            scroll_offset: 0,
            viewport_height: 20,
            margin: settings.margin,
            focused_panel: FocusedPanel::Content,
            help_popup: None,
            pending_g: false,
            sidebar_area: Rect::default(),
        }
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn scroll_state(&self) -> &ScrollState {
        self.tracker.state()
    }

    pub fn active_id(&self) -> &str {
        self.tracker.active_id()
    }

    pub fn theme_mode(&self) -> ThemeMode {
        self.theme_mode
    }

    pub fn storage(&self) -> &StateStore {
        &self.storage
    }

    pub fn checklists(&self) -> &ChecklistStore {
        &self.checklists
    }

    pub fn document(&mut self) -> &DocumentLayout {
        self.ensure_layout();
        &self.layout
    }

    pub fn selected_target(&self) -> Option<usize> {
        self.selected_target
    }

    pub fn copy_indicator(&self) -> Option<&CopyIndicator> {
        self.copy_indicator.as_ref()
    }

    pub fn is_animating(&self) -> bool {
        self.smooth_scroll.is_active()
    }

    fn set_layout_width(&mut self, width: u16) {
        if width != self.layout_width {
            self.layout_width = width;
            self.layout_dirty = true;
        }
    }

    fn ensure_layout(&mut self) {
        if !self.layout_dirty {
            return;
        }
        let now = Instant::now();
        let copied = self
            .copy_indicator
            .as_ref()
            .filter(|indicator| indicator.is_active(now))
            .map(|indicator| indicator.target().to_string());

        self.layout = DocumentLayout::build(
            &self.book,
            LayoutContext {
                renderer: &self.renderer,
                store: &mut self.checklists,
                storage: &self.storage,
                expanded: &self.expanded,
                palette: self.theme_mode.palette(),
                copied: copied.as_deref(),
                selected_target: self.selected_target,
                width: self.layout_width,
            },
        );
        self.layout_dirty = false;

        self.tracker.set_regions(self.layout.regions.clone());
        self.navigation.set_anchors(
            self.layout
                .anchors
                .iter()
                .map(|anchor| (anchor.id.as_str(), anchor.row)),
        );
        if self
            .selected_target
            .is_some_and(|index| index >= self.layout.targets.len())
        {
            self.selected_target = None;
        }
        self.scroll_offset = self.scroll_offset.min(self.max_offset());
        self.recompute_scroll_state();
    }

    fn max_offset(&self) -> usize {
        self.layout.height().saturating_sub(self.viewport_height)
    }

    fn recompute_scroll_state(&mut self) {
        self.tracker.update(
            self.scroll_offset,
            self.layout.height(),
            self.viewport_height,
        );
        if self.focused_panel != FocusedPanel::Sidebar {
            let active = self.tracker.active_id().to_string();
            self.sidebar.follow_active(&active);
        }
    }

    /// Moves the viewport and feeds the position through the throttle.
    fn scroll_to(&mut self, offset: usize) {
        self.scroll_offset = offset.min(self.max_offset());
        if self.throttle.offer(self.scroll_offset, Instant::now()).is_some() {
            self.recompute_scroll_state();
        }
    }

    fn scroll_by(&mut self, delta: isize) {
        self.smooth_scroll.cancel();
        let offset = self.scroll_offset.saturating_add_signed(delta);
        self.scroll_to(offset);
    }

    fn half_page(&self) -> isize {
        (self.viewport_height / 2).max(1) as isize
    }

    fn page(&self) -> isize {
        self.viewport_height.max(1) as isize
    }

    pub fn navigate_to(&mut self, id: &str) {
        self.ensure_layout();
        let Some(command) = self.navigation.navigate_to(id, &mut self.tracker) else {
            return;
        };
        self.sidebar.follow_active(self.tracker.active_id());
        self.start_scroll(command);
    }

    fn start_scroll(&mut self, command: ScrollCommand) {
        if self.smooth_scroll_enabled {
            self.smooth_scroll.start(command);
        } else {
            self.scroll_offset = command.offset.min(self.max_offset());
            self.recompute_scroll_state();
        }
    }

    fn advance_animation(&mut self) -> bool {
        match self.smooth_scroll.tick(self.scroll_offset) {
            Some(next) => {
                self.scroll_to(next);
                if !self.smooth_scroll.is_active() {
                    self.recompute_scroll_state();
                }
                true
            }
            None => false,
        }
    }

    fn toggle_theme(&mut self) {
        self.theme_mode = self.theme_mode.toggled();
        set_theme_mode(self.theme_mode);
        self.theme_mode.save(&mut self.storage);
        self.layout_dirty = true;
        self.show_hud(
            format!("{} mode", capitalize(self.theme_mode.as_str())),
            HudMode::Normal,
        );
    }

    fn show_hud(&mut self, message: impl Into<String>, mode: HudMode) {
        self.hud_message = Some(HudMessage::new(message, HUD_DURATION, mode));
    }

    fn select_next_target(&mut self) {
        self.ensure_layout();
        let next = match self.selected_target {
            Some(index) if index + 1 < self.layout.targets.len() => Some(index + 1),
            Some(index) => Some(index),
            None => self.layout.next_target_from(self.scroll_offset),
        };
        self.select_target(next);
    }

    fn select_previous_target(&mut self) {
        self.ensure_layout();
        let previous = match self.selected_target {
            Some(index) => Some(index.saturating_sub(1)),
            None => self
                .layout
                .targets
                .iter()
                .rposition(|target| target.row < self.scroll_offset + self.viewport_height),
        };
        self.select_target(previous);
    }

    fn select_target(&mut self, index: Option<usize>) {
        if index == self.selected_target {
            return;
        }
        self.selected_target = index;
        self.layout_dirty = true;
        if let Some(target) = index.and_then(|i| self.layout.targets.get(i)) {
            let (row, height) = (target.row, target.height);
            if row < self.scroll_offset {
                self.scroll_to(row.saturating_sub(1));
            } else if row + height > self.scroll_offset + self.viewport_height {
                self.scroll_to((row + height).saturating_sub(self.viewport_height) + 1);
            }
        }
    }

    /// Runs the action of target `index`.
    pub fn activate_target(&mut self, index: usize) {
        self.ensure_layout();
        let Some(target) = self.layout.targets.get(index) else {
            return;
        };
        let action = target.action.clone();
        self.selected_target = Some(index);
        self.layout_dirty = true;

        match action {
            TargetAction::ToggleEntry { key, line_index } => {
                let checked = self
                    .checklists
                    .toggle(&mut self.storage, &key, line_index);
                debug!("Toggled {key} line {line_index} -> {checked}");
            }
            TargetAction::CopyCode { copy_id, text } => {
                let now = Instant::now();
                match clipboard::copy_code(self.clipboard.as_mut(), copy_id, &text, now) {
                    Some(indicator) => self.copy_indicator = Some(indicator),
                    None => self.show_hud("Clipboard unavailable", HudMode::Error),
                }
            }
            TargetAction::ToggleAccordion { section_id } => {
                if !self.expanded.remove(&section_id) {
                    self.expanded.insert(section_id);
                }
            }
            TargetAction::Navigate { id } => {
                self.selected_target = None;
                self.navigate_to(&id);
            }
        }
    }

    fn activate_selected(&mut self) {
        if let Some(index) = self.selected_target {
            self.activate_target(index);
        } else {
            self.select_next_target();
        }
    }

    fn copy_selected(&mut self) {
        self.ensure_layout();
        let is_code = self
            .selected_target
            .and_then(|index| self.layout.targets.get(index))
            .is_some_and(|target| matches!(target.action, TargetAction::CopyCode { .. }));
        if let (true, Some(index)) = (is_code, self.selected_target) {
            self.activate_target(index);
        }
    }

    fn toggle_help(&mut self) {
        if self.help_popup.take().is_some() {
            self.focused_panel = FocusedPanel::Content;
        } else {
            self.help_popup = Some(HelpPopup::new());
            self.focused_panel = FocusedPanel::Help;
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<AppAction> {
        self.ensure_layout();

        if self.focused_panel == FocusedPanel::Help {
            if let Some(popup) = self.help_popup.as_mut() {
                if let Some(HelpPopupAction::Close) = popup.handle_key(key) {
                    self.toggle_help();
                }
                return None;
            }
            self.focused_panel = FocusedPanel::Content;
        }

        let was_pending_g = std::mem::take(&mut self.pending_g);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('q') => return Some(AppAction::Quit),
            KeyCode::Char('c') if ctrl => return Some(AppAction::Quit),
            KeyCode::Tab => {
                self.focused_panel = match self.focused_panel {
                    FocusedPanel::Sidebar => FocusedPanel::Content,
                    _ => FocusedPanel::Sidebar,
                };
            }
            KeyCode::Char('?') => self.toggle_help(),
            KeyCode::Char('d') if !ctrl => self.toggle_theme(),
            KeyCode::Char('t') => self.navigate_to(TOC_ANCHOR_ID),
            _ if self.focused_panel == FocusedPanel::Sidebar => self.handle_sidebar_key(key),
            _ => self.handle_content_key(key, was_pending_g),
        }
        None
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.sidebar.move_selection_down(),
            KeyCode::Char('k') | KeyCode::Up => self.sidebar.move_selection_up(),
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('l') | KeyCode::Right => {
                if let Some(id) = self.sidebar.selected_entry().map(|entry| entry.id.clone()) {
                    self.focused_panel = FocusedPanel::Content;
                    self.navigate_to(&id);
                }
            }
            KeyCode::Esc => self.focused_panel = FocusedPanel::Content,
            _ => {}
        }
    }

    fn handle_content_key(&mut self, key: KeyEvent, was_pending_g: bool) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.scroll_by(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_by(-1),
            KeyCode::Char('d') if ctrl => self.scroll_by(self.half_page()),
            KeyCode::Char('u') if ctrl => self.scroll_by(-self.half_page()),
            KeyCode::PageDown => self.scroll_by(self.page()),
            KeyCode::PageUp => self.scroll_by(-self.page()),
            KeyCode::Char('g') if was_pending_g => self.scroll_to_top(),
            KeyCode::Char('g') => self.pending_g = true,
            KeyCode::Home => self.scroll_to_top(),
            KeyCode::Char('G') | KeyCode::End => {
                self.smooth_scroll.cancel();
                let bottom = self.max_offset();
                self.scroll_to(bottom);
            }
            KeyCode::Char(']') | KeyCode::Char('n') => self.select_next_target(),
            KeyCode::Char('[') | KeyCode::Char('p') => self.select_previous_target(),
            KeyCode::Enter | KeyCode::Char(' ') => self.activate_selected(),
            KeyCode::Char('y') => self.copy_selected(),
            KeyCode::Esc => self.select_target(None),
            _ => {}
        }
    }

    fn scroll_to_top(&mut self) {
        self.start_scroll(ScrollCommand { offset: 0 });
    }

    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        self.ensure_layout();
        let over_sidebar = mouse.column < self.sidebar_area.x + self.sidebar_area.width
            && mouse.column >= self.sidebar_area.x;
        match mouse.kind {
            MouseEventKind::ScrollDown if over_sidebar => self.sidebar.move_selection_down(),
            MouseEventKind::ScrollUp if over_sidebar => self.sidebar.move_selection_up(),
            MouseEventKind::ScrollDown => self.scroll_by(MOUSE_SCROLL_LINES as isize),
            MouseEventKind::ScrollUp => self.scroll_by(-(MOUSE_SCROLL_LINES as isize)),
            MouseEventKind::Down(_) if over_sidebar => {
                if self.sidebar.handle_mouse_click(mouse.column, mouse.row) {
                    if let Some(id) = self.sidebar.selected_entry().map(|entry| entry.id.clone()) {
                        self.navigate_to(&id);
                    }
                }
            }
            MouseEventKind::Down(_) => {
                let target = self
                    .reader
                    .row_at(mouse.column, mouse.row, self.scroll_offset)
                    .and_then(|row| self.layout.target_at_row(row));
                if let Some(index) = target {
                    self.focused_panel = FocusedPanel::Content;
                    self.activate_target(index);
                }
            }
            _ => {}
        }
    }

    /// Timer work between events. Returns true if the screen needs a redraw.
    pub fn on_tick(&mut self, now: Instant) -> bool {
        let mut changed = self.advance_animation();

        if self.throttle.flush(now).is_some() {
            self.recompute_scroll_state();
            changed = true;
        }
        if self
            .copy_indicator
            .as_ref()
            .is_some_and(|indicator| !indicator.is_active(now))
        {
            self.copy_indicator = None;
            self.layout_dirty = true;
            changed = true;
        }
        if self.hud_message.as_ref().is_some_and(|hud| hud.is_expired(now)) {
            self.hud_message = None;
            changed = true;
        }
        changed
    }

    pub fn handle_resize(&mut self) {
        self.layout_dirty = true;
    }

    pub fn draw(&mut self, f: &mut ratatui::Frame) {
        let palette = current_theme();
        let background = Block::default().style(Style::default().bg(palette.base_00));
        f.render_widget(background, f.area());

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());
        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(chunks[0]);
        self.sidebar_area = main_chunks[0];

        let (text_width, text_height) = ReaderView::inner_size(main_chunks[1], self.margin);
        if text_height as usize != self.viewport_height {
            self.viewport_height = text_height as usize;
            self.layout_dirty = true;
        }
        self.set_layout_width(text_width);
        self.ensure_layout();

        let overall = self.checklists.overall_progress();
        let active_id = self.tracker.active_id().to_string();
        self.sidebar.render(
            f,
            main_chunks[0],
            self.focused_panel == FocusedPanel::Sidebar,
            palette,
            &active_id,
            self.theme_mode,
            overall,
        );

        let title = self
            .sidebar
            .chapter_title_for(&active_id)
            .unwrap_or(self.book.title.as_str())
            .to_string();
        self.reader.render(
            f,
            main_chunks[1],
            palette,
            ReaderFrame {
                layout: &self.layout,
                offset: self.scroll_offset,
                state: self.tracker.state(),
                title: &title,
                is_focused: self.focused_panel != FocusedPanel::Sidebar,
                margin: self.margin,
                hud: self.hud_message.as_ref(),
            },
        );

        self.render_help_bar(f, chunks[1], palette.base_03, palette.base_00);

        if let Some(popup) = self.help_popup.as_mut() {
            let dim = Block::default().style(
                Style::default()
                    .bg(Color::Rgb(10, 10, 10))
                    .add_modifier(Modifier::DIM),
            );
            f.render_widget(dim, f.area());
            popup.render(f, f.area());
        }
    }

    fn render_help_bar(&self, f: &mut ratatui::Frame, area: Rect, fg: Color, bg: Color) {
        let text = match self.focused_panel {
            FocusedPanel::Sidebar => "j/k: move | Enter: open | Tab: content | d: theme | ?: help | q: quit",
            FocusedPanel::Content => {
                "j/k: scroll | ]/[: select | Enter: toggle/copy | t: contents | Tab: sidebar | ?: help | q: quit"
            }
            FocusedPanel::Help => "j/k: scroll | Esc: close",
        };
        let bar = Paragraph::new(Line::from(Span::styled(format!(" {text}"), Style::default().fg(fg))))
            .style(Style::default().bg(bg));
        f.render_widget(bar, area);
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let tick_rate = Duration::from_millis(50);
    let frame_rate = Duration::from_millis(16);
    let mut last_tick = Instant::now();

    // Size the layout before any input arrives.
    terminal.draw(|f| app.draw(f))?;

    loop {
        let mut events_processed = 0;
        let mut should_quit = false;
        while event_source.poll(Duration::from_millis(0))? && events_processed < 50 {
            let event = event_source.read()?;
            events_processed += 1;

            match event {
                Event::Key(key) => {
                    if app.handle_key_event(key) == Some(AppAction::Quit) {
                        should_quit = true;
                    }
                }
                Event::Mouse(mouse_event) => match mouse_event.kind {
                    MouseEventKind::ScrollLeft | MouseEventKind::ScrollRight => {}
                    _ => app.handle_mouse_event(mouse_event),
                },
                Event::Resize(_cols, _rows) => app.handle_resize(),
                _ => {}
            }

            if should_quit {
                break;
            }
        }

        let mut needs_redraw = events_processed > 0;

        let tick_due = last_tick.elapsed() >= tick_rate;
        if tick_due || app.is_animating() {
            if app.on_tick(Instant::now()) {
                needs_redraw = true;
            }
            if tick_due {
                last_tick = Instant::now();
            }
        }

        if needs_redraw || should_quit {
            terminal.draw(|f| app.draw(f))?;
        }

        if should_quit {
            return Ok(());
        }

        if events_processed == 0 {
            let timeout = if app.is_animating() {
                frame_rate
            } else {
                tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or_else(|| Duration::from_secs(0))
            };
            let _ = event_source.poll(timeout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::event_source::SimulatedEventSource;
    use crate::storage::KeyValueStore;

    fn key(event: Event) -> KeyEvent {
        match event {
            Event::Key(key) => key,
            _ => unreachable!(),
        }
    }

    fn instant_settings() -> Settings {
        Settings {
            scroll_throttle_ms: 0,
            smooth_scroll: false,
            ..Settings::default()
        }
    }

    fn app() -> App {
        App::with_settings(
            Book::sample().unwrap(),
            StateStore::ephemeral(),
            Box::new(MemoryClipboard::default()),
            &instant_settings(),
            Some(ThemeMode::Dark),
        )
    }

    #[test]
    fn test_navigate_to_chapter_scrolls_and_activates() {
        let mut app = app();
        let top = app.document().anchor_row("part2").unwrap();
        app.navigate_to("part2");
        assert_eq!(app.scroll_offset(), top - 1);
        assert_eq!(app.active_id(), "part2");
    }

    #[test]
    fn test_toc_key_keeps_active_chapter() {
        let mut app = app();
        app.handle_key_event(key(SimulatedEventSource::char_key('t')));
        let toc = app.document().anchor_row(TOC_ANCHOR_ID).unwrap();
        assert_eq!(app.scroll_offset(), toc - 1);
        assert_eq!(app.active_id(), "intro");
    }

    #[test]
    fn test_theme_toggle_persists() {
        let mut app = app();
        app.handle_key_event(key(SimulatedEventSource::char_key('d')));
        assert_eq!(app.theme_mode(), ThemeMode::Light);
        assert_eq!(app.storage().get("theme").as_deref(), Some("light"));
    }

    #[test]
    fn test_toggle_checklist_entry_through_targets() {
        let mut app = app();
        let index = app
            .document()
            .targets
            .iter()
            .position(|t| matches!(t.action, TargetAction::ToggleEntry { .. }))
            .unwrap();
        app.activate_target(index);

        let stored = app.storage().get("checklist-part1-2-0");
        assert_eq!(stored.as_deref(), Some(r#"{"1":true}"#));

        app.activate_target(index);
        assert_eq!(
            app.storage().get("checklist-part1-2-0").as_deref(),
            Some(r#"{"1":false}"#)
        );
    }

    #[test]
    fn test_state_reaches_disk_through_store_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut app = App::with_settings(
            Book::sample().unwrap(),
            StateStore::with_file(&path),
            Box::new(MemoryClipboard::default()),
            &instant_settings(),
            None,
        );

        app.handle_key_event(key(SimulatedEventSource::char_key('d')));
        let index = app
            .document()
            .targets
            .iter()
            .position(|t| matches!(t.action, TargetAction::ToggleEntry { .. }))
            .unwrap();
        app.activate_target(index);

        let on_disk = StateStore::load_from_file(&path).unwrap();
        assert_eq!(on_disk.get("theme").as_deref(), Some("light"));
        assert_eq!(
            on_disk.get("checklist-part1-2-0").as_deref(),
            Some(r#"{"1":true}"#)
        );
    }

    #[test]
    fn test_bottom_of_document_activates_appendix() {
        let mut app = app();
        app.handle_key_event(key(SimulatedEventSource::char_key('G')));
        assert_eq!(app.active_id(), "appendix");
        assert!(app.scroll_state().show_scroll_top);
        assert_eq!(app.scroll_state().progress_percent, 100.0);
    }

    #[test]
    fn test_double_g_returns_to_top() {
        let mut app = app();
        app.handle_key_event(key(SimulatedEventSource::char_key('G')));
        app.handle_key_event(key(SimulatedEventSource::char_key('g')));
        app.handle_key_event(key(SimulatedEventSource::char_key('g')));
        assert_eq!(app.scroll_offset(), 0);
        assert!(!app.scroll_state().show_scroll_top);
    }
}
