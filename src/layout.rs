//! Lays the whole book out as terminal lines.
//!
//! Besides the styled lines, the layout records where every anchor starts,
//! the chapter regions the scroll tracker classifies against, and the rows of
//! every interactive target (checklist entries, code blocks, accordion headers
//! and table-of-contents links).

use std::collections::HashSet;
use std::mem;

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::book::{Book, Chapter, Section};
use crate::checklist::{ChecklistKey, ChecklistStore, Progress};
use crate::content_renderer::{Card, CardBlock, ContentRenderer, Decoration};
use crate::markup::{EntryDepth, InlineRun};
use crate::navigation::TOC_ANCHOR_ID;
use crate::scroll_tracker::{Region, SubAnchor};
use crate::storage::KeyValueStore;
use crate::theme::Base16Palette;

const INDENT: &str = "  ";
const CARD_BAR: &str = "  │ ";
const MIN_WIDTH: usize = 24;
const PROGRESS_BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    Chapter,
    Appendix,
    Section,
    TableOfContents,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub id: String,
    pub row: usize,
    pub kind: AnchorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAction {
    ToggleEntry {
        key: ChecklistKey,
        line_index: usize,
    },
    CopyCode {
        copy_id: String,
        text: String,
    },
    ToggleAccordion {
        section_id: String,
    },
    Navigate {
        id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub row: usize,
    pub height: usize,
    pub action: TargetAction,
}

impl Target {
    pub fn contains_row(&self, row: usize) -> bool {
        row >= self.row && row < self.row + self.height
    }
}

/// Everything layout needs besides the book itself.
pub struct LayoutContext<'a> {
    pub renderer: &'a ContentRenderer,
    pub store: &'a mut ChecklistStore,
    pub storage: &'a dyn KeyValueStore,
    pub expanded: &'a HashSet<String>,
    pub palette: &'a Base16Palette,
    /// Copy id of the code block whose "copied" indicator is on.
    pub copied: Option<&'a str>,
    pub selected_target: Option<usize>,
    pub width: u16,
}

#[derive(Debug, Default)]
pub struct DocumentLayout {
    pub lines: Vec<Line<'static>>,
    pub anchors: Vec<Anchor>,
    pub regions: Vec<Region>,
    pub targets: Vec<Target>,
}

impl DocumentLayout {
    pub fn build(book: &Book, ctx: LayoutContext<'_>) -> Self {
        let width = (ctx.width as usize).max(MIN_WIDTH);
        let mut builder = LayoutBuilder {
            ctx,
            width,
            layout: DocumentLayout::default(),
        };

        builder.push_hero(book);

        for (index, chapter) in book.chapters.iter().enumerate() {
            let top = builder.row();
            let sections = builder.push_chapter(chapter, false);
            let height = builder.row() - top;
            builder
                .layout
                .regions
                .push(Region::bounded(&chapter.id, top, height).with_sections(sections));

            if index == 0 {
                builder.push_table_of_contents(book);
            }
        }

        let top = builder.row();
        let sections = builder.push_chapter(&book.appendix, true);
        builder
            .layout
            .regions
            .push(Region::unbounded(&book.appendix.id, top).with_sections(sections));
        builder.blank();

        builder.layout
    }

    pub fn height(&self) -> usize {
        self.lines.len()
    }

    pub fn anchor_row(&self, id: &str) -> Option<usize> {
        self.anchors
            .iter()
            .find(|anchor| anchor.id == id)
            .map(|anchor| anchor.row)
    }

    pub fn target_at_row(&self, row: usize) -> Option<usize> {
        self.targets.iter().position(|target| target.contains_row(row))
    }

    /// First target starting at or below `row`.
    pub fn next_target_from(&self, row: usize) -> Option<usize> {
        self.targets.iter().position(|target| target.row >= row)
    }
}

struct LayoutBuilder<'a> {
    ctx: LayoutContext<'a>,
    width: usize,
    layout: DocumentLayout,
}

impl LayoutBuilder<'_> {
    fn row(&self) -> usize {
        self.layout.lines.len()
    }

    fn push(&mut self, spans: Vec<Span<'static>>) {
        self.layout.lines.push(Line::from(spans));
    }

    fn blank(&mut self) {
        self.layout.lines.push(Line::default());
    }

    fn anchor(&mut self, id: &str, kind: AnchorKind) {
        let row = self.row();
        self.layout.anchors.push(Anchor {
            id: id.to_string(),
            row,
            kind,
        });
    }

    /// Registers a target over rows `start..current` and highlights it when selected.
    fn target(&mut self, start: usize, action: TargetAction) {
        let index = self.layout.targets.len();
        let height = self.row().saturating_sub(start).max(1);
        if self.ctx.selected_target == Some(index) {
            let highlight = self.ctx.palette.base_02;
            for line in self.layout.lines.iter_mut().skip(start).take(height) {
                line.style = line.style.bg(highlight);
            }
        }
        self.layout.targets.push(Target {
            row: start,
            height,
            action,
        });
    }

    fn push_wrapped(&mut self, text: &str, prefix: &str, style: Style) {
        let available = self.width.saturating_sub(prefix.width()).max(1);
        for piece in textwrap::wrap(text, available) {
            self.push(vec![
                Span::raw(prefix.to_string()),
                Span::styled(piece.into_owned(), style),
            ]);
        }
    }

    fn push_hero(&mut self, book: &Book) {
        let palette = self.ctx.palette;
        self.blank();
        self.push_wrapped(
            &book.title,
            INDENT,
            Style::default()
                .fg(palette.base_07)
                .add_modifier(Modifier::BOLD),
        );
        if !book.subtitle.is_empty() {
            self.push_wrapped(&book.subtitle, INDENT, Style::default().fg(palette.base_0e));
        }
        self.blank();
        self.push(vec![
            Span::raw(INDENT),
            Span::styled("● ", Style::default().fg(palette.base_0b)),
            Span::styled(
                "Interactive E-Book Guide",
                Style::default().fg(palette.base_04),
            ),
        ]);
        self.blank();
    }

    fn push_chapter(&mut self, chapter: &Chapter, is_appendix: bool) -> Vec<SubAnchor> {
        let palette = self.ctx.palette;
        let accent = if is_appendix {
            palette.base_09
        } else {
            palette.base_0d
        };

        self.anchor(
            &chapter.id,
            if is_appendix {
                AnchorKind::Appendix
            } else {
                AnchorKind::Chapter
            },
        );
        let badge = if is_appendix {
            " SPECIAL SECTION "
        } else {
            " CHAPTER "
        };
        self.push(vec![
            Span::raw(INDENT),
            Span::styled(
                badge,
                Style::default()
                    .fg(accent)
                    .bg(palette.base_01)
                    .add_modifier(Modifier::BOLD),
            ),
        ]);
        self.blank();
        self.push_wrapped(
            &chapter.title,
            INDENT,
            Style::default()
                .fg(palette.base_07)
                .add_modifier(Modifier::BOLD),
        );
        if let Some(subtitle) = &chapter.subtitle {
            self.push_wrapped(subtitle, INDENT, Style::default().fg(palette.base_04));
        }
        self.push_rule(accent);
        self.blank();

        let mut sub_anchors = Vec::new();
        for (section_index, section) in chapter.sections.iter().enumerate() {
            if let Some(id) = &section.id {
                sub_anchors.push(SubAnchor {
                    id: id.clone(),
                    top: self.row(),
                });
            }
            self.push_section(chapter, section_index, section, accent);
        }
        sub_anchors
    }

    fn push_rule(&mut self, color: Color) {
        let rule = "─".repeat(self.width.saturating_sub(INDENT.len()));
        self.push(vec![
            Span::raw(INDENT),
            Span::styled(rule, Style::default().fg(color)),
        ]);
    }

    fn push_section(
        &mut self,
        chapter: &Chapter,
        section_index: usize,
        section: &Section,
        accent: Color,
    ) {
        let palette = self.ctx.palette;
        let storage_id = section.storage_id(&chapter.id, section_index);
        if let Some(id) = &section.id {
            self.anchor(id, AnchorKind::Section);
        }

        let expanded = !section.accordion || self.ctx.expanded.contains(&storage_id);
        let start = self.row();
        let title_style = Style::default()
            .fg(palette.base_06)
            .add_modifier(Modifier::BOLD);
        let marker = if !section.accordion {
            "▌ "
        } else if expanded {
            "▾ "
        } else {
            "▸ "
        };
        let available = self.width.saturating_sub(INDENT.len() + 2).max(1);
        for (line_no, piece) in textwrap::wrap(&section.title, available)
            .into_iter()
            .enumerate()
        {
            let lead = if line_no == 0 { marker } else { "  " };
            self.push(vec![
                Span::raw(INDENT),
                Span::styled(lead, Style::default().fg(accent)),
                Span::styled(piece.into_owned(), title_style),
            ]);
        }
        if section.accordion {
            self.target(
                start,
                TargetAction::ToggleAccordion {
                    section_id: storage_id.clone(),
                },
            );
        }
        self.blank();

        if !expanded {
            self.push(vec![
                Span::raw(INDENT),
                Span::styled(
                    format!("{} hidden items, press Enter to expand", section.items.len()),
                    Style::default()
                        .fg(palette.base_03)
                        .add_modifier(Modifier::ITALIC),
                ),
            ]);
            self.blank();
            return;
        }

        for (item_index, item) in section.items.iter().enumerate() {
            let key = ChecklistKey::for_item(&chapter.id, section_index, section, item_index);
            let card = self
                .ctx
                .renderer
                .render(item, &key, self.ctx.store, self.ctx.storage);
            self.push_card(&card);
        }
    }

    fn push_card(&mut self, card: &Card) {
        let palette = self.ctx.palette;
        let border = Style::default().fg(palette.base_02);
        let inner = self.width.saturating_sub(CARD_BAR.width()).max(1);

        let mut top = vec![Span::raw(INDENT), Span::styled("╭─", border)];
        for decoration in &card.decorations {
            if decoration.caption().is_none() {
                top.push(Span::styled(
                    format!(" {} ", decoration.glyph()),
                    Style::default().fg(match decoration {
                        Decoration::PlanBadge => palette.base_0b,
                        _ => palette.base_0d,
                    }),
                ));
            }
        }
        self.push(top);

        let mut previous_was_block = false;
        for block in &card.blocks {
            let is_block = matches!(block, CardBlock::Paragraph(_) | CardBlock::Code { .. });
            if is_block && previous_was_block {
                self.push(vec![Span::styled(CARD_BAR, border)]);
            }
            previous_was_block = is_block;

            match block {
                CardBlock::Paragraph(runs) => {
                    for spans in wrap_runs(runs, inner, &self.inline_styles(palette.base_05)) {
                        self.push_in_card(spans);
                    }
                }
                CardBlock::Code {
                    language,
                    text,
                    block_index,
                } => self.push_code(card, language.as_deref(), text, *block_index, inner),
                CardBlock::ChecklistEntry {
                    label,
                    line_index,
                    depth,
                    checked,
                } => self.push_entry(card, label, *line_index, *depth, *checked, inner),
                CardBlock::ChecklistHeader(runs) => {
                    let mut styles = self.inline_styles(palette.base_0e);
                    styles.plain = styles.plain.add_modifier(Modifier::BOLD);
                    for spans in wrap_runs(runs, inner, &styles) {
                        self.push_in_card(spans);
                    }
                }
                CardBlock::Bullet(runs) => {
                    let styles = self.inline_styles(palette.base_05);
                    let lines = wrap_runs(runs, inner.saturating_sub(2).max(1), &styles);
                    for (line_no, mut spans) in lines.into_iter().enumerate() {
                        let lead = if line_no == 0 { "• " } else { "  " };
                        spans.insert(0, Span::styled(lead, Style::default().fg(palette.base_03)));
                        self.push_in_card(spans);
                    }
                }
                CardBlock::Plain(runs) => {
                    for spans in wrap_runs(runs, inner, &self.inline_styles(palette.base_05)) {
                        self.push_in_card(spans);
                    }
                }
                CardBlock::Spacer => self.push(vec![Span::styled(CARD_BAR, border)]),
            }
        }

        if card.decorations.contains(&Decoration::ExampleTip) {
            self.push(vec![Span::styled(CARD_BAR, border)]);
            self.push_in_card(vec![
                Span::styled(
                    format!("{} ", Decoration::ExampleTip.glyph()),
                    Style::default().fg(palette.base_0d),
                ),
                Span::styled(
                    Decoration::ExampleTip.caption().unwrap_or_default(),
                    Style::default()
                        .fg(palette.base_06)
                        .bg(palette.base_01)
                        .add_modifier(Modifier::BOLD),
                ),
            ]);
        }

        if let Some(progress) = card.progress {
            self.push(vec![Span::styled(CARD_BAR, border)]);
            let spans = progress_spans(progress, palette);
            self.push_in_card(spans);
        }

        self.push(vec![Span::raw(INDENT), Span::styled("╰─", border)]);
        self.blank();
    }

    fn push_in_card(&mut self, mut spans: Vec<Span<'static>>) {
        let border = Style::default().fg(self.ctx.palette.base_02);
        spans.insert(0, Span::styled(CARD_BAR, border));
        self.push(spans);
    }

    fn push_code(
        &mut self,
        card: &Card,
        language: Option<&str>,
        text: &str,
        block_index: usize,
        inner: usize,
    ) {
        let palette = self.ctx.palette;
        let copy_id = format!("{}:{}", card.key.storage_key(), block_index);
        let frame = Style::default().fg(palette.base_03);
        let code_style = Style::default().fg(palette.base_0b).bg(palette.base_01);
        let start = self.row();

        let copied = self.ctx.copied == Some(copy_id.as_str());
        let action = if copied {
            Span::styled(
                "✓ Copied!",
                Style::default()
                    .fg(palette.base_0b)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled("[y] Copy", Style::default().fg(palette.base_04))
        };
        self.push_in_card(vec![
            Span::styled(format!("┌ {} ", language.unwrap_or("prompt")), frame),
            action,
        ]);

        let available = inner.saturating_sub(2).max(1);
        for source_line in text.split('\n') {
            if source_line.is_empty() {
                self.push_in_card(vec![Span::styled("│ ", frame)]);
                continue;
            }
            for piece in textwrap::wrap(source_line, available) {
                self.push_in_card(vec![
                    Span::styled("│ ", frame),
                    Span::styled(piece.into_owned(), code_style),
                ]);
            }
        }
        self.push_in_card(vec![Span::styled("└", frame)]);

        self.target(
            start,
            TargetAction::CopyCode {
                copy_id,
                text: text.to_string(),
            },
        );
    }

    fn push_entry(
        &mut self,
        card: &Card,
        label: &[InlineRun],
        line_index: usize,
        depth: EntryDepth,
        checked: bool,
        inner: usize,
    ) {
        let palette = self.ctx.palette;
        let indent = match depth {
            EntryDepth::Main => "",
            EntryDepth::Sub => "    ",
        };
        let (box_text, box_style) = if checked {
            ("[x] ", Style::default().fg(palette.base_0b))
        } else {
            ("[ ] ", Style::default().fg(palette.base_04))
        };

        let mut styles = self.inline_styles(palette.base_05);
        if checked {
            styles = styles.muted(palette.base_03);
        }

        let lead_width = indent.width() + box_text.width();
        let start = self.row();
        let lines = wrap_runs(label, inner.saturating_sub(lead_width).max(1), &styles);
        for (line_no, mut spans) in lines.into_iter().enumerate() {
            if line_no == 0 {
                spans.insert(0, Span::styled(box_text, box_style));
            } else {
                spans.insert(0, Span::raw(" ".repeat(box_text.width())));
            }
            spans.insert(0, Span::raw(indent));
            self.push_in_card(spans);
        }
        self.target(
            start,
            TargetAction::ToggleEntry {
                key: card.key.clone(),
                line_index,
            },
        );
    }

    fn push_table_of_contents(&mut self, book: &Book) {
        let palette = self.ctx.palette;
        self.anchor(TOC_ANCHOR_ID, AnchorKind::TableOfContents);
        self.push(vec![
            Span::raw(INDENT),
            Span::styled(
                "Table of Contents",
                Style::default()
                    .fg(palette.base_07)
                    .add_modifier(Modifier::BOLD),
            ),
        ]);
        self.push_rule(palette.base_02);
        self.blank();

        for chapter in &book.chapters {
            self.push_toc_chapter(chapter, palette.base_0d);
        }
        self.push_toc_chapter(&book.appendix, palette.base_09);
    }

    fn push_toc_chapter(&mut self, chapter: &Chapter, accent: Color) {
        let palette = self.ctx.palette;
        let start = self.row();
        self.push_wrapped(
            &chapter.title,
            INDENT,
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        );
        if let Some(subtitle) = &chapter.subtitle {
            self.push_wrapped(subtitle, INDENT, Style::default().fg(palette.base_03));
        }
        self.target(
            start,
            TargetAction::Navigate {
                id: chapter.id.clone(),
            },
        );

        for section in &chapter.sections {
            let start = self.row();
            self.push_wrapped(
                &section.title,
                "    • ",
                Style::default().fg(palette.base_05),
            );
            self.target(
                start,
                TargetAction::Navigate {
                    id: section.id.clone().unwrap_or_else(|| chapter.id.clone()),
                },
            );
        }
        self.blank();
    }

    fn inline_styles(&self, fg: Color) -> InlineStyles {
        let palette = self.ctx.palette;
        InlineStyles {
            plain: Style::default().fg(fg),
            bold: Style::default()
                .fg(palette.base_0e)
                .add_modifier(Modifier::BOLD),
            code: Style::default().fg(palette.base_08).bg(palette.base_01),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct InlineStyles {
    plain: Style,
    bold: Style,
    code: Style,
}

impl InlineStyles {
    fn for_run(&self, run: &InlineRun) -> Style {
        match run {
            InlineRun::PlainText(_) => self.plain,
            InlineRun::Bold(_) => self.bold,
            InlineRun::InlineCode(_) => self.code,
        }
    }

    fn muted(self, color: Color) -> Self {
        let muted = Style::default()
            .fg(color)
            .add_modifier(Modifier::CROSSED_OUT);
        Self {
            plain: muted,
            bold: muted.add_modifier(Modifier::BOLD),
            code: muted,
        }
    }
}

fn progress_spans(progress: Progress, palette: &Base16Palette) -> Vec<Span<'static>> {
    let filled = PROGRESS_BAR_WIDTH * progress.percent as usize / 100;
    let color = if progress.is_complete() {
        palette.base_0b
    } else {
        palette.base_0d
    };
    vec![
        Span::styled("█".repeat(filled), Style::default().fg(color)),
        Span::styled(
            "░".repeat(PROGRESS_BAR_WIDTH - filled),
            Style::default().fg(palette.base_02),
        ),
        Span::styled(
            format!(
                " {}/{} · {}%",
                progress.checked, progress.total, progress.percent
            ),
            Style::default().fg(palette.base_04),
        ),
    ]
}

/// Word-wraps styled runs to `width` columns. Explicit newlines inside a run
/// force a break; words wider than a line are split by character.
fn wrap_runs(runs: &[InlineRun], width: usize, styles: &InlineStyles) -> Vec<Vec<Span<'static>>> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0;

    for run in runs {
        let style = styles.for_run(run);
        for (segment_no, segment) in run.text().split('\n').enumerate() {
            if segment_no > 0 {
                lines.push(mem::take(&mut current));
                current_width = 0;
            }
            for token in split_words(segment) {
                let is_space = token.chars().all(char::is_whitespace);
                if is_space && current_width == 0 {
                    continue;
                }
                let token_width = token.width();
                if current_width + token_width > width && current_width > 0 {
                    lines.push(mem::take(&mut current));
                    current_width = 0;
                    if is_space {
                        continue;
                    }
                }
                if token_width <= width {
                    current.push(Span::styled(token.to_string(), style));
                    current_width += token_width;
                    continue;
                }

                let mut piece = String::new();
                for ch in token.chars() {
                    let ch_width = ch.width().unwrap_or(0);
                    if current_width + ch_width > width && current_width > 0 {
                        if !piece.is_empty() {
                            current.push(Span::styled(mem::take(&mut piece), style));
                        }
                        lines.push(mem::take(&mut current));
                        current_width = 0;
                    }
                    piece.push(ch);
                    current_width += ch_width;
                }
                if !piece.is_empty() {
                    current.push(Span::styled(piece, style));
                }
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn split_words(text: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;

    for (index, ch) in text.char_indices() {
        let space = ch.is_whitespace();
        match in_space {
            Some(previous) if previous != space => {
                words.push(&text[start..index]);
                start = index;
            }
            _ => {}
        }
        in_space = Some(space);
    }
    if start < text.len() {
        words.push(&text[start..]);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StateStore;
    use crate::theme::ThemeMode;

    fn line_text(spans: &[Span<'_>]) -> String {
        spans.iter().map(|span| span.content.as_ref()).collect()
    }

    fn styles() -> InlineStyles {
        InlineStyles {
            plain: Style::default(),
            bold: Style::default().add_modifier(Modifier::BOLD),
            code: Style::default(),
        }
    }

    fn build(book: &Book, expanded: &HashSet<String>, store: &mut ChecklistStore) -> DocumentLayout {
        let storage = StateStore::ephemeral();
        let renderer = ContentRenderer::default();
        DocumentLayout::build(
            book,
            LayoutContext {
                renderer: &renderer,
                store,
                storage: &storage,
                expanded,
                palette: ThemeMode::Dark.palette(),
                copied: None,
                selected_target: None,
                width: 60,
            },
        )
    }

    #[test]
    fn test_wrap_runs_breaks_on_words() {
        let runs = vec![
            InlineRun::PlainText("alpha beta ".to_string()),
            InlineRun::Bold("gamma".to_string()),
            InlineRun::PlainText(" delta".to_string()),
        ];
        let lines = wrap_runs(&runs, 11, &styles());
        let texts: Vec<String> = lines.iter().map(|l| line_text(l)).collect();
        assert_eq!(texts, vec!["alpha beta ", "gamma delta"]);
    }

    #[test]
    fn test_wrap_runs_splits_long_words_and_newlines() {
        let runs = vec![InlineRun::PlainText("abcdefgh\nxy".to_string())];
        let lines = wrap_runs(&runs, 3, &styles());
        let texts: Vec<String> = lines.iter().map(|l| line_text(l)).collect();
        assert_eq!(texts, vec!["abc", "def", "gh", "xy"]);
    }

    #[test]
    fn test_wrap_counts_wide_characters() {
        let runs = vec![InlineRun::PlainText("가나다라".to_string())];
        let lines = wrap_runs(&runs, 4, &styles());
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_layout_anchors_and_regions() {
        let book = Book::sample().unwrap();
        let mut store = ChecklistStore::new();
        let layout = build(&book, &HashSet::new(), &mut store);

        let intro = layout.anchor_row("intro").unwrap();
        let toc = layout.anchor_row(TOC_ANCHOR_ID).unwrap();
        let part1 = layout.anchor_row("part1").unwrap();
        let appendix = layout.anchor_row("appendix").unwrap();
        assert!(intro < toc && toc < part1 && part1 < appendix);

        let rows: Vec<usize> = layout.anchors.iter().map(|a| a.row).collect();
        let mut sorted = rows.clone();
        sorted.sort_unstable();
        assert_eq!(rows, sorted);

        let last = layout.regions.last().unwrap();
        assert!(last.unbounded);
        assert_eq!(last.id, "appendix");
        assert_eq!(layout.regions[0].top + layout.regions[0].height, toc);
    }

    #[test]
    fn test_checklists_attach_during_layout() {
        let book = Book::sample().unwrap();
        let mut store = ChecklistStore::new();
        build(&book, &HashSet::new(), &mut store);
        let key = ChecklistKey::custom("launch-checklist").unwrap();
        assert!(store.is_attached(&key));
        assert_eq!(store.progress(&key).total, 4);
    }

    #[test]
    fn test_accordion_hides_items_until_expanded() {
        let book = Book::sample().unwrap();
        let mut store = ChecklistStore::new();
        let collapsed = build(&book, &HashSet::new(), &mut store);
        let expanded_ids: HashSet<String> = ["part2-2".to_string()].into_iter().collect();
        let expanded = build(&book, &expanded_ids, &mut store);

        let copies = |layout: &DocumentLayout| {
            layout
                .targets
                .iter()
                .filter(|t| matches!(t.action, TargetAction::CopyCode { .. }))
                .count()
        };
        assert_eq!(copies(&expanded), copies(&collapsed) + 2);
        assert!(expanded.height() > collapsed.height());
        assert!(collapsed.targets.iter().any(|t| matches!(
            &t.action,
            TargetAction::ToggleAccordion { section_id } if section_id == "part2-2"
        )));
    }

    #[test]
    fn test_target_lookup_by_row() {
        let book = Book::sample().unwrap();
        let mut store = ChecklistStore::new();
        let layout = build(&book, &HashSet::new(), &mut store);
        let first = &layout.targets[0];
        assert_eq!(layout.target_at_row(first.row), Some(0));
        assert_eq!(layout.next_target_from(0), Some(0));
        assert_eq!(layout.next_target_from(layout.height()), None);
    }
}
