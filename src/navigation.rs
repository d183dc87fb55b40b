use std::collections::HashMap;

use crate::book::{Book, Chapter};
use crate::scroll_tracker::ScrollTracker;

/// Anchor of the inline table of contents. Navigating there scrolls but never
/// becomes the active id, since it is not a chapter.
pub const TOC_ANCHOR_ID: &str = "toc";

/// Share of the remaining distance covered per animation tick.
const SMOOTH_SCROLL_FRACTION: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollCommand {
    pub offset: usize,
}

#[derive(Debug, Default)]
pub struct NavigationController {
    anchors: HashMap<String, usize>,
    header_clearance: usize,
}

impl NavigationController {
    pub fn new(header_clearance: usize) -> Self {
        Self {
            anchors: HashMap::new(),
            header_clearance,
        }
    }

    pub fn set_anchors<'a>(&mut self, anchors: impl IntoIterator<Item = (&'a str, usize)>) {
        self.anchors = anchors
            .into_iter()
            .map(|(id, row)| (id.to_string(), row))
            .collect();
    }

    pub fn set_header_clearance(&mut self, header_clearance: usize) {
        self.header_clearance = header_clearance;
    }

    pub fn anchor_top(&self, id: &str) -> Option<usize> {
        self.anchors.get(id).copied()
    }

    pub fn navigate_to(&self, id: &str, tracker: &mut ScrollTracker) -> Option<ScrollCommand> {
        let Some(top) = self.anchor_top(id) else {
            log::warn!("Navigation to unknown anchor '{id}' ignored");
            return None;
        };

        if id != TOC_ANCHOR_ID {
            tracker.set_active_id(id);
        }
        log::debug!("Navigating to '{id}' at row {top}");
        Some(ScrollCommand {
            offset: top.saturating_sub(self.header_clearance),
        })
    }
}

/// Eases the viewport toward a target offset.
#[derive(Debug, Clone, Default)]
pub struct SmoothScroll {
    target: Option<usize>,
}

impl SmoothScroll {
    pub fn start(&mut self, command: ScrollCommand) {
        self.target = Some(command.offset);
    }

    pub fn cancel(&mut self) {
        self.target = None;
    }

    pub fn is_active(&self) -> bool {
        self.target.is_some()
    }

    /// Next offset from `current`; `None` once the target is reached.
    pub fn tick(&mut self, current: usize) -> Option<usize> {
        let target = self.target?;
        if current == target {
            self.target = None;
            return None;
        }

        let distance = current.abs_diff(target);
        let step = ((distance as f64 * SMOOTH_SCROLL_FRACTION).ceil() as usize).max(1);
        let next = if target > current {
            current + step.min(distance)
        } else {
            current - step.min(distance)
        };
        if next == target {
            self.target = None;
        }
        Some(next)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarEntry {
    /// Navigation target.
    pub id: String,
    pub chapter_id: String,
    pub label: Option<String>,
    pub title: String,
    pub is_section: bool,
    pub is_appendix: bool,
}

/// Splits "Part 1: Getting Started" into its label and title. Titles without
/// a colon have no label.
pub fn split_label(title: &str) -> (Option<&str>, &str) {
    match title.split_once(':') {
        Some((label, rest)) => (Some(label.trim()), rest.trim()),
        None => (None, title.trim()),
    }
}

pub fn sidebar_entries(book: &Book) -> Vec<SidebarEntry> {
    let mut entries = Vec::new();
    for chapter in &book.chapters {
        push_chapter_entries(&mut entries, chapter, false);
    }
    push_chapter_entries(&mut entries, &book.appendix, true);
    entries
}

fn push_chapter_entries(entries: &mut Vec<SidebarEntry>, chapter: &Chapter, is_appendix: bool) {
    let (label, title) = split_label(&chapter.title);
    entries.push(SidebarEntry {
        id: chapter.id.clone(),
        chapter_id: chapter.id.clone(),
        label: label.map(str::to_string),
        title: title.to_string(),
        is_section: false,
        is_appendix,
    });

    for section in &chapter.sections {
        entries.push(SidebarEntry {
            id: section.id.clone().unwrap_or_else(|| chapter.id.clone()),
            chapter_id: chapter.id.clone(),
            label: None,
            title: section.title.clone(),
            is_section: true,
            is_appendix,
        });
    }
}

/// Which entries to highlight for `active_id`. A chapter stays highlighted
/// while one of its sections is the active id.
pub fn highlighted(entries: &[SidebarEntry], active_id: &str) -> Vec<bool> {
    let active_chapter = entries
        .iter()
        .find(|entry| entry.id == active_id)
        .map(|entry| entry.chapter_id.as_str());

    entries
        .iter()
        .map(|entry| {
            if entry.is_section {
                entry.id == active_id && entry.id != entry.chapter_id
            } else {
                Some(entry.chapter_id.as_str()) == active_chapter
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scroll_tracker::{Region, ScrollConfig};

    fn controller() -> NavigationController {
        let mut controller = NavigationController::new(2);
        controller.set_anchors([("intro", 5), (TOC_ANCHOR_ID, 40), ("part1", 60), ("appendix", 200)]);
        controller
    }

    fn tracker() -> ScrollTracker {
        ScrollTracker::new(
            vec![
                Region::bounded("intro", 5, 35),
                Region::bounded("part1", 60, 140),
                Region::unbounded("appendix", 200),
            ],
            "intro",
            ScrollConfig::default(),
        )
    }

    #[test]
    fn test_navigate_sets_active_id_optimistically() {
        let mut tracker = tracker();
        let command = controller().navigate_to("part1", &mut tracker);
        assert_eq!(command, Some(ScrollCommand { offset: 58 }));
        assert_eq!(tracker.active_id(), "part1");
    }

    #[test]
    fn test_navigate_to_toc_keeps_active_id() {
        let mut tracker = tracker();
        let command = controller().navigate_to(TOC_ANCHOR_ID, &mut tracker);
        assert_eq!(command, Some(ScrollCommand { offset: 38 }));
        assert_eq!(tracker.active_id(), "intro");
    }

    #[test]
    fn test_navigate_to_unknown_id_is_noop() {
        let mut tracker = tracker();
        assert_eq!(controller().navigate_to("nowhere", &mut tracker), None);
        assert_eq!(tracker.active_id(), "intro");
    }

    #[test]
    fn test_clearance_does_not_underflow() {
        let mut tracker = tracker();
        let mut controller = controller();
        controller.set_header_clearance(10);
        assert_eq!(
            controller.navigate_to("intro", &mut tracker),
            Some(ScrollCommand { offset: 0 })
        );
    }

    #[test]
    fn test_smooth_scroll_reaches_target() {
        let mut smooth = SmoothScroll::default();
        smooth.start(ScrollCommand { offset: 100 });
        let mut current = 0;
        let mut ticks = 0;
        while let Some(next) = smooth.tick(current) {
            assert!(next > current);
            current = next;
            ticks += 1;
        }
        assert_eq!(current, 100);
        assert!(ticks > 1);
        assert!(!smooth.is_active());
    }

    #[test]
    fn test_smooth_scroll_upwards() {
        let mut smooth = SmoothScroll::default();
        smooth.start(ScrollCommand { offset: 3 });
        assert_eq!(smooth.tick(4), Some(3));
        assert_eq!(smooth.tick(3), None);
    }

    #[test]
    fn test_split_label() {
        assert_eq!(
            split_label("Part 1: Getting Started"),
            (Some("Part 1"), "Getting Started")
        );
        assert_eq!(split_label("Prologue"), (None, "Prologue"));
        assert_eq!(split_label("A: b: c"), (Some("A"), "b: c"));
    }

    #[test]
    fn test_sidebar_entries_and_highlight() {
        let book = Book::sample().unwrap();
        let entries = sidebar_entries(&book);
        assert_eq!(entries[0].id, "intro");
        assert_eq!(entries[0].label.as_deref(), Some("Intro"));
        assert!(entries.last().unwrap().is_appendix);

        let marks = highlighted(&entries, "part1-2");
        let lit: Vec<&str> = entries
            .iter()
            .zip(marks)
            .filter(|(_, lit)| *lit)
            .map(|(entry, _)| entry.id.as_str())
            .collect();
        assert_eq!(lit, vec!["part1", "part1-2"]);

        let marks = highlighted(&entries, "appendix");
        assert_eq!(marks.iter().filter(|lit| **lit).count(), 1);
    }
}
