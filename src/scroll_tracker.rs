//! Scroll-position classifier.
//!
//! On every scroll signal the tracker recomputes three values from the raw
//! offset: the active section id, the reading progress percentage, and whether
//! the scroll-to-top affordance is shown. Recomputation is pure apart from
//! updating those values, so it is safe to call at any frequency.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionGranularity {
    /// Only chapter and appendix ids become active.
    #[default]
    Chapter,
    /// The active chapter is refined to its current sub-section.
    Section,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollConfig {
    /// Added to the raw offset before matching regions, so a section counts as
    /// active slightly before its heading reaches the top edge.
    pub look_ahead: usize,
    /// The scroll-to-top affordance shows once the raw offset exceeds this.
    pub scroll_top_threshold: usize,
    pub granularity: SectionGranularity,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            look_ahead: 100,
            scroll_top_threshold: 300,
            granularity: SectionGranularity::Chapter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubAnchor {
    pub id: String,
    pub top: usize,
}

/// A chapter-level region of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub id: String,
    pub top: usize,
    pub height: usize,
    /// Extends to the end of the document and wins whenever reached.
    pub unbounded: bool,
    pub sections: Vec<SubAnchor>,
}

impl Region {
    pub fn bounded(id: impl Into<String>, top: usize, height: usize) -> Self {
        Self {
            id: id.into(),
            top,
            height,
            unbounded: false,
            sections: Vec::new(),
        }
    }

    pub fn unbounded(id: impl Into<String>, top: usize) -> Self {
        Self {
            id: id.into(),
            top,
            height: 0,
            unbounded: true,
            sections: Vec::new(),
        }
    }

    pub fn with_sections(mut self, sections: Vec<SubAnchor>) -> Self {
        self.sections = sections;
        self
    }

    fn contains(&self, position: usize) -> bool {
        if self.unbounded {
            position >= self.top
        } else {
            position >= self.top && position < self.top + self.height
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrollState {
    pub active_id: String,
    /// Percentage of the scrollable height already scrolled, in [0, 100].
    pub progress_percent: f64,
    pub show_scroll_top: bool,
}

#[derive(Debug, Clone)]
pub struct ScrollTracker {
    regions: Vec<Region>,
    config: ScrollConfig,
    state: ScrollState,
}

impl ScrollTracker {
    pub fn new(regions: Vec<Region>, initial_id: impl Into<String>, config: ScrollConfig) -> Self {
        Self {
            regions,
            config,
            state: ScrollState {
                active_id: initial_id.into(),
                progress_percent: 0.0,
                show_scroll_top: false,
            },
        }
    }

    pub fn state(&self) -> &ScrollState {
        &self.state
    }

    pub fn active_id(&self) -> &str {
        &self.state.active_id
    }

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Replaces region boundaries after a relayout. The active id is kept.
    pub fn set_regions(&mut self, regions: Vec<Region>) {
        self.regions = regions;
    }

    /// Optimistic update from navigation.
    pub fn set_active_id(&mut self, id: impl Into<String>) {
        self.state.active_id = id.into();
    }

    pub fn update(
        &mut self,
        offset: usize,
        document_height: usize,
        viewport_height: usize,
    ) -> &ScrollState {
        self.state.progress_percent = reading_progress(offset, document_height, viewport_height);
        self.state.show_scroll_top = offset > self.config.scroll_top_threshold;

        let position = offset + self.config.look_ahead;
        if let Some(id) = self.classify(position) {
            if id != self.state.active_id {
                log::trace!("Active section {} -> {}", self.state.active_id, id);
                self.state.active_id = id.to_string();
            }
        }
        &self.state
    }

    /// Id of the region containing `position`; `None` keeps the current id.
    pub fn classify(&self, position: usize) -> Option<&str> {
        let mut matched: Option<&Region> = None;
        let mut unbounded_match: Option<&Region> = None;

        for region in &self.regions {
            if region.contains(position) {
                if region.unbounded {
                    unbounded_match = Some(region);
                } else {
                    matched = Some(region);
                }
            }
        }

        let region = unbounded_match.or(matched)?;
        if self.config.granularity == SectionGranularity::Section {
            if let Some(section) = region
                .sections
                .iter()
                .filter(|section| section.top <= position)
                .last()
            {
                return Some(&section.id);
            }
        }
        Some(&region.id)
    }
}

/// Scrolled share of the scrollable height as a percentage. Zero when the
/// document fits in the viewport.
pub fn reading_progress(offset: usize, document_height: usize, viewport_height: usize) -> f64 {
    let scrollable = document_height.saturating_sub(viewport_height);
    if scrollable == 0 {
        return 0.0;
    }
    (offset as f64 / scrollable as f64 * 100.0).clamp(0.0, 100.0)
}

/// Rate limit for scroll recomputation. Offers inside the interval are kept
/// as pending and the most recent one is released by [`ScrollThrottle::flush`].
#[derive(Debug, Clone)]
pub struct ScrollThrottle {
    interval: Duration,
    last_run: Option<Instant>,
    pending: Option<usize>,
}

impl ScrollThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
            pending: None,
        }
    }

    pub fn offer(&mut self, offset: usize, now: Instant) -> Option<usize> {
        if self.ready(now) {
            self.last_run = Some(now);
            self.pending = None;
            Some(offset)
        } else {
            self.pending = Some(offset);
            None
        }
    }

    pub fn flush(&mut self, now: Instant) -> Option<usize> {
        if self.pending.is_some() && self.ready(now) {
            self.last_run = Some(now);
            self.pending.take()
        } else {
            None
        }
    }

    fn ready(&self, now: Instant) -> bool {
        self.last_run
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_look_ahead() -> ScrollConfig {
        ScrollConfig {
            look_ahead: 0,
            ..ScrollConfig::default()
        }
    }

    fn three_regions() -> Vec<Region> {
        vec![
            Region::bounded("intro", 0, 100),
            Region::bounded("part1", 100, 150),
            Region::unbounded("appendix", 250),
        ]
    }

    #[test]
    fn test_classify_three_sections() {
        let tracker = ScrollTracker::new(three_regions(), "intro", no_look_ahead());
        assert_eq!(tracker.classify(150), Some("part1"));
        assert_eq!(tracker.classify(300), Some("appendix"));
        assert_eq!(tracker.classify(250), Some("appendix"));
        assert_eq!(tracker.classify(99), Some("intro"));
    }

    #[test]
    fn test_unbounded_region_wins_over_overlap() {
        let regions = vec![
            Region::bounded("intro", 0, 100),
            Region::unbounded("appendix", 50),
            Region::bounded("late", 40, 100),
        ];
        let tracker = ScrollTracker::new(regions, "intro", no_look_ahead());
        assert_eq!(tracker.classify(60), Some("appendix"));
        assert_eq!(tracker.classify(45), Some("late"));
    }

    #[test]
    fn test_no_match_keeps_previous_id() {
        let regions = vec![Region::bounded("intro", 40, 100), Region::unbounded("appendix", 200)];
        let mut tracker = ScrollTracker::new(regions, "intro", no_look_ahead());
        tracker.update(210, 1000, 50);
        assert_eq!(tracker.active_id(), "appendix");
        tracker.update(0, 1000, 50);
        assert_eq!(tracker.active_id(), "appendix");
    }

    #[test]
    fn test_look_ahead_applies_to_position() {
        let mut tracker = ScrollTracker::new(three_regions(), "intro", ScrollConfig::default());
        tracker.update(0, 1000, 100);
        assert_eq!(tracker.active_id(), "part1");
    }

    #[test]
    fn test_section_granularity() {
        let regions = vec![
            Region::bounded("intro", 0, 100),
            Region::unbounded("appendix", 100).with_sections(vec![
                SubAnchor {
                    id: "appendix-1".to_string(),
                    top: 110,
                },
                SubAnchor {
                    id: "appendix-2".to_string(),
                    top: 180,
                },
            ]),
        ];
        let config = ScrollConfig {
            look_ahead: 0,
            granularity: SectionGranularity::Section,
            ..ScrollConfig::default()
        };
        let tracker = ScrollTracker::new(regions, "intro", config);
        assert_eq!(tracker.classify(105), Some("appendix"));
        assert_eq!(tracker.classify(150), Some("appendix-1"));
        assert_eq!(tracker.classify(500), Some("appendix-2"));
    }

    #[test]
    fn test_reading_progress_guards_zero_height() {
        assert_eq!(reading_progress(0, 0, 0), 0.0);
        assert_eq!(reading_progress(10, 20, 40), 0.0);
        assert_eq!(reading_progress(50, 200, 100), 50.0);
        assert_eq!(reading_progress(500, 200, 100), 100.0);
    }

    #[test]
    fn test_scroll_top_threshold_is_strict() {
        let mut tracker = ScrollTracker::new(three_regions(), "intro", ScrollConfig::default());
        assert!(!tracker.update(300, 2000, 100).show_scroll_top);
        assert!(tracker.update(301, 2000, 100).show_scroll_top);
        assert!(!tracker.update(0, 2000, 100).show_scroll_top);
    }

    #[test]
    fn test_throttle_keeps_latest_offset() {
        let start = Instant::now();
        let mut throttle = ScrollThrottle::new(Duration::from_millis(100));
        assert_eq!(throttle.offer(1, start), Some(1));
        assert_eq!(throttle.offer(2, start + Duration::from_millis(10)), None);
        assert_eq!(throttle.offer(3, start + Duration::from_millis(20)), None);
        assert_eq!(throttle.flush(start + Duration::from_millis(50)), None);
        assert_eq!(throttle.flush(start + Duration::from_millis(100)), Some(3));
        assert_eq!(throttle.flush(start + Duration::from_millis(300)), None);
    }
}
