use chapterbook::scroll_tracker::{Region, ScrollConfig, ScrollTracker, reading_progress};

fn book_regions() -> Vec<Region> {
    vec![
        Region::bounded("intro", 0, 100),
        Region::bounded("part1", 100, 150),
        Region::unbounded("appendix", 250),
    ]
}

#[test]
fn test_active_section_follows_look_ahead_position() {
    let mut tracker = ScrollTracker::new(book_regions(), "intro", ScrollConfig::default());

    // 50 + 100 look-ahead lands in part1
    assert_eq!(tracker.update(50, 2000, 500).active_id, "part1");
    // 200 + 100 lands in the appendix
    assert_eq!(tracker.update(200, 2000, 500).active_id, "appendix");
    assert_eq!(tracker.update(0, 2000, 500).active_id, "part1");
}

#[test]
fn test_progress_and_scroll_top_flag() {
    let mut tracker = ScrollTracker::new(book_regions(), "intro", ScrollConfig::default());
    let state = tracker.update(750, 2000, 500).clone();
    assert_eq!(state.progress_percent, 50.0);
    assert!(state.show_scroll_top);

    assert_eq!(reading_progress(0, 300, 500), 0.0);
}

#[test]
fn test_relayout_keeps_active_id() {
    let mut tracker = ScrollTracker::new(book_regions(), "intro", ScrollConfig::default());
    tracker.update(200, 2000, 500);
    tracker.set_regions(vec![Region::bounded("intro", 0, 10)]);
    assert_eq!(tracker.active_id(), "appendix");
    tracker.update(500, 2000, 500);
    assert_eq!(tracker.active_id(), "appendix");
}
