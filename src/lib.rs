pub mod book;
pub mod checklist;
pub mod clipboard;
pub mod content_renderer;
pub mod event_source;
pub mod layout;
pub mod main_app;
pub mod markup;
pub mod navigation;
pub mod panic_handler;
pub mod scroll_tracker;
pub mod settings;
pub mod storage;
pub mod theme;
pub mod widget;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use main_app::{App, AppAction, FocusedPanel, run_app_with_event_source};
