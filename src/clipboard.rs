use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};

/// How long the "copied" indicator stays on after a successful copy.
pub const COPIED_INDICATOR_DURATION: Duration = Duration::from_secs(2);

pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// System clipboard. A fresh handle is opened per copy so a clipboard that is
/// unavailable at startup does not disable copying for the whole session.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| anyhow!("Failed to access clipboard: {e}"))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| anyhow!("Failed to copy text to clipboard: {e}"))
    }
}

/// Clipboard that records what was copied, for headless runs and tests.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
    pub fail: bool,
}

impl ClipboardSink for MemoryClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        if self.fail {
            return Err(anyhow!("clipboard unavailable"));
        }
        self.contents = Some(text.to_string());
        Ok(())
    }
}

/// Shared handle, so a caller can keep reading a sink it handed to the app.
impl<T: ClipboardSink> ClipboardSink for Rc<RefCell<T>> {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.borrow_mut().set_text(text)
    }
}

/// Transient "copied" flag for one code block. A later copy restarts the
/// timer instead of cancelling anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyIndicator {
    target: String,
    copied_at: Instant,
}

impl CopyIndicator {
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_active(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.copied_at) < COPIED_INDICATOR_DURATION
    }
}

/// Copies `text` trimmed. Returns the indicator for `target` on success; on
/// failure the error is logged and no indicator is produced.
pub fn copy_code(
    clipboard: &mut dyn ClipboardSink,
    target: impl Into<String>,
    text: &str,
    now: Instant,
) -> Option<CopyIndicator> {
    match clipboard.set_text(text.trim()) {
        Ok(()) => {
            log::debug!("Copied {} bytes of code to clipboard", text.trim().len());
            Some(CopyIndicator {
                target: target.into(),
                copied_at: now,
            })
        }
        Err(e) => {
            log::error!("{e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_trims_and_activates_indicator() {
        let mut clipboard = MemoryClipboard::default();
        let now = Instant::now();
        let indicator = copy_code(&mut clipboard, "block-1", "\n  lofi beat \n", now).unwrap();

        assert_eq!(clipboard.contents.as_deref(), Some("lofi beat"));
        assert_eq!(indicator.target(), "block-1");
        assert!(indicator.is_active(now + Duration::from_millis(1999)));
        assert!(!indicator.is_active(now + COPIED_INDICATOR_DURATION));
    }

    #[test]
    fn test_failed_copy_has_no_indicator() {
        let mut clipboard = MemoryClipboard {
            contents: None,
            fail: true,
        };
        assert!(copy_code(&mut clipboard, "block-1", "x", Instant::now()).is_none());
        assert!(clipboard.contents.is_none());
    }
}
