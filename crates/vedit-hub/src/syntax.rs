use std::path::Path;
use std::time::{Duration, Instant};

use vedit_core::SyntaxToken;

/// Quiet period after the last edit before the buffer is re-highlighted.
pub const HIGHLIGHT_DELAY: Duration = Duration::from_millis(100);

/// Produces syntax tokens for a whole document.
pub trait Highlighter {
    fn highlight(&self, text: &str, path: Option<&Path>, language: &str) -> Vec<SyntaxToken>;
}

/// Highlighter that recognises nothing; every document renders as plain text.
#[derive(Debug, Default)]
pub struct PlainText;

impl Highlighter for PlainText {
    fn highlight(&self, _text: &str, _path: Option<&Path>, _language: &str) -> Vec<SyntaxToken> {
        Vec::new()
    }
}

/// Trailing-edge debounce keyed on buffer revisions.
///
/// Every new revision pushes the deadline back; the highlighter runs once the
/// buffer has been quiet for the full delay.
#[derive(Debug)]
pub struct SyntaxDebounce {
    delay: Duration,
    seen_revision: Option<u64>,
    deadline: Option<Instant>,
}

impl SyntaxDebounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            seen_revision: None,
            deadline: None,
        }
    }

    /// Note the buffer's current revision.
    pub fn observe(&mut self, revision: u64, now: Instant) {
        if self.seen_revision != Some(revision) {
            self.seen_revision = Some(revision);
            self.deadline = Some(now + self.delay);
        }
    }

    /// True once per quiet period, when the deadline has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for SyntaxDebounce {
    fn default() -> Self {
        Self::new(HIGHLIGHT_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_revision_schedules_highlight() {
        let start = Instant::now();
        let mut debounce = SyntaxDebounce::default();
        debounce.observe(0, start);
        assert!(!debounce.fire(start));
        assert!(debounce.fire(start + HIGHLIGHT_DELAY));
        assert!(!debounce.fire(start + HIGHLIGHT_DELAY * 2));
    }

    #[test]
    fn test_edits_push_deadline_back() {
        let start = Instant::now();
        let step = Duration::from_millis(60);
        let mut debounce = SyntaxDebounce::default();

        debounce.observe(1, start);
        debounce.observe(2, start + step);
        assert!(!debounce.fire(start + HIGHLIGHT_DELAY));
        assert!(debounce.fire(start + step + HIGHLIGHT_DELAY));
    }

    #[test]
    fn test_same_revision_does_not_reschedule() {
        let start = Instant::now();
        let mut debounce = SyntaxDebounce::default();
        debounce.observe(3, start);
        assert!(debounce.fire(start + HIGHLIGHT_DELAY));
        debounce.observe(3, start + HIGHLIGHT_DELAY * 3);
        assert!(!debounce.fire(start + HIGHLIGHT_DELAY * 10));
    }

    #[test]
    fn test_plain_text_has_no_tokens() {
        assert!(PlainText.highlight("fn main() {}", None, "rust").is_empty());
    }
}
