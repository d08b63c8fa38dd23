//! Letter typewriter
//!
//! Reveals a text one character per interval, driven by `tick(dt)`. The
//! first character appears on `start()`, each following one after another
//! interval. `start()` refuses to restart once more than a few characters
//! are on screen, so scrolling back and forth does not retype the letter.

use log::debug;
use std::time::Duration;

/// Typed characters above which `start()` is a no-op
const RESTART_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypewriterState {
    Idle,
    Typing,
    Finished,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct Typewriter {
    text: String,
    boundaries: Vec<usize>, // Byte offset after each char
    typed: usize,
    interval: f32,
    carry: f32,
    state: TypewriterState,
}

impl Typewriter {
    pub fn new(text: impl Into<String>, interval: Duration) -> Self {
        let text = text.into();
        let boundaries = text.char_indices().map(|(i, c)| i + c.len_utf8()).collect();
        Self {
            text,
            boundaries,
            typed: 0,
            interval: interval.as_secs_f32(),
            carry: 0.0,
            state: TypewriterState::Idle,
        }
    }

    /// Begin typing from the first character
    ///
    /// Returns false (and changes nothing) if more than five characters
    /// have already been typed.
    pub fn start(&mut self) -> bool {
        if self.typed > RESTART_LIMIT {
            return false;
        }
        self.typed = 0;
        self.carry = 0.0;
        self.state = TypewriterState::Typing;
        self.advance(1);
        debug!("Typewriter started ({} chars)", self.boundaries.len());
        true
    }

    /// Stop typing; the text typed so far stays
    pub fn cancel(&mut self) {
        if self.state == TypewriterState::Typing {
            self.state = TypewriterState::Cancelled;
        }
    }

    /// Advance the clock; returns how many characters were added
    pub fn tick(&mut self, dt: f32) -> usize {
        if self.state != TypewriterState::Typing {
            return 0;
        }
        if self.interval <= 0.0 {
            return self.advance(usize::MAX);
        }

        self.carry += dt.max(0.0);
        let due = (self.carry / self.interval).floor() as usize;
        self.carry -= due as f32 * self.interval;
        self.advance(due)
    }

    fn advance(&mut self, count: usize) -> usize {
        let before = self.typed;
        self.typed = self.typed.saturating_add(count).min(self.boundaries.len());
        if self.typed == self.boundaries.len() {
            self.state = TypewriterState::Finished;
        }
        self.typed - before
    }

    /// Text on screen right now
    pub fn visible(&self) -> &str {
        match self.typed {
            0 => "",
            n => &self.text[..self.boundaries[n - 1]],
        }
    }

    pub fn typed_chars(&self) -> usize {
        self.typed
    }

    pub fn total_chars(&self) -> usize {
        self.boundaries.len()
    }

    pub fn state(&self) -> TypewriterState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == TypewriterState::Finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer(text: &str) -> Typewriter {
        Typewriter::new(text, Duration::from_millis(40))
    }

    #[test]
    fn test_types_one_char_per_interval() {
        let mut tw = writer("Hello, Mom");
        assert_eq!(tw.visible(), "");
        assert!(tw.start());
        assert_eq!(tw.visible(), "H");

        assert_eq!(tw.tick(0.03), 0);
        assert_eq!(tw.tick(0.02), 1); // 50ms total
        assert_eq!(tw.visible(), "He");

        tw.tick(0.12);
        assert_eq!(tw.visible(), "Hello");
        tw.tick(10.0);
        assert_eq!(tw.visible(), "Hello, Mom");
        assert!(tw.is_finished());
    }

    #[test]
    fn test_multibyte_text() {
        let mut tw = writer("know…\n");
        tw.start();
        tw.tick(0.165);
        assert_eq!(tw.visible(), "know…");
    }

    #[test]
    fn test_cancel_keeps_text() {
        let mut tw = writer("abcdefgh");
        tw.start();
        tw.tick(0.085);
        tw.cancel();
        assert_eq!(tw.state(), TypewriterState::Cancelled);
        assert_eq!(tw.tick(1.0), 0);
        assert_eq!(tw.visible(), "abc");
    }

    /// Test: Restart guard
    /// Validates: Restart allowed up to 5 typed chars, refused beyond
    #[test]
    fn test_restart_guard() {
        let mut tw = writer("abcdefghij");
        tw.start();
        tw.tick(0.165); // 5 chars
        tw.cancel();
        assert!(tw.start());
        assert_eq!(tw.visible(), "a");

        tw.tick(0.25); // 7 chars
        assert!(!tw.start());
        assert_eq!(tw.typed_chars(), 7);
        assert_eq!(tw.state(), TypewriterState::Typing);
    }

    #[test]
    fn test_empty_text_finishes_immediately() {
        let mut tw = writer("");
        assert!(tw.start());
        assert!(tw.is_finished());
        assert_eq!(tw.visible(), "");
    }
}
