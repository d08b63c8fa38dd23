//! Scroll triggers - the host side of the scroll contract
//!
//! **PinTrigger**: a pinned region of fixed scroll length. While the page
//! scroll offset is inside `[start, start + length]` the hero section is
//! held in place and a progress value advances from 0 to 1.
//!
//! **LineTrigger**: fires when an element's top edge crosses a horizontal
//! line at a fraction of the viewport height ("top 85%").
//!
//! # Scrub Smoothing
//!
//! The emitted progress trails the raw scroll progress and catches up over
//! `scrub_lag` seconds (exponential approach). With a lag of 0 the raw value
//! is emitted directly. Emission is last-value-wins: `tick()` reports at most
//! one value per call, nothing is buffered.

use log::trace;

use crate::config::ScrollDuration;

/// Below this distance the smoothed progress snaps to the target
const SNAP_EPSILON: f32 = 1e-4;

/// Time constants per lag: ~98% caught up after `scrub_lag` seconds
const LAG_TIME_CONSTANTS: f32 = 4.0;

/// Where the scroll position is relative to the pinned region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinPhase {
    Before,
    Pinned,
    After,
}

/// Boundary crossings, named after the scroll direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    Enter,     // Crossed the start moving down
    Leave,     // Crossed the end moving down
    EnterBack, // Crossed the end moving up
    LeaveBack, // Crossed the start moving up
}

/// Pinned scroll region producing a progress value in [0,1]
#[derive(Debug, Clone)]
pub struct PinTrigger {
    start: f32,
    duration: ScrollDuration,
    viewport_height: f32,
    scrub_lag: f32,
    scroll: f32,
    raw_progress: f32,
    progress: f32,
    emitted: Option<f32>,
    phase: PinPhase,
}

impl PinTrigger {
    /// `start` is the page offset (logical px) where pinning begins
    pub fn new(start: f32, duration: ScrollDuration, scrub_lag: f32) -> Self {
        Self {
            start,
            duration,
            viewport_height: 1.0,
            scrub_lag: scrub_lag.max(0.0),
            scroll: 0.0,
            raw_progress: 0.0,
            progress: 0.0,
            emitted: None,
            phase: PinPhase::Before,
        }
    }

    /// Resize changes the pinned length when the duration is a percentage
    pub fn set_viewport_height(&mut self, height: f32) {
        self.viewport_height = height.max(1.0);
        self.raw_progress = self.progress_at(self.scroll);
    }

    pub fn start(&self) -> f32 {
        self.start
    }

    /// Pinned scroll distance in logical px
    pub fn length(&self) -> f32 {
        self.duration.to_pixels(self.viewport_height).max(1.0)
    }

    pub fn end(&self) -> f32 {
        self.start + self.length()
    }

    pub fn phase(&self) -> PinPhase {
        self.phase
    }

    /// Unsmoothed progress for the current scroll offset
    pub fn raw_progress(&self) -> f32 {
        self.raw_progress
    }

    /// Smoothed progress (what the binder sees)
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Scroll distance absorbed by the pin so far; content below the hero
    /// is shifted up by `scroll - pinned_distance`
    pub fn pinned_distance(&self) -> f32 {
        (self.scroll - self.start).clamp(0.0, self.length())
    }

    fn progress_at(&self, scroll: f32) -> f32 {
        ((scroll - self.start) / self.length()).clamp(0.0, 1.0)
    }

    fn phase_at(&self, scroll: f32) -> PinPhase {
        if scroll < self.start {
            PinPhase::Before
        } else if scroll > self.end() {
            PinPhase::After
        } else {
            PinPhase::Pinned
        }
    }

    /// Feed a new page scroll offset; returns boundary crossings in order
    pub fn update_scroll(&mut self, scroll: f32) -> Vec<TriggerEvent> {
        self.scroll = scroll;
        self.raw_progress = self.progress_at(scroll);

        let next = self.phase_at(scroll);
        let events = match (self.phase, next) {
            (PinPhase::Before, PinPhase::Pinned) => vec![TriggerEvent::Enter],
            (PinPhase::Before, PinPhase::After) => vec![TriggerEvent::Enter, TriggerEvent::Leave],
            (PinPhase::Pinned, PinPhase::After) => vec![TriggerEvent::Leave],
            (PinPhase::After, PinPhase::Pinned) => vec![TriggerEvent::EnterBack],
            (PinPhase::After, PinPhase::Before) => {
                vec![TriggerEvent::EnterBack, TriggerEvent::LeaveBack]
            }
            (PinPhase::Pinned, PinPhase::Before) => vec![TriggerEvent::LeaveBack],
            _ => Vec::new(),
        };
        if !events.is_empty() {
            trace!("PinTrigger: {:?} -> {:?} {:?}", self.phase, next, events);
        }
        self.phase = next;
        events
    }

    /// Advance smoothing by `dt` seconds; returns the progress if it changed
    /// since the last emission (always emits on the first call)
    pub fn tick(&mut self, dt: f32) -> Option<f32> {
        let target = self.raw_progress;

        if self.scrub_lag <= 0.0 {
            self.progress = target;
        } else {
            let alpha = 1.0 - (-dt.max(0.0) * LAG_TIME_CONSTANTS / self.scrub_lag).exp();
            self.progress += (target - self.progress) * alpha;
            if (target - self.progress).abs() < SNAP_EPSILON {
                self.progress = target;
            }
        }

        match self.emitted {
            Some(last) if last == self.progress => None,
            _ => {
                self.emitted = Some(self.progress);
                Some(self.progress)
            }
        }
    }
}

/// Fires when an element's top crosses `fraction` of the viewport height
#[derive(Debug, Clone, Copy)]
pub struct LineTrigger {
    fraction: f32,
    active: bool,
}

impl LineTrigger {
    /// `fraction` = 0.85 for "top 85%"
    pub fn new(fraction: f32) -> Self {
        Self {
            fraction,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// `element_top` is the element's top edge in viewport coordinates
    /// (0 = top of the window). Returns `Enter` when it rises above the
    /// line and `LeaveBack` when it drops below again.
    pub fn update(&mut self, element_top: f32, viewport_height: f32) -> Option<TriggerEvent> {
        let line = viewport_height * self.fraction;
        let above = element_top <= line;

        match (self.active, above) {
            (false, true) => {
                self.active = true;
                Some(TriggerEvent::Enter)
            }
            (true, false) => {
                self.active = false;
                Some(TriggerEvent::LeaveBack)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger(lag: f32) -> PinTrigger {
        let mut t = PinTrigger::new(0.0, ScrollDuration::ViewportPercent(150.0), lag);
        t.set_viewport_height(800.0);
        t
    }

    #[test]
    fn test_progress_from_scroll() {
        let mut t = trigger(0.0);
        assert_eq!(t.length(), 1200.0);

        t.update_scroll(600.0);
        assert!((t.raw_progress() - 0.5).abs() < 1e-6);
        t.update_scroll(-50.0);
        assert_eq!(t.raw_progress(), 0.0);
        t.update_scroll(5000.0);
        assert_eq!(t.raw_progress(), 1.0);
    }

    #[test]
    fn test_phase_events() {
        let mut t = PinTrigger::new(100.0, ScrollDuration::Pixels(500.0), 0.0);
        assert!(t.update_scroll(50.0).is_empty());
        assert_eq!(t.update_scroll(150.0), vec![TriggerEvent::Enter]);
        assert_eq!(t.phase(), PinPhase::Pinned);
        assert_eq!(t.update_scroll(700.0), vec![TriggerEvent::Leave]);
        assert_eq!(t.update_scroll(400.0), vec![TriggerEvent::EnterBack]);
        assert_eq!(t.update_scroll(0.0), vec![TriggerEvent::LeaveBack]);
        assert_eq!(
            t.update_scroll(900.0),
            vec![TriggerEvent::Enter, TriggerEvent::Leave]
        );
    }

    #[test]
    fn test_pinned_distance() {
        let mut t = PinTrigger::new(0.0, ScrollDuration::Pixels(1000.0), 0.0);
        t.update_scroll(400.0);
        assert_eq!(t.pinned_distance(), 400.0);
        t.update_scroll(1500.0);
        assert_eq!(t.pinned_distance(), 1000.0);
    }

    #[test]
    fn test_immediate_scrub_emits_on_change_only() {
        let mut t = trigger(0.0);
        assert_eq!(t.tick(0.016), Some(0.0));
        assert_eq!(t.tick(0.016), None);

        t.update_scroll(300.0);
        assert_eq!(t.tick(0.016), Some(0.25));
        assert_eq!(t.tick(0.016), None);
    }

    #[test]
    fn test_smoothed_scrub_catches_up() {
        let mut t = trigger(1.0);
        t.tick(0.016);
        t.update_scroll(1200.0);

        let first = t.tick(0.1).unwrap();
        assert!(first > 0.0 && first < 1.0);

        // Progress approaches monotonically and settles at the target
        let mut last = first;
        for _ in 0..200 {
            if let Some(p) = t.tick(0.016) {
                assert!(p >= last);
                last = p;
            }
        }
        assert_eq!(t.progress(), 1.0);
    }

    #[test]
    fn test_resize_rescales_percent_duration() {
        let mut t = trigger(0.0);
        t.update_scroll(600.0);
        t.set_viewport_height(400.0); // length 600
        assert_eq!(t.raw_progress(), 1.0);
    }

    #[test]
    fn test_line_trigger() {
        let mut line = LineTrigger::new(0.85);
        assert_eq!(line.update(900.0, 1000.0), None);
        assert_eq!(line.update(840.0, 1000.0), Some(TriggerEvent::Enter));
        assert_eq!(line.update(100.0, 1000.0), None);
        assert_eq!(line.update(860.0, 1000.0), Some(TriggerEvent::LeaveBack));
        assert!(!line.is_active());
    }
}
