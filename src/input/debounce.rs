//! Press timing and click/hold classification for momentary buttons.
//!
//! Two trackers cover the two button behaviors on this hardware:
//! [`PressTracker`] measures full press/release cycles on the encoder button
//! and classifies them by hold duration; [`EdgeDebouncer`] fires on the press
//! edge of a transport button with a simple re-arm window, matching buttons
//! that act immediately rather than on release.

use std::time::{Duration, Instant};

/// Default bounce floor: presses shorter than this never produce an event.
pub const DEFAULT_CLICK_MIN: Duration = Duration::from_millis(50);
/// Default hold threshold: presses at least this long classify as Hold.
pub const DEFAULT_HOLD_MIN: Duration = Duration::from_millis(3000);

/// Outcome of a completed press/release cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    /// Shorter than the bounce floor; discarded.
    Ignored,
    /// Debounced short press.
    Click,
    /// Long press at or beyond the hold threshold.
    Hold,
}

/// Per-button press timer with duration classification on release.
#[derive(Debug)]
pub struct PressTracker {
    click_min: Duration,
    hold_min: Duration,
    pressed_at: Option<Instant>,
}

impl PressTracker {
    /// Tracker with explicit debounce windows. `click_min` must be below
    /// `hold_min`; config validation enforces this upstream.
    #[must_use]
    pub const fn new(click_min: Duration, hold_min: Duration) -> Self {
        Self {
            click_min,
            hold_min,
            pressed_at: None,
        }
    }

    /// Whether the line is currently in a press.
    #[must_use]
    pub const fn is_pressed(&self) -> bool {
        self.pressed_at.is_some()
    }

    /// Consume one sample of the line (`active` = pressed) at time `now`.
    /// Returns a classification only on the release edge.
    pub fn sample(&mut self, active: bool, now: Instant) -> Option<PressOutcome> {
        match (active, self.pressed_at) {
            (true, None) => {
                self.pressed_at = Some(now);
                None
            }
            (false, Some(start)) => {
                self.pressed_at = None;
                Some(self.classify(now.duration_since(start)))
            }
            _ => None,
        }
    }

    /// Map a measured hold duration onto an outcome.
    #[must_use]
    pub fn classify(&self, held: Duration) -> PressOutcome {
        if held >= self.hold_min {
            PressOutcome::Hold
        } else if held >= self.click_min {
            PressOutcome::Click
        } else {
            PressOutcome::Ignored
        }
    }
}

impl Default for PressTracker {
    fn default() -> Self {
        Self::new(DEFAULT_CLICK_MIN, DEFAULT_HOLD_MIN)
    }
}

/// Press-edge debouncer for the transport buttons.
///
/// Fires once when the line transitions to active, then stays quiet until the
/// line releases and the re-arm window has elapsed since the last accepted
/// press.
#[derive(Debug)]
pub struct EdgeDebouncer {
    rearm: Duration,
    pressed: bool,
    last_press: Option<Instant>,
}

impl EdgeDebouncer {
    /// Debouncer with an explicit re-arm window.
    #[must_use]
    pub const fn new(rearm: Duration) -> Self {
        Self {
            rearm,
            pressed: false,
            last_press: None,
        }
    }

    /// Consume one sample. Returns `true` exactly once per debounced press.
    pub fn sample(&mut self, active: bool, now: Instant) -> bool {
        if active && !self.pressed {
            self.pressed = true;
            let accepted = self
                .last_press
                .is_none_or(|last| now.duration_since(last) > self.rearm);
            if accepted {
                self.last_press = Some(now);
            }
            return accepted;
        }
        if !active && self.pressed {
            self.pressed = false;
        }
        false
    }
}

impl Default for EdgeDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_CLICK_MIN)
    }
}
