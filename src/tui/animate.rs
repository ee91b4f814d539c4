//! Frame-timed transitions for expand/collapse reveals.
//!
//! A [`Transition`] is a declarative before/after pair: a target fraction
//! (0.0 collapsed, 1.0 expanded) reached by easing from wherever the value
//! was when the target changed. Purely cosmetic — queries are side-effect
//! free, and once the duration elapses the fraction equals the target
//! exactly, regardless of how many frames were drawn in between.

use std::time::{Duration, Instant};

/// How long an expand/collapse takes.
pub const REVEAL_DURATION: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    from: f32,
    target: f32,
    started: Instant,
}

impl Transition {
    /// A transition already at rest on `expanded`.
    pub fn settled(expanded: bool) -> Self {
        let target = if expanded { 1.0 } else { 0.0 };
        Self {
            from: target,
            target,
            started: Instant::now() - REVEAL_DURATION,
        }
    }

    /// Retargets the transition, easing from the current fraction so a
    /// mid-flight reversal doesn't jump.
    pub fn toward(&mut self, expanded: bool, now: Instant) {
        let target = if expanded { 1.0 } else { 0.0 };
        if target == self.target {
            return;
        }
        self.from = self.fraction_at(now);
        self.target = target;
        self.started = now;
    }

    /// Current eased fraction in [0, 1].
    pub fn fraction_at(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed >= REVEAL_DURATION {
            return self.target;
        }
        let t = elapsed.as_secs_f32() / REVEAL_DURATION.as_secs_f32();
        self.from + (self.target - self.from) * ease_in_out(t)
    }

    pub fn target_expanded(&self) -> bool {
        self.target >= 1.0
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) < REVEAL_DURATION
    }
}

/// Quadratic ease-in-out over [0, 1].
fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u / 2.0
    }
}

/// Number of rows visible for a body of `full` rows at `fraction` revealed.
/// Zero only at fully collapsed; any progress shows at least one row.
pub fn revealed_rows(full: u16, fraction: f32) -> u16 {
    if full == 0 || fraction <= 0.0 {
        return 0;
    }
    ((full as f32 * fraction).ceil() as u16).min(full).max(1)
}
