//! Occupancy debouncing.
//!
//! A raw sample above the threshold refreshes the trigger time; the stable
//! flag stays set for `hold_ms` after the most recent trigger.

use crate::util::{f64_to_i32_saturating, safe_map_i32};

/// Debounced occupancy state carried from tick to tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionState {
    /// Last time (ms) a sample exceeded the threshold; `None` before the first trigger.
    pub last_trigger_ms: Option<u64>,
    /// Stable occupancy flag.
    pub debounced: bool,
}

/// Compute the next state for one raw sample.
///
/// Returns the new state and whether `debounced` flipped.
pub fn update(
    raw_sample: i32,
    now_ms: u64,
    threshold: i32,
    hold_ms: u64,
    previous: MotionState,
) -> (MotionState, bool) {
    let last_trigger_ms = if raw_sample > threshold {
        Some(now_ms)
    } else {
        previous.last_trigger_ms
    };
    let debounced = last_trigger_ms.is_some_and(|t| now_ms.saturating_sub(t) < hold_ms);
    let next = MotionState {
        last_trigger_ms,
        debounced,
    };
    (next, debounced != previous.debounced)
}

/// Sensitivity threshold for the current shade position.
///
/// With `position_scaled`, the threshold rises linearly from 0 at the bottom
/// to `sensitivity` at `rise_height`, clamped at both ends; a lowered shade
/// reacts to weaker signals.
pub fn sensitivity_threshold(
    position: f64,
    rise_height: f64,
    sensitivity: i32,
    position_scaled: bool,
) -> i32 {
    if !position_scaled {
        return sensitivity;
    }
    safe_map_i32(
        f64_to_i32_saturating(position),
        0,
        f64_to_i32_saturating(rise_height),
        0,
        sensitivity,
    )
}

/// Stateful wrapper that owns the current `MotionState`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MotionDebouncer {
    state: MotionState,
}

impl MotionDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn occupied(&self) -> bool {
        self.state.debounced
    }

    /// Feed one sample; returns `Some(new_value)` only on an edge.
    pub fn update(
        &mut self,
        raw_sample: i32,
        now_ms: u64,
        threshold: i32,
        hold_ms: u64,
    ) -> Option<bool> {
        let (next, changed) = update(raw_sample, now_ms, threshold, hold_ms, self.state);
        self.state = next;
        changed.then_some(next.debounced)
    }
}
