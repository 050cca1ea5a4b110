//! What to do when the end stop fires.

use std::fmt::Debug;

/// Position and target after an end-stop edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationOutcome {
    pub position: f64,
    pub target: f64,
    /// Stop the motor and drop manual override.
    pub halt: bool,
}

/// Pluggable reaction to the end-stop switch.
pub trait CalibrationPolicy: Debug + Send {
    fn name(&self) -> &'static str;

    fn on_end_stop(&self, position: f64, target: f64) -> CalibrationOutcome;
}

/// Log the edge and change nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOnly;

impl CalibrationPolicy for LogOnly {
    fn name(&self) -> &'static str {
        "log"
    }

    fn on_end_stop(&self, position: f64, target: f64) -> CalibrationOutcome {
        CalibrationOutcome {
            position,
            target,
            halt: false,
        }
    }
}

/// Stop where the switch fired.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoldPosition;

impl CalibrationPolicy for HoldPosition {
    fn name(&self) -> &'static str {
        "hold"
    }

    fn on_end_stop(&self, position: f64, _target: f64) -> CalibrationOutcome {
        CalibrationOutcome {
            position,
            target: position,
            halt: true,
        }
    }
}

/// Treat the switch as a reference mark at a known position.
#[derive(Debug, Clone, Copy)]
pub struct ResetTo(pub f64);

impl CalibrationPolicy for ResetTo {
    fn name(&self) -> &'static str {
        "reset"
    }

    fn on_end_stop(&self, _position: f64, _target: f64) -> CalibrationOutcome {
        CalibrationOutcome {
            position: self.0,
            target: self.0,
            halt: true,
        }
    }
}
