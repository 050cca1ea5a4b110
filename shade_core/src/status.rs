//! Externally visible control state.

use std::fmt;

/// What the controller is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    /// Inside the dead band, motor stopped.
    Idle,
    /// Driving toward the target.
    Seeking,
    /// Operator duty from `turn`; target seeking suspended.
    ManualOverride,
}

impl fmt::Display for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Seeking => "seeking",
            Self::ManualOverride => "manual",
        })
    }
}
