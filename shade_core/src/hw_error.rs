//! Maps `Box<dyn Error>` from trait boundaries to typed `ShadeError`.
//!
//! The traits in `shade_traits` use `Box<dyn Error + Send + Sync>` so any
//! driver can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `shade_hardware::HwError` downcasting.

use crate::error::ShadeError;

/// Map a trait-boundary error to a typed `ShadeError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> ShadeError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<shade_hardware::error::HwError>() {
            return match hw {
                shade_hardware::error::HwError::Io(io) => ShadeError::Io(io.to_string()),
                other => ShadeError::HardwareFault(other.to_string()),
            };
        }
    }

    if let Some(io) = e.downcast_ref::<std::io::Error>() {
        return ShadeError::Io(io.to_string());
    }
    ShadeError::Hardware(e.to_string())
}
