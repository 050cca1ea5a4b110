//! Hardware seams for the shade actuator.
//!
//! Every driver the control core talks to sits behind one of these traits.
//! Errors cross the boundary as `Box<dyn Error + Send + Sync>` and are mapped
//! to typed errors by `shade_core`.

pub mod clock;
pub mod color;
pub mod rotation;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use color::Rgbw;
pub use rotation::RotationAccumulator;

/// Boxed error type used at every trait boundary.
pub type HwResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Rotary encoder on the winding shaft.
pub trait Encoder {
    /// Rotations observed since the previous call, signed as the hardware reports them.
    fn take_rotation(&mut self) -> HwResult<f64>;
}

/// Shade motor driver taking a signed duty (positive raises the shade).
pub trait Motor {
    fn set_duty(&mut self, duty: i32) -> HwResult<()>;

    fn stop(&mut self) -> HwResult<()> {
        self.set_duty(0)
    }
}

/// Occupancy (PIR) sensor returning a raw analog sample.
pub trait MotionSensor {
    fn read(&mut self) -> HwResult<i32>;
}

/// Auxiliary distance sensor used for proximity-assisted positioning.
pub trait DistanceSensor {
    fn read(&mut self) -> HwResult<i32>;
}

/// Status light.
pub trait Light {
    fn set(&mut self, color: Rgbw) -> HwResult<()>;
}
