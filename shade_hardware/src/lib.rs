//! Hardware backends for the shade actuator.
//!
//! - `sim`: simulated plant, sensors and light; always available.
//! - `quadrature`: edge decoding shared by encoder drivers.
//! - `gpio`: Raspberry Pi drivers via rppal, behind the `hardware` feature.

pub mod error;
pub mod quadrature;
pub mod sim;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;

pub use error::HwError;
pub use quadrature::QuadratureDecoder;
pub use sim::{
    SimulatedDistance, SimulatedDrive, SimulatedEncoder, SimulatedLight, SimulatedPlant,
    SimulatedPresence,
};
