#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Shade positioning core (hardware-agnostic).
//!
//! This crate turns encoder rotations into a tracked shade position and
//! drives the motor toward a target. All hardware interactions go through
//! the traits in `shade_traits`.
//!
//! ## Architecture
//!
//! - **Conversion**: rotations to length units, lock-free accumulation (`convert`)
//! - **Occupancy**: debounced motion with a position-scaled threshold (`motion`)
//! - **Targeting**: manual, remote and automated authority (`target`)
//! - **Speed**: asymmetric up/down duty curves (`speed`)
//! - **Control**: the per-tick orchestrator returning effects (`controller`)
//! - **Light**: flash overlay over the steady status color (`overlay`)
//! - **Shell**: `Shade` applies effects to hardware; `runner` paces it
//!
//! `Controller` is pure: it never blocks and never fails. Everything that
//! can fail lives in `Shade` and returns `eyre::Result`.

pub mod builder;
pub mod calibration;
pub mod command;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod convert;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod motion;
pub mod overlay;
pub mod runner;
pub mod speed;
pub mod status;
pub mod target;
pub mod util;

pub use builder::{EndStopLatch, Missing, Set, Shade, ShadeBuilder};
pub use calibration::{CalibrationOutcome, CalibrationPolicy, HoldPosition, LogOnly, ResetTo};
pub use command::{Command, Direction, Inbound, Notification, ParamValue};
pub use config::{AutomationPolicy, MotionSettings, Settings};
pub use controller::{Controller, ControllerState, Effects, TickInput};
pub use convert::convert;
pub use error::{BuildError, Result, ShadeError};
pub use motion::{MotionDebouncer, MotionState};
pub use overlay::LightOverlay;
pub use runner::{CommandSource, NotificationSink, RunParams, RunStats, run};
pub use shade_traits::RotationAccumulator;
pub use speed::{MAX_DUTY, SpeedProfile, map_speed};
pub use status::ControlState;
pub use target::{AuthorityMode, DistanceAssist, Heights, resolve};
