//! Type-state builder for `Shade`, the imperative shell around `Controller`.
//!
//! The builder enforces at compile time that Encoder, Motor, and MotionSensor
//! are provided before `build()` is available. `try_build()` is always
//! available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use eyre::WrapErr;
use shade_traits::clock::{Clock, MonotonicClock};
use shade_traits::{DistanceSensor, Encoder, Light, MotionSensor, Motor};

use crate::calibration::{CalibrationPolicy, LogOnly};
use crate::command::{Inbound, Notification};
use crate::config::Settings;
use crate::controller::{Controller, Effects, TickInput};
use crate::error::{BuildError, Result};
use crate::hw_error::map_hw_error;

// ── End-stop latch ───────────────────────────────────────────────────────────

/// Edge latch set from the end-stop interrupt and drained by the control loop.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct EndStopLatch(Arc<AtomicBool>);

impl EndStopLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edge. Safe to call from an interrupt thread.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Consume a pending edge.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ── Shell ────────────────────────────────────────────────────────────────────

type BoxedEncoder = Box<dyn Encoder + Send>;
type BoxedMotor = Box<dyn Motor + Send>;
type BoxedMotion = Box<dyn MotionSensor + Send>;
type BoxedDistance = Box<dyn DistanceSensor + Send>;
type BoxedLight = Box<dyn Light + Send>;

/// A controller wired to hardware.
///
/// Sensor read failures fall back to the last known value; motor and light
/// write failures are returned to the caller.
pub struct Shade {
    controller: Controller,
    encoder: BoxedEncoder,
    motor: BoxedMotor,
    motion: BoxedMotion,
    distance: Option<BoxedDistance>,
    light: Option<BoxedLight>,
    end_stop: EndStopLatch,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    last_motion_sample: i32,
    last_distance: Option<i32>,
}

impl core::fmt::Debug for Shade {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = self.controller.state();
        f.debug_struct("Shade")
            .field("position", &s.position)
            .field("target", &s.target)
            .field("state", &self.controller.control_state())
            .field("has_distance", &self.distance.is_some())
            .field("has_light", &self.light.is_some())
            .finish()
    }
}

impl Shade {
    /// Start building a Shade.
    pub fn builder() -> ShadeBuilder<Missing, Missing, Missing> {
        ShadeBuilder::default()
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Handle to the end-stop latch, for wiring into an interrupt callback.
    pub fn end_stop_latch(&self) -> EndStopLatch {
        self.end_stop.clone()
    }

    /// Milliseconds since the shade was built, on its clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }

    /// Bring the shade online: motor stopped, idle light on.
    pub fn start(&mut self) -> Result<Vec<Notification>> {
        let fx = self.controller.on_online();
        self.apply(fx)
    }

    /// Stop the motor and turn the light off.
    pub fn shutdown(&mut self) -> Result<Vec<Notification>> {
        let fx = self.controller.on_offline();
        self.apply(fx)
    }

    /// Apply one inbound command or parameter update.
    ///
    /// A rejected parameter is logged and ignored.
    pub fn handle(&mut self, inbound: Inbound) -> Result<Vec<Notification>> {
        let now = self.now_ms();
        let fx = match inbound {
            Inbound::Command(cmd) => self.controller.handle(cmd, now),
            Inbound::Param { key, value } => match self.controller.update_param(&key, &value) {
                Ok(fx) => fx,
                Err(e) => {
                    tracing::warn!(error = %e, "parameter update rejected");
                    Effects::default()
                }
            },
        };
        self.apply(fx)
    }

    /// Run the calibration policy if the end stop fired since the last call.
    ///
    /// `None` when no edge was pending; each edge is consumed exactly once.
    pub fn poll_end_stop(&mut self) -> Result<Option<Vec<Notification>>> {
        if !self.end_stop.take() {
            return Ok(None);
        }
        let fx = self.controller.on_end_stop(self.now_ms());
        self.apply(fx).map(Some)
    }

    /// Sample hardware, run one controller tick, and apply its effects.
    pub fn tick(&mut self) -> Result<Vec<Notification>> {
        let input = self.sample();
        let fx = self.controller.tick(input);
        self.apply(fx)
    }

    /// End-stop check followed by one tick.
    pub fn step(&mut self) -> Result<Vec<Notification>> {
        let mut out = self.poll_end_stop()?.unwrap_or_default();
        out.extend(self.tick()?);
        Ok(out)
    }

    fn sample(&mut self) -> TickInput {
        let rotation = self.encoder.take_rotation().unwrap_or_else(|e| {
            tracing::warn!(error = %map_hw_error(&*e), "encoder read failed");
            0.0
        });
        match self.motion.read() {
            Ok(v) => self.last_motion_sample = v,
            Err(e) => {
                tracing::warn!(
                    error = %map_hw_error(&*e),
                    last = self.last_motion_sample,
                    "motion sensor read failed; keeping last value"
                );
            }
        }
        if let Some(sensor) = self.distance.as_mut() {
            match sensor.read() {
                Ok(v) => self.last_distance = Some(v),
                Err(e) => {
                    tracing::warn!(
                        error = %map_hw_error(&*e),
                        "distance sensor read failed; keeping last value"
                    );
                }
            }
        }
        TickInput {
            now_ms: self.now_ms(),
            rotation,
            motion_sample: self.last_motion_sample,
            distance: self.last_distance,
        }
    }

    fn apply(&mut self, fx: Effects) -> Result<Vec<Notification>> {
        if let Some(duty) = fx.duty {
            self.motor
                .set_duty(duty)
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                .wrap_err_with(|| format!("set motor duty {duty}"))?;
        }
        if let (Some(color), Some(light)) = (fx.light, self.light.as_mut()) {
            light
                .set(color)
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                .wrap_err_with(|| format!("set light {color}"))?;
        }
        Ok(fx.notifications)
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Shade`.
pub struct ShadeBuilder<E, M, P> {
    encoder: Option<BoxedEncoder>,
    motor: Option<BoxedMotor>,
    motion: Option<BoxedMotion>,
    distance: Option<BoxedDistance>,
    light: Option<BoxedLight>,
    settings: Option<Settings>,
    calibration: Option<Box<dyn CalibrationPolicy>>,
    end_stop: Option<EndStopLatch>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    seed: Option<u64>,
    _e: PhantomData<E>,
    _m: PhantomData<M>,
    _p: PhantomData<P>,
}

impl Default for ShadeBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            encoder: None,
            motor: None,
            motion: None,
            distance: None,
            light: None,
            settings: None,
            calibration: None,
            end_stop: None,
            clock: None,
            seed: None,
            _e: PhantomData,
            _m: PhantomData,
            _p: PhantomData,
        }
    }
}

impl<E, M, P> ShadeBuilder<E, M, P> {
    /// Re-tag the builder with new type-state markers.
    fn retag<E2, M2, P2>(self) -> ShadeBuilder<E2, M2, P2> {
        ShadeBuilder {
            encoder: self.encoder,
            motor: self.motor,
            motion: self.motion,
            distance: self.distance,
            light: self.light,
            settings: self.settings,
            calibration: self.calibration,
            end_stop: self.end_stop,
            clock: self.clock,
            seed: self.seed,
            _e: PhantomData,
            _m: PhantomData,
            _p: PhantomData,
        }
    }

    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Shade> {
        let encoder = self
            .encoder
            .ok_or_else(|| eyre::Report::new(BuildError::MissingEncoder))?;
        let motor = self
            .motor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingMotor))?;
        let motion = self
            .motion
            .ok_or_else(|| eyre::Report::new(BuildError::MissingMotionSensor))?;

        let settings = self.settings.unwrap_or_default();
        validate(&settings)?;

        let calibration = self.calibration.unwrap_or_else(|| Box::new(LogOnly));
        let mut controller = Controller::with_calibration(settings, calibration);
        if let Some(seed) = self.seed {
            controller = controller.with_seed(seed);
        }

        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(c) => c,
            None => Arc::new(MonotonicClock::new()),
        };
        let epoch = clock.now();

        Ok(Shade {
            controller,
            encoder,
            motor,
            motion,
            distance: self.distance,
            light: self.light,
            end_stop: self.end_stop.unwrap_or_default(),
            clock,
            epoch,
            last_motion_sample: 0,
            last_distance: None,
        })
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }
    pub fn with_calibration(mut self, policy: Box<dyn CalibrationPolicy>) -> Self {
        self.calibration = Some(policy);
        self
    }
    pub fn with_distance_sensor(mut self, sensor: impl DistanceSensor + Send + 'static) -> Self {
        self.distance = Some(Box::new(sensor));
        self
    }
    pub fn with_light(mut self, light: impl Light + Send + 'static) -> Self {
        self.light = Some(Box::new(light));
        self
    }
    /// Share an existing latch, e.g. one already wired to an interrupt.
    pub fn with_end_stop(mut self, latch: EndStopLatch) -> Self {
        self.end_stop = Some(latch);
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
    /// Fixed seed for the `disco` color source.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

fn validate(s: &Settings) -> Result<()> {
    if !(s.winding_length.is_finite() && s.winding_length > 0.0) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "winding_length must be > 0",
        )));
    }
    if !s.precision.is_finite() || s.precision < 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "precision must be >= 0",
        )));
    }
    if s.manual_duty <= 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "manual_duty must be > 0",
        )));
    }
    if s.motion.hold_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "motion hold must be >= 1 ms",
        )));
    }
    Ok(())
}

// Setters that advance type-state
impl<M, P> ShadeBuilder<Missing, M, P> {
    pub fn with_encoder(
        mut self,
        encoder: impl Encoder + Send + 'static,
    ) -> ShadeBuilder<Set, M, P> {
        self.encoder = Some(Box::new(encoder));
        self.retag()
    }
}

impl<E, P> ShadeBuilder<E, Missing, P> {
    pub fn with_motor(mut self, motor: impl Motor + Send + 'static) -> ShadeBuilder<E, Set, P> {
        self.motor = Some(Box::new(motor));
        self.retag()
    }
}

impl<E, M> ShadeBuilder<E, M, Missing> {
    pub fn with_motion_sensor(
        mut self,
        sensor: impl MotionSensor + Send + 'static,
    ) -> ShadeBuilder<E, M, Set> {
        self.motion = Some(Box::new(sensor));
        self.retag()
    }
}

impl ShadeBuilder<Set, Set, Set> {
    /// Validate and build the Shade. Only available when Encoder, Motor, and MotionSensor are set.
    pub fn build(self) -> Result<Shade> {
        self.try_build()
    }
}
