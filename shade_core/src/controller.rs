//! Per-tick position control.
//!
//! `Controller` owns all control state and never touches hardware. Every
//! entry point returns [`Effects`] that the shell applies: a duty to write,
//! a light color to show, and notifications to publish.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shade_traits::Rgbw;
use tracing::{debug, info};

use crate::calibration::{CalibrationPolicy, LogOnly};
use crate::command::{Command, Direction, Notification, ParamValue};
use crate::config::Settings;
use crate::convert::convert;
use crate::error::ShadeError;
use crate::motion::{MotionDebouncer, sensitivity_threshold};
use crate::overlay::LightOverlay;
use crate::speed::{MAX_DUTY, map_speed};
use crate::status::ControlState;
use crate::target::{AuthorityMode, resolve};

/// Intensity and length of the `ping` flash.
pub const PING_INTENSITY: i32 = 512;
pub const PING_MS: u64 = 100;

/// Mutable position state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerState {
    pub position: f64,
    pub target: f64,
    /// Last published position.
    pub sent_position: f64,
    /// Last published distance; `None` until the first report.
    pub sent_distance: Option<i32>,
    /// Operator duty while in manual override.
    pub manual_duty: Option<i32>,
    /// A remote `move` is still seeking while automation stays on.
    pub remote_pending: bool,
    /// Duty most recently requested from the motor.
    pub last_duty: i32,
}

impl ControllerState {
    fn at(position: f64) -> Self {
        Self {
            position,
            target: position,
            sent_position: position,
            sent_distance: None,
            manual_duty: None,
            remote_pending: false,
            last_duty: 0,
        }
    }
}

/// Inputs sampled by the shell for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    pub now_ms: u64,
    /// Raw encoder rotations since the previous tick.
    pub rotation: f64,
    pub motion_sample: i32,
    pub distance: Option<i32>,
}

/// What the shell should do after a controller call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects {
    pub duty: Option<i32>,
    pub light: Option<Rgbw>,
    pub notifications: Vec<Notification>,
}

impl Effects {
    /// Fold `other` into `self`; later duty and light win.
    pub fn merge(&mut self, other: Effects) {
        if other.duty.is_some() {
            self.duty = other.duty;
        }
        if other.light.is_some() {
            self.light = other.light;
        }
        self.notifications.extend(other.notifications);
    }
}

#[derive(Debug)]
pub struct Controller {
    settings: Settings,
    state: ControllerState,
    debouncer: MotionDebouncer,
    overlay: LightOverlay,
    calibration: Box<dyn CalibrationPolicy>,
    online: bool,
    rng: StdRng,
}

impl Controller {
    pub fn new(settings: Settings) -> Self {
        Self::with_calibration(settings, Box::new(LogOnly))
    }

    pub fn with_calibration(settings: Settings, calibration: Box<dyn CalibrationPolicy>) -> Self {
        let settings = settings.sanitized();
        Self {
            state: ControllerState::at(settings.initial_position),
            settings,
            debouncer: MotionDebouncer::new(),
            overlay: LightOverlay::default(),
            calibration,
            online: false,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the random source used by `disco`.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn occupied(&self) -> bool {
        self.debouncer.occupied()
    }

    pub fn light(&self) -> Rgbw {
        self.overlay.current()
    }

    pub fn calibration(&self) -> &dyn CalibrationPolicy {
        self.calibration.as_ref()
    }

    /// Who owns the target right now.
    pub fn mode(&self) -> AuthorityMode {
        if self.state.manual_duty.is_some() {
            AuthorityMode::Manual
        } else if self.settings.automate && !self.state.remote_pending {
            AuthorityMode::Automated
        } else {
            AuthorityMode::RemoteTarget
        }
    }

    pub fn control_state(&self) -> ControlState {
        if self.state.manual_duty.is_some() {
            ControlState::ManualOverride
        } else if self.state.last_duty != 0 {
            ControlState::Seeking
        } else {
            ControlState::Idle
        }
    }

    /// Run one control tick.
    pub fn tick(&mut self, input: TickInput) -> Effects {
        let mut fx = Effects::default();
        let now = input.now_ms;

        if let Some(color) = self.overlay.poll(now) {
            fx.light = Some(color);
        }

        // 1. integrate encoder
        let rotation = if input.rotation.is_finite() {
            input.rotation
        } else {
            0.0
        };
        self.state.position += convert(
            rotation,
            self.settings.winding_length,
            self.settings.invert_encoder,
        );

        // 2. occupancy and distance
        let threshold = sensitivity_threshold(
            self.state.position,
            self.settings.heights().rise,
            self.settings.motion.sensitivity,
            self.settings.motion.position_scaled,
        );
        if let Some(occupied) = self.debouncer.update(
            input.motion_sample,
            now,
            threshold,
            self.settings.motion.hold_ms,
        ) {
            debug!(occupied, threshold, "motion changed");
            fx.notifications.push(Notification::Motion(occupied));
        }
        if let (Some(d), Some(assist)) = (input.distance, self.settings.distance.as_ref()) {
            let moved = self.state.sent_distance.is_none_or(|sent| {
                (i64::from(d) - i64::from(sent)).abs() > i64::from(assist.report_threshold)
            });
            if moved {
                self.state.sent_distance = Some(d);
                fx.notifications.push(Notification::Distance(d));
            }
        }

        // 3. manual override skips resolve and speed
        if self.state.manual_duty.is_none() {
            // 4. resolve
            let mode = self.mode();
            self.state.target = resolve(
                mode,
                self.debouncer.occupied(),
                self.settings.heights(),
                self.state.target,
                input.distance,
                self.settings.distance.as_ref(),
            );

            // 5. speed
            let duty = map_speed(
                self.state.position,
                self.state.target,
                self.settings.precision,
                &self.settings.speed(),
            );
            if duty == 0 && self.state.remote_pending {
                self.state.remote_pending = false;
                debug!(target = self.state.target, "remote target reached");
            }
            self.set_duty(duty, &mut fx);
        }

        // 6. position report
        if (self.state.position - self.state.sent_position).abs() > self.settings.report_threshold
        {
            self.state.sent_position = self.state.position;
            fx.notifications
                .push(Notification::Position(self.state.position));
        }

        fx
    }

    /// Apply a decoded remote command.
    pub fn handle(&mut self, cmd: Command, now_ms: u64) -> Effects {
        let mut fx = Effects::default();
        debug!(command = cmd.topic(), "handling command");
        match cmd {
            Command::Ping => {
                fx.light = Some(self.overlay.trigger_flash(
                    Rgbw::white(PING_INTENSITY),
                    PING_MS,
                    now_ms,
                ));
            }
            Command::Flash { duration_ms } => {
                let color = Rgbw::mono(self.settings.flash_intensity);
                fx.light = Some(self.overlay.trigger_flash(color, duration_ms, now_ms));
            }
            Command::FlashColor { color, duration_ms } => {
                fx.light = Some(self.overlay.trigger_flash(color, duration_ms, now_ms));
            }
            Command::Turn(dir) => {
                let duty = match dir {
                    Direction::Up => self.settings.manual_duty,
                    Direction::Down => -self.settings.manual_duty,
                };
                self.state.manual_duty = Some(duty);
                self.state.remote_pending = false;
                self.set_duty(duty, &mut fx);
            }
            Command::Move(target) => {
                self.state.manual_duty = None;
                self.state.target = target;
                if self.settings.automate && self.settings.policy.disable_on_move {
                    self.disable_automation(&mut fx);
                }
                self.state.remote_pending = self.settings.automate;
            }
            Command::Stop => {
                self.state.manual_duty = None;
                self.state.remote_pending = false;
                self.state.target = self.state.position;
                self.set_duty(0, &mut fx);
                if self.settings.automate && self.settings.policy.disable_on_stop {
                    self.disable_automation(&mut fx);
                }
            }
            Command::Reset(position) => {
                self.state.manual_duty = None;
                self.state.remote_pending = false;
                self.state.position = position;
                self.state.target = position;
                fx.notifications.push(Notification::Param {
                    key: "saved-position",
                    value: ParamValue::Double(position),
                });
            }
            Command::Disco => {
                let mut channel = || self.rng.gen_range(0..=MAX_DUTY);
                let color = Rgbw::new(channel(), channel(), channel(), channel());
                fx.light = self.overlay.set_steady(color);
            }
        }
        fx
    }

    /// React to a latched end-stop edge.
    pub fn on_end_stop(&mut self, now_ms: u64) -> Effects {
        let mut fx = Effects::default();
        let outcome = self
            .calibration
            .on_end_stop(self.state.position, self.state.target);
        info!(
            now_ms,
            position = self.state.position,
            policy = self.calibration.name(),
            "end stop triggered"
        );
        if outcome.halt {
            self.state.manual_duty = None;
            self.state.remote_pending = false;
            self.set_duty(0, &mut fx);
        }
        if outcome.position != self.state.position {
            fx.notifications.push(Notification::Param {
                key: "saved-position",
                value: ParamValue::Double(outcome.position),
            });
        }
        self.state.position = outcome.position;
        self.state.target = outcome.target;
        fx
    }

    /// Connection established: stop, hold the current position, show the idle light.
    pub fn on_online(&mut self) -> Effects {
        let mut fx = Effects::default();
        self.online = true;
        self.state.manual_duty = None;
        self.state.remote_pending = false;
        self.state.target = self.state.position;
        self.set_duty(0, &mut fx);
        self.overlay.cancel_flash();
        fx.light = self
            .overlay
            .set_steady(Rgbw::mono(self.settings.idle_light));
        info!(position = self.state.position, "online");
        fx
    }

    /// Connection lost: stop and turn the light off.
    pub fn on_offline(&mut self) -> Effects {
        let mut fx = Effects::default();
        self.online = false;
        self.state.manual_duty = None;
        self.set_duty(0, &mut fx);
        self.overlay.cancel_flash();
        fx.light = self.overlay.set_steady(Rgbw::OFF);
        info!(position = self.state.position, "offline");
        fx
    }

    /// Apply a live parameter update.
    pub fn update_param(&mut self, key: &str, value: &str) -> Result<Effects, ShadeError> {
        let was_automated = self.settings.automate;
        self.settings.apply_param(key, value)?;
        debug!(key, value, "parameter updated");
        let mut fx = Effects::default();
        match key {
            "automate" if self.settings.automate && !was_automated => {
                self.state.remote_pending = false;
            }
            "idle-light" if self.online => {
                fx.light = self
                    .overlay
                    .set_steady(Rgbw::mono(self.settings.idle_light));
            }
            _ => {}
        }
        Ok(fx)
    }

    fn set_duty(&mut self, duty: i32, fx: &mut Effects) {
        if duty != self.state.last_duty {
            debug!(from = self.state.last_duty, to = duty, "duty changed");
        }
        self.state.last_duty = duty;
        fx.duty = Some(duty);
    }

    fn disable_automation(&mut self, fx: &mut Effects) {
        self.settings.automate = false;
        info!("automation disabled by remote command");
        fx.notifications.push(Notification::Param {
            key: "automate",
            value: ParamValue::Bool(false),
        });
    }
}
