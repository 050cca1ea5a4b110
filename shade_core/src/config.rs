//! Runtime settings for the controller.
//!
//! These are the live values `Controller` reads every tick. They are separate
//! from the TOML-deserialized config in `shade_config` and can be changed at
//! runtime through [`Settings::apply_param`] using the wire parameter names.

use crate::error::ShadeError;
use crate::speed::{MAX_DUTY, SpeedProfile};
use crate::target::{DistanceAssist, Heights};

/// Whether remote commands switch automation off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutomationPolicy {
    pub disable_on_move: bool,
    pub disable_on_stop: bool,
}

impl Default for AutomationPolicy {
    fn default() -> Self {
        Self {
            disable_on_move: true,
            disable_on_stop: true,
        }
    }
}

/// Occupancy sensing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionSettings {
    /// Raw threshold (upper end when position scaled).
    pub sensitivity: i32,
    /// Hold window after the last trigger.
    pub hold_ms: u64,
    pub position_scaled: bool,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            sensitivity: 300,
            hold_ms: 2000,
            position_scaled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Automation flag (`automate`).
    pub automate: bool,
    pub policy: AutomationPolicy,
    pub heights: Heights,
    pub winding_length: f64,
    pub invert_encoder: bool,
    /// Dead-band full width.
    pub precision: f64,
    /// Position change that triggers a report.
    pub report_threshold: f64,
    pub manual_duty: i32,
    pub speed: SpeedProfile,
    pub motion: MotionSettings,
    pub distance: Option<DistanceAssist>,
    pub idle_light: i32,
    pub flash_intensity: i32,
    /// Position assumed at startup.
    pub initial_position: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            automate: false,
            policy: AutomationPolicy::default(),
            heights: Heights::default(),
            winding_length: 7.5,
            invert_encoder: true,
            precision: 1.0,
            report_threshold: 1.0,
            manual_duty: 512,
            speed: SpeedProfile::default(),
            motion: MotionSettings::default(),
            distance: None,
            idle_light: 127,
            flash_intensity: 1023,
            initial_position: 0.0,
        }
    }
}

fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() { v } else { fallback }
}

impl Settings {
    /// Clamp each value into the range the controller can run with.
    ///
    /// Every clamp looks at one value only. The ordering between values
    /// (`idle <= max`, `min <= max` per direction) is applied when they are
    /// read through [`Settings::heights`] and [`Settings::speed`], so lowering
    /// a bound and raising it again gives back the values set before.
    pub fn sanitized(mut self) -> Self {
        let h = &mut self.heights;
        h.idle = finite_or(h.idle, 0.0).max(0.0);
        h.rise = finite_or(h.rise, 0.0).max(0.0);
        h.max = finite_or(h.max, 0.0).max(0.0);
        let sp = &mut self.speed;
        for v in [&mut sp.min_up, &mut sp.max_up, &mut sp.min_down, &mut sp.max_down] {
            *v = (*v).clamp(0, MAX_DUTY);
        }
        sp.distance_norm_range = finite_or(sp.distance_norm_range, 0.0).max(0.0);
        if !(self.winding_length.is_finite() && self.winding_length > 0.0) {
            self.winding_length = Self::default().winding_length;
        }
        self.precision = finite_or(self.precision, 0.0).max(0.0);
        self.report_threshold = finite_or(self.report_threshold, 0.0).max(0.0);
        self.manual_duty = self.manual_duty.clamp(0, MAX_DUTY);
        self.motion.sensitivity = self.motion.sensitivity.max(0);
        self.motion.hold_ms = self.motion.hold_ms.max(1);
        self.idle_light = self.idle_light.clamp(0, MAX_DUTY);
        self.flash_intensity = self.flash_intensity.clamp(0, MAX_DUTY);
        self.initial_position = finite_or(self.initial_position, 0.0);
        if let Some(d) = self.distance.as_mut() {
            d.band = d.band.max(0);
            d.step = finite_or(d.step, 0.0).max(0.0);
            d.report_threshold = d.report_threshold.max(0);
        }
        self
    }

    /// Heights as the resolver uses them: `idle` and `rise` capped at `max`.
    pub fn heights(&self) -> Heights {
        self.heights.sanitized()
    }

    /// Speed curves as the mapper uses them: `min <= max` per direction.
    pub fn speed(&self) -> SpeedProfile {
        self.speed.sanitized()
    }

    /// Apply one live parameter update by its wire name.
    ///
    /// An out-of-range value is clamped on its own. Values the controller
    /// cannot run with at all (a winding length `<= 0`, a motion interval
    /// below 1 ms) are rejected like unparseable ones, leaving the settings
    /// untouched.
    pub fn apply_param(&mut self, key: &str, value: &str) -> Result<(), ShadeError> {
        let v = value.trim();
        match key {
            "automate" => self.automate = parse_bool(key, v)?,
            "winding-length" => {
                let w = parse_f64(key, v)?;
                if w <= 0.0 {
                    return Err(invalid(key, v));
                }
                self.winding_length = w;
            }
            "idle-height" => self.heights.idle = parse_f64(key, v)?,
            "rise-height" => self.heights.rise = parse_f64(key, v)?,
            "max-height" => self.heights.max = parse_f64(key, v)?,
            "idle-light" => self.idle_light = parse_i32(key, v)?,
            "flash-intensity" => self.flash_intensity = parse_i32(key, v)?,
            "min-down-speed" => self.speed.min_down = parse_i32(key, v)?,
            "min-up-speed" => self.speed.min_up = parse_i32(key, v)?,
            "max-down-speed" => self.speed.max_down = parse_i32(key, v)?,
            "max-up-speed" => self.speed.max_up = parse_i32(key, v)?,
            "speed-map-range" => self.speed.distance_norm_range = parse_f64(key, v)?,
            "invert-encoder" => self.invert_encoder = parse_bool(key, v)?,
            "move-precision" => self.precision = parse_f64(key, v)?,
            "pir-sensitivity" => self.motion.sensitivity = parse_i32(key, v)?,
            "pir-interval" => {
                let ms = parse_i32(key, v)?;
                self.motion.hold_ms = u64::try_from(ms)
                    .ok()
                    .filter(|&ms| ms >= 1)
                    .ok_or_else(|| invalid(key, v))?;
            }
            other => return Err(ShadeError::UnknownParam(other.to_string())),
        }
        *self = std::mem::take(self).sanitized();
        Ok(())
    }
}

fn invalid(key: &str, value: &str) -> ShadeError {
    ShadeError::InvalidParam {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_bool(key: &str, v: &str) -> Result<bool, ShadeError> {
    match v {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" => Ok(false),
        _ => Err(invalid(key, v)),
    }
}

fn parse_f64(key: &str, v: &str) -> Result<f64, ShadeError> {
    v.parse::<f64>()
        .ok()
        .filter(|x| x.is_finite())
        .ok_or_else(|| invalid(key, v))
}

fn parse_i32(key: &str, v: &str) -> Result<i32, ShadeError> {
    v.parse::<i32>().map_err(|_| invalid(key, v))
}
