#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the shade actuator.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//! - Every section is optional; defaults match the shipped firmware parameters.
use serde::Deserialize;
use std::path::Path;

/// Largest duty / light channel value accepted by the drivers.
pub const MAX_LEVEL: i32 = 1023;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AutomationCfg {
    /// Drive the target from occupancy when true
    pub enabled: bool,
    /// Height without occupancy
    pub idle_height: f64,
    /// Height on occupancy
    pub rise_height: f64,
    /// Upper travel bound for automated targets
    pub max_height: f64,
    /// Turn automation off when a remote `move` arrives
    pub disable_on_move: bool,
    /// Turn automation off when a remote `stop` arrives
    pub disable_on_stop: bool,
}

impl Default for AutomationCfg {
    fn default() -> Self {
        Self {
            enabled: false,
            idle_height: 100.0,
            rise_height: 150.0,
            max_height: 250.0,
            disable_on_move: true,
            disable_on_stop: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EncoderCfg {
    /// Length units of travel per encoder rotation
    pub winding_length: f64,
    /// Flip the encoder sign before scaling
    pub invert: bool,
    /// Quadrature pulses per rotation (GPIO encoder only)
    pub pulses_per_rev: u32,
}

impl Default for EncoderCfg {
    fn default() -> Self {
        Self {
            winding_length: 7.5,
            invert: true,
            pulses_per_rev: 20,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ControlCfg {
    /// Dead-band width around the target
    pub precision: f64,
    /// Publish position once it moved more than this since the last report
    pub report_threshold: f64,
    /// Duty applied by `turn up` / `turn down`
    pub manual_duty: i32,
    /// Distance at which mapped speed saturates
    pub speed_map_range: f64,
    pub min_up_speed: i32,
    pub max_up_speed: i32,
    pub min_down_speed: i32,
    pub max_down_speed: i32,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            precision: 1.0,
            report_threshold: 1.0,
            manual_duty: 512,
            speed_map_range: 20.0,
            min_up_speed: 350,
            max_up_speed: 950,
            min_down_speed: 350,
            max_down_speed: 500,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MotionCfg {
    /// Raw sample threshold (upper end when position scaled)
    pub sensitivity: i32,
    /// Hold window after the last trigger (ms)
    pub interval_ms: u64,
    /// Scale the threshold with the current position over `[0, rise_height]`
    pub position_scaled: bool,
}

impl Default for MotionCfg {
    fn default() -> Self {
        Self {
            sensitivity: 300,
            interval_ms: 2000,
            position_scaled: true,
        }
    }
}

/// Proximity-assisted positioning; absent means the plain occupancy policy.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DistanceCfg {
    /// Distance reading the automation tries to hold
    pub midpoint: i32,
    /// Half-width of the tolerated band around `midpoint`
    pub band: i32,
    /// Target nudge per tick
    pub step: f64,
    /// Publish distance once it changed more than this
    pub report_threshold: i32,
}

impl Default for DistanceCfg {
    fn default() -> Self {
        Self {
            midpoint: 400,
            band: 50,
            step: 0.5,
            report_threshold: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LightCfg {
    /// Steady intensity while online
    pub idle: i32,
    /// Intensity used by `flash`
    pub flash: i32,
}

impl Default for LightCfg {
    fn default() -> Self {
        Self {
            idle: 127,
            flash: 1023,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationPolicyKind {
    /// Log the end-stop edge and keep going
    #[default]
    Log,
    /// Stop where the end stop fired
    Hold,
    /// Recalibrate position to `reset_position`
    Reset,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CalibrationCfg {
    pub policy: CalibrationPolicyKind,
    /// Position assigned by the `reset` policy
    pub reset_position: f64,
    /// Last persisted position, loaded at startup
    pub saved_position: f64,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            policy: CalibrationPolicyKind::Log,
            reset_position: 0.0,
            saved_position: 0.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RunnerCfg {
    /// Control tick period (ms)
    pub tick_ms: u64,
    /// Notification channel capacity before dropping
    pub notify_capacity: usize,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            tick_ms: 10,
            notify_capacity: 64,
        }
    }
}

/// Simulated plant used by the CLI when no hardware backend is compiled in.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimCfg {
    /// Shaft rotations per second at full duty
    pub revs_per_sec: f64,
    /// Raw PIR sample reported while presence is on
    pub presence_level: i32,
    /// Initial distance reading
    pub distance: i32,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            revs_per_sec: 2.0,
            presence_level: MAX_LEVEL,
            distance: 400,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// GPIO wiring for the Raspberry Pi backend.
#[derive(Debug, Deserialize, Clone)]
pub struct Pins {
    pub motor_up: u8,
    pub motor_down: u8,
    pub encoder_a: u8,
    pub encoder_b: u8,
    pub pir: u8,
    pub end_stop: Option<u8>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub automation: AutomationCfg,
    pub encoder: EncoderCfg,
    pub control: ControlCfg,
    pub motion: MotionCfg,
    /// Proximity-assisted automation; omitted for the occupancy-only variant
    pub distance: Option<DistanceCfg>,
    pub light: LightCfg,
    pub calibration: CalibrationCfg,
    pub runner: RunnerCfg,
    pub sim: SimCfg,
    pub logging: Logging,
    /// Only read by the hardware backend
    pub pins: Option<Pins>,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_path(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

fn finite_non_negative(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

fn level_in_range(v: i32) -> bool {
    (0..=MAX_LEVEL).contains(&v)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Automation
        let a = &self.automation;
        if !finite_non_negative(a.idle_height) {
            eyre::bail!("automation.idle_height must be a finite value >= 0");
        }
        if !finite_non_negative(a.rise_height) {
            eyre::bail!("automation.rise_height must be a finite value >= 0");
        }
        if !finite_non_negative(a.max_height) {
            eyre::bail!("automation.max_height must be a finite value >= 0");
        }
        if a.idle_height > a.max_height {
            eyre::bail!("automation.idle_height must be <= automation.max_height");
        }
        if a.rise_height > a.max_height {
            eyre::bail!("automation.rise_height must be <= automation.max_height");
        }

        // Encoder
        if !(self.encoder.winding_length.is_finite() && self.encoder.winding_length > 0.0) {
            eyre::bail!("encoder.winding_length must be > 0");
        }
        if self.encoder.pulses_per_rev == 0 {
            eyre::bail!("encoder.pulses_per_rev must be >= 1");
        }

        // Control
        let c = &self.control;
        if !finite_non_negative(c.precision) {
            eyre::bail!("control.precision must be >= 0");
        }
        if !finite_non_negative(c.report_threshold) {
            eyre::bail!("control.report_threshold must be >= 0");
        }
        if !finite_non_negative(c.speed_map_range) {
            eyre::bail!("control.speed_map_range must be >= 0");
        }
        if !(1..=MAX_LEVEL).contains(&c.manual_duty) {
            eyre::bail!("control.manual_duty must be in [1, {MAX_LEVEL}]");
        }
        for (name, v) in [
            ("min_up_speed", c.min_up_speed),
            ("max_up_speed", c.max_up_speed),
            ("min_down_speed", c.min_down_speed),
            ("max_down_speed", c.max_down_speed),
        ] {
            if !level_in_range(v) {
                eyre::bail!("control.{name} must be in [0, {MAX_LEVEL}]");
            }
        }
        if c.min_up_speed > c.max_up_speed {
            eyre::bail!("control.min_up_speed must be <= control.max_up_speed");
        }
        if c.min_down_speed > c.max_down_speed {
            eyre::bail!("control.min_down_speed must be <= control.max_down_speed");
        }

        // Motion
        if self.motion.sensitivity < 0 {
            eyre::bail!("motion.sensitivity must be >= 0");
        }
        if self.motion.interval_ms == 0 {
            eyre::bail!("motion.interval_ms must be >= 1");
        }
        if self.motion.interval_ms > 60 * 60 * 1000 {
            eyre::bail!("motion.interval_ms is unreasonably large (>1h)");
        }

        // Distance
        if let Some(d) = &self.distance {
            if d.band < 0 {
                eyre::bail!("distance.band must be >= 0");
            }
            if !(d.step.is_finite() && d.step > 0.0) {
                eyre::bail!("distance.step must be > 0");
            }
            if d.report_threshold < 0 {
                eyre::bail!("distance.report_threshold must be >= 0");
            }
        }

        // Light
        if !level_in_range(self.light.idle) {
            eyre::bail!("light.idle must be in [0, {MAX_LEVEL}]");
        }
        if !level_in_range(self.light.flash) {
            eyre::bail!("light.flash must be in [0, {MAX_LEVEL}]");
        }

        // Calibration
        if !self.calibration.reset_position.is_finite() {
            eyre::bail!("calibration.reset_position must be finite");
        }
        if !self.calibration.saved_position.is_finite() {
            eyre::bail!("calibration.saved_position must be finite");
        }

        // Runner
        if self.runner.tick_ms == 0 {
            eyre::bail!("runner.tick_ms must be >= 1");
        }
        if self.runner.tick_ms > 1000 {
            eyre::bail!("runner.tick_ms is unreasonably large (>1s)");
        }
        if self.runner.notify_capacity == 0 {
            eyre::bail!("runner.notify_capacity must be >= 1");
        }

        // Sim
        if !(self.sim.revs_per_sec.is_finite() && self.sim.revs_per_sec > 0.0) {
            eyre::bail!("sim.revs_per_sec must be > 0");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        Ok(())
    }
}
