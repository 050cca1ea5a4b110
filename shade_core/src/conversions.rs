//! `From` implementations bridging `shade_config` types to `shade_core` types.

use crate::calibration::{CalibrationPolicy, HoldPosition, LogOnly, ResetTo};
use crate::config::{AutomationPolicy, MotionSettings, Settings};
use crate::speed::SpeedProfile;
use crate::target::{DistanceAssist, Heights};

// ── Automation ───────────────────────────────────────────────────────────────

impl From<&shade_config::AutomationCfg> for Heights {
    fn from(c: &shade_config::AutomationCfg) -> Self {
        Self {
            idle: c.idle_height,
            rise: c.rise_height,
            max: c.max_height,
        }
    }
}

impl From<&shade_config::AutomationCfg> for AutomationPolicy {
    fn from(c: &shade_config::AutomationCfg) -> Self {
        Self {
            disable_on_move: c.disable_on_move,
            disable_on_stop: c.disable_on_stop,
        }
    }
}

// ── Control ──────────────────────────────────────────────────────────────────

impl From<&shade_config::ControlCfg> for SpeedProfile {
    fn from(c: &shade_config::ControlCfg) -> Self {
        Self {
            min_up: c.min_up_speed,
            max_up: c.max_up_speed,
            min_down: c.min_down_speed,
            max_down: c.max_down_speed,
            distance_norm_range: c.speed_map_range,
        }
    }
}

// ── Motion / distance ────────────────────────────────────────────────────────

impl From<&shade_config::MotionCfg> for MotionSettings {
    fn from(c: &shade_config::MotionCfg) -> Self {
        Self {
            sensitivity: c.sensitivity,
            hold_ms: c.interval_ms,
            position_scaled: c.position_scaled,
        }
    }
}

impl From<&shade_config::DistanceCfg> for DistanceAssist {
    fn from(c: &shade_config::DistanceCfg) -> Self {
        Self {
            midpoint: c.midpoint,
            band: c.band,
            step: c.step,
            report_threshold: c.report_threshold,
        }
    }
}

// ── Calibration ──────────────────────────────────────────────────────────────

impl From<&shade_config::CalibrationCfg> for Box<dyn CalibrationPolicy> {
    fn from(c: &shade_config::CalibrationCfg) -> Self {
        match c.policy {
            shade_config::CalibrationPolicyKind::Log => Box::new(LogOnly),
            shade_config::CalibrationPolicyKind::Hold => Box::new(HoldPosition),
            shade_config::CalibrationPolicyKind::Reset => Box::new(ResetTo(c.reset_position)),
        }
    }
}

// ── Whole config ─────────────────────────────────────────────────────────────

impl From<&shade_config::Config> for Settings {
    fn from(c: &shade_config::Config) -> Self {
        Self {
            automate: c.automation.enabled,
            policy: (&c.automation).into(),
            heights: (&c.automation).into(),
            winding_length: c.encoder.winding_length,
            invert_encoder: c.encoder.invert,
            precision: c.control.precision,
            report_threshold: c.control.report_threshold,
            manual_duty: c.control.manual_duty,
            speed: (&c.control).into(),
            motion: (&c.motion).into(),
            distance: c.distance.as_ref().map(DistanceAssist::from),
            idle_light: c.light.idle,
            flash_intensity: c.light.flash,
            initial_position: c.calibration.saved_position,
        }
        .sanitized()
    }
}
