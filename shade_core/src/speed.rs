//! Distance-to-duty mapping with independent up/down curves.

use crate::util::{f64_to_i32_saturating, safe_map_f64};

/// Largest duty magnitude a motor driver accepts.
pub const MAX_DUTY: i32 = 1023;

/// Speed curves for both travel directions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedProfile {
    pub min_up: i32,
    pub max_up: i32,
    pub min_down: i32,
    pub max_down: i32,
    /// Distance at which the mapped speed reaches the max.
    pub distance_norm_range: f64,
}

impl Default for SpeedProfile {
    fn default() -> Self {
        Self {
            min_up: 350,
            max_up: 950,
            min_down: 350,
            max_down: 500,
            distance_norm_range: 20.0,
        }
    }
}

impl SpeedProfile {
    /// Clamp every speed into `[0, MAX_DUTY]` and force `min <= max` per direction.
    pub fn sanitized(self) -> Self {
        let c = |v: i32| v.clamp(0, MAX_DUTY);
        let (min_up, max_up) = (c(self.min_up), c(self.max_up));
        let (min_down, max_down) = (c(self.min_down), c(self.max_down));
        let range = if self.distance_norm_range.is_finite() {
            self.distance_norm_range.max(0.0)
        } else {
            0.0
        };
        Self {
            min_up: min_up.min(max_up),
            max_up,
            min_down: min_down.min(max_down),
            max_down,
            distance_norm_range: range,
        }
    }
}

/// Signed duty driving `position` toward `target`.
///
/// Inside the dead band (`|target - position| <= precision / 2`) the result
/// is exactly 0. Positive values raise the shade.
pub fn map_speed(position: f64, target: f64, precision: f64, profile: &SpeedProfile) -> i32 {
    let delta = target - position;
    if !delta.is_finite() || delta.abs() <= precision / 2.0 {
        return 0;
    }
    let range = profile.distance_norm_range;
    let duty = if delta > 0.0 {
        let v = safe_map_f64(
            delta,
            0.0,
            range,
            f64::from(profile.min_up),
            f64::from(profile.max_up),
        );
        f64_to_i32_saturating(v)
    } else {
        let v = safe_map_f64(
            -delta,
            0.0,
            range,
            f64::from(profile.min_down),
            f64::from(profile.max_down),
        );
        -f64_to_i32_saturating(v)
    };
    tracing::trace!(delta, duty, "speed selected");
    duty.clamp(-MAX_DUTY, MAX_DUTY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dead_band_is_zero() {
        let p = SpeedProfile::default();
        assert_eq!(map_speed(100.0, 100.5, 1.0, &p), 0);
        assert_eq!(map_speed(100.0, 99.5, 1.0, &p), 0);
        assert_ne!(map_speed(100.0, 100.6, 1.0, &p), 0);
    }

    #[test]
    fn direction_sign() {
        let p = SpeedProfile::default();
        assert!(map_speed(0.0, 10.0, 1.0, &p) > 0);
        assert!(map_speed(10.0, 0.0, 1.0, &p) < 0);
    }

    #[test]
    fn sanitize_orders_bounds() {
        let p = SpeedProfile {
            min_up: 2000,
            max_up: 900,
            min_down: -5,
            max_down: 400,
            distance_norm_range: f64::NAN,
        }
        .sanitized();
        assert_eq!((p.min_up, p.max_up), (900, 900));
        assert_eq!((p.min_down, p.max_down), (0, 400));
        assert_eq!(p.distance_norm_range, 0.0);
    }

    #[test]
    fn zero_range_jumps_to_max() {
        let p = SpeedProfile {
            distance_norm_range: 0.0,
            ..SpeedProfile::default()
        };
        assert_eq!(map_speed(0.0, 3.0, 1.0, &p), 950);
        assert_eq!(map_speed(3.0, 0.0, 1.0, &p), -500);
    }
}
