//! Common numeric and timing helpers for shade_core.

/// Number of microseconds in one millisecond.
pub const MICROS_PER_MILLI: u64 = 1_000;

/// Tick period in microseconds for a tick length in milliseconds.
/// - Clamps `tick_ms` to at least 1.
#[inline]
pub fn period_us(tick_ms: u64) -> u64 {
    tick_ms.max(1).saturating_mul(MICROS_PER_MILLI)
}

/// Saturating linear map of `x` from `[in_min, in_max]` onto `[out_min, out_max]`.
///
/// `x` is clamped to the input range first, so the result never leaves the
/// output range. A degenerate input range maps everything at or below
/// `in_min` to `out_min` and everything above to `out_max`. Non-finite `x`
/// maps to `out_min`.
#[inline]
pub fn safe_map_f64(x: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    if !x.is_finite() {
        return out_min;
    }
    if in_max <= in_min {
        return if x <= in_min { out_min } else { out_max };
    }
    if x >= in_max {
        return out_max;
    }
    let x = x.max(in_min);
    out_min + (x - in_min) * (out_max - out_min) / (in_max - in_min)
}

/// Integer variant of [`safe_map_f64`], truncating toward zero like the
/// firmware's integer map.
#[inline]
pub fn safe_map_i32(x: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    if in_max <= in_min {
        return if x <= in_min { out_min } else { out_max };
    }
    let x = i64::from(x.clamp(in_min, in_max));
    let (in_min, in_max) = (i64::from(in_min), i64::from(in_max));
    let (out_min, out_max) = (i64::from(out_min), i64::from(out_max));
    let y = out_min + (x - in_min) * (out_max - out_min) / (in_max - in_min);
    y.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Convert a length to an integer coordinate, saturating and mapping NaN to 0.
#[inline]
pub fn f64_to_i32_saturating(v: f64) -> i32 {
    if v.is_nan() {
        0
    } else {
        v.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_clamps_both_ends() {
        assert_eq!(safe_map_f64(-5.0, 0.0, 20.0, 350.0, 950.0), 350.0);
        assert_eq!(safe_map_f64(10.0, 0.0, 20.0, 350.0, 950.0), 650.0);
        assert_eq!(safe_map_f64(50.0, 0.0, 20.0, 350.0, 950.0), 950.0);
    }

    #[test]
    fn degenerate_range_is_a_step() {
        assert_eq!(safe_map_f64(0.0, 0.0, 0.0, 1.0, 9.0), 1.0);
        assert_eq!(safe_map_f64(0.1, 0.0, 0.0, 1.0, 9.0), 9.0);
        assert_eq!(safe_map_i32(3, 5, 5, 0, 300), 0);
        assert_eq!(safe_map_i32(6, 5, 5, 0, 300), 300);
    }

    #[test]
    fn integer_map_truncates() {
        assert_eq!(safe_map_i32(75, 0, 150, 0, 300), 150);
        assert_eq!(safe_map_i32(1, 0, 150, 0, 300), 2);
        assert_eq!(safe_map_i32(1, 0, 7, 0, 3), 0);
        assert_eq!(safe_map_i32(i32::MAX, 0, 150, 0, 300), 300);
    }

    #[test]
    fn nan_maps_to_out_min() {
        assert_eq!(safe_map_f64(f64::NAN, 0.0, 1.0, 2.0, 3.0), 2.0);
        assert_eq!(f64_to_i32_saturating(f64::NAN), 0);
        assert_eq!(f64_to_i32_saturating(1e12), i32::MAX);
    }

    #[test]
    fn period_never_zero() {
        assert_eq!(period_us(0), 1_000);
        assert_eq!(period_us(10), 10_000);
    }
}
