//! Target resolution: who owns the target this tick, and what it is.

/// Which source currently owns the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityMode {
    /// Operator duty is in effect; target seeking is suspended.
    Manual,
    /// A remote command set the target (or automation is off and the last target holds).
    RemoteTarget,
    /// Target follows occupancy every tick.
    Automated,
}

/// Heights used by the automation policy, in length units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Heights {
    pub idle: f64,
    pub rise: f64,
    pub max: f64,
}

impl Default for Heights {
    fn default() -> Self {
        Self {
            idle: 100.0,
            rise: 150.0,
            max: 250.0,
        }
    }
}

impl Heights {
    /// Force `idle <= max` and `rise <= max`, all finite and non-negative.
    pub fn sanitized(self) -> Self {
        let fix = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        let max = fix(self.max);
        Self {
            idle: fix(self.idle).min(max),
            rise: fix(self.rise).min(max),
            max,
        }
    }
}

/// Proximity-assisted fine positioning around a distance midpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceAssist {
    pub midpoint: i32,
    pub band: i32,
    /// Target change per tick while outside the band.
    pub step: f64,
    /// Publish distance once it moved more than this.
    pub report_threshold: i32,
}

impl Default for DistanceAssist {
    fn default() -> Self {
        Self {
            midpoint: 400,
            band: 50,
            step: 0.5,
            report_threshold: 10,
        }
    }
}

/// Decide the target for this tick.
///
/// Only `Automated` changes anything; the other modes keep the target their
/// command handler already set. Automated output is always inside
/// `[min(idle, rise), max]`.
pub fn resolve(
    mode: AuthorityMode,
    motion: bool,
    heights: Heights,
    current_target: f64,
    aux_distance: Option<i32>,
    assist: Option<&DistanceAssist>,
) -> f64 {
    match mode {
        AuthorityMode::Manual | AuthorityMode::RemoteTarget => current_target,
        AuthorityMode::Automated => {
            if !motion {
                return heights.idle.min(heights.max);
            }
            match (aux_distance, assist) {
                (Some(distance), Some(assist)) => {
                    let nudged = if distance < assist.midpoint.saturating_sub(assist.band) {
                        current_target + assist.step
                    } else if distance > assist.midpoint.saturating_add(assist.band) {
                        current_target - assist.step
                    } else {
                        current_target
                    };
                    clamp_into(nudged, heights.rise, heights.max)
                }
                _ => heights.rise.min(heights.max),
            }
        }
    }
}

/// Clamp that tolerates an inverted range (yields `hi`) and NaN (yields `lo`).
#[inline]
fn clamp_into(v: f64, lo: f64, hi: f64) -> f64 {
    if v.is_nan() {
        return lo.min(hi);
    }
    v.max(lo).min(hi)
}
