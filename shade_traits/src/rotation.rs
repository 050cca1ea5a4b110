//! Rotation buffer between an encoder interrupt and the control tick.
//!
//! Both sides touch the cell only through single atomic operations, so no
//! rotation is lost between a read and its reset.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{Encoder, HwResult};

/// Lock-free `f64` accumulator shared between the encoder callback and the tick.
///
/// Clones share the same cell.
#[derive(Debug, Clone, Default)]
pub struct RotationAccumulator {
    bits: Arc<AtomicU64>,
}

impl RotationAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rotation delta. Safe to call from another thread at any time.
    pub fn add(&self, rotation: f64) {
        if !rotation.is_finite() || rotation == 0.0 {
            return;
        }
        let _ = self
            .bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                Some((f64::from_bits(cur) + rotation).to_bits())
            });
    }

    /// Take everything accumulated so far and reset to zero in one step.
    pub fn drain(&self) -> f64 {
        f64::from_bits(self.bits.swap(0.0_f64.to_bits(), Ordering::AcqRel))
    }

    /// Current pending value without draining.
    pub fn pending(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

impl Encoder for RotationAccumulator {
    fn take_rotation(&mut self) -> HwResult<f64> {
        Ok(self.drain())
    }
}
