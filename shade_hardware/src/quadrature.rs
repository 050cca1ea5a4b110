//! Quadrature decoding on channel A edges.

use shade_traits::{Encoder, HwResult, RotationAccumulator};

/// Turns A-channel edges into rotations.
///
/// Clones share one accumulator, so the interrupt side keeps a clone and the
/// tick side drains the original.
#[derive(Debug, Clone)]
pub struct QuadratureDecoder {
    acc: RotationAccumulator,
    per_edge: f64,
}

impl QuadratureDecoder {
    /// `pulses_per_rev` counts full A cycles; both edges are used.
    pub fn new(pulses_per_rev: u32) -> Self {
        Self {
            acc: RotationAccumulator::new(),
            per_edge: 1.0 / (f64::from(pulses_per_rev.max(1)) * 2.0),
        }
    }

    /// Record one A edge. A at the same level as B runs backwards.
    pub fn edge(&self, a_high: bool, b_high: bool) {
        let step = if a_high == b_high { -1.0 } else { 1.0 };
        self.acc.add(step * self.per_edge);
    }
}

impl Encoder for QuadratureDecoder {
    fn take_rotation(&mut self) -> HwResult<f64> {
        Ok(self.acc.drain())
    }
}
