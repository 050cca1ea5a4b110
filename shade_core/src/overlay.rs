//! Time-boxed light override on top of the steady status color.

use shade_traits::Rgbw;

/// Steady color plus an optional flash that expires at a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightOverlay {
    steady: Rgbw,
    flash: Option<(Rgbw, u64)>,
}

impl Default for LightOverlay {
    fn default() -> Self {
        Self::new(Rgbw::OFF)
    }
}

impl LightOverlay {
    pub fn new(steady: Rgbw) -> Self {
        Self {
            steady,
            flash: None,
        }
    }

    /// Color that should be showing right now.
    pub fn current(&self) -> Rgbw {
        self.flash.map_or(self.steady, |(c, _)| c)
    }

    pub fn steady(&self) -> Rgbw {
        self.steady
    }

    pub fn flash_active(&self) -> bool {
        self.flash.is_some()
    }

    /// Start a flash and return the color to show. A zero duration still
    /// shows the color until the next `poll`.
    pub fn trigger_flash(&mut self, color: Rgbw, duration_ms: u64, now_ms: u64) -> Rgbw {
        self.flash = Some((color, now_ms.saturating_add(duration_ms)));
        color
    }

    /// Expire the flash once its deadline passed; returns the steady color on expiry.
    pub fn poll(&mut self, now_ms: u64) -> Option<Rgbw> {
        match self.flash {
            Some((_, deadline)) if now_ms >= deadline => {
                self.flash = None;
                Some(self.steady)
            }
            _ => None,
        }
    }

    /// Change the steady color; returns it when it should be shown now.
    pub fn set_steady(&mut self, color: Rgbw) -> Option<Rgbw> {
        self.steady = color;
        (!self.flash_active()).then_some(color)
    }

    /// Drop any flash without changing the steady color.
    pub fn cancel_flash(&mut self) {
        self.flash = None;
    }
}
