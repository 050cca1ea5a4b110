/// Largest channel value accepted by the light driver (10-bit PWM).
pub const MAX_CHANNEL: u16 = 1023;

/// Four-channel light color, each channel in `0..=MAX_CHANNEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgbw {
    pub r: u16,
    pub g: u16,
    pub b: u16,
    pub w: u16,
}

impl Rgbw {
    pub const OFF: Rgbw = Rgbw {
        r: 0,
        g: 0,
        b: 0,
        w: 0,
    };

    /// Build a color, clamping every channel into range.
    pub fn new(r: i32, g: i32, b: i32, w: i32) -> Self {
        Self {
            r: clamp_channel(r),
            g: clamp_channel(g),
            b: clamp_channel(b),
            w: clamp_channel(w),
        }
    }

    /// Same intensity on all four channels.
    pub fn mono(intensity: i32) -> Self {
        Self::new(intensity, intensity, intensity, intensity)
    }

    /// White channel only.
    pub fn white(intensity: i32) -> Self {
        Self::new(0, 0, 0, intensity)
    }

    pub fn is_off(&self) -> bool {
        *self == Self::OFF
    }
}

#[inline]
fn clamp_channel(v: i32) -> u16 {
    v.clamp(0, i32::from(MAX_CHANNEL)) as u16
}

impl core::fmt::Display for Rgbw {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {} {} {}", self.r, self.g, self.b, self.w)
    }
}
