//! Encoder rotations to length units.

/// Scale a raw rotation delta to length units, flipping the sign first when `invert`.
#[inline]
pub fn convert(raw_rotation_delta: f64, winding_constant: f64, invert: bool) -> f64 {
    let rotation = if invert {
        -raw_rotation_delta
    } else {
        raw_rotation_delta
    };
    rotation * winding_constant
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winding_scales_rotation() {
        assert_eq!(convert(2.0, 7.5, false), 15.0);
        assert_eq!(convert(2.0, 7.5, true), -15.0);
        assert_eq!(convert(-0.5, 7.5, true), 3.75);
    }
}
