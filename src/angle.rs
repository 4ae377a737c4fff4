//! Angle helpers for degree accumulators.

/// PI, f32
pub const PI: f32 = core::f32::consts::PI;

/// PI / 180, for conversion to radians
pub const PI_180: f32 = PI / 180.0;

/// 180 / PI, for conversion to degrees
pub const DEG_PER_RAD: f32 = 180.0 / PI;

const FULL_TURN: f32 = 360.0;

/// Folds a heading accumulator into [0, 360).
///
/// Accumulators move by at most one sample's increment between calls, so a
/// single correction in either direction is all that is normally needed.
/// Inputs further than a full turn outside the range are folded with a
/// remainder instead. NaN passes through unchanged.
pub fn wrap_degrees(angle: f32) -> f32 {
    let mut wrapped = angle;
    if wrapped >= FULL_TURN {
        wrapped -= FULL_TURN;
    }
    if wrapped < 0.0 {
        wrapped += FULL_TURN;
    }

    if !(0.0..FULL_TURN).contains(&wrapped) && wrapped.is_finite() {
        wrapped %= FULL_TURN;
        if wrapped < 0.0 {
            wrapped += FULL_TURN;
        }
    }

    // -1e-7 + 360 rounds to exactly 360 in f32
    if wrapped >= FULL_TURN {
        wrapped = 0.0;
    }

    wrapped
}

/// Folds an angle into [-180, 180), e.g. heading relative to a reference
pub fn wrap_signed_degrees(angle: f32) -> f32 {
    let wrapped = wrap_degrees(angle + FULL_TURN / 2.0) - FULL_TURN / 2.0;
    if wrapped >= FULL_TURN / 2.0 {
        wrapped - FULL_TURN
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn wrap_keeps_values_in_range() {
        assert_eq!(wrap_degrees(0.0), 0.0);
        assert_eq!(wrap_degrees(359.5), 359.5);
        assert_eq!(wrap_degrees(360.0), 0.0);
        assert_eq!(wrap_degrees(361.0), 1.0);
        assert_eq!(wrap_degrees(-1.0), 359.0);
        assert_eq!(wrap_degrees(-360.0), 0.0);
    }

    #[test]
    fn wrap_tiny_negative_does_not_round_to_full_turn() {
        let wrapped = wrap_degrees(-1e-7);
        assert!((0.0..360.0).contains(&wrapped), "{wrapped}");
    }

    #[test]
    fn wrap_far_out_of_range() {
        assert_abs_diff_eq!(wrap_degrees(1085.0), 5.0, epsilon = 1e-3);
        assert_abs_diff_eq!(wrap_degrees(-1085.0), 355.0, epsilon = 1e-3);
    }

    #[test]
    fn wrap_is_idempotent() {
        let mut x = -2000.0;
        while x < 2000.0 {
            let once = wrap_degrees(x);
            assert!((0.0..360.0).contains(&once), "wrap({x}) = {once}");
            assert_eq!(wrap_degrees(once), once, "x = {x}");
            x += 7.3;
        }
    }

    #[test]
    fn wrap_nan_passes_through() {
        assert!(wrap_degrees(f32::NAN).is_nan());
    }

    #[test]
    fn signed_wrap() {
        assert_eq!(wrap_signed_degrees(0.0), 0.0);
        assert_eq!(wrap_signed_degrees(190.0), -170.0);
        assert_eq!(wrap_signed_degrees(-190.0), 170.0);
        assert_eq!(wrap_signed_degrees(180.0), -180.0);
        assert_abs_diff_eq!(wrap_signed_degrees(350.0), -10.0, epsilon = 1e-4);
    }
}
