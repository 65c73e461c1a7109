//! Scalar, vector and rotation interpolation helpers.
//!
//! `smoothstep` follows the game-engine convention `smoothstep(from, to, t)`
//! rather than the shader one: `t` is clamped to [0, 1], eased with the cubic
//! Hermite `3t² − 2t³` and used to blend `from` into `to`.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Linear interpolation with `t` clamped to [0, 1].
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    to * t + from * (1.0 - t)
}

/// Hermite interpolation between `from` and `to`.
pub fn smoothstep(from: f64, to: f64, t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    let t = -2.0 * t * t * t + 3.0 * t * t;
    to * t + from * (1.0 - t)
}

/// Ease-in-ease-out of a blend factor.
pub fn ease_in_out(t: f64) -> f64 {
    smoothstep(0.0, 1.0, t)
}

/// Smoothstep applied twice; flatter at both ends than a single pass.
pub fn double_smoothstep(t: f64) -> f64 {
    ease_in_out(ease_in_out(t))
}

/// Component-wise lerp of two vectors.
pub fn lerp_vector(from: &Vector3<f64>, to: &Vector3<f64>, t: f64) -> Vector3<f64> {
    Vector3::new(
        lerp(from.x, to.x, t),
        lerp(from.y, to.y, t),
        lerp(from.z, to.z, t),
    )
}

/// Interpolation used for anything moving between lanes.
///
/// x and z are linear, y is eased twice so that the lateral shift starts and
/// ends tangentially.
pub fn lane_lerp(from: &Vector3<f64>, to: &Vector3<f64>, t: f64) -> Vector3<f64> {
    Vector3::new(
        lerp(from.x, to.x, t),
        smoothstep(from.y, to.y, ease_in_out(t)),
        lerp(from.z, to.z, t),
    )
}

/// Folds `t` back and forth over [0, length].
pub fn ping_pong(t: f64, length: f64) -> f64 {
    if length <= 0.0 {
        return 0.0;
    }
    let period = length * 2.0;
    let wrapped = t.rem_euclid(period);
    length - (wrapped - length).abs()
}

/// Spherical interpolation that returns the endpoints bit-exactly.
///
/// Falls back to a normalized linear blend when the rotations are opposite
/// and the slerp axis is undefined.
pub fn slerp(
    from: &UnitQuaternion<f64>,
    to: &UnitQuaternion<f64>,
    t: f64,
) -> UnitQuaternion<f64> {
    if t <= 0.0 {
        return *from;
    }
    if t >= 1.0 {
        return *to;
    }
    from.try_slerp(to, t, 1.0e-9)
        .unwrap_or_else(|| from.nlerp(to, t))
}

/// Builds a unit quaternion from raw components, falling back to identity
/// when the components are degenerate (all zero or non-finite).
pub fn unit_quaternion_or_identity(x: f64, y: f64, z: f64, w: f64) -> UnitQuaternion<f64> {
    let q = Quaternion::new(w, x, y, z);
    let norm = q.norm();
    if !norm.is_finite() || norm < 1.0e-9 {
        return UnitQuaternion::identity();
    }
    UnitQuaternion::from_quaternion(q)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_smoothstep_endpoints_and_midpoint() {
        assert_eq!(smoothstep(2.0, 5.0, 0.0), 2.0);
        assert_eq!(smoothstep(2.0, 5.0, 1.0), 5.0);
        assert_relative_eq!(smoothstep(0.0, 1.0, 0.5), 0.5, epsilon = 1e-12);
        // clamped
        assert_eq!(smoothstep(2.0, 5.0, -3.0), 2.0);
        assert_eq!(smoothstep(2.0, 5.0, 7.0), 5.0);
    }

    #[test]
    fn test_double_smoothstep_is_flatter_near_start() {
        let t = 0.1;
        assert!(double_smoothstep(t) < ease_in_out(t));
        assert!(ease_in_out(t) > 0.0);
        assert_relative_eq!(double_smoothstep(0.5), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_lane_lerp_mixes_linear_and_eased_axes() {
        let a = Vector3::new(0.0, 0.0, 0.0);
        let b = Vector3::new(10.0, 4.0, 2.0);
        let p = lane_lerp(&a, &b, 0.25);
        assert_relative_eq!(p.x, 2.5, epsilon = 1e-12);
        assert_relative_eq!(p.z, 0.5, epsilon = 1e-12);
        assert_relative_eq!(p.y, 4.0 * double_smoothstep(0.25), epsilon = 1e-12);
        assert!(p.y < 1.0);

        assert_eq!(lane_lerp(&a, &b, 0.0), a);
        assert_eq!(lane_lerp(&a, &b, 1.0), b);
    }

    #[test]
    fn test_ping_pong() {
        assert_relative_eq!(ping_pong(0.25, 1.0), 0.25);
        assert_relative_eq!(ping_pong(1.25, 1.0), 0.75);
        assert_relative_eq!(ping_pong(2.25, 1.0), 0.25);
        assert_relative_eq!(ping_pong(-0.25, 1.0), 0.25);
    }

    #[test]
    fn test_slerp_endpoints_exact() {
        let a = UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3);
        let b = UnitQuaternion::from_euler_angles(-0.4, 0.0, 1.0);
        assert_eq!(slerp(&a, &b, 0.0), a);
        assert_eq!(slerp(&a, &b, 1.0), b);
        let mid = slerp(&a, &b, 0.5);
        assert_relative_eq!(mid.angle_to(&a), mid.angle_to(&b), epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_quaternion_is_identity() {
        assert_eq!(
            unit_quaternion_or_identity(0.0, 0.0, 0.0, 0.0),
            UnitQuaternion::identity()
        );
        let q = unit_quaternion_or_identity(0.0, 0.0, 0.0, 2.0);
        assert_relative_eq!(q.quaternion().w, 1.0);
    }
}
