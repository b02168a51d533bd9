use nalgebra::Vector3;

use crate::dynamics::state::{normalize_angle, DroneState};

/// Per-axis attitude error `target − current`, each wrapped into (−π, π].
/// Layout matches the rotation vector: (roll, pitch, yaw).
pub fn rotation_error(target: &Vector3<f64>, current: &Vector3<f64>) -> Vector3<f64> {
    (target - current).map(normalize_angle)
}

/// Energy-like stability function
///
/// V = ½ (‖e_p‖² + ‖e_r‖² + ‖v‖² + ‖ω‖²)
///
/// Zero only at the target pose with no motion; positive everywhere else.
pub fn lyapunov_value(
    position_error: &Vector3<f64>,
    rotation_error: &Vector3<f64>,
    velocity: &Vector3<f64>,
    angular_velocity: &Vector3<f64>,
) -> f64 {
    0.5 * (position_error.norm_squared()
        + rotation_error.norm_squared()
        + velocity.norm_squared()
        + angular_velocity.norm_squared())
}

/// V evaluated for a state against a target pose.
pub fn lyapunov_for_state(
    state: &DroneState,
    target_position: &Vector3<f64>,
    target_rotation: &Vector3<f64>,
) -> f64 {
    lyapunov_value(
        &(target_position - state.position),
        &rotation_error(target_rotation, &state.rotation),
        &state.velocity,
        &state.angular_velocity,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn zero_at_target() {
        let target = Vector3::new(1.0, 2.0, 3.0);
        let s = DroneState::at_rest(target);
        assert_eq!(lyapunov_for_state(&s, &target, &Vector3::zeros()), 0.0);
    }

    #[test]
    fn rotation_error_takes_short_way_round() {
        let e = rotation_error(
            &Vector3::new(PI - 0.1, 0.0, 0.0),
            &Vector3::new(-PI + 0.1, 0.0, 0.0),
        );
        assert!((e.x + 0.2).abs() < 1e-12);
    }

    #[test]
    fn each_term_contributes_half_square() {
        let one = Vector3::new(1.0, 0.0, 0.0);
        let z = Vector3::zeros();
        assert_eq!(lyapunov_value(&one, &z, &z, &z), 0.5);
        assert_eq!(lyapunov_value(&z, &one, &z, &z), 0.5);
        assert_eq!(lyapunov_value(&z, &z, &one, &z), 0.5);
        assert_eq!(lyapunov_value(&z, &z, &z, &one), 0.5);
        assert_eq!(lyapunov_value(&one, &one, &one, &one), 2.0);
    }
}
