use nalgebra::Vector3;

use crate::dynamics::state::{Airframe, BACK, FRONT, G0, LEFT, RIGHT, YAW_TORQUE_COEFF};

// ---------------------------------------------------------------------------
// Force → tilt setpoint
// ---------------------------------------------------------------------------

/// Roll/pitch that tilt the thrust vector toward the horizontal part of
/// `force`. Returns (roll, pitch), each within ±`max_tilt`. Level when the
/// required vertical thrust is not above `epsilon`.
pub fn tilt_setpoint(force: &Vector3<f64>, mass: f64, max_tilt: f64, epsilon: f64) -> (f64, f64) {
    let thrust = mass * G0 + force.y;
    if thrust <= epsilon {
        return (0.0, 0.0);
    }
    let pitch = force.x.atan2(thrust).clamp(-max_tilt, max_tilt);
    let roll = (-force.z).atan2(thrust).clamp(-max_tilt, max_tilt);
    (roll, pitch)
}

// ---------------------------------------------------------------------------
// Thrust/torque → motor fractions
// ---------------------------------------------------------------------------

/// Each torque channel is divided by its lever-arm or reaction constant and
/// added to both motors of its pair with the rigid-body sign table, so a
/// demand comes back doubled in roll/pitch and quadrupled in yaw. `torque`
/// uses the (roll, yaw, pitch) channel layout. Every output is clamped to [0, 1].
pub fn mix(vertical_force: f64, torque: &Vector3<f64>, airframe: &Airframe) -> [f64; 4] {
    let lever = airframe.motor_thrust * airframe.arm_length;
    let reaction = airframe.motor_thrust * YAW_TORQUE_COEFF;

    let base = airframe.hover_fraction();
    let vertical = vertical_force / airframe.max_total_thrust();
    let roll = torque.x / lever;
    let yaw = torque.y / reaction;
    let pitch = torque.z / lever;

    let collective = base + vertical;
    let mut m = [0.0; 4];
    m[FRONT] = collective + pitch + yaw;
    m[BACK] = collective - pitch + yaw;
    m[RIGHT] = collective + roll - yaw;
    m[LEFT] = collective - roll - yaw;
    m.map(|s| s.clamp(0.0, 1.0))
}
