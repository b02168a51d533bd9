use nalgebra::Vector3;

use crate::control::controller::{ControlOutput, Controller};
use crate::control::gains::{ControllerLimits, Gains};
use crate::control::lyapunov::{lyapunov_value, rotation_error};
use crate::control::mixer::{mix, tilt_setpoint};
use crate::control::pid::{cap_norm, VectorPid};
use crate::dynamics::state::{Airframe, DroneState};

// ---------------------------------------------------------------------------
// Cascaded position → attitude → motor controller
// ---------------------------------------------------------------------------

/// Outer loop turns position error into a world force, which sets the tilt
/// setpoint of the inner attitude loop; the resulting torque and the vertical
/// force are mixed onto the four motors.
///
/// The cached Lyapunov value and both integrators are the only state mutated
/// by [`StabilizingController::compute_control`].
#[derive(Debug, Clone)]
pub struct StabilizingController {
    gains: Gains,
    limits: ControllerLimits,
    target_position: Vector3<f64>,
    target_rotation: Vector3<f64>, // (roll, pitch, yaw)
    position_pid: VectorPid,
    rotation_pid: VectorPid,
    lyapunov: f64,
}

impl StabilizingController {
    pub fn new(gains: Gains, limits: ControllerLimits) -> Self {
        Self {
            gains: gains.clamped(),
            limits,
            target_position: Vector3::new(0.0, 2.0, 0.0),
            target_rotation: Vector3::zeros(),
            position_pid: VectorPid::new(limits.integral_pos),
            rotation_pid: VectorPid::new(limits.integral_rot),
            lyapunov: 0.0,
        }
    }

    pub fn gains(&self) -> Gains {
        self.gains
    }

    /// Out-of-range gains are clamped into [0, MAX_GAIN].
    pub fn set_gains(&mut self, gains: Gains) {
        self.gains = gains.clamped();
    }

    pub fn limits(&self) -> ControllerLimits {
        self.limits
    }

    pub fn set_limits(&mut self, limits: ControllerLimits) {
        self.limits = limits;
        self.position_pid.set_integral_limit(limits.integral_pos);
        self.rotation_pid.set_integral_limit(limits.integral_rot);
    }

    pub fn target_position(&self) -> Vector3<f64> {
        self.target_position
    }

    pub fn target_rotation(&self) -> Vector3<f64> {
        self.target_rotation
    }

    pub fn set_target_position(&mut self, x: f64, y: f64, z: f64) {
        self.target_position = Vector3::new(x, y, z);
    }

    pub fn set_target_rotation(&mut self, roll: f64, pitch: f64, yaw: f64) {
        self.target_rotation = Vector3::new(roll, pitch, yaw);
    }

    /// V from the most recent `compute_control`.
    pub fn lyapunov(&self) -> f64 {
        self.lyapunov
    }

    /// Position integrator, then rotation integrator (roll, yaw, pitch channels).
    pub fn integrals(&self) -> (Vector3<f64>, Vector3<f64>) {
        (self.position_pid.integral(), self.rotation_pid.integral())
    }

    /// Zero the integrators and V. Gains and targets are kept.
    pub fn reset(&mut self) {
        self.position_pid.reset();
        self.rotation_pid.reset();
        self.lyapunov = 0.0;
    }

    pub fn compute_control(&mut self, state: &DroneState, airframe: &Airframe, dt: f64) -> ControlOutput {
        // --- 1. Stability metric ---
        let position_error = self.target_position - state.position;
        let full_rotation_error = rotation_error(&self.target_rotation, &state.rotation);
        self.lyapunov = lyapunov_value(
            &position_error,
            &full_rotation_error,
            &state.velocity,
            &state.angular_velocity,
        );

        // --- 2. Position loop → world force ---
        let force = self.position_pid.update(
            self.gains.position_terms(),
            position_error,
            state.velocity,
            dt,
        );
        let control_force = cap_norm(force, self.limits.max_force);

        // --- 3. Force → tilt setpoint ---
        let (desired_roll, desired_pitch) = tilt_setpoint(
            &control_force,
            airframe.mass,
            self.limits.max_tilt,
            self.limits.thrust_epsilon,
        );
        let attitude_target = Vector3::new(desired_roll, desired_pitch, self.target_rotation.z);

        // --- 4. Attitude loop → torque ---
        let control_torque = self.attitude_torque(state, &attitude_target, dt);

        // --- 5. Mixing ---
        let motor_speeds = mix(control_force.y, &control_torque, airframe);

        ControlOutput {
            motor_speeds,
            control_force,
            control_torque,
            desired_angles: attitude_target,
        }
    }

    /// Attitude PID against an explicit target. The error is re-laid out onto
    /// the (roll, yaw, pitch) rate/torque channels before use.
    fn attitude_torque(&mut self, state: &DroneState, target: &Vector3<f64>, dt: f64) -> Vector3<f64> {
        let e = rotation_error(target, &state.rotation);
        let channel_error = Vector3::new(e.x, e.z, e.y);
        let torque = self.rotation_pid.update(
            self.gains.rotation_terms(),
            channel_error,
            state.angular_velocity,
            dt,
        );
        cap_norm(torque, self.limits.max_torque)
    }
}

impl Default for StabilizingController {
    fn default() -> Self {
        Self::new(Gains::default(), ControllerLimits::default())
    }
}

impl Controller for StabilizingController {
    fn control(&mut self, state: &DroneState, airframe: &Airframe, dt: f64) -> ControlOutput {
        self.compute_control(state, airframe, dt)
    }

    fn reset(&mut self) {
        StabilizingController::reset(self);
    }

    fn lyapunov_value(&self) -> Option<f64> {
        Some(self.lyapunov)
    }

    fn name(&self) -> &str {
        "StabilizingController"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::RigidBody;

    const DT: f64 = 1.0 / 60.0;

    #[test]
    fn at_target_v_is_zero_and_motors_hover() {
        let airframe = Airframe::default();
        let mut c = StabilizingController::default();
        c.set_target_position(1.0, 2.0, -1.0);
        let s = DroneState::at_rest(Vector3::new(1.0, 2.0, -1.0));
        let out = c.compute_control(&s, &airframe, DT);
        assert_eq!(c.lyapunov(), 0.0);
        for m in out.motor_speeds {
            assert!((m - airframe.hover_fraction()).abs() < 1e-12);
        }
    }

    #[test]
    fn integrators_respect_bounds_under_persistent_error() {
        let airframe = Airframe::default();
        let mut c = StabilizingController::default();
        c.set_target_position(100.0, 50.0, -100.0);
        c.set_target_rotation(0.0, 0.0, 3.0);
        let s = DroneState::at_rest(Vector3::new(0.0, 1.0, 0.0));
        for _ in 0..10_000 {
            c.compute_control(&s, &airframe, DT);
        }
        let limits = c.limits();
        let (ip, ir) = c.integrals();
        assert!(ip.iter().all(|v| v.abs() <= limits.integral_pos));
        assert!(ir.iter().all(|v| v.abs() <= limits.integral_rot));
    }

    #[test]
    fn force_and_torque_are_capped() {
        let airframe = Airframe::default();
        let mut c = StabilizingController::new(
            Gains::from_array([50.0; 6]),
            ControllerLimits::default(),
        );
        c.set_target_position(1e3, 1e3, 1e3);
        let mut s = DroneState::at_rest(Vector3::zeros());
        s.angular_velocity = Vector3::new(50.0, -50.0, 50.0);
        let out = c.compute_control(&s, &airframe, DT);
        let limits = c.limits();
        assert!(out.control_force.norm() <= limits.max_force + 1e-9);
        assert!(out.control_torque.norm() <= limits.max_torque + 1e-9);
        assert!(out.motor_speeds.iter().all(|m| (0.0..=1.0).contains(m)));
    }

    #[test]
    fn tilt_override_does_not_touch_target() {
        let airframe = Airframe::default();
        let mut c = StabilizingController::default();
        c.set_target_rotation(0.1, -0.2, 0.3);
        c.set_target_position(5.0, 2.0, 5.0);
        let s = DroneState::at_rest(Vector3::new(0.0, 2.0, 0.0));
        let out = c.compute_control(&s, &airframe, DT);
        assert_eq!(c.target_rotation(), Vector3::new(0.1, -0.2, 0.3));
        assert!(out.desired_angles.y > 0.0, "+x error should ask for positive pitch");
        assert!(out.desired_angles.x < 0.0, "+z error should ask for negative roll");
        assert_eq!(out.desired_angles.z, 0.3);
    }

    #[test]
    fn reset_keeps_gains_and_targets() {
        let airframe = Airframe::default();
        let gains = Gains { kp_pos: 3.0, ..Gains::default() };
        let mut c = StabilizingController::new(gains, ControllerLimits::default());
        c.set_target_position(1.0, 1.0, 1.0);
        c.compute_control(&DroneState::default(), &airframe, DT);
        assert!(c.lyapunov() > 0.0);
        c.reset();
        assert_eq!(c.lyapunov(), 0.0);
        assert_eq!(c.integrals().0, Vector3::zeros());
        assert_eq!(c.gains(), gains);
        assert_eq!(c.target_position(), Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn closed_loop_settles_on_target() {
        let airframe = Airframe::default();
        let mut c = StabilizingController::default();
        c.set_target_position(0.0, 2.0, 0.0);
        let mut body = RigidBody::new(airframe, DroneState::at_rest(Vector3::new(1.0, 1.0, 1.0)));
        for _ in 0..1200 {
            let out = c.compute_control(&body.state(), &airframe, DT);
            body.set_motor_speeds(out.motor_speeds);
            body.update(DT, Vector3::zeros(), Vector3::zeros());
        }
        let s = body.state();
        assert!((s.position - Vector3::new(0.0, 2.0, 0.0)).norm() < 0.1, "ended at {:?}", s.position);
        assert!(c.lyapunov() < 1e-2);
    }
}
