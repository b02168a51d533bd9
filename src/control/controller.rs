use nalgebra::Vector3;

use crate::dynamics::state::{Airframe, DroneState};

/// One control decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlOutput {
    pub motor_speeds: [f64; 4],         // [front, right, back, left], each in [0, 1]
    pub control_force: Vector3<f64>,    // N, world frame
    pub control_torque: Vector3<f64>,   // N·m, (roll, yaw, pitch) channels
    pub desired_angles: Vector3<f64>,   // rad, (roll, pitch, yaw) setpoint
}

impl Default for ControlOutput {
    fn default() -> Self {
        Self {
            motor_speeds: [0.0; 4],
            control_force: Vector3::zeros(),
            control_torque: Vector3::zeros(),
            desired_angles: Vector3::zeros(),
        }
    }
}

/// Trait for flight controllers.
///
/// Implement this to plug a custom controller into the simulation loop.
pub trait Controller {
    /// Compute motor commands from the current state.
    fn control(&mut self, state: &DroneState, airframe: &Airframe, dt: f64) -> ControlOutput;

    /// Reset controller internal state (e.g., PID integrators).
    fn reset(&mut self) {}

    /// Stability metric of the last call, if the controller tracks one.
    fn lyapunov_value(&self) -> Option<f64> {
        None
    }

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}
