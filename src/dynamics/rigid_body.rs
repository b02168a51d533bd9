use nalgebra::Vector3;

use crate::dynamics::state::{
    normalize_angle, Airframe, DroneState, ANGULAR_DAMPING, BACK, FLOOR_HEIGHT, FRONT, G0, LEFT,
    LINEAR_DRAG, RIGHT, YAW_TORQUE_COEFF,
};

// ---------------------------------------------------------------------------
// Rigid-body quadrotor
// ---------------------------------------------------------------------------

/// Single rigid body with four fixed-axis rotors in a cross layout.
#[derive(Debug, Clone)]
pub struct RigidBody {
    airframe: Airframe,
    state: DroneState,
    grounded: bool,
}

impl RigidBody {
    pub fn new(airframe: Airframe, initial: DroneState) -> Self {
        Self {
            airframe,
            state: initial,
            grounded: false,
        }
    }

    pub fn airframe(&self) -> &Airframe {
        &self.airframe
    }

    /// Replace mass/thrust/geometry. Inertia follows automatically.
    pub fn set_airframe(&mut self, airframe: Airframe) {
        self.airframe = airframe;
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> DroneState {
        self.state.clone()
    }

    /// True if the floor clamp engaged on the last update.
    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn set_motor_speeds(&mut self, speeds: [f64; 4]) {
        self.state.motor_speeds = speeds.map(|s| s.clamp(0.0, 1.0));
    }

    /// Put the body at rest at `position`, level, motors off.
    pub fn reset(&mut self, position: Vector3<f64>) {
        self.state = DroneState::at_rest(position);
        self.grounded = false;
    }

    /// World-frame force from thrust, gravity and drag, excluding external inputs.
    pub fn body_force(&self) -> Vector3<f64> {
        let s = &self.state;
        let thrust = s.motor_speeds.iter().sum::<f64>() * self.airframe.motor_thrust;
        let (roll, pitch) = (s.roll(), s.pitch());

        let f_thrust = Vector3::new(
            thrust * pitch.sin(),
            thrust * pitch.cos() * roll.cos(),
            -thrust * roll.sin() * pitch.cos(),
        );
        let f_gravity = Vector3::new(0.0, -self.airframe.mass * G0, 0.0);
        let f_drag = -s.velocity * LINEAR_DRAG;

        f_thrust + f_gravity + f_drag
    }

    /// Torque from motor differentials and angular damping, excluding external inputs.
    /// Layout: x = roll, y = yaw, z = pitch.
    pub fn body_torque(&self) -> Vector3<f64> {
        let m = &self.state.motor_speeds;
        let lever = self.airframe.motor_thrust * self.airframe.arm_length;

        let roll = (m[RIGHT] - m[LEFT]) * lever;
        let pitch = (m[FRONT] - m[BACK]) * lever;
        // Counter-rotating pairs: front/back spin one way, right/left the other
        let yaw = ((m[FRONT] + m[BACK]) - (m[RIGHT] + m[LEFT]))
            * self.airframe.motor_thrust
            * YAW_TORQUE_COEFF;

        Vector3::new(roll, yaw, pitch) - self.state.angular_velocity * ANGULAR_DAMPING
    }

    /// Advance one fixed step with semi-implicit Euler.
    pub fn update(&mut self, dt: f64, external_force: Vector3<f64>, external_torque: Vector3<f64>) {
        debug_assert!(dt.is_finite() && dt >= 0.0);
        debug_assert!(external_force.iter().all(|v| v.is_finite()));
        debug_assert!(external_torque.iter().all(|v| v.is_finite()));

        let force = self.body_force() + external_force;
        let torque = self.body_torque() + external_torque;
        let inertia = self.airframe.inertia();

        let s = &mut self.state;

        // --- Translation ---
        let accel = force / self.airframe.mass;
        s.velocity += accel * dt;
        s.position += s.velocity * dt;

        // --- Rotation ---
        let alpha = torque.component_div(&inertia);
        s.angular_velocity += alpha * dt;
        let w = s.angular_velocity;
        s.rotation = Vector3::new(
            normalize_angle(s.rotation.x + w.x * dt),
            normalize_angle(s.rotation.y + w.z * dt),
            normalize_angle(s.rotation.z + w.y * dt),
        );

        // --- Floor ---
        self.grounded = s.position.y < FLOOR_HEIGHT;
        if self.grounded {
            s.position.y = FLOOR_HEIGHT;
            if s.velocity.y < 0.0 {
                s.velocity.y = 0.0;
            }
        }
    }
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new(Airframe::default(), DroneState::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
