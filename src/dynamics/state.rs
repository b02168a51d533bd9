use std::f64::consts::{PI, TAU};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{check_positive, ConfigError};

// ---------------------------------------------------------------------------
// Physical constants
// ---------------------------------------------------------------------------

pub const G0: f64 = 9.81; // m/s^2
pub const FLOOR_HEIGHT: f64 = 0.1; // m, lowest allowed altitude
pub const LINEAR_DRAG: f64 = 0.1; // N per m/s
pub const ANGULAR_DAMPING: f64 = 0.1; // N·m per rad/s
pub const YAW_TORQUE_COEFF: f64 = 0.05; // reaction torque per N of thrust, m

/// Motor index order used everywhere: front, right, back, left.
pub const FRONT: usize = 0;
pub const RIGHT: usize = 1;
pub const BACK: usize = 2;
pub const LEFT: usize = 3;

/// Wrap an angle into (−π, π].
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid maps +π onto −π; the interval is closed on the positive side
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

// ---------------------------------------------------------------------------
// Drone state: position, velocity, attitude, angular rate, motors
// ---------------------------------------------------------------------------

/// Frame: y up. Rotation is (roll, pitch, yaw) Euler angles.
#[derive(Debug, Clone, PartialEq)]
pub struct DroneState {
    pub position: Vector3<f64>,         // m
    pub velocity: Vector3<f64>,         // m/s
    pub rotation: Vector3<f64>,         // rad, (roll, pitch, yaw)
    pub angular_velocity: Vector3<f64>, // rad/s, x→roll, y→yaw, z→pitch channel
    pub motor_speeds: [f64; 4],         // fraction of max thrust, [0, 1]
}

impl DroneState {
    /// At rest at `position`, level, motors off.
    pub fn at_rest(position: Vector3<f64>) -> Self {
        Self {
            position,
            velocity: Vector3::zeros(),
            rotation: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            motor_speeds: [0.0; 4],
        }
    }

    pub fn roll(&self) -> f64 {
        self.rotation.x
    }

    pub fn pitch(&self) -> f64 {
        self.rotation.y
    }

    pub fn yaw(&self) -> f64 {
        self.rotation.z
    }

    /// Largest of |roll| and |pitch|.
    pub fn tilt(&self) -> f64 {
        self.roll().abs().max(self.pitch().abs())
    }

    /// Distance from the vertical axis through the origin.
    pub fn horizontal_distance(&self) -> f64 {
        (self.position.x.powi(2) + self.position.z.powi(2)).sqrt()
    }
}

impl Default for DroneState {
    fn default() -> Self {
        Self::at_rest(Vector3::new(0.0, 1.0, 0.0))
    }
}

// ---------------------------------------------------------------------------
// Airframe: mass and geometry, inertia derived on demand
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Airframe {
    pub mass: f64,         // kg
    pub motor_thrust: f64, // N, per motor at full speed
    pub arm_length: f64,   // m, centre to motor
}

impl Airframe {
    pub const MAX_MASS: f64 = 10.0;
    pub const MAX_MOTOR_THRUST: f64 = 20.0;
    pub const MAX_ARM_LENGTH: f64 = 1.0;

    pub fn new(mass: f64, motor_thrust: f64, arm_length: f64) -> Result<Self, ConfigError> {
        let airframe = Self { mass, motor_thrust, arm_length };
        airframe.validate()?;
        Ok(airframe)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("mass", self.mass, Self::MAX_MASS)?;
        check_positive("motor_thrust", self.motor_thrust, Self::MAX_MOTOR_THRUST)?;
        check_positive("arm_length", self.arm_length, Self::MAX_ARM_LENGTH)?;
        Ok(())
    }

    /// Diagonal inertia from four point masses of m/4 at the arm tips.
    /// Roll (x) and pitch (z) axes each see two motors; yaw (y) sees all four.
    pub fn inertia(&self) -> Vector3<f64> {
        let i = self.mass * self.arm_length * self.arm_length;
        Vector3::new(0.5 * i, i, 0.5 * i)
    }

    /// Collective thrust at full speed on all motors.
    pub fn max_total_thrust(&self) -> f64 {
        4.0 * self.motor_thrust
    }

    /// Per-motor fraction that exactly cancels gravity.
    pub fn hover_fraction(&self) -> f64 {
        self.mass * G0 / self.max_total_thrust()
    }
}

impl Default for Airframe {
    fn default() -> Self {
        Self {
            mass: 1.0,
            motor_thrust: 5.0,
            arm_length: 0.25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_angles_stay_in_half_open_interval() {
        let mut a = -20.0;
        while a < 20.0 {
            let n = normalize_angle(a);
            assert!(n > -PI && n <= PI, "{} normalized to {}", a, n);
            a += 0.013;
        }
    }

    #[test]
    fn pi_maps_to_pi() {
        assert_eq!(normalize_angle(PI), PI);
        assert!((normalize_angle(-PI) - PI).abs() < 1e-12);
        assert!((normalize_angle(3.0 * PI).abs() - PI).abs() < 1e-9);
    }

    #[test]
    fn inertia_tracks_inputs() {
        let mut a = Airframe::default();
        let before = a.inertia();
        a.mass *= 2.0;
        assert!((a.inertia() - before * 2.0).norm() < 1e-12);
        assert!(a.inertia().y > a.inertia().x);
    }

    #[test]
    fn airframe_rejects_out_of_range() {
        assert!(Airframe::new(0.0, 5.0, 0.25).is_err());
        assert!(Airframe::new(1.0, 25.0, 0.25).is_err());
        assert!(Airframe::new(1.0, 5.0, 1.5).is_err());
        assert!(Airframe::new(10.0, 20.0, 1.0).is_ok());
    }
}
