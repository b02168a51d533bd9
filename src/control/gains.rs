use serde::{Deserialize, Serialize};

use crate::control::pid::PidTerms;
use crate::error::{check_range, ConfigError};

pub const MAX_GAIN: f64 = 50.0;

/// The six tunable gains of the cascaded controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gains {
    pub kp_pos: f64,
    pub kd_pos: f64,
    pub ki_pos: f64,
    pub kp_rot: f64,
    pub kd_rot: f64,
    pub ki_rot: f64,
}

impl Gains {
    pub const COUNT: usize = 6;
    pub const NAMES: [&'static str; 6] = ["kp_pos", "kd_pos", "ki_pos", "kp_rot", "kd_rot", "ki_rot"];

    pub fn to_array(&self) -> [f64; 6] {
        [self.kp_pos, self.kd_pos, self.ki_pos, self.kp_rot, self.kd_rot, self.ki_rot]
    }

    pub fn from_array(g: [f64; 6]) -> Self {
        Self {
            kp_pos: g[0],
            kd_pos: g[1],
            ki_pos: g[2],
            kp_rot: g[3],
            kd_rot: g[4],
            ki_rot: g[5],
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in Self::NAMES.into_iter().zip(self.to_array()) {
            check_range(name, value, 0.0, MAX_GAIN)?;
        }
        Ok(())
    }

    /// Every gain forced into [0, MAX_GAIN]; NaN becomes 0.
    pub fn clamped(&self) -> Self {
        Self::from_array(self.to_array().map(|g| {
            if g.is_nan() {
                0.0
            } else {
                g.clamp(0.0, MAX_GAIN)
            }
        }))
    }

    pub fn position_terms(&self) -> PidTerms {
        PidTerms { kp: self.kp_pos, ki: self.ki_pos, kd: self.kd_pos }
    }

    pub fn rotation_terms(&self) -> PidTerms {
        PidTerms { kp: self.kp_rot, ki: self.ki_rot, kd: self.kd_rot }
    }
}

impl Default for Gains {
    fn default() -> Self {
        Self {
            kp_pos: 2.0,
            kd_pos: 2.5,
            ki_pos: 0.1,
            kp_rot: 2.0,
            kd_rot: 0.4,
            ki_rot: 0.05,
        }
    }
}

/// Fixed bounds of the cascade. Hitting any of them is a silent clamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerLimits {
    pub integral_pos: f64,   // m·s, per axis
    pub integral_rot: f64,   // rad·s, per axis
    pub max_force: f64,      // N
    pub max_torque: f64,     // N·m
    pub max_tilt: f64,       // rad
    pub thrust_epsilon: f64, // N, below this no tilt is commanded
}

impl Default for ControllerLimits {
    fn default() -> Self {
        Self {
            integral_pos: 5.0,
            integral_rot: 2.0,
            max_force: 10.0,
            max_torque: 2.0,
            max_tilt: 30f64.to_radians(),
            thrust_epsilon: 1e-6,
        }
    }
}
