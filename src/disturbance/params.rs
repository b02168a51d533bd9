use serde::{Deserialize, Serialize};

use crate::error::{check_range, ConfigError};

/// User-facing disturbance configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisturbanceParams {
    pub wind_speed: f64,          // m/s, [0, 20]
    pub wind_direction: f64,      // deg, [0, 360), 0 = +x, 90 = +z
    pub wind_turbulence: f64,     // fraction of wind speed, [0, 1]
    pub impulse_frequency: f64,   // kicks per second, [0, 5]; 0 disables
    pub impulse_intensity: f64,   // N, [0, 50]
    pub obstacles_enabled: bool,
    pub projectiles_enabled: bool,
    pub projectile_interval: f64, // s between spawns
}

impl DisturbanceParams {
    /// Nothing acts on the drone.
    pub fn calm() -> Self {
        Self {
            wind_speed: 0.0,
            wind_direction: 0.0,
            wind_turbulence: 0.0,
            impulse_frequency: 0.0,
            impulse_intensity: 0.0,
            obstacles_enabled: false,
            projectiles_enabled: false,
            projectile_interval: 3.0,
        }
    }

    /// Stronger wind and frequent kicks, no obstacles or projectiles.
    pub fn training() -> Self {
        Self {
            wind_speed: 5.0,
            wind_direction: 45.0,
            wind_turbulence: 0.3,
            impulse_frequency: 1.0,
            impulse_intensity: 10.0,
            obstacles_enabled: false,
            projectiles_enabled: false,
            projectile_interval: 3.0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("wind_speed", self.wind_speed, 0.0, 20.0)?;
        check_range("wind_direction", self.wind_direction, 0.0, 360.0)?;
        if self.wind_direction >= 360.0 {
            return Err(ConfigError::OutOfRange {
                name: "wind_direction",
                value: self.wind_direction,
                min: 0.0,
                max: 360.0,
            });
        }
        check_range("wind_turbulence", self.wind_turbulence, 0.0, 1.0)?;
        check_range("impulse_frequency", self.impulse_frequency, 0.0, 5.0)?;
        check_range("impulse_intensity", self.impulse_intensity, 0.0, 50.0)?;
        if !(self.projectile_interval.is_finite() && self.projectile_interval > 0.0) {
            return Err(ConfigError::NotPositive {
                name: "projectile_interval",
                value: self.projectile_interval,
            });
        }
        Ok(())
    }

    /// Seconds between kicks, `None` when impulses are off.
    pub fn impulse_interval(&self) -> Option<f64> {
        if self.impulse_frequency > 0.0 && self.impulse_intensity > 0.0 {
            Some(1.0 / self.impulse_frequency)
        } else {
            None
        }
    }

    pub fn apply(&mut self, update: &DisturbanceUpdate) {
        if let Some(v) = update.wind_speed { self.wind_speed = v; }
        if let Some(v) = update.wind_direction { self.wind_direction = v; }
        if let Some(v) = update.wind_turbulence { self.wind_turbulence = v; }
        if let Some(v) = update.impulse_frequency { self.impulse_frequency = v; }
        if let Some(v) = update.impulse_intensity { self.impulse_intensity = v; }
        if let Some(v) = update.obstacles_enabled { self.obstacles_enabled = v; }
        if let Some(v) = update.projectiles_enabled { self.projectiles_enabled = v; }
        if let Some(v) = update.projectile_interval { self.projectile_interval = v; }
    }
}

impl Default for DisturbanceParams {
    fn default() -> Self {
        Self {
            wind_speed: 2.0,
            wind_direction: 0.0,
            wind_turbulence: 0.2,
            impulse_frequency: 0.2,
            impulse_intensity: 5.0,
            obstacles_enabled: true,
            projectiles_enabled: false,
            projectile_interval: 3.0,
        }
    }
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DisturbanceUpdate {
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub wind_turbulence: Option<f64>,
    pub impulse_frequency: Option<f64>,
    pub impulse_intensity: Option<f64>,
    pub obstacles_enabled: Option<bool>,
    pub projectiles_enabled: Option<bool>,
    pub projectile_interval: Option<f64>,
}
