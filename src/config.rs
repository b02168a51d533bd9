use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::control::{ControllerLimits, Gains, StabilizingController};
use crate::disturbance::{DisturbanceField, DisturbanceParams};
use crate::dynamics::Airframe;
use crate::error::ConfigError;
use crate::sim::{LoopConfig, SimulationLoop};
use crate::tuning::SearchConfig;

/// Everything a run needs, loadable from JSON. Missing fields take defaults.
///
/// ```json
/// { "airframe": { "mass": 1.2 }, "gains": { "kp_pos": 3.0 }, "seed": 7 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub airframe: Airframe,
    pub gains: Gains,
    pub limits: ControllerLimits,
    pub disturbance: DisturbanceParams,
    pub sim: LoopConfig,
    pub search: SearchConfig,
    pub target: Option<[f64; 3]>,
    /// Seeds the disturbance field; `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Settings {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let settings: Settings =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.airframe.validate()?;
        self.gains.validate()?;
        self.disturbance.validate()?;
        self.search.validate()?;
        if !(self.sim.fixed_step.is_finite() && self.sim.fixed_step > 0.0) {
            return Err(ConfigError::NotPositive { name: "fixed_step", value: self.sim.fixed_step });
        }
        Ok(())
    }

    /// Assemble a loop from these settings.
    pub fn build_loop(&self) -> SimulationLoop {
        let mut sim = SimulationLoop::new(
            self.airframe,
            StabilizingController::new(self.gains, self.limits),
            DisturbanceField::new(self.disturbance, self.seed),
            self.sim,
        );
        if let Some([x, y, z]) = self.target {
            sim.set_target_position(x, y, z);
        }
        sim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn empty_object_gives_defaults() {
        assert_eq!(Settings::from_json_str("{}").unwrap(), Settings::default());
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let s = Settings::from_json_str(
            r#"{ "airframe": { "mass": 2.0 }, "gains": { "kp_pos": 3.5 },
                 "disturbance": { "wind_speed": 4.0 }, "target": [1.0, 2.0, 3.0], "seed": 9 }"#,
        )
        .unwrap();
        assert_eq!(s.airframe.mass, 2.0);
        assert_eq!(s.airframe.motor_thrust, Airframe::default().motor_thrust);
        assert_eq!(s.gains.kp_pos, 3.5);
        assert_eq!(s.gains.kd_pos, Gains::default().kd_pos);
        assert_eq!(s.disturbance.wind_speed, 4.0);

        let sim = s.build_loop();
        assert_eq!(sim.controller().target_position(), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(sim.airframe().mass, 2.0);
    }

    #[test]
    fn out_of_range_is_rejected() {
        let err = Settings::from_json_str(r#"{ "gains": { "kd_rot": 60.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { name: "kd_rot", .. }));
        let err = Settings::from_json_str(r#"{ "airframe": { "mass": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::NotPositive { name: "mass", .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(Settings::from_json_str("{ nope"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            Settings::from_json_file("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
