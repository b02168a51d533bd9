use std::io::{self, Write};
use std::path::Path;

use nalgebra::Vector3;
use serde::Serialize;

use crate::control::Gains;
use crate::sim::Sample;
use crate::tuning::{settling_index, SearchOutcome};

/// Summary statistics computed from a flight record.
#[derive(Debug, Clone, Serialize)]
pub struct FlightSummary {
    #[serde(rename = "flight_time_s")]
    pub flight_time: f64,
    pub peak_lyapunov: f64,
    pub final_lyapunov: f64,
    #[serde(rename = "final_position_error_m")]
    pub final_position_error: f64,
    /// Time after which V stayed under the threshold, if it ever did.
    #[serde(rename = "settle_time_s")]
    pub settle_time: Option<f64>,
    pub max_tilt_deg: f64,
    #[serde(rename = "max_speed_ms")]
    pub max_speed: f64,
}

impl FlightSummary {
    /// Summarize `samples` against `target`. `None` for an empty record.
    pub fn from_samples(
        samples: &[Sample],
        target: &Vector3<f64>,
        settle_threshold: f64,
        settle_window: usize,
    ) -> Option<Self> {
        let last = samples.last()?;

        let trace: Vec<f64> = samples.iter().map(|s| s.lyapunov.unwrap_or(0.0)).collect();
        let peak_lyapunov = trace.iter().copied().fold(0.0_f64, f64::max);

        let max_tilt = samples
            .iter()
            .map(|s| s.state.tilt())
            .fold(0.0_f64, f64::max);

        let max_speed = samples
            .iter()
            .map(|s| s.state.velocity.norm())
            .fold(0.0_f64, f64::max);

        let settle = settling_index(&trace, settle_threshold, settle_window);
        let settle_time = samples.get(settle).map(|s| s.time);

        Some(FlightSummary {
            flight_time: last.time,
            peak_lyapunov,
            final_lyapunov: last.lyapunov.unwrap_or(0.0),
            final_position_error: (target - last.state.position).norm(),
            settle_time,
            max_tilt_deg: max_tilt.to_degrees(),
            max_speed,
        })
    }
}

#[derive(Serialize)]
struct FlightReport<'a> {
    gains: &'a Gains,
    performance: &'a FlightSummary,
}

/// Pretty JSON plus a trailing newline. Non-finite numbers come out as `null`.
fn write_pretty<W: Write, T: Serialize>(writer: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)
}

/// Write flight summary as JSON to a writer.
pub fn write_flight_summary<W: Write>(
    writer: &mut W,
    gains: &Gains,
    summary: &FlightSummary,
) -> io::Result<()> {
    write_pretty(writer, &FlightReport { gains, performance: summary })
}

/// Write flight summary JSON to a file.
pub fn write_flight_summary_file(
    path: impl AsRef<Path>,
    gains: &Gains,
    summary: &FlightSummary,
) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_flight_summary(&mut file, gains, summary)
}

/// Write the gain-search trace and its best result as JSON.
pub fn write_training_report<W: Write>(writer: &mut W, outcome: &SearchOutcome) -> io::Result<()> {
    write_pretty(writer, outcome)
}

pub fn write_training_report_file(path: impl AsRef<Path>, outcome: &SearchOutcome) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_training_report(&mut file, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::DroneState;
    use crate::tuning::TrainingRecord;

    fn record() -> Vec<Sample> {
        (0..200)
            .map(|i| {
                let t = i as f64 / 60.0;
                let y = 2.0 - (-t).exp();
                let mut state = DroneState::at_rest(Vector3::new(0.0, y, 0.0));
                state.rotation.y = if i == 10 { 0.2 } else { 0.0 };
                Sample {
                    time: t,
                    state,
                    lyapunov: Some(0.5 * (2.0 - y).powi(2)),
                    external_force: Vector3::zeros(),
                }
            })
            .collect()
    }

    #[test]
    fn summary_from_samples() {
        let target = Vector3::new(0.0, 2.0, 0.0);
        let s = FlightSummary::from_samples(&record(), &target, 0.1, 50).unwrap();
        assert!((s.peak_lyapunov - 0.5).abs() < 1e-12);
        assert!((s.max_tilt_deg - 0.2f64.to_degrees()).abs() < 1e-9);
        assert!(s.final_position_error < 0.05);
        // V = 0.5·e^(−2t) drops under 0.1 after ln(5)/2 s
        assert_eq!(s.settle_time, Some(49.0 / 60.0));
        assert!(FlightSummary::from_samples(&[], &target, 0.1, 50).is_none());
    }

    #[test]
    fn json_outputs_parse() {
        let target = Vector3::new(0.0, 2.0, 0.0);
        let summary = FlightSummary::from_samples(&record(), &target, 0.1, 50).unwrap();
        let mut buf = Vec::new();
        write_flight_summary(&mut buf, &Gains::default(), &summary).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v["gains"]["kp_pos"], 2.0);
        assert!(v["performance"]["peak_lyapunov"].is_number());
        assert_eq!(v["performance"]["settle_time_s"], 49.0 / 60.0);
        assert!(v["performance"]["flight_time_s"].is_number());

        let outcome = SearchOutcome {
            best_gains: Gains::default(),
            best_score: 0.25,
            records: vec![
                TrainingRecord { iteration: 0, gains: Gains::default(), score: 0.25 },
                TrainingRecord { iteration: 1, gains: Gains::default(), score: f64::INFINITY },
            ],
            completed: false,
        };
        let mut buf = Vec::new();
        write_training_report(&mut buf, &outcome).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v["records"].as_array().map(Vec::len), Some(2));
        assert!(v["records"][1]["score"].is_null());
        assert_eq!(v["completed"], false);
        let best: Gains = serde_json::from_value(v["best_gains"].clone()).unwrap();
        assert_eq!(best, Gains::default());
    }
}
