use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::control::Gains;
use crate::disturbance::DisturbanceParams;
use crate::error::{check_positive, check_range, ConfigError, SimError};
use crate::sim::SimulationLoop;
use crate::tuning::record::TrainingRecord;
use crate::tuning::score::score_trace;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Per-gain sampling box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GainRanges {
    pub low: Gains,
    pub high: Gains,
}

impl GainRanges {
    pub fn bounds(&self) -> [(f64, f64); Gains::COUNT] {
        let (lo, hi) = (self.low.to_array(), self.high.to_array());
        std::array::from_fn(|i| (lo[i], hi[i]))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.low.validate()?;
        self.high.validate()?;
        if self.bounds().iter().any(|(lo, hi)| lo > hi) {
            return Err(ConfigError::Search("every gain range needs low <= high"));
        }
        Ok(())
    }
}

impl Default for GainRanges {
    fn default() -> Self {
        Self {
            low: Gains { kp_pos: 0.5, kd_pos: 0.5, ki_pos: 0.0, kp_rot: 0.5, kd_rot: 0.05, ki_rot: 0.0 },
            high: Gains { kp_pos: 10.0, kd_pos: 10.0, ki_pos: 2.0, kp_rot: 20.0, kd_rot: 5.0, ki_rot: 2.0 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub trials: usize,
    /// Trials before local search starts; trial 0 is always the current gains.
    pub exploration_trials: usize,
    pub test_duration: f64,     // s
    pub initial_position: [f64; 3],
    pub target: [f64; 3],
    pub disturbance: DisturbanceParams,
    pub settle_threshold: f64,
    pub settle_window: usize,   // steps
    pub perturbation: f64,      // fraction of each range
    pub seed: Option<u64>,
    pub ranges: GainRanges,
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trials == 0 {
            return Err(ConfigError::Search("trials must be at least 1"));
        }
        if self.exploration_trials == 0 {
            return Err(ConfigError::Search("exploration_trials must be at least 1"));
        }
        if self.settle_window == 0 {
            return Err(ConfigError::Search("settle_window must be at least 1"));
        }
        check_positive("test_duration", self.test_duration, 600.0)?;
        check_positive("settle_threshold", self.settle_threshold, f64::MAX)?;
        check_range("perturbation", self.perturbation, 0.0, 1.0)?;
        self.disturbance.validate()?;
        self.ranges.validate()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            trials: 50,
            exploration_trials: 10,
            test_duration: 10.0,
            initial_position: [2.0, 3.0, -1.5],
            target: [0.0, 2.0, 0.0],
            disturbance: DisturbanceParams::training(),
            settle_threshold: 0.1,
            settle_window: 100,
            perturbation: 0.2,
            seed: None,
            ranges: GainRanges::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cancellation and session guard
// ---------------------------------------------------------------------------

/// Shared stop flag, polled at every trial boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Holds the loop in training mode; dropping it always returns to the
/// pre-training mode, targets and disturbance settings.
pub struct TrainingSession<'a> {
    sim: &'a mut SimulationLoop,
}

impl<'a> TrainingSession<'a> {
    pub fn begin(sim: &'a mut SimulationLoop) -> Result<Self, SimError> {
        sim.begin_training()?;
        Ok(Self { sim })
    }
}

impl Deref for TrainingSession<'_> {
    type Target = SimulationLoop;

    fn deref(&self) -> &SimulationLoop {
        self.sim
    }
}

impl DerefMut for TrainingSession<'_> {
    fn deref_mut(&mut self) -> &mut SimulationLoop {
        self.sim
    }
}

impl Drop for TrainingSession<'_> {
    fn drop(&mut self) {
        self.sim.end_training();
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub best_gains: Gains,
    pub best_score: f64,
    pub records: Vec<TrainingRecord>,
    /// False when stopped through the cancel handle.
    pub completed: bool,
}

/// Two-phase random/local search over the six gains.
pub struct GainSearch {
    config: SearchConfig,
    rng: StdRng,
    records: Vec<TrainingRecord>,
    best: Option<(Gains, f64)>,
    cancel: CancelHandle,
}

impl GainSearch {
    pub fn new(config: SearchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            config,
            rng,
            records: Vec::new(),
            best: None,
            cancel: CancelHandle::default(),
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn records(&self) -> &[TrainingRecord] {
        &self.records
    }

    pub fn best(&self) -> Option<(Gains, f64)> {
        self.best
    }

    /// Run every trial on `sim`, calling `observer` after each one. The loop
    /// is in training mode for the duration; afterwards the controller keeps
    /// the best gains found and everything else is restored.
    pub fn run<F>(&mut self, sim: &mut SimulationLoop, mut observer: F) -> Result<SearchOutcome, SimError>
    where
        F: FnMut(&TrainingRecord),
    {
        let mut session = TrainingSession::begin(sim)?;
        let start = session.controller().gains();
        self.records.clear();
        self.best = None;
        self.cancel.clear();
        info!(trials = self.config.trials, "gain search started");

        let mut completed = true;
        for trial in 0..self.config.trials {
            if self.cancel.is_cancelled() {
                completed = false;
                info!(trial, "gain search cancelled");
                break;
            }

            let gains = self.candidate(trial, start);
            let score = evaluate(&mut session, &self.config, gains);
            let record = TrainingRecord { iteration: trial, gains, score };

            if self.best.map_or(true, |(_, best)| score < best) {
                self.best = Some((gains, score));
            }
            let best = self.best.map_or(f64::INFINITY, |(_, s)| s);
            info!(trial, score, best, "trial finished");

            observer(&record);
            self.records.push(record);
        }

        let (best_gains, best_score) = self.best.unwrap_or((start, f64::INFINITY));
        session.controller_mut().set_gains(best_gains);
        drop(session);
        info!(best_score, completed, "gain search finished");

        Ok(SearchOutcome {
            best_gains,
            best_score,
            records: self.records.clone(),
            completed,
        })
    }

    fn candidate(&mut self, trial: usize, start: Gains) -> Gains {
        let bounds = self.config.ranges.bounds();
        if trial == 0 {
            return start;
        }
        if trial < self.config.exploration_trials {
            return Gains::from_array(std::array::from_fn(|i| {
                let (lo, hi) = bounds[i];
                if hi > lo { self.rng.gen_range(lo..=hi) } else { lo }
            }));
        }

        let base = self.best.map_or(start, |(g, _)| g).to_array();
        let spread = self.config.perturbation;
        Gains::from_array(std::array::from_fn(|i| {
            let (lo, hi) = bounds[i];
            let step = spread * (hi - lo);
            let delta = if step > 0.0 { self.rng.gen_range(-step..=step) } else { 0.0 };
            (base[i] + delta).clamp(lo, hi)
        }))
    }
}

/// One trial: fixed start, fixed target, training disturbances, scored trace.
/// Obstacles and projectiles are always off, whatever the profile says.
fn evaluate(sim: &mut SimulationLoop, config: &SearchConfig, gains: Gains) -> f64 {
    let [tx, ty, tz] = config.target;
    sim.controller_mut().set_gains(gains);
    sim.set_target_position(tx, ty, tz);
    sim.set_target_rotation(0.0, 0.0, 0.0);
    sim.field_mut().set_params(DisturbanceParams {
        obstacles_enabled: false,
        projectiles_enabled: false,
        ..config.disturbance
    });
    sim.reset_to(Vector3::from(config.initial_position));

    let trace: Vec<f64> = sim
        .run_for(config.test_duration)
        .iter()
        .map(|s| s.lyapunov.unwrap_or(f64::INFINITY))
        .collect();
    score_trace(&trace, config.settle_threshold, config.settle_window)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::StabilizingController;
    use crate::disturbance::DisturbanceField;
    use crate::dynamics::Airframe;
    use crate::sim::{LoopConfig, Mode};

    fn sim() -> SimulationLoop {
        SimulationLoop::new(
            Airframe::default(),
            StabilizingController::default(),
            DisturbanceField::new(DisturbanceParams::calm(), Some(7)),
            LoopConfig::default(),
        )
    }

    fn quick() -> SearchConfig {
        SearchConfig {
            trials: 8,
            exploration_trials: 4,
            test_duration: 3.0,
            seed: Some(42),
            ..SearchConfig::default()
        }
    }

    #[test]
    fn best_is_running_minimum_and_kept() {
        let mut sim = sim();
        let mut search = GainSearch::new(quick()).unwrap();
        let mut seen = Vec::new();
        let outcome = search.run(&mut sim, |r| seen.push(r.iteration)).unwrap();

        assert!(outcome.completed);
        assert_eq!(seen, (0..8).collect::<Vec<_>>());
        assert_eq!(outcome.records[0].gains, Gains::default());
        assert!(outcome.records.iter().all(|r| r.score >= 0.0));
        let min = outcome.records.iter().map(|r| r.score).fold(f64::INFINITY, f64::min);
        assert_eq!(outcome.best_score, min);
        assert_eq!(sim.controller().gains(), outcome.best_gains);
    }

    #[test]
    fn candidates_stay_in_ranges() {
        let mut sim = sim();
        let config = quick();
        let mut search = GainSearch::new(config).unwrap();
        let outcome = search.run(&mut sim, |_| {}).unwrap();
        for r in &outcome.records[1..] {
            for (g, (lo, hi)) in r.gains.to_array().iter().zip(config.ranges.bounds()) {
                assert!(*g >= lo && *g <= hi);
            }
        }
    }

    #[test]
    fn session_restores_loop_state() {
        let mut sim = sim();
        sim.set_target_position(4.0, 4.0, 4.0);
        sim.start().unwrap();
        let mut search = GainSearch::new(quick()).unwrap();
        search.run(&mut sim, |_| {}).unwrap();

        assert_eq!(sim.mode(), Mode::Running);
        assert_eq!(sim.controller().target_position(), Vector3::new(4.0, 4.0, 4.0));
        assert_eq!(*sim.field().params(), DisturbanceParams::calm());
        assert_eq!(sim.time(), 0.0);
    }

    #[test]
    fn cancel_stops_at_trial_boundary() {
        let mut sim = sim();
        let mut search = GainSearch::new(quick()).unwrap();
        let handle = search.cancel_handle();
        let outcome = search
            .run(&mut sim, |r| {
                if r.iteration == 2 {
                    handle.cancel();
                }
            })
            .unwrap();
        assert!(!outcome.completed);
        assert_eq!(outcome.records.len(), 3);
        assert!(outcome.best_score.is_finite());
        assert_eq!(sim.mode(), Mode::Idle);
    }

    #[test]
    fn rejects_reentry() {
        let mut sim = sim();
        sim.begin_training().unwrap();
        let mut search = GainSearch::new(quick()).unwrap();
        assert_eq!(search.run(&mut sim, |_| {}).unwrap_err(), SimError::AlreadyTraining);
    }

    #[test]
    fn same_seed_same_trace() {
        let a = GainSearch::new(quick()).unwrap().run(&mut sim(), |_| {}).unwrap();
        let b = GainSearch::new(quick()).unwrap().run(&mut sim(), |_| {}).unwrap();
        assert_eq!(a.records, b.records);
    }

    #[test]
    fn trials_ignore_obstacles_in_profile() {
        let mut sim = sim();
        let o = sim.field().obstacles()[0];
        let hover = o.position + Vector3::new(o.radius + 0.1, 0.0, 0.0);
        let mut config = SearchConfig {
            test_duration: 1.0,
            initial_position: [hover.x, hover.y, hover.z],
            target: [hover.x, hover.y, hover.z],
            disturbance: DisturbanceParams::calm(),
            ..SearchConfig::default()
        };

        let clear = evaluate(&mut sim, &config, Gains::default());
        config.disturbance.obstacles_enabled = true;
        let with_flag = evaluate(&mut sim, &config, Gains::default());

        assert_eq!(clear, with_flag);
        assert!(!sim.field().params().obstacles_enabled);
        assert_eq!(sim.field().last_forces().collision, Vector3::zeros());
    }

    #[test]
    fn config_validation() {
        assert!(SearchConfig::default().validate().is_ok());
        assert!(SearchConfig { trials: 0, ..SearchConfig::default() }.validate().is_err());
        let mut bad = SearchConfig::default();
        bad.ranges.low.kp_pos = 20.0;
        assert!(bad.validate().is_err());
    }
}
