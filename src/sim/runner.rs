use std::collections::VecDeque;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::control::{ControlOutput, Controller, StabilizingController};
use crate::disturbance::{DisturbanceField, DisturbanceParams, DisturbanceUpdate, ForceBreakdown};
use crate::dynamics::{Airframe, DroneState, RigidBody};
use crate::error::SimError;
use crate::sim::event::{
    Advisory, BoundaryDetector, EventDetector, GroundContactDetector, SimEvent, TiltDetector,
};

// ---------------------------------------------------------------------------
// Loop configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub fixed_step: f64,              // s
    pub max_frame: f64,               // s, longest frame credited to the accumulator
    pub max_accumulator: f64,         // s
    pub home: [f64; 3],               // m, reset position
    pub max_horizontal_distance: f64, // m, advisory
    pub max_tilt: f64,                // rad, advisory
    pub event_log_capacity: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            fixed_step: 1.0 / 60.0,
            max_frame: 0.1,
            max_accumulator: 0.25,
            home: [0.0, 1.0, 0.0],
            max_horizontal_distance: 20.0,
            max_tilt: 60f64.to_radians(),
            event_log_capacity: 256,
        }
    }
}

impl LoopConfig {
    pub fn home_position(&self) -> Vector3<f64> {
        Vector3::from(self.home)
    }
}

/// Interactive loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Running,
    Training,
}

/// One recorded tick.
#[derive(Debug, Clone)]
pub struct Sample {
    pub time: f64,
    pub state: DroneState,
    pub lyapunov: Option<f64>,
    pub external_force: Vector3<f64>,
}

/// Read-only snapshot for renderers and UIs.
#[derive(Debug, Clone)]
pub struct Telemetry {
    pub time: f64,
    pub state: DroneState,
    pub forces: ForceBreakdown,
    pub lyapunov: Option<f64>,
    pub desired_angles: Vector3<f64>,
    pub advisory: Advisory,
}

/// What a training session displaced, restored when it ends.
#[derive(Debug, Clone)]
struct SavedSession {
    target_position: Vector3<f64>,
    target_rotation: Vector3<f64>,
    disturbance: DisturbanceParams,
    was_running: bool,
}

// ---------------------------------------------------------------------------
// Fixed-step simulation loop
// ---------------------------------------------------------------------------

/// Owns the body, the controller and the disturbance field. Each tick runs
/// control → motors → external forces → integration, in that order.
pub struct SimulationLoop<C: Controller = StabilizingController> {
    config: LoopConfig,
    body: RigidBody,
    controller: C,
    field: DisturbanceField,
    time: f64,
    accumulator: f64,
    mode: Mode,
    last_output: ControlOutput,
    detectors: Vec<Box<dyn EventDetector>>,
    events: VecDeque<SimEvent>,
    advisory: Advisory,
    saved: Option<SavedSession>,
}

impl<C: Controller> SimulationLoop<C> {
    pub fn new(airframe: Airframe, controller: C, field: DisturbanceField, config: LoopConfig) -> Self {
        let body = RigidBody::new(airframe, DroneState::at_rest(config.home_position()));
        let detectors: Vec<Box<dyn EventDetector>> = vec![
            Box::new(BoundaryDetector::new(config.max_horizontal_distance)),
            Box::new(TiltDetector::new(config.max_tilt)),
            Box::new(GroundContactDetector),
        ];
        Self {
            config,
            body,
            controller,
            field,
            time: 0.0,
            accumulator: 0.0,
            mode: Mode::Idle,
            last_output: ControlOutput::default(),
            detectors,
            events: VecDeque::new(),
            advisory: Advisory::default(),
            saved: None,
        }
    }

    /// Advance one fixed step regardless of mode.
    pub fn step(&mut self) {
        let dt = self.config.fixed_step;
        let prev = self.body.state();

        let output = self.controller.control(&prev, self.body.airframe(), dt);
        self.body.set_motor_speeds(output.motor_speeds);
        let external = self.field.total_external_force(&prev.position, self.time, dt);
        self.body.update(dt, external, Vector3::zeros());

        self.time += dt;
        self.last_output = output;
        self.check_events(&prev);
    }

    /// Credit one frame of wall time and run the fixed steps it pays for.
    /// Does nothing unless the loop is running. Returns the number of steps.
    pub fn advance(&mut self, frame_dt: f64) -> usize {
        if self.mode != Mode::Running {
            return 0;
        }
        // NaN and negative frames credit nothing
        let frame = frame_dt.max(0.0).min(self.config.max_frame);
        self.accumulator = (self.accumulator + frame).min(self.config.max_accumulator);

        let mut steps = 0;
        while self.accumulator >= self.config.fixed_step {
            self.step();
            self.accumulator -= self.config.fixed_step;
            steps += 1;
        }
        steps
    }

    /// Step for `duration` simulated seconds and record every tick.
    pub fn run_for(&mut self, duration: f64) -> Vec<Sample> {
        let steps = (duration.max(0.0) / self.config.fixed_step).round() as usize;
        let mut samples = Vec::with_capacity(steps);
        for _ in 0..steps {
            self.step();
            samples.push(self.sample());
        }
        samples
    }

    fn sample(&self) -> Sample {
        Sample {
            time: self.time,
            state: self.body.state(),
            lyapunov: self.controller.lyapunov_value(),
            external_force: self.field.last_forces().total,
        }
    }

    fn check_events(&mut self, prev: &DroneState) {
        let current = self.body.state();
        for detector in &mut self.detectors {
            if let Some(kind) = detector.check(prev, &current) {
                if self.mode == Mode::Training {
                    debug!(time = self.time, ?kind, "advisory event");
                } else {
                    warn!(time = self.time, ?kind, "advisory event");
                }
                if self.events.len() >= self.config.event_log_capacity {
                    self.events.pop_front();
                }
                self.events.push_back(SimEvent { time: self.time, kind, state: current.clone() });
            }
        }
        self.advisory = Advisory::evaluate(&current, self.config.max_horizontal_distance, self.config.max_tilt);
    }

    /// Put everything back at the start: body at rest at home, integrators,
    /// field transients, clock and event log cleared. Mode is unchanged.
    pub fn reset(&mut self) {
        self.reset_to(self.config.home_position());
    }

    pub fn reset_to(&mut self, position: Vector3<f64>) {
        self.body.reset(position);
        self.controller.reset();
        self.field.reset();
        for detector in &mut self.detectors {
            detector.reset();
        }
        self.time = 0.0;
        self.accumulator = 0.0;
        self.last_output = ControlOutput::default();
        self.events.clear();
        self.advisory = Advisory::evaluate(&self.body.state(), self.config.max_horizontal_distance, self.config.max_tilt);
    }

    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            time: self.time,
            state: self.body.state(),
            forces: self.field.last_forces(),
            lyapunov: self.controller.lyapunov_value(),
            desired_angles: self.last_output.desired_angles,
            advisory: self.advisory,
        }
    }

    // --- Mode ---

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.mode == Mode::Running
    }

    pub fn start(&mut self) -> Result<(), SimError> {
        if self.mode == Mode::Training {
            return Err(SimError::AlreadyTraining);
        }
        self.mode = Mode::Running;
        Ok(())
    }

    /// Stop the interactive loop. Ignored while training.
    pub fn pause(&mut self) {
        if self.mode == Mode::Running {
            self.mode = Mode::Idle;
            self.accumulator = 0.0;
        }
    }

    // --- Accessors ---

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn state(&self) -> DroneState {
        self.body.state()
    }

    pub fn airframe(&self) -> &Airframe {
        self.body.airframe()
    }

    pub fn set_airframe(&mut self, airframe: Airframe) {
        self.body.set_airframe(airframe);
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    pub fn field(&self) -> &DisturbanceField {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut DisturbanceField {
        &mut self.field
    }

    pub fn update_disturbance(&mut self, update: &DisturbanceUpdate) {
        self.field.update_parameters(update);
    }

    pub fn last_output(&self) -> ControlOutput {
        self.last_output
    }

    pub fn events(&self) -> &VecDeque<SimEvent> {
        &self.events
    }

    pub fn add_detector(&mut self, detector: Box<dyn EventDetector>) {
        self.detectors.push(detector);
    }
}

// ---------------------------------------------------------------------------
// Targets and training sessions (default controller)
// ---------------------------------------------------------------------------

impl SimulationLoop<StabilizingController> {
    pub fn set_target_position(&mut self, x: f64, y: f64, z: f64) {
        self.controller.set_target_position(x, y, z);
    }

    pub fn set_target_rotation(&mut self, roll: f64, pitch: f64, yaw: f64) {
        self.controller.set_target_rotation(roll, pitch, yaw);
    }

    pub fn is_training(&self) -> bool {
        self.mode == Mode::Training
    }

    /// Enter training: remember target, disturbance settings and whether the
    /// loop was running, then stop it.
    pub fn begin_training(&mut self) -> Result<(), SimError> {
        if self.mode == Mode::Training {
            return Err(SimError::AlreadyTraining);
        }
        self.saved = Some(SavedSession {
            target_position: self.controller.target_position(),
            target_rotation: self.controller.target_rotation(),
            disturbance: *self.field.params(),
            was_running: self.mode == Mode::Running,
        });
        self.mode = Mode::Training;
        self.accumulator = 0.0;
        Ok(())
    }

    /// Leave training: restore what `begin_training` saved and re-initialize.
    /// Gains are left as they are. No-op outside training.
    pub fn end_training(&mut self) {
        if self.mode != Mode::Training {
            return;
        }
        let was_running = match self.saved.take() {
            Some(saved) => {
                let p = saved.target_position;
                let r = saved.target_rotation;
                self.controller.set_target_position(p.x, p.y, p.z);
                self.controller.set_target_rotation(r.x, r.y, r.z);
                self.field.set_params(saved.disturbance);
                saved.was_running
            }
            None => false,
        };
        self.reset();
        self.mode = if was_running { Mode::Running } else { Mode::Idle };
    }
}

impl Default for SimulationLoop<StabilizingController> {
    fn default() -> Self {
        Self::new(
            Airframe::default(),
            StabilizingController::default(),
            DisturbanceField::default(),
            LoopConfig::default(),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
