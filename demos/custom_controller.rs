use nalgebra::Vector3;

use drone_sim::control::mixer::mix;
use drone_sim::control::{lyapunov_for_state, ControlOutput, Controller};
use drone_sim::disturbance::{DisturbanceField, DisturbanceParams};
use drone_sim::dynamics::{Airframe, DroneState};
use drone_sim::sim::{LoopConfig, SimulationLoop};

/// Altitude-only PD hold: collective thrust, no attitude control.
struct AltitudeHold {
    target_y: f64,
    kp: f64,
    kd: f64,
}

impl Controller for AltitudeHold {
    fn control(&mut self, state: &DroneState, airframe: &Airframe, _dt: f64) -> ControlOutput {
        let fy = self.kp * (self.target_y - state.position.y) - self.kd * state.velocity.y;
        ControlOutput {
            motor_speeds: mix(fy, &Vector3::zeros(), airframe),
            control_force: Vector3::new(0.0, fy, 0.0),
            ..ControlOutput::default()
        }
    }

    fn name(&self) -> &str {
        "AltitudeHold"
    }
}

fn main() {
    let controller = AltitudeHold { target_y: 3.0, kp: 4.0, kd: 3.0 };
    let name = controller.name().to_string();
    let mut sim = SimulationLoop::new(
        Airframe::default(),
        controller,
        DisturbanceField::new(DisturbanceParams::calm(), Some(1)),
        LoopConfig::default(),
    );

    println!("Simulating with {} controller...", name);
    let samples = sim.run_for(8.0);

    for s in samples.iter().step_by(60) {
        println!("  t={:>5.2}s  y={:>6.3} m  vy={:>6.3} m/s", s.time, s.state.position.y, s.state.velocity.y);
    }
    let last = sim.state();
    println!("Final altitude: {:.3} m (target 3.0 m)", last.position.y);
    let v = lyapunov_for_state(&last, &Vector3::new(0.0, 3.0, 0.0), &Vector3::zeros());
    println!("V against the hover pose: {:.5}", v);
}
