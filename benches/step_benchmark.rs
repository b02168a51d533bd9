//! Cost of one closed-loop tick and of its pieces.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::Vector3;

use drone_sim::control::StabilizingController;
use drone_sim::disturbance::{DisturbanceField, DisturbanceParams};
use drone_sim::dynamics::{Airframe, DroneState, RigidBody};
use drone_sim::sim::{LoopConfig, SimulationLoop};

const DT: f64 = 1.0 / 60.0;

fn bench_rigid_body(c: &mut Criterion) {
    let mut body = RigidBody::new(Airframe::default(), DroneState::at_rest(Vector3::new(0.0, 2.0, 0.0)));
    body.set_motor_speeds([0.5, 0.49, 0.5, 0.51]);
    c.bench_function("rigid_body_update", |b| {
        b.iter(|| body.update(black_box(DT), black_box(Vector3::new(0.1, 0.0, -0.1)), Vector3::zeros()))
    });
}

fn bench_controller(c: &mut Criterion) {
    let airframe = Airframe::default();
    let mut controller = StabilizingController::default();
    let mut state = DroneState::at_rest(Vector3::new(2.0, 3.0, -1.5));
    state.velocity = Vector3::new(0.3, -0.1, 0.2);
    c.bench_function("compute_control", |b| {
        b.iter(|| controller.compute_control(black_box(&state), &airframe, DT))
    });
}

fn bench_full_tick(c: &mut Criterion) {
    let mut sim = SimulationLoop::new(
        Airframe::default(),
        StabilizingController::default(),
        DisturbanceField::new(DisturbanceParams::default(), Some(3)),
        LoopConfig::default(),
    );
    c.bench_function("simulation_step", |b| b.iter(|| sim.step()));
}

criterion_group!(benches, bench_rigid_body, bench_controller, bench_full_tick);
criterion_main!(benches);
