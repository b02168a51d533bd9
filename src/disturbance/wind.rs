use nalgebra::Vector3;
use rand::Rng;

use crate::disturbance::params::DisturbanceParams;

pub const WIND_DRAG: f64 = 0.3; // N per m/s of wind
pub const WIND_BASE_FREQ: f64 = 0.5; // rad/s
const VERTICAL_GUST: f64 = 0.2; // fraction of wind speed
const VERTICAL_NOISE: f64 = 0.05; // fraction of wind speed

/// Wind force at `time`.
///
/// Horizontal base from speed and heading, a slow vertical sinusoid with
/// period 4π/ω, and per-axis turbulence. Every term scales with wind speed,
/// so calm air yields an exact zero.
pub fn wind_force<R: Rng + ?Sized>(params: &DisturbanceParams, time: f64, rng: &mut R) -> Vector3<f64> {
    let speed = params.wind_speed;
    if speed <= 0.0 {
        return Vector3::zeros();
    }

    let heading = params.wind_direction.to_radians();
    let base = Vector3::new(heading.cos(), 0.0, heading.sin()) * speed;

    let vertical = speed
        * (VERTICAL_GUST * (0.5 * WIND_BASE_FREQ * time).sin()
            + VERTICAL_NOISE * rng.gen_range(-1.0..=1.0));

    let turbulence = Vector3::new(
        rng.gen_range(-1.0..=1.0),
        rng.gen_range(-1.0..=1.0),
        rng.gen_range(-1.0..=1.0),
    ) * (params.wind_turbulence * speed);

    (base + Vector3::new(0.0, vertical, 0.0) + turbulence) * WIND_DRAG
}
