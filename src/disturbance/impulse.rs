use std::f64::consts::{FRAC_PI_2, TAU};

use nalgebra::Vector3;
use rand::Rng;
use tracing::debug;

pub const IMPULSE_DURATION: f64 = 0.2; // s, linear fade-out

/// Periodic kicks of fixed magnitude in a random direction.
///
/// Elevation is drawn uniformly in angle, not on the sphere, so kicks are
/// more likely near the vertical than an area-uniform draw would give.
#[derive(Debug, Clone, Default)]
pub struct ImpulseGenerator {
    last_kick: Option<f64>,
    active: Option<Kick>,
}

#[derive(Debug, Clone, Copy)]
struct Kick {
    start: f64,
    vector: Vector3<f64>,
}

impl ImpulseGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force at `time`. `interval` is `None` when impulses are off; a kick
    /// already in progress still fades out.
    pub fn force<R: Rng + ?Sized>(
        &mut self,
        time: f64,
        interval: Option<f64>,
        intensity: f64,
        rng: &mut R,
    ) -> Vector3<f64> {
        let last = *self.last_kick.get_or_insert(time);
        if let Some(interval) = interval {
            if time - last >= interval {
                let azimuth = rng.gen_range(0.0..TAU);
                let elevation = rng.gen_range(-FRAC_PI_2..FRAC_PI_2);
                let vector = Vector3::new(
                    elevation.cos() * azimuth.cos(),
                    elevation.sin(),
                    elevation.cos() * azimuth.sin(),
                ) * intensity;
                debug!(time, x = vector.x, y = vector.y, z = vector.z, "impulse kick");
                self.active = Some(Kick { start: time, vector });
                self.last_kick = Some(time);
            }
        }

        match self.active {
            Some(kick) => {
                let age = time - kick.start;
                if (0.0..IMPULSE_DURATION).contains(&age) {
                    kick.vector * (1.0 - age / IMPULSE_DURATION)
                } else {
                    self.active = None;
                    Vector3::zeros()
                }
            }
            None => Vector3::zeros(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn reset(&mut self) {
        self.last_kick = None;
        self.active = None;
    }
}
