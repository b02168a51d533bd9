use nalgebra::Vector3;
use rand::Rng;

pub const OBSTACLE_COUNT: usize = 8;
pub const COLLISION_DISTANCE: f64 = 0.3; // m, margin outside the sphere
pub const OBSTACLE_STIFFNESS: f64 = 50.0; // N/m
pub(crate) const GEOMETRY_EPS: f64 = 1e-6; // m

/// Static sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub position: Vector3<f64>,
    pub radius: f64,
}

impl Obstacle {
    /// Spring push along obstacle → drone once the drone is inside
    /// `radius + COLLISION_DISTANCE`. Zero at the exact center.
    pub fn repulsion(&self, drone: &Vector3<f64>) -> Vector3<f64> {
        let offset = drone - self.position;
        let distance = offset.norm();
        let reach = self.radius + COLLISION_DISTANCE;
        if distance >= reach || distance <= GEOMETRY_EPS {
            return Vector3::zeros();
        }
        offset / distance * (OBSTACLE_STIFFNESS * (reach - distance))
    }
}

/// Scatter obstacles over the flight area, clear of the floor.
pub fn generate_obstacles<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Obstacle> {
    (0..count)
        .map(|_| Obstacle {
            position: Vector3::new(
                rng.gen_range(-8.0..=8.0),
                rng.gen_range(1.0..=6.0),
                rng.gen_range(-8.0..=8.0),
            ),
            radius: rng.gen_range(0.3..=1.0),
        })
        .collect()
}
