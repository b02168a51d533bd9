use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::disturbance::impulse::ImpulseGenerator;
use crate::disturbance::obstacle::{generate_obstacles, Obstacle, OBSTACLE_COUNT};
use crate::disturbance::params::{DisturbanceParams, DisturbanceUpdate};
use crate::disturbance::projectile::{Projectile, MAX_PROJECTILES};
use crate::disturbance::wind::wind_force;

/// Per-source decomposition of the external force for the latest tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ForceBreakdown {
    pub wind: Vector3<f64>,
    pub impulse: Vector3<f64>,
    pub collision: Vector3<f64>,
    pub projectile: Vector3<f64>,
    pub total: Vector3<f64>,
}

// ---------------------------------------------------------------------------
// Disturbance field
// ---------------------------------------------------------------------------

/// Every external force acting on the drone, as a function of simulated time
/// and drone position. All randomness comes from one seedable RNG.
#[derive(Debug, Clone)]
pub struct DisturbanceField {
    params: DisturbanceParams,
    rng: StdRng,
    impulses: ImpulseGenerator,
    obstacles: Vec<Obstacle>,
    projectiles: Vec<Projectile>,
    next_projectile_id: u64,
    last_spawn: Option<f64>,
    last: ForceBreakdown,
}

impl DisturbanceField {
    /// `seed = None` draws the seed from the OS.
    pub fn new(params: DisturbanceParams, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let obstacles = generate_obstacles(&mut rng, OBSTACLE_COUNT);
        Self {
            params,
            rng,
            impulses: ImpulseGenerator::new(),
            obstacles,
            projectiles: Vec::new(),
            next_projectile_id: 0,
            last_spawn: None,
            last: ForceBreakdown::default(),
        }
    }

    pub fn params(&self) -> &DisturbanceParams {
        &self.params
    }

    /// Replace the whole parameter set.
    pub fn set_params(&mut self, params: DisturbanceParams) {
        self.params = params;
    }

    pub fn update_parameters(&mut self, update: &DisturbanceUpdate) {
        self.params.apply(update);
    }

    /// Sum of every source for this tick. The breakdown is kept until the next
    /// call.
    pub fn total_external_force(&mut self, drone: &Vector3<f64>, time: f64, dt: f64) -> Vector3<f64> {
        let wind = wind_force(&self.params, time, &mut self.rng);

        let impulse = self.impulses.force(
            time,
            self.params.impulse_interval(),
            self.params.impulse_intensity,
            &mut self.rng,
        );

        let collision: Vector3<f64> = if self.params.obstacles_enabled {
            self.obstacles.iter().map(|o| o.repulsion(drone)).sum()
        } else {
            Vector3::zeros()
        };

        let projectile = self.update_projectiles(drone, time, dt);

        let total = wind + impulse + collision + projectile;
        self.last = ForceBreakdown { wind, impulse, collision, projectile, total };
        total
    }

    fn update_projectiles(&mut self, drone: &Vector3<f64>, time: f64, dt: f64) -> Vector3<f64> {
        if self.params.projectiles_enabled {
            let last = *self.last_spawn.get_or_insert(time);
            if time - last >= self.params.projectile_interval {
                self.launch_projectile(drone, time);
            }
        }

        // In-flight projectiles keep moving even after spawning is switched off
        let mut force = Vector3::zeros();
        for p in &mut self.projectiles {
            force += p.step(drone, dt, &mut self.rng);
        }
        self.projectiles.retain(|p| !p.expired(time));
        force
    }

    /// Throw one projectile at `drone` now. Returns its id, or `None` when the
    /// in-flight set is full.
    pub fn launch_projectile(&mut self, drone: &Vector3<f64>, time: f64) -> Option<u64> {
        self.last_spawn = Some(time);
        if self.projectiles.len() >= MAX_PROJECTILES {
            return None;
        }
        let id = self.next_projectile_id;
        self.next_projectile_id += 1;
        let p = Projectile::spawn(id, drone, time, &mut self.rng);
        debug!(id, x = p.position.x, y = p.position.y, z = p.position.z, "projectile spawned");
        self.projectiles.push(p);
        Some(id)
    }

    pub fn last_forces(&self) -> ForceBreakdown {
        self.last
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn active_projectiles(&self) -> Vec<Projectile> {
        self.projectiles.clone()
    }

    /// Clear transient state. Obstacles and parameters are kept.
    pub fn reset(&mut self) {
        self.impulses.reset();
        self.projectiles.clear();
        self.last_spawn = None;
        self.last = ForceBreakdown::default();
    }
}

impl Default for DisturbanceField {
    fn default() -> Self {
        Self::new(DisturbanceParams::default(), None)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disturbance::projectile::SPAWN_RADIUS;

    const DT: f64 = 1.0 / 60.0;

    #[test]
    fn calm_field_is_silent() {
        let mut field = DisturbanceField::new(DisturbanceParams::calm(), Some(1));
        let drone = field.obstacles()[0].position;
        for i in 0..600 {
            let f = field.total_external_force(&drone, i as f64 * DT, DT);
            assert_eq!(f, Vector3::zeros());
        }
        assert_eq!(field.last_forces(), ForceBreakdown::default());
    }

    #[test]
    fn breakdown_sums_to_total() {
        let params = DisturbanceParams {
            wind_speed: 8.0,
            impulse_frequency: 2.0,
            impulse_intensity: 20.0,
            ..DisturbanceParams::default()
        };
        let mut field = DisturbanceField::new(params, Some(2));
        let drone = field.obstacles()[0].position + Vector3::new(0.1, 0.0, 0.0);
        for i in 0..300 {
            let total = field.total_external_force(&drone, i as f64 * DT, DT);
            let b = field.last_forces();
            assert!((b.wind + b.impulse + b.collision + b.projectile - total).norm() < 1e-12);
            assert!(b.collision.norm() > 0.0);
        }
    }

    #[test]
    fn projectile_hits_exactly_once() {
        let mut field = DisturbanceField::new(DisturbanceParams::calm(), Some(4));
        let drone = Vector3::new(0.0, 5.0, 0.0);
        let id = field.launch_projectile(&drone, 0.0);
        assert_eq!(id, Some(0));
        let start = field.active_projectiles()[0].clone();
        assert!(((start.position - drone).norm() - SPAWN_RADIUS).abs() < 1e-9);

        let mut hits = 0;
        let mut fell = 0;
        let mut was_falling = false;
        for i in 1..=600 {
            field.total_external_force(&drone, i as f64 * DT, DT);
            if field.last_forces().projectile.norm() > 0.0 {
                hits += 1;
            }
            let falling = field.active_projectiles().first().map_or(was_falling, |p| p.is_falling);
            if falling && !was_falling {
                fell += 1;
            }
            was_falling = falling;
        }
        assert_eq!(hits, 1);
        assert_eq!(fell, 1);
        assert!(field.active_projectiles().is_empty(), "removed once on the ground or timed out");
    }

    #[test]
    fn periodic_spawning_and_reset() {
        let params = DisturbanceParams {
            projectiles_enabled: true,
            projectile_interval: 1.0,
            ..DisturbanceParams::calm()
        };
        let mut field = DisturbanceField::new(params, Some(6));
        let drone = Vector3::new(0.0, 5.0, 0.0);
        for i in 0..=150 {
            field.total_external_force(&drone, i as f64 * DT, DT);
        }
        assert!(!field.active_projectiles().is_empty());
        field.reset();
        assert!(field.active_projectiles().is_empty());
        assert_eq!(field.last_forces(), ForceBreakdown::default());
    }

    #[test]
    fn same_seed_same_forces() {
        let params = DisturbanceParams { wind_speed: 6.0, wind_turbulence: 0.8, ..DisturbanceParams::default() };
        let mut a = DisturbanceField::new(params, Some(11));
        let mut b = DisturbanceField::new(params, Some(11));
        let drone = Vector3::new(0.0, 2.0, 0.0);
        for i in 0..120 {
            let t = i as f64 * DT;
            assert_eq!(a.total_external_force(&drone, t, DT), b.total_external_force(&drone, t, DT));
        }
    }
}
