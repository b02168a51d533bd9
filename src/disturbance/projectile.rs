use std::f64::consts::{FRAC_PI_2, TAU};

use nalgebra::Vector3;
use rand::Rng;
use tracing::debug;

use crate::disturbance::obstacle::GEOMETRY_EPS;
use crate::dynamics::state::G0;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const SPAWN_RADIUS: f64 = 15.0; // m from the drone
pub const PROJECTILE_SPEED: f64 = 8.0; // m/s
pub const HIT_RADIUS: f64 = 0.5; // m
pub const RESTITUTION: f64 = 0.6;
pub const IMPACT_FORCE: f64 = 15.0; // N, single tick
pub const BOUNCE_JITTER: f64 = 1.0; // m/s per axis
pub const MAX_SPIN: f64 = 10.0; // rad/s per axis
pub const AIR_DECAY: f64 = 0.5; // 1/s, horizontal, falling only
pub const GROUND_HEIGHT: f64 = 0.0; // m
pub const MAX_RANGE: f64 = 100.0; // m from origin
pub const MAX_LIFETIME: f64 = 10.0; // s
pub const MAX_PROJECTILES: usize = 32;

// ---------------------------------------------------------------------------
// Projectile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: u64,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub rotation: Vector3<f64>, // rad, cosmetic
    pub spin: Vector3<f64>,     // rad/s, cosmetic
    pub has_collided: bool,
    pub is_falling: bool,
    pub spawn_time: f64,
}

impl Projectile {
    /// On a sphere of `SPAWN_RADIUS` around `target`, heading straight at it.
    /// Elevation is uniform in angle.
    pub fn spawn<R: Rng + ?Sized>(id: u64, target: &Vector3<f64>, time: f64, rng: &mut R) -> Self {
        let azimuth = rng.gen_range(0.0..TAU);
        let elevation = rng.gen_range(-FRAC_PI_2..FRAC_PI_2);
        let outward = Vector3::new(
            elevation.cos() * azimuth.cos(),
            elevation.sin(),
            elevation.cos() * azimuth.sin(),
        );
        Self {
            id,
            position: target + outward * SPAWN_RADIUS,
            velocity: -outward * PROJECTILE_SPEED,
            rotation: Vector3::zeros(),
            spin: Vector3::zeros(),
            has_collided: false,
            is_falling: false,
            spawn_time: time,
        }
    }

    /// Advance one tick against a drone at `drone`. Returns the impact force
    /// on the tick the hit happens, zero otherwise. A projectile hits at most
    /// once.
    pub fn step<R: Rng + ?Sized>(&mut self, drone: &Vector3<f64>, dt: f64, rng: &mut R) -> Vector3<f64> {
        self.rotation += self.spin * dt;

        if self.has_collided {
            self.velocity.y -= G0 * dt;
            let decay = (1.0 - AIR_DECAY * dt).max(0.0);
            self.velocity.x *= decay;
            self.velocity.z *= decay;
            self.position += self.velocity * dt;
            return Vector3::zeros();
        }

        self.position += self.velocity * dt;
        let offset = self.position - drone;
        let distance = offset.norm();
        if distance >= HIT_RADIUS {
            return Vector3::zeros();
        }

        let incoming = self.velocity;
        let speed = incoming.norm();
        let impact = if speed > GEOMETRY_EPS {
            incoming / speed * IMPACT_FORCE
        } else {
            Vector3::zeros()
        };

        let normal = if distance > GEOMETRY_EPS {
            offset / distance
        } else if speed > GEOMETRY_EPS {
            -incoming / speed
        } else {
            Vector3::y()
        };
        let reflected = incoming - normal * (2.0 * incoming.dot(&normal));
        let jitter = Vector3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        ) * BOUNCE_JITTER;
        self.velocity = reflected * RESTITUTION + jitter;
        self.spin = Vector3::new(
            rng.gen_range(-MAX_SPIN..=MAX_SPIN),
            rng.gen_range(-MAX_SPIN..=MAX_SPIN),
            rng.gen_range(-MAX_SPIN..=MAX_SPIN),
        );
        self.has_collided = true;
        self.is_falling = true;
        debug!(id = self.id, fx = impact.x, fy = impact.y, fz = impact.z, "projectile impact");
        impact
    }

    /// Past any of the lifetime bounds.
    pub fn expired(&self, time: f64) -> bool {
        (self.is_falling && self.position.y < GROUND_HEIGHT)
            || self.position.norm() > MAX_RANGE
            || time - self.spawn_time > MAX_LIFETIME
    }
}
