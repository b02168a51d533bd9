//! Quadrotor rigid-body simulation with a Lyapunov-certified cascaded
//! controller, a disturbance field and an automatic gain search.
//!
//! Frame: y up. One [`sim::SimulationLoop`] owns the body, the controller and
//! the disturbance field; [`tuning::GainSearch`] borrows it for training.

pub mod config;
pub mod control;
pub mod disturbance;
pub mod dynamics;
pub mod error;
pub mod io;
pub mod sim;
pub mod tuning;

pub use config::Settings;
pub use control::{Controller, Gains, StabilizingController};
pub use disturbance::{DisturbanceField, DisturbanceParams};
pub use dynamics::{Airframe, DroneState, RigidBody};
pub use error::{ConfigError, SimError};
pub use sim::SimulationLoop;
pub use tuning::GainSearch;
