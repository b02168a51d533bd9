pub mod rigid_body;
pub mod state;

pub use rigid_body::RigidBody;
pub use state::{normalize_angle, Airframe, DroneState, FLOOR_HEIGHT, G0};
