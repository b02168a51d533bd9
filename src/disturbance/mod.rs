pub mod field;
pub mod impulse;
pub mod obstacle;
pub mod params;
pub mod projectile;
pub mod wind;

pub use field::{DisturbanceField, ForceBreakdown};
pub use obstacle::Obstacle;
pub use params::{DisturbanceParams, DisturbanceUpdate};
pub use projectile::Projectile;
