pub mod controller;
pub mod gains;
pub mod lyapunov;
pub mod mixer;
pub mod pid;
pub mod stabilizer;

pub use controller::{ControlOutput, Controller};
pub use gains::{ControllerLimits, Gains, MAX_GAIN};
pub use lyapunov::{lyapunov_for_state, lyapunov_value, rotation_error};
pub use pid::{PidTerms, VectorPid};
pub use stabilizer::StabilizingController;
