pub mod event;
pub mod runner;

pub use event::{Advisory, EventDetector, EventKind, SimEvent};
pub use runner::{LoopConfig, Mode, Sample, SimulationLoop, Telemetry};
