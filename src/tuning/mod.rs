pub mod record;
pub mod score;
pub mod search;

pub use record::{best_so_far, TrainingRecord};
pub use score::{score_trace, settling_index};
pub use search::{CancelHandle, GainRanges, GainSearch, SearchConfig, SearchOutcome, TrainingSession};
