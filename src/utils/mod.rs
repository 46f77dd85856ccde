pub mod constants;
pub mod coordinates;
pub mod progress;

pub use constants::*;
pub use coordinates::{format_readout, parse_degrees, round_degrees, same_position};
pub use progress::ProgressReporter;
