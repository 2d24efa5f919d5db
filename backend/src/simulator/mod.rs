//! Deterministic payoff simulation
//!
//! - **engine**: the month-by-month payoff simulator
//! - **baseline**: the minimum-only comparison run
//!
//! Both are pure, synchronous and bounded by `SimulationConfig::max_months`.

pub mod baseline;
pub mod engine;

pub use baseline::{BaselineOutcome, MinimumOnlyBaseline};
pub use engine::{PayoffSimulator, SimulationError};
