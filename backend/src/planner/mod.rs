//! Model-generated plans
//!
//! - **validator**: accepts, repairs or rejects a candidate schedule
//! - **generator**: asks the model for candidates with bounded retries

pub mod generator;
pub mod validator;

pub use generator::{AiPlanGenerator, GeneratedPlan, GenerationError, PlanContext};
pub use validator::{PlanValidator, Rejection, ValidatedPlan};
