//! Optimization entry point
//!
//! - **request**: caller input, validation and fingerprinting
//! - **engine**: `DebtOptimizer`, orchestrating advisor, simulator and generator
//! - **assembler**: builds the `OptimizationResult` from an accepted plan
//! - **scenario**: deterministic what-if comparisons

pub mod assembler;
pub mod engine;
pub mod request;
pub mod scenario;

pub use assembler::{template_explanation, ResultAssembler};
pub use engine::DebtOptimizer;
pub use request::OptimizationRequest;
pub use scenario::{LumpSum, ScenarioAdjustments, ScenarioComparison, ScenarioOutcome};
