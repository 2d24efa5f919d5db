//! Debt Optimizer Core - Rust Engine
//!
//! Repayment-optimization engine with a deterministic amortization simulator
//! and a validated, fallback-protected language-model path.
//!
//! # Architecture
//!
//! - **core**: Money rounding, interest accrual and the month calendar
//! - **models**: Domain types (DebtRecord, Strategy, schedules, results)
//! - **simulator**: Deterministic payoff simulator and minimum-only baseline
//! - **advisor**: Language-model seam and the strategy advisor
//! - **planner**: Model plan generation and the plan validator
//! - **optimizer**: Run orchestration, result assembly, what-if scenarios
//!
//! # Critical Invariants
//!
//! 1. `total_paid = total_interest + sum(input balances)` within a cent per debt
//! 2. `total_remaining` never increases month over month
//! 3. `payoff_order` covers every input debt exactly once
//! 4. The simulator always terminates (hard month cap)
//! 5. Model failures degrade the explanation, never the numbers

// Module declarations
pub mod advisor;
pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod optimizer;
pub mod planner;
pub mod simulator;

// Re-exports for convenience
pub use advisor::{
    LanguageModel, ModelError, OpenAiClient, Prompt, RecommendationSource, StrategyAdvisor,
    StrategyRecommendation, UserContext,
};
pub use config::{AdvisorConfig, OptimizerConfig, RetryConfig, SimulationConfig, ValidationConfig};
pub use error::OptimizationError;
pub use models::{
    DebtPayoffInfo, DebtRecord, MonthlyBreakdown, OptimizationResult, PaymentScheduleItem,
    PlanProjection, PlanSource, RepaymentPlan, Strategy, StrategyPreference,
};
pub use optimizer::{
    template_explanation, DebtOptimizer, LumpSum, OptimizationRequest, ScenarioAdjustments,
    ScenarioComparison, ScenarioOutcome,
};
pub use planner::{
    AiPlanGenerator, GeneratedPlan, GenerationError, PlanContext, PlanValidator, Rejection,
    ValidatedPlan,
};
pub use simulator::{BaselineOutcome, MinimumOnlyBaseline, PayoffSimulator, SimulationError};
