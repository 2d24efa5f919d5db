//! Domain models for the debt optimizer

pub mod debt;
pub mod plan;
pub mod strategy;

// Re-exports
pub use debt::DebtRecord;
pub use plan::{
    DebtPayoffInfo, MonthlyBreakdown, OptimizationResult, PaymentScheduleItem, PlanProjection,
    PlanSource, RepaymentPlan,
};
pub use strategy::{Strategy, StrategyPreference};
