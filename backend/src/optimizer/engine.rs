//! Debt Optimizer
//!
//! Orchestrates one optimization run.
//!
//! # Architecture
//!
//! ```text
//! validate config + request        (input errors surface here)
//!        |
//! resolve start date, strategy, extra payment   (StrategyAdvisor)
//!        |
//! deterministic simulation         (non-convergence surfaces here)
//!        |
//! minimum-only baseline
//!        |
//! model present? --yes--> AiPlanGenerator --accepted--> AI result
//!        |                       |
//!        no                  exhausted / timed out
//!        |                       |
//!        +-----------> deterministic result (template explanation)
//! ```
//!
//! # Critical Invariants
//!
//! 1. The deterministic plan is always computed, so an unaffordable budget is
//!    reported even when the model would have produced something
//! 2. Model failures never reach the caller; they only change `source` and
//!    `explanation`
//! 3. No state is shared between runs; one optimizer may serve concurrent
//!    requests

use super::assembler::ResultAssembler;
use super::request::OptimizationRequest;
use super::scenario::{ScenarioAdjustments, ScenarioComparison};
use crate::advisor::llm::LanguageModel;
use crate::advisor::strategy::{StrategyAdvisor, StrategyRecommendation};
use crate::config::OptimizerConfig;
use crate::error::OptimizationError;
use crate::models::plan::{OptimizationResult, RepaymentPlan};
use crate::planner::{AiPlanGenerator, PlanContext, PlanValidator};
use crate::simulator::{MinimumOnlyBaseline, PayoffSimulator};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;

/// Entry point for optimization runs
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use debt_optimizer_core::{
///     DebtOptimizer, DebtRecord, OptimizationRequest, OptimizerConfig, PlanSource,
///     StrategyPreference,
/// };
///
/// let request = OptimizationRequest::new(
///     vec![
///         DebtRecord::with_id("card", "Card", 1000.0, 20.0, 50.0),
///         DebtRecord::with_id("loan", "Loan", 2000.0, 6.0, 80.0),
///     ],
///     300.0,
/// )
/// .with_strategy(StrategyPreference::Avalanche)
/// .with_extra_payment(0.0)
/// .with_start_date(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
///
/// let result = DebtOptimizer::new(OptimizerConfig::default())
///     .optimize_deterministic(&request)
///     .unwrap();
///
/// assert_eq!(result.source, PlanSource::Deterministic);
/// assert_eq!(result.payoff_order[0].debt_id, "card");
/// assert!(result.months_saved > 0);
/// ```
#[derive(Clone, Default)]
pub struct DebtOptimizer {
    config: OptimizerConfig,
    model: Option<Arc<dyn LanguageModel>>,
}

/// Strategy, extra payment and start date settled for one run
struct ResolvedRun {
    recommendation: StrategyRecommendation,
    extra_payment: f64,
    start: NaiveDate,
}

impl DebtOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            config,
            model: None,
        }
    }

    /// Attach the language model used for strategy advice and plan generation
    pub fn with_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Full run: advisor, deterministic simulation, then the model path when available
    pub async fn optimize(
        &self,
        request: &OptimizationRequest,
    ) -> Result<OptimizationResult, OptimizationError> {
        self.check_inputs(request)?;

        let advisor = self.advisor();
        let recommendation = advisor
            .resolve(
                request.strategy,
                &request.debts,
                request.monthly_budget,
                &request.user_context,
            )
            .await;
        let run = self.settle(request, recommendation);

        let plan = self.simulate(request, &run)?;
        let assembler = self.assembler(request, &run);

        let Some(model) = &self.model else {
            return Ok(assembler.deterministic(plan));
        };

        let generator = AiPlanGenerator::new(
            Arc::clone(model),
            PlanValidator::new(self.config.validation.clone()),
            self.config.retry.clone(),
        );
        let context = PlanContext {
            debts: &request.debts,
            strategy: run.recommendation.strategy,
            monthly_budget: request.monthly_budget,
            extra_payment: run.extra_payment,
            start_date: run.start,
            user_context: &request.user_context,
        };

        match generator.generate(context).await {
            Ok(generated) => Ok(assembler.ai_generated(generated)),
            Err(err) => {
                tracing::warn!(%err, "falling back to deterministic plan");
                Ok(assembler.deterministic(plan))
            }
        }
    }

    /// Deterministic run; never calls the model (`Auto` uses the heuristic)
    pub fn optimize_deterministic(
        &self,
        request: &OptimizationRequest,
    ) -> Result<OptimizationResult, OptimizationError> {
        self.check_inputs(request)?;
        let run = self.resolve_offline(request);
        let plan = self.simulate(request, &run)?;
        Ok(self.assembler(request, &run).deterministic(plan))
    }

    /// Compare the request as given with a what-if variant; never calls the model
    pub fn simulate_scenario(
        &self,
        request: &OptimizationRequest,
        adjustments: &ScenarioAdjustments,
    ) -> Result<ScenarioComparison, OptimizationError> {
        self.check_inputs(request)?;
        let run = self.resolve_offline(request);
        let simulator = PayoffSimulator::new(self.config.simulation.clone());

        let current = self.simulate(request, &run)?;
        let adjusted = adjustments.apply(request, run.recommendation.strategy, run.extra_payment)?;
        let simulated = simulator.simulate(
            &adjusted.debts,
            adjusted.strategy,
            adjusted.monthly_budget,
            adjusted.extra_payment,
            run.start,
        )?;

        tracing::info!(
            current_months = current.total_months,
            simulated_months = simulated.total_months,
            "scenario simulated"
        );
        Ok(ScenarioComparison::new(
            run.recommendation.strategy,
            &current,
            adjusted.strategy,
            simulated,
        ))
    }

    fn check_inputs(&self, request: &OptimizationRequest) -> Result<(), OptimizationError> {
        self.config.validate()?;
        request.validate()?;
        tracing::info!(
            debts = request.debts.len(),
            monthly_budget = request.monthly_budget,
            preference = %request.strategy,
            "optimization run started"
        );
        Ok(())
    }

    fn advisor(&self) -> StrategyAdvisor {
        let advisor = StrategyAdvisor::new(self.config.advisor.clone());
        match &self.model {
            Some(model) => advisor.with_model(Arc::clone(model)),
            None => advisor,
        }
    }

    fn resolve_offline(&self, request: &OptimizationRequest) -> ResolvedRun {
        let recommendation = self.advisor().resolve_offline(
            request.strategy,
            &request.debts,
            request.monthly_budget,
        );
        self.settle(request, recommendation)
    }

    /// A caller-supplied extra payment always wins over a suggested one
    fn settle(
        &self,
        request: &OptimizationRequest,
        recommendation: StrategyRecommendation,
    ) -> ResolvedRun {
        let extra_payment = request
            .extra_payment
            .or(recommendation.suggested_extra_payment)
            .unwrap_or(0.0);
        let start = request.resolved_start_date(Utc::now().date_naive());

        tracing::info!(
            strategy = %recommendation.strategy,
            source = ?recommendation.source,
            extra_payment,
            %start,
            "strategy resolved"
        );
        ResolvedRun {
            recommendation,
            extra_payment,
            start,
        }
    }

    fn simulate(
        &self,
        request: &OptimizationRequest,
        run: &ResolvedRun,
    ) -> Result<RepaymentPlan, OptimizationError> {
        let plan = PayoffSimulator::new(self.config.simulation.clone()).simulate(
            &request.debts,
            run.recommendation.strategy,
            request.monthly_budget,
            run.extra_payment,
            run.start,
        )?;
        Ok(plan)
    }

    fn assembler(&self, request: &OptimizationRequest, run: &ResolvedRun) -> ResultAssembler {
        let baseline = MinimumOnlyBaseline::new(self.config.simulation.clone()).calculate(&request.debts);
        if !baseline.converged {
            tracing::debug!(
                months = baseline.total_months,
                "minimum-only baseline did not converge within the horizon"
            );
        }

        ResultAssembler {
            strategy: run.recommendation.strategy,
            extra_payment: run.extra_payment,
            baseline,
            input_fingerprint: request.fingerprint(
                run.recommendation.strategy,
                run.extra_payment,
                run.start,
            ),
        }
    }
}
