//! AI Plan Generator
//!
//! Asks the language model for a complete candidate schedule and runs each
//! reply through the `PlanValidator`. Transport failures, unparseable output
//! and validator rejections are all treated alike: log, wait the configured
//! delay, try again. After `max_attempts` the caller falls back to the
//! deterministic simulator.
//!
//! # Critical Invariants
//!
//! 1. At most `max_attempts` model calls per run
//! 2. No delay after the final attempt
//! 3. The first accepted candidate wins; later attempts are never made

use super::validator::{PlanValidator, ValidatedPlan};
use crate::advisor::context::UserContext;
use crate::advisor::llm::LanguageModel;
use crate::advisor::prompts;
use crate::config::RetryConfig;
use crate::models::debt::DebtRecord;
use crate::models::strategy::Strategy;
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;

/// Everything the model needs to draft one plan
#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    pub debts: &'a [DebtRecord],
    pub strategy: Strategy,
    pub monthly_budget: f64,
    pub extra_payment: f64,
    pub start_date: NaiveDate,
    pub user_context: &'a UserContext,
}

/// Why the model path produced no plan
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Model plan generation is disabled (max_attempts = 0)")]
    Disabled,

    #[error("No valid plan after {attempts} attempts: {last_failure}")]
    Exhausted { attempts: u32, last_failure: String },

    #[error("Model plan generation timed out after {seconds}s")]
    TimedOut { seconds: u64 },
}

/// A validated model plan and the attempt that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPlan {
    pub attempt: u32,
    pub validated: ValidatedPlan,
}

/// Model-backed plan generator with bounded retries
pub struct AiPlanGenerator {
    model: Arc<dyn LanguageModel>,
    validator: PlanValidator,
    retry: RetryConfig,
}

impl AiPlanGenerator {
    pub fn new(model: Arc<dyn LanguageModel>, validator: PlanValidator, retry: RetryConfig) -> Self {
        Self {
            model,
            validator,
            retry,
        }
    }

    /// Run the retry loop, bounded by the configured overall timeout
    pub async fn generate(&self, context: PlanContext<'_>) -> Result<GeneratedPlan, GenerationError> {
        match self.retry.timeout() {
            Some(limit) => tokio::time::timeout(limit, self.attempt_all(context))
                .await
                .unwrap_or_else(|_| {
                    tracing::warn!(seconds = limit.as_secs(), "model plan generation timed out");
                    Err(GenerationError::TimedOut {
                        seconds: limit.as_secs(),
                    })
                }),
            None => self.attempt_all(context).await,
        }
    }

    async fn attempt_all(&self, context: PlanContext<'_>) -> Result<GeneratedPlan, GenerationError> {
        let max_attempts = self.retry.max_attempts;
        if max_attempts == 0 {
            return Err(GenerationError::Disabled);
        }

        let prompt = prompts::plan_generation(
            context.debts,
            context.strategy,
            context.monthly_budget,
            context.extra_payment,
            context.start_date,
            context.user_context,
        );
        let mut last_failure = String::new();

        for attempt in 1..=max_attempts {
            tracing::info!(
                attempt,
                max_attempts,
                model = self.model.model_name(),
                "requesting model plan"
            );

            let outcome = match self.model.complete(&prompt).await {
                Ok(text) => self
                    .validator
                    .validate_text(&text, context.debts, context.start_date)
                    .map_err(|rejection| format!("rejected: {rejection}")),
                Err(err) => Err(format!("model error: {err}")),
            };

            match outcome {
                Ok(validated) => {
                    tracing::info!(
                        attempt,
                        total_months = validated.plan.total_months,
                        repaired = validated.repaired,
                        "model plan accepted"
                    );
                    return Ok(GeneratedPlan { attempt, validated });
                }
                Err(failure) => {
                    tracing::warn!(attempt, max_attempts, %failure, "model plan attempt failed");
                    last_failure = failure;
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.retry.retry_delay()).await;
            }
        }

        Err(GenerationError::Exhausted {
            attempts: max_attempts,
            last_failure,
        })
    }
}
