//! Strategy Advisor
//!
//! Resolves the caller's strategy preference into a concrete `Strategy`.
//!
//! ```text
//! Avalanche / Snowball  ->  used as given                  (source: Caller)
//! Auto + model          ->  model recommendation            (source: Model)
//! Auto, model fails     ->  APR-threshold heuristic         (source: Heuristic)
//! Auto, no model        ->  APR-threshold heuristic         (source: Heuristic)
//! ```
//!
//! The advisor never fails: a model problem degrades the recommendation, not
//! the run.

use super::context::UserContext;
use super::llm::{extract_json_object, LanguageModel};
use super::prompts;
use crate::config::AdvisorConfig;
use crate::models::debt::DebtRecord;
use crate::models::strategy::{Strategy, StrategyPreference};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Where a recommendation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Caller,
    Model,
    Heuristic,
}

/// A resolved strategy with supporting detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRecommendation {
    pub strategy: Strategy,
    pub reasoning: String,
    pub confidence: Option<f64>,
    pub suggested_extra_payment: Option<f64>,
    pub source: RecommendationSource,
}

/// Shape the model is asked to return
#[derive(Debug, Deserialize)]
struct ModelRecommendation {
    strategy: String,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    suggested_extra_payment: Option<f64>,
}

/// Chooses avalanche or snowball
pub struct StrategyAdvisor {
    model: Option<Arc<dyn LanguageModel>>,
    config: AdvisorConfig,
}

impl StrategyAdvisor {
    pub fn new(config: AdvisorConfig) -> Self {
        Self {
            model: None,
            config,
        }
    }

    pub fn with_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Resolve `preference`, consulting the model only for `Auto`
    pub async fn resolve(
        &self,
        preference: StrategyPreference,
        debts: &[DebtRecord],
        monthly_budget: f64,
        context: &UserContext,
    ) -> StrategyRecommendation {
        if let Some(strategy) = preference.fixed() {
            return Self::caller_choice(strategy);
        }

        match &self.model {
            Some(model) => self.recommend(model.as_ref(), debts, monthly_budget, context).await,
            None => self.heuristic(debts, monthly_budget),
        }
    }

    /// Resolve `preference` without any model call
    pub fn resolve_offline(
        &self,
        preference: StrategyPreference,
        debts: &[DebtRecord],
        monthly_budget: f64,
    ) -> StrategyRecommendation {
        match preference.fixed() {
            Some(strategy) => Self::caller_choice(strategy),
            None => self.heuristic(debts, monthly_budget),
        }
    }

    fn caller_choice(strategy: Strategy) -> StrategyRecommendation {
        StrategyRecommendation {
            strategy,
            reasoning: format!("The {} strategy was requested explicitly.", strategy),
            confidence: None,
            suggested_extra_payment: None,
            source: RecommendationSource::Caller,
        }
    }

    async fn recommend(
        &self,
        model: &dyn LanguageModel,
        debts: &[DebtRecord],
        monthly_budget: f64,
        context: &UserContext,
    ) -> StrategyRecommendation {
        let prompt = prompts::strategy_recommendation(debts, monthly_budget, context);

        let parsed = match model.complete(&prompt).await {
            Ok(text) => Self::parse_recommendation(&text),
            Err(err) => Err(err.to_string()),
        };

        match parsed {
            Ok(recommendation) => {
                tracing::info!(
                    strategy = %recommendation.strategy,
                    model = model.model_name(),
                    "model recommended strategy"
                );
                recommendation
            }
            Err(reason) => {
                tracing::warn!(%reason, "strategy recommendation failed, using heuristic");
                self.heuristic(debts, monthly_budget)
            }
        }
    }

    /// Parse a model reply; `Err` carries the reason for the log
    fn parse_recommendation(text: &str) -> Result<StrategyRecommendation, String> {
        let json = extract_json_object(text).ok_or("no JSON object in response")?;
        let raw: ModelRecommendation =
            serde_json::from_str(json).map_err(|e| format!("malformed recommendation: {}", e))?;
        let strategy: Strategy = raw.strategy.parse()?;

        Ok(StrategyRecommendation {
            strategy,
            reasoning: raw
                .reasoning
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| format!("The model recommended the {} strategy.", strategy)),
            confidence: raw
                .confidence
                .filter(|c| c.is_finite())
                .map(|c| c.clamp(0.0, 1.0)),
            suggested_extra_payment: raw
                .suggested_extra_payment
                .filter(|e| e.is_finite() && *e >= 0.0),
            source: RecommendationSource::Model,
        })
    }

    /// Deterministic fallback
    ///
    /// Avalanche when the highest APR among open debts exceeds the threshold,
    /// snowball otherwise. Suggested extra = share x max(0, budget - minimums).
    ///
    /// # Example
    /// ```
    /// use debt_optimizer_core::{AdvisorConfig, DebtRecord, Strategy, StrategyAdvisor};
    ///
    /// let advisor = StrategyAdvisor::new(AdvisorConfig::default());
    /// let debts = vec![
    ///     DebtRecord::with_id("a", "Card", 800.0, 24.0, 40.0),
    ///     DebtRecord::with_id("b", "Car", 9000.0, 5.0, 210.0),
    /// ];
    /// let rec = advisor.heuristic(&debts, 500.0);
    /// assert_eq!(rec.strategy, Strategy::Avalanche);
    /// assert_eq!(rec.suggested_extra_payment, Some(25.0));
    /// ```
    pub fn heuristic(&self, debts: &[DebtRecord], monthly_budget: f64) -> StrategyRecommendation {
        let open = || debts.iter().filter(|d| d.balance > 0.0);
        let highest_apr = open().map(|d| d.apr).fold(0.0, f64::max);
        let total_minimum: f64 = open().map(|d| d.minimum_payment).sum();

        let strategy = if highest_apr > self.config.avalanche_apr_threshold {
            Strategy::Avalanche
        } else {
            Strategy::Snowball
        };
        let reasoning = match strategy {
            Strategy::Avalanche => format!(
                "Highest APR of {:.1}% is above {:.1}%, so paying it down first saves the most interest.",
                highest_apr, self.config.avalanche_apr_threshold
            ),
            Strategy::Snowball => format!(
                "No APR exceeds {:.1}%, so clearing the smallest balances first builds momentum at little extra cost.",
                self.config.avalanche_apr_threshold
            ),
        };

        StrategyRecommendation {
            strategy,
            reasoning,
            confidence: None,
            suggested_extra_payment: Some(
                (monthly_budget - total_minimum).max(0.0) * self.config.default_extra_share,
            ),
            source: RecommendationSource::Heuristic,
        }
    }
}
