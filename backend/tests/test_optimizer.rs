//! Debt Optimizer Tests
//!
//! End-to-end runs through `DebtOptimizer`: deterministic path, model path,
//! retries, timeouts and the fallback between them.

use async_trait::async_trait;
use chrono::NaiveDate;
use debt_optimizer_core::{
    DebtOptimizer, DebtRecord, LanguageModel, ModelError, OptimizationError, OptimizationRequest,
    OptimizerConfig, PayoffSimulator, PlanSource, Prompt, RetryConfig, Strategy,
    StrategyPreference,
};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Test Helpers
// ============================================================================

/// Replays canned replies in order, then reports an empty response
#[derive(Default)]
struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedModel {
    fn new(replies: Vec<Result<String, ModelError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Default::default()
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, _prompt: &Prompt) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ModelError::EmptyResponse))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
}

fn debts() -> Vec<DebtRecord> {
    vec![
        DebtRecord::with_id("card", "Card", 1000.0, 20.0, 50.0),
        DebtRecord::with_id("loan", "Loan", 2000.0, 6.0, 80.0),
    ]
}

fn request() -> OptimizationRequest {
    OptimizationRequest::new(debts(), 300.0)
        .with_strategy(StrategyPreference::Avalanche)
        .with_start_date(start())
}

/// A candidate the validator accepts, as the model would send it
fn valid_candidate_text() -> String {
    let plan = PayoffSimulator::default()
        .simulate(&debts(), Strategy::Avalanche, 300.0, 0.0, start())
        .unwrap();
    let mut value = serde_json::to_value(&plan).unwrap();
    value["ai_explanation"] = json!("Knock out the card, then roll into the loan.");
    value["key_insights"] = json!(["The card is gone by May", "Debt-free by November"]);
    format!("```json\n{}\n```", value)
}

fn fast_retries() -> OptimizerConfig {
    OptimizerConfig {
        retry: RetryConfig {
            max_attempts: 3,
            retry_delay_ms: 1,
            timeout_secs: None,
        },
        ..OptimizerConfig::default()
    }
}

fn optimizer_with(model: Arc<ScriptedModel>, config: OptimizerConfig) -> DebtOptimizer {
    DebtOptimizer::new(config).with_model(model)
}

// ============================================================================
// Input errors
// ============================================================================

#[tokio::test]
async fn test_input_errors_surface_before_any_model_call() {
    let model = ScriptedModel::new(vec![]);
    let optimizer = optimizer_with(model.clone(), fast_retries());

    let empty = OptimizationRequest::new(Vec::new(), 300.0);
    assert_eq!(
        optimizer.optimize(&empty).await.unwrap_err(),
        OptimizationError::NoDebts
    );

    let broke = OptimizationRequest::new(debts(), 0.0);
    assert_eq!(
        optimizer.optimize(&broke).await.unwrap_err(),
        OptimizationError::InvalidBudget(0.0)
    );

    let mut bad_apr = debts();
    bad_apr[0].apr = 140.0;
    assert!(matches!(
        optimizer
            .optimize(&OptimizationRequest::new(bad_apr, 300.0))
            .await
            .unwrap_err(),
        OptimizationError::InvalidDebt { .. }
    ));

    assert_eq!(model.calls(), 0);
}

#[test]
fn test_minimum_only_baseline_at_horizon_is_flagged() {
    // 24% on 10,000 accrues 200 a month; the 150 minimum never catches up
    let request = OptimizationRequest::new(
        vec![DebtRecord::with_id("x", "Card", 10_000.0, 24.0, 150.0)],
        1000.0,
    )
    .with_strategy(StrategyPreference::Avalanche)
    .with_start_date(start());

    let result = DebtOptimizer::default()
        .optimize_deterministic(&request)
        .unwrap();

    assert!(!result.baseline_converged);
    assert_eq!(result.months_saved, 600 - result.total_months);
}

#[tokio::test]
async fn test_unaffordable_budget_surfaces_before_model_call() {
    let model = ScriptedModel::new(vec![Ok(valid_candidate_text())]);
    let optimizer = optimizer_with(model.clone(), fast_retries());

    let request = OptimizationRequest::new(
        vec![DebtRecord::with_id("x", "Card", 10_000.0, 24.0, 50.0)],
        100.0,
    )
    .with_start_date(start());

    assert!(matches!(
        optimizer.optimize(&request).await.unwrap_err(),
        OptimizationError::NonConvergent { months: 600, .. }
    ));
    assert_eq!(model.calls(), 0);
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = OptimizerConfig::default();
    config.simulation.max_months = 0;
    assert!(matches!(
        DebtOptimizer::new(config).optimize_deterministic(&request()),
        Err(OptimizationError::InvalidConfig(_))
    ));
}

// ============================================================================
// Deterministic path
// ============================================================================

#[test]
fn test_deterministic_result() {
    let result = DebtOptimizer::default()
        .optimize_deterministic(&request())
        .unwrap();

    assert_eq!(result.source, PlanSource::Deterministic);
    assert_eq!(result.strategy, Strategy::Avalanche);
    assert_eq!(result.total_months, 11);
    assert_eq!(result.monthly_payment, 300.0);
    assert_eq!(result.extra_payment, 0.0);
    assert_eq!(result.months_saved, 27 - 11);
    assert!(result.interest_saved > 0.0);
    assert!(result.baseline_converged);
    assert_eq!(result.input_fingerprint.len(), 64);

    let explanation = result.explanation.unwrap();
    assert!(explanation.starts_with("Your avalanche plan"));
    assert!(explanation.contains("11 months"));
    assert!(explanation.contains("$300.00"));
}

#[tokio::test]
async fn test_optimize_without_model_is_deterministic() {
    let optimizer = DebtOptimizer::default();
    let async_result = optimizer.optimize(&request()).await.unwrap();
    let sync_result = optimizer.optimize_deterministic(&request()).unwrap();
    assert_eq!(async_result, sync_result);
}

#[test]
fn test_auto_offline_applies_suggested_extra() {
    let request = request().with_strategy(StrategyPreference::Auto);
    let result = DebtOptimizer::default()
        .optimize_deterministic(&request)
        .unwrap();

    // Highest APR 20% picks avalanche; extra is 10% of (300 - 130)
    assert_eq!(result.strategy, Strategy::Avalanche);
    assert_eq!(result.extra_payment, 17.0);
    assert_eq!(result.monthly_payment, 317.0);
}

#[test]
fn test_caller_extra_wins_over_suggestion() {
    let request = request()
        .with_strategy(StrategyPreference::Auto)
        .with_extra_payment(0.0);
    let result = DebtOptimizer::default()
        .optimize_deterministic(&request)
        .unwrap();
    assert_eq!(result.extra_payment, 0.0);
}

#[test]
fn test_fingerprint_changes_with_debts() {
    let optimizer = DebtOptimizer::default();
    let before = optimizer.optimize_deterministic(&request()).unwrap();

    let mut changed = request();
    changed.debts[1].balance = 1500.0;
    let after = optimizer.optimize_deterministic(&changed).unwrap();

    assert_ne!(before.input_fingerprint, after.input_fingerprint);
}

// ============================================================================
// Model path
// ============================================================================

#[tokio::test]
async fn test_valid_model_plan_is_used() {
    let model = ScriptedModel::new(vec![Ok(valid_candidate_text())]);
    let result = optimizer_with(model.clone(), fast_retries())
        .optimize(&request())
        .await
        .unwrap();

    assert_eq!(result.source, PlanSource::AiGenerated { attempt: 1 });
    assert_eq!(model.calls(), 1);
    assert_eq!(result.total_months, 11);
    assert_eq!(
        result.explanation.as_deref(),
        Some(
            "Knock out the card, then roll into the loan.\n\nKey Insights:\n\
             • The card is gone by May\n• Debt-free by November"
        )
    );
}

#[tokio::test]
async fn test_retries_until_candidate_is_accepted() {
    let model = ScriptedModel::new(vec![
        Ok("not json at all".to_string()),
        Err(ModelError::Api {
            status: 429,
            body: "rate limited".to_string(),
        }),
        Ok(valid_candidate_text()),
    ]);
    let result = optimizer_with(model.clone(), fast_retries())
        .optimize(&request())
        .await
        .unwrap();

    assert_eq!(result.source, PlanSource::AiGenerated { attempt: 3 });
    assert_eq!(model.calls(), 3);
}

#[tokio::test]
async fn test_exhausted_retries_fall_back_to_simulator() {
    let mut broken = serde_json::from_str::<serde_json::Value>(
        valid_candidate_text()
            .trim_start_matches("```json\n")
            .trim_end_matches("\n```"),
    )
    .unwrap();
    broken["payoff_order"].as_array_mut().unwrap().pop();

    let model = ScriptedModel::new(vec![
        Ok(broken.to_string()),
        Ok(broken.to_string()),
        Ok(broken.to_string()),
        Ok(valid_candidate_text()),
    ]);
    let optimizer = optimizer_with(model.clone(), fast_retries());
    let result = optimizer.optimize(&request()).await.unwrap();

    assert_eq!(result.source, PlanSource::Deterministic);
    assert_eq!(model.calls(), 3);
    assert!(result.explanation.unwrap().starts_with("Your avalanche plan"));

    let deterministic = DebtOptimizer::default()
        .optimize_deterministic(&request())
        .unwrap();
    assert_eq!(result.monthly_schedule, deterministic.monthly_schedule);
    assert_eq!(result.payoff_order, deterministic.payoff_order);
}

#[tokio::test]
async fn test_zero_attempts_disables_model_plans() {
    let model = ScriptedModel::new(vec![Ok(valid_candidate_text())]);
    let mut config = fast_retries();
    config.retry.max_attempts = 0;

    let result = optimizer_with(model.clone(), config)
        .optimize(&request())
        .await
        .unwrap();

    assert_eq!(result.source, PlanSource::Deterministic);
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_auto_consults_model_then_generates_plan() {
    let model = ScriptedModel::new(vec![
        Ok(r#"{"strategy": "snowball", "reasoning": "Quick wins.", "suggested_extra_payment": 20}"#
            .to_string()),
        Err(ModelError::EmptyResponse),
        Err(ModelError::EmptyResponse),
        Err(ModelError::EmptyResponse),
    ]);
    let request = request().with_strategy(StrategyPreference::Auto);
    let result = optimizer_with(model.clone(), fast_retries())
        .optimize(&request)
        .await
        .unwrap();

    assert_eq!(result.strategy, Strategy::Snowball);
    assert_eq!(result.extra_payment, 20.0);
    assert_eq!(result.monthly_payment, 320.0);
    assert_eq!(result.source, PlanSource::Deterministic);
    assert_eq!(model.calls(), 4);
}

// ============================================================================
// Timing (paused clock)
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_retry_delay_between_attempts_only() {
    let model = ScriptedModel::new(vec![]);
    let config = OptimizerConfig {
        retry: RetryConfig {
            max_attempts: 3,
            retry_delay_ms: 1000,
            timeout_secs: None,
        },
        ..OptimizerConfig::default()
    };

    let began = tokio::time::Instant::now();
    let result = optimizer_with(model.clone(), config)
        .optimize(&request())
        .await
        .unwrap();
    let elapsed = began.elapsed();

    assert_eq!(result.source, PlanSource::Deterministic);
    assert_eq!(model.calls(), 3);
    // Two waits: after attempts 1 and 2, none after the last
    assert!(elapsed >= Duration::from_secs(2), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(3), "elapsed {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_falls_back_to_simulator() {
    let model = ScriptedModel::slow(Duration::from_secs(3600));
    let config = OptimizerConfig {
        retry: RetryConfig {
            max_attempts: 3,
            retry_delay_ms: 1000,
            timeout_secs: Some(30),
        },
        ..OptimizerConfig::default()
    };

    let began = tokio::time::Instant::now();
    let result = optimizer_with(model.clone(), config)
        .optimize(&request())
        .await
        .unwrap();

    assert_eq!(result.source, PlanSource::Deterministic);
    assert_eq!(model.calls(), 1);
    assert!(began.elapsed() < Duration::from_secs(60));
}

#[tokio::test]
async fn test_concurrent_runs_share_nothing() {
    let optimizer = Arc::new(DebtOptimizer::default());
    let avalanche = request();
    let snowball = request().with_strategy(StrategyPreference::Snowball);

    let (a, b) = tokio::join!(optimizer.optimize(&avalanche), optimizer.optimize(&snowball));

    assert_eq!(a.unwrap().strategy, Strategy::Avalanche);
    assert_eq!(b.unwrap().strategy, Strategy::Snowball);
}
