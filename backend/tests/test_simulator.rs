//! Payoff Simulator Tests
//!
//! Month-by-month behavior of the deterministic simulator: allocation,
//! payoff marking, shortfall handling and the horizon cap.

use chrono::NaiveDate;
use debt_optimizer_core::{
    DebtRecord, PayoffSimulator, RepaymentPlan, SimulationConfig, SimulationError, Strategy,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
}

fn card_and_loan() -> Vec<DebtRecord> {
    vec![
        DebtRecord::with_id("card", "Card", 1000.0, 20.0, 50.0),
        DebtRecord::with_id("loan", "Loan", 2000.0, 6.0, 80.0),
    ]
}

fn simulate(debts: &[DebtRecord], strategy: Strategy, budget: f64) -> RepaymentPlan {
    PayoffSimulator::default()
        .simulate(debts, strategy, budget, 0.0, start())
        .expect("plan should converge")
}

fn payment_for(plan: &RepaymentPlan, month: u32, debt_id: &str) -> Option<f64> {
    plan.monthly_schedule
        .iter()
        .find(|m| m.month == month)?
        .payments
        .iter()
        .find(|p| p.debt_id == debt_id)
        .map(|p| p.payment_amount)
}

// ============================================================================
// End-to-end example
// ============================================================================

#[test]
fn test_card_and_loan_avalanche() {
    let plan = simulate(&card_and_loan(), Strategy::Avalanche, 300.0);

    assert_eq!(plan.total_months, 11);
    assert_eq!(plan.payoff_order[0].debt_id, "card");
    assert_eq!(plan.payoff_order[0].payoff_month, 5);
    assert_eq!(plan.payoff_order[1].debt_id, "loan");
    assert_eq!(plan.payoff_order[1].payoff_month, 11);
    assert!((plan.total_interest - 122.72).abs() < 0.011);

    // Month 1: loan gets its minimum, card gets everything else
    assert_eq!(payment_for(&plan, 1, "loan"), Some(80.0));
    assert_eq!(payment_for(&plan, 1, "card"), Some(220.0));
}

#[test]
fn test_dates_advance_one_month_at_a_time() {
    let plan = simulate(&card_and_loan(), Strategy::Avalanche, 300.0);

    let dates: Vec<NaiveDate> = plan.monthly_schedule.iter().map(|m| m.date).collect();
    assert_eq!(dates[0], start());
    assert_eq!(dates[1], NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
    assert_eq!(plan.debt_free_date, NaiveDate::from_ymd_opt(2026, 11, 1).unwrap());
    assert_eq!(
        plan.payoff_order[0].payoff_date,
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
    );
}

#[test]
fn test_mid_month_start_is_normalized() {
    let plan = PayoffSimulator::default()
        .simulate(
            &card_and_loan(),
            Strategy::Avalanche,
            300.0,
            0.0,
            NaiveDate::from_ymd_opt(2026, 1, 17).unwrap(),
        )
        .unwrap();
    assert_eq!(plan.monthly_schedule[0].date, start());
}

#[test]
fn test_extra_payment_adds_to_budget() {
    let with_extra = PayoffSimulator::default()
        .simulate(&card_and_loan(), Strategy::Avalanche, 250.0, 50.0, start())
        .unwrap();
    let plain = simulate(&card_and_loan(), Strategy::Avalanche, 300.0);

    assert_eq!(with_extra.monthly_payment, 300.0);
    assert_eq!(with_extra.monthly_schedule, plain.monthly_schedule);
}

#[test]
fn test_monthly_payments_never_exceed_budget() {
    let plan = simulate(&card_and_loan(), Strategy::Snowball, 300.0);
    for month in &plan.monthly_schedule {
        assert!(month.total_payment <= 300.0 + 1e-9, "month {} overpaid", month.month);
    }
}

#[test]
fn test_payoff_marked_once_per_debt() {
    let plan = simulate(&card_and_loan(), Strategy::Avalanche, 300.0);
    for debt in card_and_loan() {
        let markers = plan
            .monthly_schedule
            .iter()
            .flat_map(|m| &m.payments)
            .filter(|p| p.debt_id == debt.id && p.is_payoff_month)
            .count();
        assert_eq!(markers, 1, "debt {} should be marked paid off exactly once", debt.id);
    }
}

#[test]
fn test_paid_off_debt_disappears_from_schedule() {
    let plan = simulate(&card_and_loan(), Strategy::Avalanche, 300.0);
    let card_months: Vec<u32> = plan
        .monthly_schedule
        .iter()
        .filter(|m| m.payments.iter().any(|p| p.debt_id == "card"))
        .map(|m| m.month)
        .collect();
    assert_eq!(card_months, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_payoff_info_sums_debt_lines() {
    let plan = simulate(&card_and_loan(), Strategy::Avalanche, 300.0);
    for info in &plan.payoff_order {
        let lines: Vec<_> = plan
            .monthly_schedule
            .iter()
            .flat_map(|m| &m.payments)
            .filter(|p| p.debt_id == info.debt_id)
            .collect();
        let interest: f64 = lines.iter().map(|p| p.interest).sum();
        let paid: f64 = lines.iter().map(|p| p.payment_amount).sum();
        assert!((info.total_interest_paid - interest).abs() < 0.05);
        assert!((info.total_paid - paid).abs() < 0.05);
    }
}

#[test]
fn test_projections_follow_schedule() {
    let plan = simulate(&card_and_loan(), Strategy::Avalanche, 300.0);
    assert_eq!(plan.projections.len(), plan.monthly_schedule.len());

    let last = plan.projections.last().unwrap();
    assert!((last.cumulative_interest_paid - plan.total_interest).abs() < 0.05);
    assert!((last.cumulative_principal_paid - 3000.0).abs() < 0.05);
    assert_eq!(last.total_remaining, 0.0);
}

// ============================================================================
// Edge cases
// ============================================================================

#[test]
fn test_already_cleared_debt_reported_at_month_zero() {
    let debts = vec![
        DebtRecord::with_id("done", "Old card", 0.0, 18.0, 0.0),
        DebtRecord::with_id("loan", "Loan", 500.0, 0.0, 100.0),
    ];
    let plan = simulate(&debts, Strategy::Avalanche, 100.0);

    assert_eq!(plan.payoff_order.len(), 2);
    let done = plan.payoff_order.iter().find(|p| p.debt_id == "done").unwrap();
    assert_eq!(done.payoff_month, 0);
    assert_eq!(done.payoff_date, start());
    assert!(plan
        .monthly_schedule
        .iter()
        .flat_map(|m| &m.payments)
        .all(|p| p.debt_id != "done"));
}

#[test]
fn test_shortfall_pays_minimums_in_priority_order() {
    // Budget 150 against 200 of minimums: first debt in order gets its full minimum
    let debts = vec![
        DebtRecord::with_id("a", "First", 1000.0, 0.0, 100.0),
        DebtRecord::with_id("b", "Second", 1000.0, 0.0, 100.0),
    ];
    let plan = simulate(&debts, Strategy::Avalanche, 150.0);

    assert_eq!(payment_for(&plan, 1, "a"), Some(100.0));
    assert_eq!(payment_for(&plan, 1, "b"), Some(50.0));
    assert_eq!(plan.total_months, 14);
    assert_eq!(plan.payoff_order[0].payoff_month, 10);
}

#[test]
fn test_budget_below_interest_reports_non_convergence() {
    // 24% on 10,000 accrues 200 a month; 100 never touches principal
    let debts = vec![DebtRecord::with_id("x", "Card", 10_000.0, 24.0, 50.0)];
    let result = PayoffSimulator::default().simulate(&debts, Strategy::Avalanche, 100.0, 0.0, start());

    match result {
        Err(SimulationError::NonConvergent { months, remaining }) => {
            assert_eq!(months, 600);
            assert!(remaining > 10_000.0);
        }
        other => panic!("expected non-convergence, got {:?}", other),
    }
}

#[test]
fn test_custom_horizon_is_respected() {
    let simulator = PayoffSimulator::new(SimulationConfig {
        max_months: 6,
        ..SimulationConfig::default()
    });
    let debts = vec![DebtRecord::with_id("x", "Loan", 1200.0, 0.0, 100.0)];

    assert_eq!(
        simulator.simulate(&debts, Strategy::Avalanche, 100.0, 0.0, start()),
        Err(SimulationError::NonConvergent {
            months: 6,
            remaining: 600.0
        })
    );
}

#[test]
fn test_repeated_runs_are_identical() {
    let first = simulate(&card_and_loan(), Strategy::Snowball, 275.0);
    let second = simulate(&card_and_loan(), Strategy::Snowball, 275.0);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
