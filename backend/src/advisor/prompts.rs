//! Prompt builders
//!
//! The exact wording is not load-bearing; the JSON shape each prompt asks
//! for is, because the advisor and the plan validator parse it.

use super::context::UserContext;
use super::llm::Prompt;
use crate::models::debt::DebtRecord;
use crate::models::strategy::Strategy;
use chrono::NaiveDate;

const STRATEGY_SYSTEM: &str = "You are a financial advisor specializing in debt repayment \
strategies. Recommend either 'avalanche' (highest interest first) or 'snowball' (lowest \
balance first). Return ONLY a JSON object.";

const PLAN_SYSTEM: &str = "You are a financial planning assistant that generates precise debt \
repayment schedules. Always return a single valid JSON object. All dates are strings in \
YYYY-MM-DD format. All numeric fields are numbers, not strings. The payoff_order array MUST \
contain every debt exactly once, using the exact ids provided.";

fn debt_lines(debts: &[DebtRecord]) -> String {
    debts
        .iter()
        .map(|d| {
            format!(
                "- ID: {}, Name: {}, Balance: {:.2}, APR: {}%, Minimum Payment: {:.2}",
                d.id, d.name, d.balance, d.apr, d.minimum_payment
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn context_section(context: &UserContext) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!("\n**User Context:**\n{}\n", context.render())
    }
}

/// Ask for a strategy recommendation
pub fn strategy_recommendation(
    debts: &[DebtRecord],
    monthly_budget: f64,
    context: &UserContext,
) -> Prompt {
    let total_debt: f64 = debts.iter().map(|d| d.balance).sum();
    let total_minimum: f64 = debts.iter().map(|d| d.minimum_payment).sum();
    let highest_apr = debts.iter().map(|d| d.apr).fold(0.0, f64::max);

    let user = format!(
        r#"Analyze this debt situation and recommend the optimal repayment strategy.

**Debts:**
{debts}

**Financial Capacity:**
- Total Debt: {total_debt:.2}
- Monthly Budget: {monthly_budget:.2}
- Required Minimums: {total_minimum:.2}
- Available Extra: {extra:.2}
- Highest APR: {highest_apr:.1}%
{context}
Return a JSON object:
{{
  "strategy": "avalanche" or "snowball",
  "reasoning": "2-3 sentence explanation",
  "confidence": 0.0-1.0,
  "suggested_extra_payment": optional number
}}"#,
        debts = debt_lines(debts),
        extra = (monthly_budget - total_minimum).max(0.0),
        context = context_section(context),
    );

    Prompt::json(STRATEGY_SYSTEM, user)
}

/// Ask for a complete candidate schedule
pub fn plan_generation(
    debts: &[DebtRecord],
    strategy: Strategy,
    monthly_budget: f64,
    extra_payment: f64,
    start_date: NaiveDate,
    context: &UserContext,
) -> Prompt {
    let total_debt: f64 = debts.iter().map(|d| d.balance).sum();
    let total_minimum: f64 = debts.iter().map(|d| d.minimum_payment).sum();
    let total_available = monthly_budget + extra_payment;
    let focus = match strategy {
        Strategy::Avalanche => "Send extra payment to the highest-APR open debt first",
        Strategy::Snowball => "Send extra payment to the lowest-balance open debt first",
    };

    let user = format!(
        r#"Generate a complete debt repayment plan using the {strategy} strategy.

**Debts ({count}):**
{debts}
{context}
**Financial Situation:**
- Total Debt: {total_debt:.2}
- Monthly Budget: {monthly_budget:.2}
- Extra Payment: {extra_payment:.2}
- Total Available Each Month: {total_available:.2}
- Required Minimums: {total_minimum:.2}
- Start Date: {start}

**Rules:**
1. Each month, interest = balance x APR / 12 / 100
2. Pay every debt's minimum first, then send all remaining budget to ONE priority debt
3. {focus}
4. Never pay more than a debt owes
5. Continue until every balance is zero
6. Round currency to 2 decimal places

Return a JSON object with exactly this shape:
{{
  "total_months": <number>,
  "total_interest": <number>,
  "total_paid": <number>,
  "monthly_payment": <number>,
  "debt_free_date": "YYYY-MM-DD",
  "payoff_order": [
    {{"debt_id": "<id>", "debt_name": "<name>", "payoff_month": <number>, "total_interest": <number>}}
  ],
  "ai_explanation": "<3-4 motivating sentences>",
  "key_insights": ["<insight>", "..."],
  "monthly_schedule": [
    {{
      "month": 1,
      "date": "YYYY-MM-DD",
      "total_payment": <number>,
      "total_remaining": <number>,
      "payments": [
        {{"debt_id": "<id>", "debt_name": "<name>", "payment_amount": <number>, "principal": <number>,
          "interest": <number>, "remaining_balance": <number>, "is_payoff_month": false}}
      ]
    }}
  ]
}}"#,
        count = debts.len(),
        debts = debt_lines(debts),
        context = context_section(context),
        start = start_date.format("%Y-%m-%d"),
    );

    Prompt::json(PLAN_SYSTEM, user)
}
