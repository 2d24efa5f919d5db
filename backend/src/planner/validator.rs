//! Plan Validator / Reconciler
//!
//! Turns untrusted model output into either a `ValidatedPlan` or a
//! `Rejection`. Nothing in here panics or propagates a parse error: every
//! failure becomes a rejection the generator can retry on.
//!
//! # Checks (in order)
//!
//! 1. **Structure**: `total_months > 0`, `total_interest >= 0`,
//!    `total_paid > 0`, `monthly_payment > 0`, `debt_free_date` is a date
//! 2. **Schedule**: months are numbered 1..n and dated one calendar month
//!    apart from the start date. Unparseable or negative payment lines are
//!    dropped, and a month left with none rejects the plan. Lines must name
//!    input debts and each month's `total_payment` must match its lines
//! 3. **Coverage repair**: empty `payoff_order` is rebuilt from
//!    `is_payoff_month` markers when they are unambiguous
//! 4. **Coverage**: payoff ids equal input ids exactly (no missing, extra or
//!    duplicate ids)
//! 5. **Terminal balance**: last `total_remaining` within tolerance of zero
//! 6. **Monotonicity**: `total_remaining` never rises month over month
//! 7. **Conservation**: `total_paid = total_interest + sum of input balances`
//! 8. **Summary**: `total_months`, `debt_free_date`, `total_paid` and
//!    `total_interest` agree with the schedule they summarize

use crate::advisor::llm::extract_json_object;
use crate::config::ValidationConfig;
use crate::core::calendar::MonthCalendar;
use crate::core::money::BALANCE_EPSILON;
use crate::models::debt::DebtRecord;
use crate::models::plan::{
    DebtPayoffInfo, MonthlyBreakdown, PaymentScheduleItem, PlanProjection, RepaymentPlan,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Slack allowed when comparing consecutive month totals
const MONOTONIC_SLACK: f64 = 0.01;

/// Rounding slack per payment line when a stated total is compared to a line sum
const LINE_ROUNDING_SLACK: f64 = 0.01;

/// Why a candidate plan was rejected
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Rejection {
    #[error("No JSON object found in model output")]
    NoJsonObject,

    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Monthly schedule is empty")]
    EmptySchedule,

    #[error("Schedule entry {index} has an invalid month number")]
    InvalidMonthNumber { index: usize },

    #[error("Month {month} has an invalid date")]
    InvalidMonthDate { month: u32 },

    #[error("Month {month} has an invalid {field}")]
    InvalidMonthTotal { month: u32, field: &'static str },

    #[error("Month {month} has no valid payment lines")]
    EmptyMonth { month: u32 },

    #[error("Month {month} is out of sequence")]
    MonthOutOfSequence { month: u32 },

    #[error("Month {month} is dated {actual}, expected {expected}")]
    MonthDateMismatch {
        month: u32,
        expected: NaiveDate,
        actual: NaiveDate,
    },

    #[error("Month {month} pays unknown debt {debt_id}")]
    UnknownPaymentDebt { month: u32, debt_id: String },

    #[error("Month {month} total_payment {stated:.2} does not match its lines ({computed:.2})")]
    MonthTotalMismatch {
        month: u32,
        stated: f64,
        computed: f64,
    },

    #[error("Payoff entry {index} is malformed: {reason}")]
    InvalidPayoffEntry { index: usize, reason: String },

    #[error("Debt {0} is marked paid off in more than one month")]
    AmbiguousPayoffMarker(String),

    #[error("Payoff order lists unknown debt {0}")]
    UnknownDebt(String),

    #[error("Payoff order lists debt {0} more than once")]
    DuplicateDebt(String),

    #[error("Payoff order is missing debt {0}")]
    MissingDebt(String),

    #[error("Payoff month {month} for debt {debt_id} is not in the schedule")]
    PayoffMonthOutOfRange { debt_id: String, month: u32 },

    #[error("Final month leaves {remaining:.2} outstanding (tolerance {tolerance:.2})")]
    TerminalBalance { remaining: f64, tolerance: f64 },

    #[error("Total remaining increases in month {month}")]
    RemainingIncreased { month: u32 },

    #[error("Total paid {actual:.2} does not equal interest plus principal {expected:.2}")]
    ConservationViolated { expected: f64, actual: f64 },

    #[error("{field} is {stated} but the schedule gives {computed}")]
    SummaryMismatch {
        field: &'static str,
        stated: String,
        computed: String,
    },
}

/// A candidate that passed every check
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPlan {
    pub plan: RepaymentPlan,
    /// Model explanation with key insights appended
    pub explanation: Option<String>,
    /// True when `payoff_order` was rebuilt from schedule markers
    pub repaired: bool,
}

/// One payment line as the model is asked to emit it
#[derive(Debug, Deserialize)]
struct CandidatePayment {
    debt_id: String,
    #[serde(default)]
    debt_name: Option<String>,
    payment_amount: f64,
    principal: f64,
    interest: f64,
    remaining_balance: f64,
    #[serde(default)]
    is_payoff_month: bool,
}

/// One payoff entry as the model is asked to emit it
#[derive(Debug, Deserialize)]
struct CandidatePayoff {
    debt_id: String,
    #[serde(default)]
    debt_name: Option<String>,
    payoff_month: u32,
    #[serde(default)]
    total_interest: Option<f64>,
}

/// Payoff entry before dates and per-debt totals are attached
#[derive(Debug, Clone)]
struct PayoffEntry {
    debt_id: String,
    debt_name: Option<String>,
    payoff_month: u32,
    /// Summed from the schedule when the model leaves it out
    total_interest: Option<f64>,
}

/// Top-level numbers of a candidate
struct Summary {
    total_months: u32,
    total_interest: f64,
    total_paid: f64,
    monthly_payment: f64,
    debt_free_date: NaiveDate,
}

/// Validates model-generated candidate plans against the input debts
#[derive(Debug, Clone, Default)]
pub struct PlanValidator {
    config: ValidationConfig,
}

impl PlanValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate raw model output text
    pub fn validate_text(
        &self,
        text: &str,
        debts: &[DebtRecord],
        start: NaiveDate,
    ) -> Result<ValidatedPlan, Rejection> {
        let json = extract_json_object(text).ok_or(Rejection::NoJsonObject)?;
        let value: Value =
            serde_json::from_str(json).map_err(|e| Rejection::MalformedJson(e.to_string()))?;
        self.validate(&value, debts, start)
    }

    /// Validate an already-parsed candidate
    pub fn validate(
        &self,
        candidate: &Value,
        debts: &[DebtRecord],
        start: NaiveDate,
    ) -> Result<ValidatedPlan, Rejection> {
        let object = candidate
            .as_object()
            .ok_or_else(|| Rejection::MalformedJson("top level is not an object".into()))?;
        let names: HashMap<&str, &str> = debts
            .iter()
            .map(|d| (d.id.as_str(), d.name.as_str()))
            .collect();

        // 1. Structure
        let summary = Self::parse_summary(object)?;

        // 2. Schedule
        let schedule = Self::parse_schedule(object, &names, start)?;

        // 3. Coverage repair
        let provided = Self::parse_payoff_entries(object)?;
        let repaired = provided.is_empty();
        let entries = if repaired {
            let rebuilt = Self::reconstruct_payoff_entries(&schedule)?;
            if !rebuilt.is_empty() {
                tracing::info!(
                    entries = rebuilt.len(),
                    "rebuilt payoff order from schedule markers"
                );
            }
            rebuilt
        } else {
            provided
        };

        // 4. Coverage
        Self::check_coverage(&entries, debts)?;
        let payoff_order = Self::attach_payoff_details(entries, &schedule, debts, &names, start)?;

        // 5. Terminal balance
        self.check_terminal_balance(&schedule)?;

        // 6. Monotonicity
        Self::check_monotonic(&schedule)?;

        // 7. Conservation
        self.check_conservation(&summary, debts)?;

        // 8. Summary
        Self::check_summary(&summary, &schedule)?;

        let projections = PlanProjection::from_schedule(&schedule);
        let plan = RepaymentPlan {
            debt_free_date: summary.debt_free_date,
            total_months: summary.total_months,
            total_interest: summary.total_interest,
            total_paid: summary.total_paid,
            monthly_payment: summary.monthly_payment,
            monthly_schedule: schedule,
            projections,
            payoff_order,
        }
        .rounded();

        Ok(ValidatedPlan {
            plan,
            explanation: Self::explanation(object),
            repaired,
        })
    }

    // ========================================================================
    // 1. Structure
    // ========================================================================

    fn parse_summary(object: &Map<String, Value>) -> Result<Summary, Rejection> {
        let total_months = number_field(object, "total_months")?;
        if total_months <= 0.0 || total_months.fract() != 0.0 || total_months > u32::MAX as f64 {
            return Err(invalid("total_months", "must be a positive whole number"));
        }

        let total_interest = number_field(object, "total_interest")?;
        if total_interest < 0.0 {
            return Err(invalid("total_interest", "must be >= 0"));
        }

        let total_paid = number_field(object, "total_paid")?;
        if total_paid <= 0.0 {
            return Err(invalid("total_paid", "must be > 0"));
        }

        let monthly_payment = number_field(object, "monthly_payment")?;
        if monthly_payment <= 0.0 {
            return Err(invalid("monthly_payment", "must be > 0"));
        }

        let debt_free_date = object
            .get("debt_free_date")
            .ok_or(Rejection::MissingField("debt_free_date"))
            .and_then(|v| parse_date(v).ok_or_else(|| invalid("debt_free_date", "not a YYYY-MM-DD date")))?;

        Ok(Summary {
            total_months: total_months as u32,
            total_interest,
            total_paid,
            monthly_payment,
            debt_free_date,
        })
    }

    // ========================================================================
    // 2. Schedule
    // ========================================================================

    fn parse_schedule(
        object: &Map<String, Value>,
        names: &HashMap<&str, &str>,
        start: NaiveDate,
    ) -> Result<Vec<MonthlyBreakdown>, Rejection> {
        let months = match object.get("monthly_schedule") {
            Some(Value::Array(months)) => months,
            Some(_) => return Err(invalid("monthly_schedule", "must be an array")),
            None => return Err(Rejection::EmptySchedule),
        };
        if months.is_empty() {
            return Err(Rejection::EmptySchedule);
        }

        let schedule: Vec<MonthlyBreakdown> = months
            .iter()
            .enumerate()
            .map(|(index, month)| Self::parse_month(index, month, names))
            .collect::<Result<_, _>>()?;

        let mut calendar = MonthCalendar::new(start);
        for month in &schedule {
            let (expected_month, expected_date) = calendar.advance();
            if month.month != expected_month {
                return Err(Rejection::MonthOutOfSequence { month: month.month });
            }
            if month.date != expected_date {
                return Err(Rejection::MonthDateMismatch {
                    month: month.month,
                    expected: expected_date,
                    actual: month.date,
                });
            }
        }
        Ok(schedule)
    }

    fn parse_month(
        index: usize,
        value: &Value,
        names: &HashMap<&str, &str>,
    ) -> Result<MonthlyBreakdown, Rejection> {
        let month = value
            .get("month")
            .and_then(Value::as_u64)
            .filter(|m| *m > 0 && *m <= u32::MAX as u64)
            .ok_or(Rejection::InvalidMonthNumber { index })? as u32;

        let date = value
            .get("date")
            .and_then(parse_date)
            .ok_or(Rejection::InvalidMonthDate { month })?;

        let payments: Vec<PaymentScheduleItem> = value
            .get("payments")
            .and_then(Value::as_array)
            .map(|lines| {
                lines
                    .iter()
                    .filter_map(|line| Self::parse_payment(line, month, date, names))
                    .collect()
            })
            .unwrap_or_default();
        if let Some(stray) = payments
            .iter()
            .find(|p| !names.contains_key(p.debt_id.as_str()))
        {
            return Err(Rejection::UnknownPaymentDebt {
                month,
                debt_id: stray.debt_id.clone(),
            });
        }
        if payments.is_empty() {
            return Err(Rejection::EmptyMonth { month });
        }

        let total = |field: &'static str| {
            value
                .get(field)
                .and_then(Value::as_f64)
                .filter(|v| v.is_finite() && *v >= 0.0)
                .ok_or(Rejection::InvalidMonthTotal { month, field })
        };

        let total_payment = total("total_payment")?;
        let computed: f64 = payments.iter().map(|p| p.payment_amount).sum();
        if !within_line_slack(total_payment, computed, payments.len()) {
            return Err(Rejection::MonthTotalMismatch {
                month,
                stated: total_payment,
                computed,
            });
        }

        Ok(MonthlyBreakdown {
            month,
            date,
            total_payment,
            total_remaining: total("total_remaining")?,
            payments,
        })
    }

    /// `None` drops the line
    fn parse_payment(
        line: &Value,
        month: u32,
        date: NaiveDate,
        names: &HashMap<&str, &str>,
    ) -> Option<PaymentScheduleItem> {
        let payment = match CandidatePayment::deserialize(line) {
            Ok(payment) => payment,
            Err(err) => {
                tracing::debug!(month, %err, "dropping unparseable payment line");
                return None;
            }
        };

        let amounts = [
            payment.payment_amount,
            payment.principal,
            payment.interest,
            payment.remaining_balance,
        ];
        if amounts.iter().any(|v| !v.is_finite() || *v < 0.0) {
            tracing::debug!(month, debt_id = %payment.debt_id, "dropping payment line with negative amounts");
            return None;
        }

        let debt_name = payment
            .debt_name
            .or_else(|| names.get(payment.debt_id.as_str()).map(|n| n.to_string()))
            .unwrap_or_else(|| payment.debt_id.clone());

        Some(PaymentScheduleItem {
            month,
            date,
            debt_id: payment.debt_id,
            debt_name,
            payment_amount: payment.payment_amount,
            principal: payment.principal,
            interest: payment.interest,
            remaining_balance: payment.remaining_balance,
            is_payoff_month: payment.is_payoff_month,
        })
    }

    // ========================================================================
    // 3. Coverage repair
    // ========================================================================

    fn parse_payoff_entries(object: &Map<String, Value>) -> Result<Vec<PayoffEntry>, Rejection> {
        let entries = match object.get("payoff_order") {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(entries)) => entries,
            Some(_) => return Err(invalid("payoff_order", "must be an array")),
        };

        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let payoff = CandidatePayoff::deserialize(entry).map_err(|e| {
                    Rejection::InvalidPayoffEntry {
                        index,
                        reason: e.to_string(),
                    }
                })?;
                if let Some(interest) = payoff.total_interest {
                    if !interest.is_finite() || interest < 0.0 {
                        return Err(Rejection::InvalidPayoffEntry {
                            index,
                            reason: "total_interest must be >= 0".into(),
                        });
                    }
                }
                Ok(PayoffEntry {
                    debt_id: payoff.debt_id,
                    debt_name: payoff.debt_name,
                    payoff_month: payoff.payoff_month,
                    total_interest: payoff.total_interest,
                })
            })
            .collect()
    }

    /// Rebuild payoff entries from `is_payoff_month` markers
    ///
    /// The first marker per debt gives its payoff month; interest is summed
    /// later, over lines up to and including that month. A debt marked in two
    /// different months is ambiguous and rejects.
    fn reconstruct_payoff_entries(
        schedule: &[MonthlyBreakdown],
    ) -> Result<Vec<PayoffEntry>, Rejection> {
        let mut entries: Vec<PayoffEntry> = Vec::new();

        for item in schedule.iter().flat_map(|m| &m.payments) {
            if !item.is_payoff_month {
                continue;
            }
            match entries.iter().find(|e| e.debt_id == item.debt_id) {
                Some(existing) if existing.payoff_month != item.month => {
                    return Err(Rejection::AmbiguousPayoffMarker(item.debt_id.clone()));
                }
                Some(_) => {}
                None => entries.push(PayoffEntry {
                    debt_id: item.debt_id.clone(),
                    debt_name: Some(item.debt_name.clone()),
                    payoff_month: item.month,
                    total_interest: None,
                }),
            }
        }
        Ok(entries)
    }

    // ========================================================================
    // 4. Coverage
    // ========================================================================

    fn check_coverage(entries: &[PayoffEntry], debts: &[DebtRecord]) -> Result<(), Rejection> {
        let expected: HashSet<&str> = debts.iter().map(|d| d.id.as_str()).collect();
        let mut seen: HashSet<&str> = HashSet::new();

        for entry in entries {
            if !expected.contains(entry.debt_id.as_str()) {
                return Err(Rejection::UnknownDebt(entry.debt_id.clone()));
            }
            if !seen.insert(entry.debt_id.as_str()) {
                return Err(Rejection::DuplicateDebt(entry.debt_id.clone()));
            }
        }

        match debts.iter().find(|d| !seen.contains(d.id.as_str())) {
            Some(missing) => Err(Rejection::MissingDebt(missing.id.clone())),
            None => Ok(()),
        }
    }

    fn attach_payoff_details(
        entries: Vec<PayoffEntry>,
        schedule: &[MonthlyBreakdown],
        debts: &[DebtRecord],
        names: &HashMap<&str, &str>,
        start: NaiveDate,
    ) -> Result<Vec<DebtPayoffInfo>, Rejection> {
        entries
            .into_iter()
            .map(|entry| {
                let payoff_date = if entry.payoff_month == 0 {
                    let already_clear = debts
                        .iter()
                        .any(|d| d.id == entry.debt_id && d.balance <= BALANCE_EPSILON);
                    already_clear.then_some(start)
                } else {
                    schedule
                        .iter()
                        .find(|m| m.month == entry.payoff_month)
                        .map(|m| m.date)
                };
                let payoff_date = payoff_date.ok_or_else(|| Rejection::PayoffMonthOutOfRange {
                    debt_id: entry.debt_id.clone(),
                    month: entry.payoff_month,
                })?;

                let total_paid = debt_lines_through(schedule, &entry.debt_id, entry.payoff_month)
                    .map(|p| p.payment_amount)
                    .sum();
                let total_interest_paid = entry.total_interest.unwrap_or_else(|| {
                    debt_lines_through(schedule, &entry.debt_id, entry.payoff_month)
                        .map(|p| p.interest)
                        .sum()
                });
                let debt_name = entry
                    .debt_name
                    .or_else(|| names.get(entry.debt_id.as_str()).map(|n| n.to_string()))
                    .unwrap_or_else(|| entry.debt_id.clone());

                Ok(DebtPayoffInfo {
                    debt_id: entry.debt_id,
                    debt_name,
                    payoff_month: entry.payoff_month,
                    payoff_date,
                    total_interest_paid,
                    total_paid,
                })
            })
            .collect()
    }

    // ========================================================================
    // 5-7. Balance invariants
    // ========================================================================

    fn check_terminal_balance(&self, schedule: &[MonthlyBreakdown]) -> Result<(), Rejection> {
        let remaining = schedule
            .last()
            .map(|m| m.total_remaining)
            .ok_or(Rejection::EmptySchedule)?;
        let tolerance = self.config.terminal_balance_tolerance;
        if remaining > tolerance {
            return Err(Rejection::TerminalBalance {
                remaining,
                tolerance,
            });
        }
        Ok(())
    }

    fn check_monotonic(schedule: &[MonthlyBreakdown]) -> Result<(), Rejection> {
        for pair in schedule.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            if current.total_remaining > previous.total_remaining + MONOTONIC_SLACK {
                return Err(Rejection::RemainingIncreased {
                    month: current.month,
                });
            }
        }
        Ok(())
    }

    fn check_conservation(&self, summary: &Summary, debts: &[DebtRecord]) -> Result<(), Rejection> {
        let principal: f64 = debts.iter().map(|d| d.balance).sum();
        let expected = summary.total_interest + principal;
        let tolerance = self.config.conservation_tolerance_per_debt * debts.len().max(1) as f64;

        // Small epsilon absorbs binary representation error in the sum
        if (summary.total_paid - expected).abs() > tolerance + 1e-9 {
            return Err(Rejection::ConservationViolated {
                expected,
                actual: summary.total_paid,
            });
        }
        Ok(())
    }

    // ========================================================================
    // 8. Summary
    // ========================================================================

    fn check_summary(summary: &Summary, schedule: &[MonthlyBreakdown]) -> Result<(), Rejection> {
        let months = schedule.len() as u32;
        if summary.total_months != months {
            return Err(Rejection::SummaryMismatch {
                field: "total_months",
                stated: summary.total_months.to_string(),
                computed: months.to_string(),
            });
        }

        if let Some(last) = schedule.last() {
            if summary.debt_free_date != last.date {
                return Err(Rejection::SummaryMismatch {
                    field: "debt_free_date",
                    stated: summary.debt_free_date.to_string(),
                    computed: last.date.to_string(),
                });
            }
        }

        let lines: Vec<&PaymentScheduleItem> = schedule.iter().flat_map(|m| &m.payments).collect();
        let sums = [
            ("total_paid", summary.total_paid, lines.iter().map(|p| p.payment_amount).sum::<f64>()),
            ("total_interest", summary.total_interest, lines.iter().map(|p| p.interest).sum::<f64>()),
        ];
        for (field, stated, computed) in sums {
            if !within_line_slack(stated, computed, lines.len()) {
                return Err(Rejection::SummaryMismatch {
                    field,
                    stated: format!("{:.2}", stated),
                    computed: format!("{:.2}", computed),
                });
            }
        }
        Ok(())
    }

    fn explanation(object: &Map<String, Value>) -> Option<String> {
        let mut text = object
            .get("ai_explanation")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        let insights: Vec<&str> = object
            .get("key_insights")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        if !insights.is_empty() {
            if !text.is_empty() {
                text.push_str("\n\n");
            }
            text.push_str("Key Insights:");
            for insight in insights {
                text.push_str("\n• ");
                text.push_str(insight);
            }
        }

        (!text.is_empty()).then_some(text)
    }
}

fn invalid(field: &'static str, reason: &str) -> Rejection {
    Rejection::InvalidField {
        field,
        reason: reason.to_string(),
    }
}

/// Stated total vs a sum of `lines` individually rounded amounts
fn within_line_slack(stated: f64, computed: f64, lines: usize) -> bool {
    // Small epsilon absorbs binary representation error in the sum
    (stated - computed).abs() <= LINE_ROUNDING_SLACK * lines.max(1) as f64 + 1e-9
}

fn number_field(object: &Map<String, Value>, field: &'static str) -> Result<f64, Rejection> {
    let value = object.get(field).ok_or(Rejection::MissingField(field))?;
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(field, "must be a number"))
}

fn parse_date(value: &Value) -> Option<NaiveDate> {
    value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
}

/// A debt's schedule lines up to and including `through_month`
fn debt_lines_through<'a>(
    schedule: &'a [MonthlyBreakdown],
    debt_id: &'a str,
    through_month: u32,
) -> impl Iterator<Item = &'a PaymentScheduleItem> + 'a {
    schedule
        .iter()
        .take_while(move |m| m.month <= through_month)
        .flat_map(|m| &m.payments)
        .filter(move |p| p.debt_id == debt_id)
}
