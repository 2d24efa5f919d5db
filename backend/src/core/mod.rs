//! Core primitives shared by every engine component
//!
//! - **money**: rounding and the single interest-accrual formula
//! - **calendar**: month-by-month date advancement

pub mod calendar;
pub mod money;

pub use calendar::{first_of_next_month, MonthCalendar};
pub use money::{monthly_interest, round_cents, split_payment, BALANCE_EPSILON};
