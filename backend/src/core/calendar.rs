//! Calendar management for the payoff simulation
//!
//! The simulation operates in discrete months. Every scheduled month is dated
//! on the first day of that calendar month.

use chrono::{Datelike, Months, NaiveDate};

/// First day of the month after `today`.
///
/// Used as the default plan start date.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use debt_optimizer_core::core::first_of_next_month;
///
/// let today = NaiveDate::from_ymd_opt(2025, 12, 17).unwrap();
/// assert_eq!(first_of_next_month(today), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
/// ```
pub fn first_of_next_month(today: NaiveDate) -> NaiveDate {
    add_one_month(first_of_month(today))
}

/// First day of the month containing `date`.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn add_one_month(date: NaiveDate) -> NaiveDate {
    // Only fails at the very end of chrono's representable range
    date.checked_add_months(Months::new(1)).unwrap_or(NaiveDate::MAX)
}

/// Steps through plan months
///
/// Month numbers are 1-based: before the first `advance` the calendar sits at
/// month 0 (the start date itself); the first `advance` yields month 1, dated
/// on the start month.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use debt_optimizer_core::core::MonthCalendar;
///
/// let start = NaiveDate::from_ymd_opt(2026, 11, 1).unwrap();
/// let mut calendar = MonthCalendar::new(start);
/// assert_eq!(calendar.month(), 0);
///
/// assert_eq!(calendar.advance(), (1, start));
/// assert_eq!(calendar.advance(), (2, NaiveDate::from_ymd_opt(2026, 12, 1).unwrap()));
/// assert_eq!(calendar.advance(), (3, NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()));
/// ```
#[derive(Debug, Clone)]
pub struct MonthCalendar {
    start: NaiveDate,
    /// Months elapsed (number of the most recently issued month)
    month: u32,
    /// Date of the next month to be issued
    next_date: NaiveDate,
}

impl MonthCalendar {
    /// Create a calendar starting on the first of `start`'s month
    pub fn new(start: NaiveDate) -> Self {
        let start = first_of_month(start);
        Self {
            start,
            month: 0,
            next_date: start,
        }
    }

    /// Issue the next month, returning its 1-based number and date
    pub fn advance(&mut self) -> (u32, NaiveDate) {
        let date = self.next_date;
        self.month += 1;
        self.next_date = add_one_month(date);
        (self.month, date)
    }

    /// Number of months issued so far
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Normalized start date (first of the start month)
    pub fn start(&self) -> NaiveDate {
        self.start
    }
}
