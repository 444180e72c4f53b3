//! Spending windows
//!
//! The spent budget sums expenses over three windows that all end at the last
//! instant of the current day and start at the beginning of the day, of the
//! week (Monday) and of the month respectively.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::BudgetWindow;

/// Window boundaries around a reference instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendingWindows {
    pub start_of_day: NaiveDateTime,
    pub start_of_week: NaiveDateTime,
    pub start_of_month: NaiveDateTime,
    pub end_of_day: NaiveDateTime,
}

impl SpendingWindows {
    /// Windows for the day containing `now`
    pub fn containing(now: NaiveDateTime) -> Self {
        let today = now.date();
        let start_of_day = today.and_time(NaiveTime::MIN);
        let week_start = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        let month_start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);

        Self {
            start_of_day,
            start_of_week: week_start.and_time(NaiveTime::MIN),
            start_of_month: month_start.and_time(NaiveTime::MIN),
            end_of_day: today.and_time(last_instant()),
        }
    }

    /// Inclusive `[start, end]` bounds of `window`
    pub fn bounds(&self, window: BudgetWindow) -> (NaiveDateTime, NaiveDateTime) {
        let start = match window {
            BudgetWindow::Daily => self.start_of_day,
            BudgetWindow::Weekly => self.start_of_week,
            BudgetWindow::Monthly => self.start_of_month,
        };
        (start, self.end_of_day)
    }
}

/// Last representable instant of a day at storage precision
fn last_instant() -> NaiveTime {
    NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN)
}
