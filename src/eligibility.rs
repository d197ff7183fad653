//! Calendar eligibility.
//!
//! Decides, for a client's cadence rule and a candidate day, whether that
//! client is due for collection. Also builds the working calendar of a
//! month (Sundays excluded).

use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::PlanError;
use crate::model::VisitRule;

const BUSINESS_WEEKDAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

/// The weekdays served by an "N times per week" client: an evenly-spaced
/// sample of Monday..Friday.
pub fn scheduled_weekdays(n: u8) -> Vec<Weekday> {
    let n = usize::from(n.clamp(1, 5));
    let step = (BUSINESS_WEEKDAYS.len() / n).max(1);
    BUSINESS_WEEKDAYS
        .iter()
        .copied()
        .step_by(step)
        .take(n)
        .collect()
}

/// Whether `date` is a collection day for the given rule.
///
/// Interval cadences count from the first day of the target month.
pub fn is_due(rule: VisitRule, date: NaiveDate, first_of_month: NaiveDate) -> bool {
    match rule {
        VisitRule::FixedWeekday(day) => date.weekday() == day,
        VisitRule::TimesPerWeek(n) => scheduled_weekdays(n).contains(&date.weekday()),
        VisitRule::EveryKDays(k) => {
            if k == 0 {
                return false;
            }
            let offset = (date - first_of_month).num_days();
            offset >= 0 && offset % i64::from(k) == 0
        }
        VisitRule::None => false,
    }
}

/// All days of `month`/`year` except Sundays, ascending.
pub fn month_calendar(year: i32, month: u32) -> Result<Vec<NaiveDate>, PlanError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or(PlanError::InvalidMonth { month })?;
    let mut days = Vec::with_capacity(31);
    let mut day = first;
    while day.month() == month {
        if day.weekday() != Weekday::Sun {
            days.push(day);
        }
        let Some(next) = day.succ_opt() else { break };
        day = next;
    }
    if days.is_empty() {
        return Err(PlanError::EmptyCalendar { month, year });
    }
    Ok(days)
}

/// First day of the month containing `date`.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
