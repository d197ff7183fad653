//! Demand normalisation.
//!
//! Derives, from raw contract fields, how many visits a client needs per
//! month and how much weight each visit collects. Pure functions: calling
//! them twice on the same terms yields the same result.

use crate::model::ContractTerms;

/// Nominal weeks in a planning month.
const WEEKS_PER_MONTH: u32 = 4;
/// Nominal days in a planning month for interval cadences.
const MONTH_DAYS: u32 = 30;

/// Number of visits a client requires over one month.
///
/// A weekly count takes precedence over a day interval; a client with a
/// fixed weekday and nothing else is served once a week. A client with no
/// cadence at all is non-recurring and gets zero visits.
pub fn visits_per_month(terms: &ContractTerms) -> u32 {
    if let Some(n) = terms.times_per_week.filter(|n| (1..=5).contains(n)) {
        u32::from(n) * WEEKS_PER_MONTH
    } else if let Some(k) = terms.every_k_days.filter(|k| *k > 0) {
        (MONTH_DAYS / k).max(1)
    } else if terms.fixed_weekday.is_some() {
        WEEKS_PER_MONTH
    } else {
        0
    }
}

/// Expected weight collected at each visit, kg.
///
/// Zero when the monthly estimate is missing or the client has no cadence;
/// such clients are excluded downstream.
pub fn per_visit_weight(terms: &ContractTerms) -> f64 {
    let visits = visits_per_month(terms);
    if visits == 0 || terms.monthly_estimate_kg <= 0.0 {
        return 0.0;
    }
    terms.monthly_estimate_kg / f64::from(visits)
}
