//! Fatal planning errors.
//!
//! Only conditions that abort a run before any persistence write live here.
//! Soft conditions (capacity shortfalls, infeasible buckets, excluded
//! clients) are accumulated in [`crate::model::PlanReport`] instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    /// The fleet source returned no vehicles; nothing can be routed.
    #[error("no vehicles available for planning")]
    NoVehicles,

    /// The requested month number is outside 1..=12.
    #[error("invalid month {month}")]
    InvalidMonth { month: u32 },

    /// The target month contains no working days.
    #[error("no working days in {month}/{year}")]
    EmptyCalendar { month: u32, year: i32 },

    /// The client source failed to produce its records.
    #[error("client source failed: {0}")]
    ClientSource(String),

    /// The vehicle source failed to produce its records.
    #[error("vehicle source failed: {0}")]
    VehicleSource(String),

    /// The persistence sink rejected the replace operation.
    #[error("assignment sink failed: {0}")]
    Sink(String),
}
