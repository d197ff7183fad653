//! Domain records.
//!
//! `Client` and `Vehicle` are read-only snapshots of entities owned by the
//! surrounding application. Everything else is ephemeral planning state,
//! created and discarded within a single run, except the `RouteAssignment`
//! output records handed back to persistence.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

pub type ClientId = u64;
pub type VehicleId = u64;

/// Billing category of a client; private-sector clients are served on a
/// shorter morning horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCategory {
    State,
    Private,
}

/// Raw cadence fields from the collection contract.
#[derive(Debug, Clone, Default)]
pub struct ContractTerms {
    /// Estimated weight to collect over a month, kg.
    pub monthly_estimate_kg: f64,
    /// Collect on this weekday, every week.
    pub fixed_weekday: Option<Weekday>,
    /// Collect N times per week, N in 1..=5.
    pub times_per_week: Option<u8>,
    /// Collect every K calendar days.
    pub every_k_days: Option<u32>,
}

/// The single cadence rule governing when a client is due.
///
/// Exactly one branch applies per client. When several raw fields are
/// populated, a fixed weekday wins over a weekly count, which wins over a
/// day interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitRule {
    FixedWeekday(Weekday),
    TimesPerWeek(u8),
    EveryKDays(u32),
    None,
}

impl VisitRule {
    pub fn from_terms(terms: &ContractTerms) -> Self {
        if let Some(day) = terms.fixed_weekday {
            Self::FixedWeekday(day)
        } else if let Some(n) = terms.times_per_week.filter(|n| (1..=5).contains(n)) {
            Self::TimesPerWeek(n)
        } else if let Some(k) = terms.every_k_days.filter(|k| *k > 0) {
            Self::EveryKDays(k)
        } else {
            Self::None
        }
    }
}

/// A geolocated client with its contract cadence. Read-only input.
#[derive(Debug, Clone)]
pub struct Client {
    pub id: ClientId,
    /// (lat, lon). Absent means the client can be weight-scheduled but
    /// never sequenced onto a route.
    pub location: Option<(f64, f64)>,
    pub terms: ContractTerms,
    /// Governorate/zone index, when known.
    pub zone: Option<u32>,
    pub category: ClientCategory,
    /// Precomputed road distance from the depot, km.
    pub road_distance_from_depot_km: Option<f64>,
}

/// A fleet vehicle. Read-only input.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    /// Payload capacity in kg. Non-positive values are normalised to
    /// unlimited at intake.
    pub capacity_kg: f64,
}

/// Per-run schedulable view of a client: normalised per-visit weight and
/// monthly quota, plus the fields clustering and routing need.
#[derive(Debug, Clone)]
pub struct ClientPlan {
    pub client_id: ClientId,
    pub location: Option<(f64, f64)>,
    pub weight_kg: f64,
    pub rule: VisitRule,
    /// Visits still to place this month.
    pub quota: u32,
    pub zone: Option<u32>,
    pub category: ClientCategory,
    pub depot_km: f64,
}

impl ClientPlan {
    /// The visit this client contributes on any of its collection days.
    /// `None` when the client has no coordinates and cannot be routed.
    pub fn template_job(&self, config: &crate::config::PlannerConfig) -> Option<PlanningJob> {
        let location = self.location?;
        let window_end = match self.category {
            ClientCategory::State => config.work_end_secs,
            ClientCategory::Private => config.private_end_secs,
        };
        let service = config.base_service_secs
            + (config.per_kg_service_secs * self.weight_kg).round() as i32;
        Some(PlanningJob {
            client_id: self.client_id,
            location,
            weight_kg: self.weight_kg,
            window: (config.work_start_secs, window_end),
            service_secs: service,
            zone: self.zone,
            depot_km: self.depot_km,
        })
    }
}

/// One required stop: a (client, day) visit awaiting routing.
#[derive(Debug, Clone)]
pub struct PlanningJob {
    pub client_id: ClientId,
    pub location: (f64, f64),
    pub weight_kg: f64,
    /// Earliest/latest service start, seconds from midnight.
    pub window: (i32, i32),
    pub service_secs: i32,
    pub zone: Option<u32>,
    pub depot_km: f64,
}

/// An ordered stop in a finished route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteStop {
    pub client_id: ClientId,
    pub weight_kg: f64,
    /// Elapsed travel + service seconds from route start at arrival.
    pub cumulative_secs: i32,
    /// Estimated arrival, seconds from midnight. Populated by the
    /// time-window solver only.
    pub arrival_secs: Option<i32>,
    /// Estimated departure, seconds from midnight.
    pub departure_secs: Option<i32>,
}

/// A vehicle's route for one date. The only output the engine persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteAssignment {
    pub date: NaiveDate,
    pub vehicle_id: VehicleId,
    pub stops: Vec<RouteStop>,
    pub travel_secs: i32,
    pub travel_km: f64,
}

/// Outcome of a planning run: the assignments plus the soft conditions
/// accumulated along the way.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanReport {
    pub assignments: Vec<RouteAssignment>,
    /// Clients skipped for zero demand or no usable cadence.
    pub clients_without_demand: u32,
    /// Clients scheduled for capacity but absent from routes.
    pub clients_without_coordinates: u32,
    /// Vehicles whose non-positive capacity was treated as unlimited.
    pub vehicles_unlimited_capacity: u32,
    /// Visits that found no date within the daily capacity ceiling.
    pub visits_unplaced: u32,
    /// Visits placed on the calendar for clients that cannot be routed.
    pub visits_without_route: u32,
    /// Stops dropped after every candidate day was exhausted.
    pub stops_dropped: u32,
    /// (date, cluster) buckets where no vehicle could take any stop.
    pub buckets_infeasible: u32,
}

impl PlanReport {
    pub fn total_stops(&self) -> usize {
        self.assignments.iter().map(|a| a.stops.len()).sum()
    }

    /// Operator-facing one-line account of the run.
    pub fn summary(&self) -> String {
        format!(
            "planned {} stops across {} routes; {} clients without demand, \
             {} without coordinates; {} visits unplaced, {} unroutable, \
             {} stops dropped, {} infeasible buckets",
            self.total_stops(),
            self.assignments.len(),
            self.clients_without_demand,
            self.clients_without_coordinates,
            self.visits_unplaced,
            self.visits_without_route,
            self.stops_dropped,
            self.buckets_infeasible,
        )
    }
}
