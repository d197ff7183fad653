//! Planner configuration.
//!
//! Every constant the engine depends on (depot position, capacities,
//! working hours, solver knobs) is carried here explicitly and passed into
//! the planning entry points. Defaults mirror the production deployment.

use serde::{Deserialize, Serialize};

/// How distance/duration matrices are obtained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MatrixStrategy {
    /// Great-circle estimation at an assumed average speed.
    Haversine,
    /// Road-network lookup via an external table service, degrading to
    /// haversine per call on any transport or decode failure.
    Remote(RemoteMatrixConfig),
}

/// How each day's stops are sequenced onto vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverStrategy {
    /// Capacitated routing with time windows: cheapest feasible insertion
    /// plus local search under a wall-clock budget.
    TimeWindow,
    /// Greedy distance-sorted bin packing, no windows, no reordering.
    Greedy,
}

/// Connection settings for the external routing-matrix service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteMatrixConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for RemoteMatrixConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Depot coordinates (lat, lon). Routes start and end here.
    pub depot: (f64, f64),
    /// Ceiling on the total weight committed to any calendar day, in kg.
    pub daily_capacity_kg: f64,
    /// Assumed average driving speed for travel-time estimation.
    pub speed_kmh: f64,
    /// Working-day start, seconds from midnight.
    pub work_start_secs: i32,
    /// Working-day end, seconds from midnight.
    pub work_end_secs: i32,
    /// Earlier service cutoff applied to private-sector clients.
    pub private_end_secs: i32,
    /// Fixed per-stop service time, seconds.
    pub base_service_secs: i32,
    /// Additional service time per collected kilogram, seconds.
    pub per_kg_service_secs: f64,
    /// Target number of geographic clusters per run.
    pub desired_clusters: usize,
    /// Stops farther than this from the depot are routed in dedicated
    /// far clusters instead of being mixed into nearby ones.
    pub far_threshold_km: f64,
    /// Scale applied to the zone index in the clustering feature space.
    /// Large values keep different zones in different clusters.
    pub zone_weight: f64,
    /// Seed for cluster initialisation; same seed and input give the same
    /// partition.
    pub kmeans_seed: u64,
    /// Iteration cap for cluster refinement.
    pub kmeans_max_iters: usize,
    /// Wall-clock budget for each bucket's route search, milliseconds.
    pub solver_budget_ms: u64,
    /// Iteration cap for local search improvement.
    pub local_search_iterations: usize,
    pub matrix: MatrixStrategy,
    pub solver: SolverStrategy,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            // Tunis depot.
            depot: (36.8065, 10.1815),
            daily_capacity_kg: 10_000.0,
            speed_kmh: 40.0,
            work_start_secs: 8 * 3600,
            work_end_secs: 17 * 3600,
            private_end_secs: 13 * 3600,
            base_service_secs: 600,
            per_kg_service_secs: 2.0,
            desired_clusters: 4,
            far_threshold_km: 60.0,
            zone_weight: 1000.0,
            kmeans_seed: 7,
            kmeans_max_iters: 50,
            solver_budget_ms: 2000,
            local_search_iterations: 100,
            matrix: MatrixStrategy::Haversine,
            solver: SolverStrategy::TimeWindow,
        }
    }
}
