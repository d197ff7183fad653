//! Planning entry points.
//!
//! One run is synchronous and batch-oriented: load inputs, normalise,
//! cluster, allocate dates, route each (date, cluster) bucket, then hand
//! the finished assignments to the sink in a single replace. Nothing is
//! written before every fatal check has passed.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::allocator;
use crate::cluster::{self, KMeansClusterer};
use crate::config::{PlannerConfig, SolverStrategy};
use crate::demand;
use crate::eligibility::{first_of_month, is_due, month_calendar};
use crate::error::PlanError;
use crate::haversine::haversine_km;
use crate::matrix::ResilientMatrix;
use crate::model::{
    Client, ClientPlan, PlanReport, PlanningJob, RouteAssignment, RouteStop, Vehicle, VisitRule,
};
use crate::packer::pack_bucket;
use crate::solver::{solve_bucket, BucketSolution, SolveOptions};
use crate::traits::{
    AssignmentSink, ClientSource, DistanceMatrixProvider, Notifier, VehicleSource,
};

/// Plan a whole month: every schedulable client's visits spread across the
/// working calendar, each day's stops routed onto the fleet. Replaces any
/// assignments previously stored for that month.
pub fn generate_monthly_plan<C, V, S, N>(
    month: u32,
    year: i32,
    clients: &C,
    vehicles: &V,
    sink: &mut S,
    notifier: &mut N,
    config: &PlannerConfig,
) -> Result<PlanReport, PlanError>
where
    C: ClientSource,
    V: VehicleSource,
    S: AssignmentSink,
    N: Notifier,
{
    let mut report = PlanReport::default();

    let fleet = load_fleet(vehicles, &mut report)?;
    let calendar = month_calendar(year, month)?;
    let (routable, unroutable) = intake(clients.list_clients()?, config, &mut report);

    let clusterer = KMeansClusterer::from_config(config);
    let clusters = cluster::partition_clients(routable, &clusterer, config);

    let allocation = allocator::allocate(&clusters, &unroutable, &calendar, config);
    report.visits_unplaced = allocation.visits_unplaced;
    report.visits_without_route = allocation.visits_without_route;

    let provider = ResilientMatrix::from_strategy(&config.matrix, config.speed_kmh);

    for buckets in allocation.buckets {
        let mut carry: Vec<PlanningJob> = Vec::new();
        for (date, mut jobs) in buckets {
            jobs.append(&mut carry);
            if jobs.is_empty() {
                continue;
            }
            let solution = route_bucket(&jobs, &fleet, &provider, config);
            if solution.routes.is_empty() {
                report.buckets_infeasible += 1;
            }
            for &j in &solution.unassigned {
                carry.push(jobs[j].clone());
            }
            collect_assignments(date, &jobs, &solution, &mut report.assignments);
        }
        if !carry.is_empty() {
            warn!(
                stops = carry.len(),
                "stops left unrouted at month end, dropping"
            );
            report.stops_dropped += carry.len() as u32;
        }
    }

    let range = month_range(year, month, &calendar);
    sink.replace_assignments(range, &report.assignments)?;

    let summary = report.summary();
    info!(month, year, %summary, "monthly plan complete");
    notifier.post_message(&summary);
    Ok(report)
}

/// Plan a single day: route every client due on `date`. Replaces any
/// assignments previously stored for that day.
pub fn generate_daily_plan<C, V, S, N>(
    date: NaiveDate,
    clients: &C,
    vehicles: &V,
    sink: &mut S,
    notifier: &mut N,
    config: &PlannerConfig,
) -> Result<PlanReport, PlanError>
where
    C: ClientSource,
    V: VehicleSource,
    S: AssignmentSink,
    N: Notifier,
{
    let mut report = PlanReport::default();

    let fleet = load_fleet(vehicles, &mut report)?;
    let (routable, unroutable) = intake(clients.list_clients()?, config, &mut report);
    report.visits_without_route = unroutable
        .iter()
        .filter(|p| is_due(p.rule, date, first_of_month(date)))
        .count() as u32;

    let due: Vec<ClientPlan> = routable
        .into_iter()
        .filter(|p| is_due(p.rule, date, first_of_month(date)))
        .collect();

    if due.is_empty() {
        notifier.post_message(&format!("no eligible clients for {date}"));
        sink.replace_assignments((date, date), &[])?;
        return Ok(report);
    }

    let clusterer = KMeansClusterer::from_config(config);
    let clusters = cluster::partition_clients(due, &clusterer, config);
    let provider = ResilientMatrix::from_strategy(&config.matrix, config.speed_kmh);

    for cluster in &clusters {
        let jobs: Vec<PlanningJob> = cluster
            .members
            .iter()
            .filter_map(|p| p.template_job(config))
            .collect();
        if jobs.is_empty() {
            continue;
        }
        let solution = route_bucket(&jobs, &fleet, &provider, config);
        if solution.routes.is_empty() {
            report.buckets_infeasible += 1;
        }
        report.stops_dropped += solution.unassigned.len() as u32;
        collect_assignments(date, &jobs, &solution, &mut report.assignments);
    }

    sink.replace_assignments((date, date), &report.assignments)?;

    let summary = report.summary();
    info!(%date, %summary, "daily plan complete");
    notifier.post_message(&summary);
    Ok(report)
}

/// Load the fleet, normalising non-positive capacities to unlimited.
fn load_fleet<V: VehicleSource>(
    vehicles: &V,
    report: &mut PlanReport,
) -> Result<Vec<Vehicle>, PlanError> {
    let mut fleet = vehicles.list_vehicles()?;
    if fleet.is_empty() {
        return Err(PlanError::NoVehicles);
    }
    for vehicle in &mut fleet {
        if vehicle.capacity_kg <= 0.0 {
            warn!(vehicle = vehicle.id, "vehicle without capacity treated as unlimited");
            vehicle.capacity_kg = f64::INFINITY;
            report.vehicles_unlimited_capacity += 1;
        }
    }
    Ok(fleet)
}

/// Normalise raw clients into per-run plans, splitting off those that can
/// be weight-scheduled but never routed.
fn intake(
    clients: Vec<Client>,
    config: &PlannerConfig,
    report: &mut PlanReport,
) -> (Vec<ClientPlan>, Vec<ClientPlan>) {
    let mut routable = Vec::new();
    let mut unroutable = Vec::new();

    for client in clients {
        let weight = demand::per_visit_weight(&client.terms);
        let quota = demand::visits_per_month(&client.terms);
        if weight <= 0.0 || quota == 0 {
            report.clients_without_demand += 1;
            continue;
        }

        let depot_km = client.road_distance_from_depot_km.unwrap_or_else(|| {
            client
                .location
                .map(|loc| haversine_km(config.depot, loc))
                .unwrap_or(0.0)
        });
        let plan = ClientPlan {
            client_id: client.id,
            location: client.location,
            weight_kg: weight,
            rule: VisitRule::from_terms(&client.terms),
            quota,
            zone: client.zone,
            category: client.category,
            depot_km,
        };

        if plan.location.is_some() {
            routable.push(plan);
        } else {
            report.clients_without_coordinates += 1;
            unroutable.push(plan);
        }
    }

    (routable, unroutable)
}

/// Route one bucket with the configured strategy.
fn route_bucket(
    jobs: &[PlanningJob],
    fleet: &[Vehicle],
    provider: &ResilientMatrix,
    config: &PlannerConfig,
) -> BucketSolution {
    let mut locations = Vec::with_capacity(jobs.len() + 1);
    locations.push(config.depot);
    locations.extend(jobs.iter().map(|j| j.location));
    let matrix = provider.matrix_for(&locations);

    match config.solver {
        SolverStrategy::TimeWindow => {
            let options = SolveOptions {
                budget: std::time::Duration::from_millis(config.solver_budget_ms),
                local_search_iterations: config.local_search_iterations,
                work_start_secs: config.work_start_secs,
                work_end_secs: config.work_end_secs,
            };
            solve_bucket(jobs, fleet, &matrix, &options)
        }
        SolverStrategy::Greedy => pack_bucket(jobs, fleet, &matrix),
    }
}

fn collect_assignments(
    date: NaiveDate,
    jobs: &[PlanningJob],
    solution: &BucketSolution,
    assignments: &mut Vec<RouteAssignment>,
) {
    for route in &solution.routes {
        assignments.push(RouteAssignment {
            date,
            vehicle_id: route.vehicle_id,
            stops: route
                .stops
                .iter()
                .map(|s| RouteStop {
                    client_id: jobs[s.job].client_id,
                    weight_kg: jobs[s.job].weight_kg,
                    cumulative_secs: s.cumulative_secs,
                    arrival_secs: s.arrival_secs,
                    departure_secs: s.departure_secs,
                })
                .collect(),
            travel_secs: route.travel_secs,
            travel_km: route.travel_km,
        });
    }
}

fn month_range(year: i32, month: u32, calendar: &[NaiveDate]) -> (NaiveDate, NaiveDate) {
    let first = calendar
        .first()
        .copied()
        .map(first_of_month)
        .unwrap_or_default();
    let last = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .and_then(|d| d.pred_opt())
    .unwrap_or(first);
    (first, last)
}
