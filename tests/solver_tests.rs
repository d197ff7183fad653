//! Route solver and greedy packer tests.

use std::time::Duration;

use collecte_planner::haversine::HaversineMatrix;
use collecte_planner::model::{PlanningJob, Vehicle};
use collecte_planner::packer::pack_bucket;
use collecte_planner::solver::{solve_bucket, SolveOptions};
use collecte_planner::traits::{DistanceMatrixProvider, TravelMatrix};

mod fixtures;
use fixtures::tunis_locations::DEPOT;

// ============================================================================
// Fixtures
// ============================================================================

const WORK_START: i32 = 8 * 3600;
const WORK_END: i32 = 17 * 3600;

fn job_at(lat: f64, lon: f64, weight_kg: f64) -> PlanningJob {
    PlanningJob {
        client_id: 0,
        location: (lat, lon),
        weight_kg,
        window: (WORK_START, WORK_END),
        service_secs: 600,
        zone: None,
        depot_km: 0.0,
    }
}

fn vehicle(id: u64, capacity_kg: f64) -> Vehicle {
    Vehicle { id, capacity_kg }
}

fn matrix_over(jobs: &[PlanningJob]) -> TravelMatrix {
    let mut locations = vec![DEPOT.coords()];
    locations.extend(jobs.iter().map(|j| j.location));
    HaversineMatrix::default().matrix_for(&locations)
}

fn options() -> SolveOptions {
    SolveOptions {
        budget: Duration::from_secs(2),
        local_search_iterations: 100,
        work_start_secs: WORK_START,
        work_end_secs: WORK_END,
    }
}

// ============================================================================
// Solver
// ============================================================================

#[test]
fn routes_every_stop_with_nondecreasing_arrivals() {
    let (lat, lon) = DEPOT.coords();
    let jobs = vec![
        job_at(lat + 0.02, lon, 200.0),
        job_at(lat + 0.04, lon, 200.0),
        job_at(lat - 0.03, lon, 200.0),
    ];
    let solution = solve_bucket(&jobs, &[vehicle(1, 5000.0)], &matrix_over(&jobs), &options());

    assert!(solution.unassigned.is_empty());
    let routed: usize = solution.routes.iter().map(|r| r.stops.len()).sum();
    assert_eq!(routed, jobs.len());

    for route in &solution.routes {
        let mut last_arrival = WORK_START;
        for stop in &route.stops {
            let arrival = stop.arrival_secs.expect("solver emits arrival times");
            let departure = stop.departure_secs.expect("solver emits departure times");
            assert!(arrival >= last_arrival, "arrivals must not go backwards");
            assert_eq!(departure, arrival + jobs[stop.job].service_secs);
            let (start, end) = jobs[stop.job].window;
            assert!(arrival >= start && arrival <= end, "arrival outside window");
            last_arrival = arrival;
        }
    }
}

#[test]
fn solver_distance_never_exceeds_greedy_order() {
    // Stops on a rough north-south line: greedy depot-distance order
    // zigzags, the solver should not.
    let (lat, lon) = DEPOT.coords();
    let jobs = vec![
        job_at(lat + 0.01, lon, 100.0),
        job_at(lat - 0.02, lon, 100.0),
        job_at(lat + 0.03, lon, 100.0),
    ];
    let matrix = matrix_over(&jobs);
    let fleet = [vehicle(1, 5000.0)];

    let solved = solve_bucket(&jobs, &fleet, &matrix, &options());
    let packed = pack_bucket(&jobs, &fleet, &matrix);

    let solved_km: f64 = solved.routes.iter().map(|r| r.travel_km).sum();
    let packed_km: f64 = packed.routes.iter().map(|r| r.travel_km).sum();
    assert!(solved.unassigned.is_empty());
    assert!(
        solved_km <= packed_km + 1e-9,
        "solver ({solved_km} km) lost to naive order ({packed_km} km)"
    );
}

#[test]
fn vehicle_capacity_is_respected() {
    let (lat, lon) = DEPOT.coords();
    let jobs: Vec<_> = (0..4)
        .map(|i| job_at(lat + 0.01 * f64::from(i), lon, 300.0))
        .collect();
    let fleet = [vehicle(1, 600.0), vehicle(2, 600.0)];

    let solution = solve_bucket(&jobs, &fleet, &matrix_over(&jobs), &options());

    assert!(solution.unassigned.is_empty());
    for route in &solution.routes {
        let load: f64 = route.stops.iter().map(|s| jobs[s.job].weight_kg).sum();
        assert!(load <= 600.0, "route load {load} exceeds capacity");
    }
}

#[test]
fn unreachable_window_leaves_the_stop_unassigned() {
    let (lat, lon) = DEPOT.coords();
    let mut far = job_at(lat - 2.0, lon + 0.6, 100.0); // Sfax, hours away
    far.window = (WORK_START, WORK_START + 1800);
    let near = job_at(lat + 0.01, lon, 100.0);
    let jobs = vec![far, near];

    let solution = solve_bucket(&jobs, &[vehicle(1, 5000.0)], &matrix_over(&jobs), &options());

    assert_eq!(solution.unassigned, vec![0]);
    let routed: usize = solution.routes.iter().map(|r| r.stops.len()).sum();
    assert_eq!(routed, 1);
}

#[test]
fn morning_only_window_is_honoured() {
    let (lat, lon) = DEPOT.coords();
    let mut private = job_at(lat + 0.05, lon + 0.02, 150.0);
    private.window = (WORK_START, 13 * 3600);
    let jobs = vec![private, job_at(lat + 0.02, lon, 150.0)];

    let solution = solve_bucket(&jobs, &[vehicle(1, 5000.0)], &matrix_over(&jobs), &options());

    for route in &solution.routes {
        for stop in &route.stops {
            if stop.job == 0 {
                let arrival = stop.arrival_secs.unwrap();
                assert!(arrival <= 13 * 3600, "private stop served after cutoff");
            }
        }
    }
}

#[test]
fn expired_budget_returns_no_routes() {
    let (lat, lon) = DEPOT.coords();
    let jobs = vec![job_at(lat + 0.01, lon, 100.0)];
    let mut opts = options();
    opts.budget = Duration::ZERO;

    let solution = solve_bucket(&jobs, &[vehicle(1, 5000.0)], &matrix_over(&jobs), &opts);

    assert_eq!(solution.unassigned, vec![0]);
    assert!(solution.routes.is_empty());
}

#[test]
fn empty_fleet_assigns_nothing() {
    let (lat, lon) = DEPOT.coords();
    let jobs = vec![job_at(lat + 0.01, lon, 100.0)];
    let solution = solve_bucket(&jobs, &[], &matrix_over(&jobs), &options());
    assert_eq!(solution.unassigned, vec![0]);
}

// ============================================================================
// Greedy packer
// ============================================================================

#[test]
fn packer_fills_vehicles_in_depot_distance_order() {
    let (lat, lon) = DEPOT.coords();
    // Increasing distance from the depot; ids track the expected order.
    let jobs: Vec<_> = (0..4)
        .map(|i| job_at(lat + 0.01 * f64::from(i + 1), lon, 300.0))
        .collect();
    let fleet = [vehicle(1, 600.0), vehicle(2, 600.0)];

    let solution = pack_bucket(&jobs, &fleet, &matrix_over(&jobs));

    assert!(solution.unassigned.is_empty());
    assert_eq!(solution.routes.len(), 2);
    let first: Vec<usize> = solution.routes[0].stops.iter().map(|s| s.job).collect();
    let second: Vec<usize> = solution.routes[1].stops.iter().map(|s| s.job).collect();
    assert_eq!(first, vec![0, 1], "nearest stops fill the first vehicle");
    assert_eq!(second, vec![2, 3]);
}

#[test]
fn packer_reports_cumulative_time_without_clock_estimates() {
    let (lat, lon) = DEPOT.coords();
    let jobs = vec![
        job_at(lat + 0.02, lon, 100.0),
        job_at(lat + 0.05, lon, 100.0),
    ];
    let solution = pack_bucket(&jobs, &[vehicle(1, 5000.0)], &matrix_over(&jobs));

    let route = &solution.routes[0];
    let mut last = 0;
    for stop in &route.stops {
        assert!(stop.arrival_secs.is_none());
        assert!(stop.departure_secs.is_none());
        assert!(stop.cumulative_secs > last, "cumulative time must grow");
        last = stop.cumulative_secs;
    }
}

#[test]
fn oversized_job_does_not_burn_the_fleet() {
    let (lat, lon) = DEPOT.coords();
    let jobs = vec![
        job_at(lat + 0.01, lon, 9000.0),
        job_at(lat + 0.02, lon, 300.0),
    ];
    let solution = pack_bucket(&jobs, &[vehicle(1, 600.0)], &matrix_over(&jobs));

    assert_eq!(solution.unassigned, vec![0]);
    assert_eq!(solution.routes.len(), 1);
    assert_eq!(solution.routes[0].stops[0].job, 1);
}
