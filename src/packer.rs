//! Greedy fallback packing.
//!
//! Deterministic alternative to the route solver: stops sorted by distance
//! from the depot, vehicles filled in that order until capacity, no time
//! windows and no reordering. Cumulative drive + service time is computed
//! along the fixed order for reporting only.

use crate::model::{PlanningJob, Vehicle, VehicleId};
use crate::solver::{BucketSolution, SolvedStop, VehicleRoute};
use crate::traits::TravelMatrix;

/// Pack a bucket of jobs onto the fleet in depot-distance order.
pub fn pack_bucket(
    jobs: &[PlanningJob],
    vehicles: &[Vehicle],
    matrix: &TravelMatrix,
) -> BucketSolution {
    if jobs.is_empty() || vehicles.is_empty() {
        return BucketSolution {
            unassigned: (0..jobs.len()).collect(),
            ..Default::default()
        };
    }

    let mut order: Vec<usize> = (0..jobs.len()).collect();
    order.sort_by(|&a, &b| matrix.km[0][a + 1].total_cmp(&matrix.km[0][b + 1]));

    let mut routes = Vec::new();
    let mut unassigned = Vec::new();
    let mut vehicle_idx = 0;
    let mut current: Vec<usize> = Vec::new();
    let mut load = 0.0;

    for j in order {
        let weight = jobs[j].weight_kg;
        loop {
            if vehicle_idx >= vehicles.len() {
                unassigned.push(j);
                break;
            }
            if load + weight <= vehicles[vehicle_idx].capacity_kg {
                current.push(j);
                load += weight;
                break;
            }
            if current.is_empty() {
                // Heavier than an empty vehicle: skip the job, keep the
                // vehicle for the rest.
                unassigned.push(j);
                break;
            }
            routes.push(build_route(&current, jobs, vehicles[vehicle_idx].id, matrix));
            current.clear();
            load = 0.0;
            vehicle_idx += 1;
        }
    }

    if !current.is_empty() && vehicle_idx < vehicles.len() {
        routes.push(build_route(&current, jobs, vehicles[vehicle_idx].id, matrix));
    }

    BucketSolution { routes, unassigned }
}

fn build_route(
    order: &[usize],
    jobs: &[PlanningJob],
    vehicle_id: VehicleId,
    matrix: &TravelMatrix,
) -> VehicleRoute {
    let mut elapsed = 0i32;
    let mut travel = 0i32;
    let mut km = 0.0;
    let mut prev = 0usize;
    let mut stops = Vec::with_capacity(order.len());

    for &j in order {
        let node = j + 1;
        let leg = matrix.secs[prev][node];
        elapsed += leg;
        travel += leg;
        km += matrix.km[prev][node];
        stops.push(SolvedStop {
            job: j,
            cumulative_secs: elapsed,
            arrival_secs: None,
            departure_secs: None,
        });
        elapsed += jobs[j].service_secs;
        prev = node;
    }

    travel += matrix.secs[prev][0];
    km += matrix.km[prev][0];

    VehicleRoute {
        vehicle_id,
        stops,
        travel_secs: travel,
        travel_km: km,
    }
}
