//! Route solver for one day's bucket of stops.
//!
//! Builds routes by cheapest feasible insertion, then improves them with
//! local search (intra-route 2-opt and inter-route relocate) until no move
//! helps or the wall-clock budget expires. Anytime behaviour: whatever
//! feasible solution is current when the budget runs out is returned.
//! Feasibility means vehicle capacity, per-stop time windows, and the
//! working-hours horizon for the whole route.

use std::time::{Duration, Instant};

use crate::model::{PlanningJob, Vehicle, VehicleId};
use crate::traits::TravelMatrix;

#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Wall-clock budget for the whole bucket.
    pub budget: Duration,
    /// Iteration cap for the improvement loop.
    pub local_search_iterations: usize,
    /// Route start, seconds from midnight.
    pub work_start_secs: i32,
    /// Latest return to depot, seconds from midnight.
    pub work_end_secs: i32,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            budget: Duration::from_secs(2),
            local_search_iterations: 100,
            work_start_secs: 8 * 3600,
            work_end_secs: 17 * 3600,
        }
    }
}

/// A routed stop. `job` indexes the bucket's job slice.
#[derive(Debug, Clone)]
pub struct SolvedStop {
    pub job: usize,
    /// Elapsed seconds from route start at arrival.
    pub cumulative_secs: i32,
    /// Arrival/departure clock times; absent for the greedy packer.
    pub arrival_secs: Option<i32>,
    pub departure_secs: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct VehicleRoute {
    pub vehicle_id: VehicleId,
    pub stops: Vec<SolvedStop>,
    pub travel_secs: i32,
    pub travel_km: f64,
}

/// Solver output for one bucket; `unassigned` jobs roll forward to the
/// cluster's next collection day.
#[derive(Debug, Clone, Default)]
pub struct BucketSolution {
    pub routes: Vec<VehicleRoute>,
    pub unassigned: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
struct Schedule {
    stops: Vec<SolvedStop>,
    travel_secs: i32,
    travel_km: f64,
}

#[derive(Debug, Clone)]
struct RouteState {
    vehicle_id: VehicleId,
    capacity_kg: f64,
    order: Vec<usize>,
    load_kg: f64,
    schedule: Schedule,
}

/// Walk a visiting order from the depot and back, checking every window.
///
/// Index 0 of the matrix is the depot; job `j` sits at `j + 1`. Returns
/// `None` when any stop would start after its window closes or the route
/// cannot return within working hours. Arriving early means waiting.
fn compute_schedule(
    order: &[usize],
    jobs: &[PlanningJob],
    matrix: &TravelMatrix,
    options: &SolveOptions,
) -> Option<Schedule> {
    let mut time = options.work_start_secs;
    let mut travel = 0i32;
    let mut km = 0.0;
    let mut stops = Vec::with_capacity(order.len());
    let mut prev = 0usize;

    for &j in order {
        let node = j + 1;
        let leg = matrix.secs[prev][node];
        time += leg;
        travel += leg;
        km += matrix.km[prev][node];

        let (window_start, window_end) = jobs[j].window;
        if time < window_start {
            time = window_start;
        }
        if time > window_end {
            return None;
        }

        let arrival = time;
        let departure = arrival + jobs[j].service_secs;
        stops.push(SolvedStop {
            job: j,
            cumulative_secs: arrival - options.work_start_secs,
            arrival_secs: Some(arrival),
            departure_secs: Some(departure),
        });
        time = departure;
        prev = node;
    }

    let leg = matrix.secs[prev][0];
    time += leg;
    travel += leg;
    km += matrix.km[prev][0];
    if time > options.work_end_secs {
        return None;
    }

    Some(Schedule {
        stops,
        travel_secs: travel,
        travel_km: km,
    })
}

/// Route a bucket of jobs onto the fleet, minimising driven distance.
pub fn solve_bucket(
    jobs: &[PlanningJob],
    vehicles: &[Vehicle],
    matrix: &TravelMatrix,
    options: &SolveOptions,
) -> BucketSolution {
    if jobs.is_empty() || vehicles.is_empty() {
        return BucketSolution {
            unassigned: (0..jobs.len()).collect(),
            ..Default::default()
        };
    }

    let deadline = Instant::now() + options.budget;
    let fleet = &vehicles[..vehicles.len().min(jobs.len())];

    let mut routes: Vec<RouteState> = fleet
        .iter()
        .map(|v| RouteState {
            vehicle_id: v.id,
            capacity_kg: v.capacity_kg,
            order: Vec::new(),
            load_kg: 0.0,
            schedule: Schedule::default(),
        })
        .collect();
    let mut unassigned = Vec::new();

    // Tightest deadline first, heaviest first on ties: hard stops claim
    // their slots before flexible ones fill the day.
    let mut pending: Vec<usize> = (0..jobs.len()).collect();
    pending.sort_by(|&a, &b| {
        jobs[a]
            .window
            .1
            .cmp(&jobs[b].window.1)
            .then(jobs[b].weight_kg.total_cmp(&jobs[a].weight_kg))
    });

    for j in pending {
        if Instant::now() >= deadline {
            unassigned.push(j);
            continue;
        }

        let mut best: Option<(usize, usize, Schedule)> = None;
        let mut best_delta = f64::INFINITY;

        for (route_idx, route) in routes.iter().enumerate() {
            if route.load_kg + jobs[j].weight_kg > route.capacity_kg {
                continue;
            }
            for position in 0..=route.order.len() {
                let mut candidate = route.order.clone();
                candidate.insert(position, j);
                if let Some(schedule) = compute_schedule(&candidate, jobs, matrix, options) {
                    let delta = schedule.travel_km - route.schedule.travel_km;
                    if delta < best_delta {
                        best_delta = delta;
                        best = Some((route_idx, position, schedule));
                    }
                }
            }
        }

        match best {
            Some((route_idx, position, schedule)) => {
                let route = &mut routes[route_idx];
                route.order.insert(position, j);
                route.load_kg += jobs[j].weight_kg;
                route.schedule = schedule;
            }
            None => unassigned.push(j),
        }
    }

    local_search(&mut routes, jobs, matrix, options, deadline);

    BucketSolution {
        routes: routes
            .into_iter()
            .filter(|r| !r.order.is_empty())
            .map(|r| VehicleRoute {
                vehicle_id: r.vehicle_id,
                stops: r.schedule.stops,
                travel_secs: r.schedule.travel_secs,
                travel_km: r.schedule.travel_km,
            })
            .collect(),
        unassigned,
    }
}

fn total_km(routes: &[RouteState]) -> f64 {
    routes.iter().map(|r| r.schedule.travel_km).sum()
}

/// Improvement loop: first-improvement 2-opt then relocate, repeated
/// until a full pass changes nothing, the iteration cap is hit, or the
/// deadline passes.
fn local_search(
    routes: &mut [RouteState],
    jobs: &[PlanningJob],
    matrix: &TravelMatrix,
    options: &SolveOptions,
    deadline: Instant,
) {
    for _ in 0..options.local_search_iterations {
        if Instant::now() >= deadline {
            break;
        }
        let mut improved = false;

        for route in routes.iter_mut() {
            if two_opt_improve(route, jobs, matrix, options, deadline) {
                improved = true;
            }
        }

        if relocate_improve(routes, jobs, matrix, options, deadline) {
            improved = true;
        }

        if !improved {
            break;
        }
    }
}

/// Reverse a segment within a route when that shortens it.
fn two_opt_improve(
    route: &mut RouteState,
    jobs: &[PlanningJob],
    matrix: &TravelMatrix,
    options: &SolveOptions,
    deadline: Instant,
) -> bool {
    let n = route.order.len();
    if n < 3 {
        return false;
    }

    for i in 0..n - 1 {
        if Instant::now() >= deadline {
            return false;
        }
        for j in i + 2..n {
            let mut candidate = route.order.clone();
            candidate[i + 1..=j].reverse();

            if let Some(schedule) = compute_schedule(&candidate, jobs, matrix, options) {
                if schedule.travel_km < route.schedule.travel_km {
                    route.order = candidate;
                    route.schedule = schedule;
                    return true;
                }
            }
        }
    }

    false
}

/// Move one stop to another position or vehicle when that reduces the
/// fleet's total distance.
fn relocate_improve(
    routes: &mut [RouteState],
    jobs: &[PlanningJob],
    matrix: &TravelMatrix,
    options: &SolveOptions,
    deadline: Instant,
) -> bool {
    let current_total = total_km(routes);

    for from_idx in 0..routes.len() {
        for stop_idx in 0..routes[from_idx].order.len() {
            if Instant::now() >= deadline {
                return false;
            }
            let job = routes[from_idx].order[stop_idx];

            for to_idx in 0..routes.len() {
                let same_route = from_idx == to_idx;
                if !same_route
                    && routes[to_idx].load_kg + jobs[job].weight_kg
                        > routes[to_idx].capacity_kg
                {
                    continue;
                }

                let mut from_candidate = routes[from_idx].order.clone();
                from_candidate.remove(stop_idx);

                let positions = if same_route {
                    from_candidate.len() + 1
                } else {
                    routes[to_idx].order.len() + 1
                };

                for position in 0..positions {
                    if same_route && (position == stop_idx) {
                        continue;
                    }

                    if same_route {
                        let mut candidate = from_candidate.clone();
                        candidate.insert(position, job);
                        let Some(schedule) =
                            compute_schedule(&candidate, jobs, matrix, options)
                        else {
                            continue;
                        };
                        let others: f64 = routes
                            .iter()
                            .enumerate()
                            .filter(|(i, _)| *i != from_idx)
                            .map(|(_, r)| r.schedule.travel_km)
                            .sum();
                        if schedule.travel_km + others < current_total {
                            routes[from_idx].order = candidate;
                            routes[from_idx].schedule = schedule;
                            return true;
                        }
                    } else {
                        let mut to_candidate = routes[to_idx].order.clone();
                        to_candidate.insert(position, job);

                        let Some(from_schedule) =
                            compute_schedule(&from_candidate, jobs, matrix, options)
                        else {
                            continue;
                        };
                        let Some(to_schedule) =
                            compute_schedule(&to_candidate, jobs, matrix, options)
                        else {
                            continue;
                        };

                        let others: f64 = routes
                            .iter()
                            .enumerate()
                            .filter(|(i, _)| *i != from_idx && *i != to_idx)
                            .map(|(_, r)| r.schedule.travel_km)
                            .sum();
                        if from_schedule.travel_km + to_schedule.travel_km + others
                            < current_total
                        {
                            let weight = jobs[job].weight_kg;
                            routes[from_idx].order.remove(stop_idx);
                            routes[from_idx].load_kg -= weight;
                            routes[from_idx].schedule = from_schedule;
                            routes[to_idx].order.insert(position, job);
                            routes[to_idx].load_kg += weight;
                            routes[to_idx].schedule = to_schedule;
                            return true;
                        }
                    }
                }
            }
        }
    }

    false
}
