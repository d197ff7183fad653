//! Spatial clustering of collection stops.
//!
//! Groups clients into geographically coherent zones before dates and
//! vehicles are assigned, so each day's route stays compact. Stops far
//! from the depot are isolated into dedicated clusters up front; one
//! distant client must not drag a whole route out of town.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

use crate::config::PlannerConfig;
use crate::model::{ClientPlan, PlanningJob};
use crate::traits::Clusterer;

/// A group of clients routed together, in processing order.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub members: Vec<ClientPlan>,
}

/// Seeded k-means over a two-feature space.
///
/// When every job carries a zone label the features are
/// `[distance from depot, zone index * zone_weight]`; the zone term is
/// scaled so clients from different zones rarely share a cluster.
/// Otherwise raw (lat, lon) is used. Same seed and input give the same
/// labels.
#[derive(Debug, Clone)]
pub struct KMeansClusterer {
    pub seed: u64,
    pub max_iters: usize,
    pub zone_weight: f64,
}

impl KMeansClusterer {
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            seed: config.kmeans_seed,
            max_iters: config.kmeans_max_iters,
            zone_weight: config.zone_weight,
        }
    }

    fn features(&self, jobs: &[PlanningJob]) -> Vec<[f64; 2]> {
        let zoned = jobs.iter().all(|j| j.zone.is_some());
        jobs.iter()
            .map(|j| {
                if zoned {
                    let zone = f64::from(j.zone.unwrap_or(0));
                    [j.depot_km, zone * self.zone_weight]
                } else {
                    [j.location.0, j.location.1]
                }
            })
            .collect()
    }
}

fn sq_dist(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

fn nearest_centroid(point: [f64; 2], centroids: &[[f64; 2]]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = sq_dist(point, *c);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

impl Clusterer for KMeansClusterer {
    fn assign(&self, jobs: &[PlanningJob], k: usize) -> Vec<usize> {
        let n = jobs.len();
        let k = k.min(n);
        if n == 0 {
            return Vec::new();
        }
        if k <= 1 {
            return vec![0; n];
        }

        let features = self.features(jobs);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        // Farthest-point seeding: first centroid at random, each next one
        // at the point farthest from all chosen so far. Spreads centroids
        // across zones before refinement starts.
        let mut centroids: Vec<[f64; 2]> = vec![features[rng.gen_range(0..n)]];
        while centroids.len() < k {
            let mut next = 0;
            let mut next_dist = -1.0;
            for (i, point) in features.iter().enumerate() {
                let d = centroids
                    .iter()
                    .map(|c| sq_dist(*point, *c))
                    .fold(f64::INFINITY, f64::min);
                if d > next_dist {
                    next_dist = d;
                    next = i;
                }
            }
            centroids.push(features[next]);
        }
        let mut labels = vec![0usize; n];

        for _ in 0..self.max_iters.max(1) {
            let mut changed = false;
            for (i, point) in features.iter().enumerate() {
                let label = nearest_centroid(*point, &centroids);
                if labels[i] != label {
                    labels[i] = label;
                    changed = true;
                }
            }

            // Re-seed any cluster that lost all members from the point
            // farthest from its own centroid.
            let mut counts = vec![0usize; k];
            for &label in &labels {
                counts[label] += 1;
            }
            for empty in 0..k {
                if counts[empty] > 0 {
                    continue;
                }
                let mut farthest = None;
                let mut farthest_dist = -1.0;
                for (i, point) in features.iter().enumerate() {
                    if counts[labels[i]] <= 1 {
                        continue;
                    }
                    let d = sq_dist(*point, centroids[labels[i]]);
                    if d > farthest_dist {
                        farthest_dist = d;
                        farthest = Some(i);
                    }
                }
                if let Some(i) = farthest {
                    counts[labels[i]] -= 1;
                    labels[i] = empty;
                    counts[empty] += 1;
                    changed = true;
                }
            }

            let mut sums = vec![[0.0f64; 2]; k];
            for (i, point) in features.iter().enumerate() {
                sums[labels[i]][0] += point[0];
                sums[labels[i]][1] += point[1];
            }
            for (c, sum) in sums.iter().enumerate() {
                if counts[c] > 0 {
                    let count = counts[c] as f64;
                    centroids[c] = [sum[0] / count, sum[1] / count];
                }
            }

            if !changed {
                break;
            }
        }

        labels
    }
}

/// Partition routable clients into ordered clusters.
///
/// Far clients (beyond `far_threshold_km`) are grouped per zone without
/// touching the main clusterer. Clusters come back ordered by
/// (minimum zone index, minimum depot distance) ascending, so nearby
/// low-zone groups are served first.
pub fn partition_clients(
    plans: Vec<ClientPlan>,
    clusterer: &dyn Clusterer,
    config: &PlannerConfig,
) -> Vec<Cluster> {
    let mut near: Vec<ClientPlan> = Vec::new();
    let mut far_groups: BTreeMap<u32, Vec<ClientPlan>> = BTreeMap::new();

    for plan in plans {
        if plan.depot_km > config.far_threshold_km {
            far_groups
                .entry(plan.zone.unwrap_or(u32::MAX))
                .or_default()
                .push(plan);
        } else {
            near.push(plan);
        }
    }

    let mut clusters: Vec<Cluster> = Vec::new();

    if !near.is_empty() {
        let jobs: Vec<PlanningJob> = near
            .iter()
            .filter_map(|p| p.template_job(config))
            .collect();
        let k = config.desired_clusters.min(jobs.len()).max(1);
        let labels = clusterer.assign(&jobs, k);

        let mut groups: BTreeMap<usize, Vec<ClientPlan>> = BTreeMap::new();
        for (plan, label) in near.into_iter().zip(labels) {
            groups.entry(label).or_default().push(plan);
        }
        clusters.extend(groups.into_values().map(|members| Cluster { members }));
    }

    clusters.extend(
        far_groups
            .into_values()
            .map(|members| Cluster { members }),
    );

    clusters.sort_by(|a, b| cluster_rank(a).partial_cmp(&cluster_rank(b)).unwrap_or(std::cmp::Ordering::Equal));
    clusters
}

fn cluster_rank(cluster: &Cluster) -> (u32, f64) {
    let zone = cluster
        .members
        .iter()
        .map(|m| m.zone.unwrap_or(u32::MAX))
        .min()
        .unwrap_or(u32::MAX);
    let km = cluster
        .members
        .iter()
        .map(|m| m.depot_km)
        .fold(f64::INFINITY, f64::min);
    (zone, km)
}
