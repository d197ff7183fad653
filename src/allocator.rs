//! Monthly capacity allocation.
//!
//! Spreads each client's required visits across the working calendar so
//! that no day's committed weight exceeds the daily ceiling. Days already
//! serving a client's cluster are preferred, keeping a day's collection
//! geographically compact. Placement is best-effort: a client that cannot
//! fit all its visits simply gets fewer that month.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use tracing::warn;

use crate::cluster::Cluster;
use crate::config::PlannerConfig;
use crate::eligibility::{first_of_month, is_due};
use crate::model::{ClientPlan, PlanningJob, VisitRule};

/// Weight committed per calendar day, plus which cluster each day serves.
/// Only ever increased during a run, discarded afterwards.
#[derive(Debug, Default)]
pub struct DailyCapacityLedger {
    committed: HashMap<NaiveDate, f64>,
    bound_cluster: HashMap<NaiveDate, usize>,
}

impl DailyCapacityLedger {
    pub fn load(&self, date: NaiveDate) -> f64 {
        self.committed.get(&date).copied().unwrap_or(0.0)
    }

    pub fn commit(&mut self, date: NaiveDate, kg: f64) {
        *self.committed.entry(date).or_insert(0.0) += kg;
    }

    pub fn binding(&self, date: NaiveDate) -> Option<usize> {
        self.bound_cluster.get(&date).copied()
    }

    pub fn bind(&mut self, date: NaiveDate, cluster: usize) {
        self.bound_cluster.entry(date).or_insert(cluster);
    }
}

/// Outcome of the allocation pass.
#[derive(Debug, Default)]
pub struct Allocation {
    /// Visit jobs per cluster (input order), keyed by date.
    pub buckets: Vec<BTreeMap<NaiveDate, Vec<PlanningJob>>>,
    /// Visits that found no date within capacity.
    pub visits_unplaced: u32,
    /// Visits placed for clients that cannot be routed (no coordinates).
    pub visits_without_route: u32,
}

/// Assign every client's monthly visits to concrete dates.
///
/// Clusters are processed in order, fixed-weekday clients first within
/// each cluster. Unroutable clients are placed last: they consume daily
/// capacity but never appear in a routing bucket.
pub fn allocate(
    clusters: &[Cluster],
    unroutable: &[ClientPlan],
    calendar: &[NaiveDate],
    config: &PlannerConfig,
) -> Allocation {
    let mut ledger = DailyCapacityLedger::default();
    let mut allocation = Allocation {
        buckets: vec![BTreeMap::new(); clusters.len()],
        ..Default::default()
    };

    let Some(&first_day) = calendar.first() else {
        return allocation;
    };
    let month_start = first_of_month(first_day);

    for (cluster_idx, cluster) in clusters.iter().enumerate() {
        let mut members: Vec<&ClientPlan> = cluster.members.iter().collect();
        members.sort_by_key(|m| !matches!(m.rule, VisitRule::FixedWeekday(_)));

        for plan in members {
            let Some(job) = plan.template_job(config) else {
                continue;
            };
            let placed = place_client(
                plan,
                Some(cluster_idx),
                calendar,
                month_start,
                &mut ledger,
                config,
                |date| {
                    allocation.buckets[cluster_idx]
                        .entry(date)
                        .or_default()
                        .push(job.clone());
                },
            );
            if placed < plan.quota {
                let shortfall = plan.quota - placed;
                warn!(
                    client = plan.client_id,
                    shortfall, "daily capacity exhausted, client gets fewer visits"
                );
                allocation.visits_unplaced += shortfall;
            }
        }
    }

    for plan in unroutable {
        let placed = place_client(
            plan,
            None,
            calendar,
            month_start,
            &mut ledger,
            config,
            |_| {},
        );
        allocation.visits_without_route += placed;
        if placed < plan.quota {
            let shortfall = plan.quota - placed;
            warn!(
                client = plan.client_id,
                shortfall, "daily capacity exhausted, client gets fewer visits"
            );
            allocation.visits_unplaced += shortfall;
        }
    }

    allocation
}

/// Place up to `quota` visits for one client, returning how many landed.
fn place_client(
    plan: &ClientPlan,
    cluster: Option<usize>,
    calendar: &[NaiveDate],
    month_start: NaiveDate,
    ledger: &mut DailyCapacityLedger,
    config: &PlannerConfig,
    mut on_placed: impl FnMut(NaiveDate),
) -> u32 {
    let eligible: Vec<NaiveDate> = calendar
        .iter()
        .copied()
        .filter(|&d| is_due(plan.rule, d, month_start))
        .collect();

    // Days already serving this client's cluster (or still unclaimed) are
    // tried before days bound elsewhere; each group least-loaded first.
    let (mut preferred, mut fallback): (Vec<NaiveDate>, Vec<NaiveDate>) =
        eligible.into_iter().partition(|&d| match cluster {
            Some(c) => ledger.binding(d).is_none_or(|bound| bound == c),
            None => true,
        });
    let by_load = |ledger: &DailyCapacityLedger, dates: &mut Vec<NaiveDate>| {
        dates.sort_by(|a, b| {
            ledger
                .load(*a)
                .total_cmp(&ledger.load(*b))
                .then(a.cmp(b))
        });
    };
    by_load(ledger, &mut preferred);
    by_load(ledger, &mut fallback);

    let mut placed = 0;
    for date in preferred.into_iter().chain(fallback) {
        if placed >= plan.quota {
            break;
        }
        if ledger.load(date) + plan.weight_kg > config.daily_capacity_kg {
            continue;
        }
        ledger.commit(date, plan.weight_kg);
        if let Some(c) = cluster {
            ledger.bind(date, c);
        }
        on_placed(date);
        placed += 1;
    }
    placed
}
