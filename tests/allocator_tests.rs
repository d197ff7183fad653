//! Allocation tests: capacity ledger, date preference, eligibility.

use chrono::{Datelike, NaiveDate, Weekday};

use collecte_planner::allocator::allocate;
use collecte_planner::cluster::Cluster;
use collecte_planner::config::PlannerConfig;
use collecte_planner::eligibility::{is_due, month_calendar};
use collecte_planner::model::{ClientCategory, ClientPlan, VisitRule};

// ============================================================================
// Fixtures
// ============================================================================

fn plan(id: u64, weight_kg: f64, rule: VisitRule, quota: u32) -> ClientPlan {
    ClientPlan {
        client_id: id,
        location: Some((36.8065, 10.1815)),
        weight_kg,
        rule,
        quota,
        zone: Some(0),
        category: ClientCategory::State,
        depot_km: 5.0,
    }
}

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
}

fn june() -> Vec<NaiveDate> {
    month_calendar(2025, 6).unwrap()
}

fn config() -> PlannerConfig {
    PlannerConfig {
        daily_capacity_kg: 1000.0,
        ..Default::default()
    }
}

/// Total weight booked per date across every cluster bucket.
fn daily_totals(
    allocation: &collecte_planner::allocator::Allocation,
) -> std::collections::BTreeMap<NaiveDate, f64> {
    let mut totals = std::collections::BTreeMap::new();
    for buckets in &allocation.buckets {
        for (day, jobs) in buckets {
            let weight: f64 = jobs.iter().map(|j| j.weight_kg).sum();
            *totals.entry(*day).or_insert(0.0) += weight;
        }
    }
    totals
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn capacity_overflow_defers_to_another_eligible_day() {
    let rule = VisitRule::FixedWeekday(Weekday::Tue);
    let cluster = Cluster {
        members: vec![plan(1, 600.0, rule, 1), plan(2, 600.0, rule, 1)],
    };

    let allocation = allocate(&[cluster], &[], &june(), &config());

    let totals = daily_totals(&allocation);
    assert_eq!(allocation.visits_unplaced, 0);
    assert_eq!(totals.len(), 2, "the two visits must land on distinct days");
    for (day, total) in totals {
        assert_eq!(day.weekday(), Weekday::Tue);
        assert_eq!(total, 600.0, "no day may carry both 600 kg visits");
    }
}

#[test]
fn overflow_with_no_remaining_day_is_dropped_not_doubled() {
    let rule = VisitRule::FixedWeekday(Weekday::Tue);
    let cluster = Cluster {
        members: vec![plan(1, 600.0, rule, 1), plan(2, 600.0, rule, 1)],
    };
    // Only one eligible day in the whole window.
    let calendar = vec![date(3)];

    let allocation = allocate(&[cluster], &[], &calendar, &config());

    let totals = daily_totals(&allocation);
    assert_eq!(allocation.visits_unplaced, 1);
    assert_eq!(totals.get(&date(3)).copied(), Some(600.0));
}

#[test]
fn every_assigned_date_satisfies_the_client_rule() {
    let rules = [
        (1u64, VisitRule::FixedWeekday(Weekday::Wed)),
        (2, VisitRule::TimesPerWeek(2)),
        (3, VisitRule::EveryKDays(3)),
    ];
    let cluster = Cluster {
        members: rules
            .iter()
            .map(|&(id, rule)| plan(id, 50.0, rule, 4))
            .collect(),
    };

    let calendar = june();
    let allocation = allocate(&[cluster], &[], &calendar, &config());

    let month_start = date(1);
    for buckets in &allocation.buckets {
        for (day, jobs) in buckets {
            for job in jobs {
                let (_, rule) = rules
                    .iter()
                    .find(|(id, _)| *id == job.client_id)
                    .expect("job from unknown client");
                assert!(
                    is_due(*rule, *day, month_start),
                    "client {} booked on {} which its rule does not allow",
                    job.client_id,
                    day
                );
            }
        }
    }
}

#[test]
fn clusters_prefer_days_not_claimed_by_others() {
    let rule = VisitRule::TimesPerWeek(5);
    let first = Cluster {
        members: vec![plan(1, 100.0, rule, 4)],
    };
    let second = Cluster {
        members: vec![plan(2, 100.0, rule, 4)],
    };

    let allocation = allocate(&[first, second], &[], &june(), &config());

    let days_of = |idx: usize| -> Vec<NaiveDate> {
        allocation.buckets[idx].keys().copied().collect()
    };
    for day in days_of(0) {
        assert!(
            !days_of(1).contains(&day),
            "{day} serves both clusters despite free days remaining"
        );
    }
}

#[test]
fn fixed_day_clients_claim_their_day_first() {
    let mut config = config();
    config.daily_capacity_kg = 600.0;
    let cluster = Cluster {
        members: vec![
            // Flexible client listed first on purpose.
            plan(1, 600.0, VisitRule::TimesPerWeek(5), 1),
            plan(2, 600.0, VisitRule::FixedWeekday(Weekday::Mon), 1),
        ],
    };

    let allocation = allocate(&[cluster], &[], &june(), &config);

    let fixed_day = allocation.buckets[0]
        .iter()
        .find_map(|(day, jobs)| jobs.iter().any(|j| j.client_id == 2).then_some(*day))
        .expect("fixed-day client was not placed");
    assert_eq!(fixed_day.weekday(), Weekday::Mon);
}

#[test]
fn unroutable_clients_consume_capacity_without_jobs() {
    let rule = VisitRule::FixedWeekday(Weekday::Tue);
    let mut unroutable = plan(9, 600.0, rule, 1);
    unroutable.location = None;

    let allocation = allocate(&[], &[unroutable], &june(), &config());

    assert_eq!(allocation.visits_without_route, 1);
    assert!(allocation.buckets.is_empty());
}

#[test]
fn routable_and_unroutable_share_the_same_ledger() {
    let rule = VisitRule::FixedWeekday(Weekday::Tue);
    let cluster = Cluster {
        members: vec![plan(1, 600.0, rule, 1)],
    };
    let mut unroutable = plan(9, 600.0, rule, 1);
    unroutable.location = None;

    // One eligible day; the routable cluster is allocated first and the
    // unroutable client must not overbook it.
    let allocation = allocate(&[cluster], &[unroutable], &[date(3)], &config());

    assert_eq!(allocation.visits_without_route, 0);
    assert_eq!(allocation.visits_unplaced, 1);
    assert_eq!(daily_totals(&allocation).get(&date(3)).copied(), Some(600.0));
}
