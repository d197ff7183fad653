//! Seams between the planning engine and the surrounding application.
//!
//! The engine consumes clients and vehicles through read-only sources and
//! emits finished plans through a sink; concrete apps implement these for
//! their own persistence layer.

use chrono::NaiveDate;

use crate::error::PlanError;
use crate::model::{Client, PlanningJob, RouteAssignment, Vehicle};

/// Read-only source of schedulable clients.
pub trait ClientSource {
    fn list_clients(&self) -> Result<Vec<Client>, PlanError>;
}

/// Read-only source of the available fleet.
pub trait VehicleSource {
    fn list_vehicles(&self) -> Result<Vec<Vehicle>, PlanError>;
}

/// Persistence sink for finished plans.
///
/// Implementations must delete any assignment previously stored for a date
/// inside `range` before inserting the new ones, as one atomic step.
pub trait AssignmentSink {
    fn replace_assignments(
        &mut self,
        range: (NaiveDate, NaiveDate),
        assignments: &[RouteAssignment],
    ) -> Result<(), PlanError>;
}

/// Operator-facing informational channel.
pub trait Notifier {
    fn post_message(&mut self, text: &str);
}

/// Duration and distance matrices over a set of locations, indexed by the
/// input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TravelMatrix {
    /// Travel time in seconds, `secs[i][j]` from location i to j.
    pub secs: Vec<Vec<i32>>,
    /// Driven distance in kilometres.
    pub km: Vec<Vec<f64>>,
}

impl TravelMatrix {
    pub fn len(&self) -> usize {
        self.secs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secs.is_empty()
    }
}

/// Provides a travel matrix for a set of (lat, lon) locations.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> TravelMatrix;
}

/// Partitions jobs into at most `k` groups, returning one label per job.
pub trait Clusterer {
    fn assign(&self, jobs: &[PlanningJob], k: usize) -> Vec<usize>;
}
