//! Road-network travel matrices via an external table service.
//!
//! The remote lookup is strictly best-effort: any transport error, non-200
//! status, timeout, or malformed body degrades that call to the haversine
//! estimate. A planning run never fails because the service is down.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;

use crate::config::{MatrixStrategy, RemoteMatrixConfig};
use crate::haversine::HaversineMatrix;
use crate::traits::{DistanceMatrixProvider, TravelMatrix};

#[derive(Debug)]
enum FetchError {
    Http(reqwest::Error),
    /// Response decoded but did not cover every requested location.
    Shape,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(err)
    }
}

/// HTTP client for an OSRM-style `/table` endpoint.
#[derive(Debug, Clone)]
pub struct RemoteMatrixClient {
    config: RemoteMatrixConfig,
    client: reqwest::blocking::Client,
}

impl RemoteMatrixClient {
    pub fn new(config: RemoteMatrixConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn fetch(&self, locations: &[(f64, f64)]) -> Result<TravelMatrix, FetchError> {
        let coords = locations
            .iter()
            .map(|(lat, lon)| format!("{:.6},{:.6}", lon, lat))
            .collect::<Vec<_>>()
            .join(";");

        let url = format!(
            "{}/table/v1/{}/{}?annotations=duration,distance",
            self.config.base_url, self.config.profile, coords
        );

        let body = self
            .client
            .get(url)
            .send()?
            .error_for_status()?
            .json::<TableResponse>()?;

        let (Some(durations), Some(distances)) = (body.durations, body.distances) else {
            return Err(FetchError::Shape);
        };

        let n = locations.len();
        if durations.len() != n
            || distances.len() != n
            || durations.iter().any(|row| row.len() != n)
            || distances.iter().any(|row| row.len() != n)
        {
            return Err(FetchError::Shape);
        }

        Ok(TravelMatrix {
            secs: durations
                .into_iter()
                .map(|row| row.into_iter().map(|v| v.round() as i32).collect())
                .collect(),
            // The table service reports metres.
            km: distances
                .into_iter()
                .map(|row| row.into_iter().map(|v| v / 1000.0).collect())
                .collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TableResponse {
    durations: Option<Vec<Vec<f64>>>,
    distances: Option<Vec<Vec<f64>>>,
}

/// Matrix provider that prefers the remote service and silently falls back
/// to haversine, per call.
pub struct ResilientMatrix {
    remote: Option<RemoteMatrixClient>,
    local: HaversineMatrix,
    degraded: AtomicBool,
}

impl ResilientMatrix {
    /// Build the provider selected by configuration. A remote client that
    /// cannot even be constructed leaves the haversine provider alone.
    pub fn from_strategy(strategy: &MatrixStrategy, speed_kmh: f64) -> Self {
        let remote = match strategy {
            MatrixStrategy::Haversine => None,
            MatrixStrategy::Remote(config) => match RemoteMatrixClient::new(config.clone()) {
                Ok(client) => Some(client),
                Err(err) => {
                    tracing::warn!(%err, "cannot build road matrix client, using haversine");
                    None
                }
            },
        };

        Self {
            remote,
            local: HaversineMatrix::new(speed_kmh),
            degraded: AtomicBool::new(false),
        }
    }
}

impl DistanceMatrixProvider for ResilientMatrix {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> TravelMatrix {
        if locations.is_empty() {
            return TravelMatrix::default();
        }

        if let Some(remote) = &self.remote {
            match remote.fetch(locations) {
                Ok(matrix) => return matrix,
                Err(err) => {
                    if !self.degraded.swap(true, Ordering::Relaxed) {
                        tracing::warn!(
                            ?err,
                            "road matrix lookup failed, falling back to haversine"
                        );
                    }
                }
            }
        }

        self.local.matrix_for(locations)
    }
}
