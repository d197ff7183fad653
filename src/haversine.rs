//! Haversine travel matrix provider.
//!
//! Uses great-circle distance to estimate driven distance and travel time.
//! Less accurate than a road-network service (ignores roads) but always
//! available, and the fallback for every remote-matrix failure.

use rayon::prelude::*;

use crate::traits::{DistanceMatrixProvider, TravelMatrix};

/// Average driving speed assumption for time estimation.
pub const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Guard against zero or unset speeds.
const MIN_SPEED_KMH: f64 = 1e-3;

/// Great-circle distance between two (lat, lon) points, km.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = from;
    let (lat2, lon2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Convert a distance in km to travel time in seconds at the given speed.
pub fn travel_secs(km: f64, speed_kmh: f64) -> i32 {
    let hours = km / speed_kmh.max(MIN_SPEED_KMH);
    (hours * 3600.0).round() as i32
}

/// Haversine-based travel matrix provider.
#[derive(Debug, Clone)]
pub struct HaversineMatrix {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineMatrix {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineMatrix {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }
}

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> TravelMatrix {
        let rows: Vec<(Vec<i32>, Vec<f64>)> = locations
            .par_iter()
            .map(|from| {
                let mut secs_row = Vec::with_capacity(locations.len());
                let mut km_row = Vec::with_capacity(locations.len());
                for to in locations {
                    let km = if from == to {
                        0.0
                    } else {
                        haversine_km(*from, *to)
                    };
                    km_row.push(km);
                    secs_row.push(travel_secs(km, self.speed_kmh));
                }
                (secs_row, km_row)
            })
            .collect();

        let mut matrix = TravelMatrix::default();
        for (secs_row, km_row) in rows {
            matrix.secs.push(secs_row);
            matrix.km.push(km_row);
        }
        matrix
    }
}
