//! Real locations around Tunis and the Sahel for realistic fixtures.
//!
//! Coordinates sourced from OpenStreetMap. Zone indices follow the
//! governorate grouping used throughout the tests: 0 = Tunis,
//! 1 = Ariana/Ben Arous suburbs, 2 = Sahel coast.

/// A named location with coordinates and a governorate index.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub zone: u32,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lon: f64, zone: u32) -> Self {
        Self {
            name,
            lat,
            lon,
            zone,
        }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}

/// Central depot by the port of Tunis.
pub const DEPOT: Location = Location::new("Port de Tunis", 36.8065, 10.1815, 0);

// ============================================================================
// Tunis city centre (zone 0)
// ============================================================================

pub const TUNIS: &[Location] = &[
    Location::new("Avenue Habib Bourguiba", 36.8008, 10.1817, 0),
    Location::new("Medina de Tunis", 36.7981, 10.1713, 0),
    Location::new("Bab El Khadra", 36.8094, 10.1688, 0),
    Location::new("Lafayette", 36.8123, 10.1857, 0),
    Location::new("Montplaisir", 36.8214, 10.1916, 0),
];

// ============================================================================
// Northern and southern suburbs (zone 1)
// ============================================================================

pub const SUBURBS: &[Location] = &[
    Location::new("La Marsa", 36.8775, 10.3247, 1),
    Location::new("Carthage", 36.8529, 10.3233, 1),
    Location::new("Ariana Centre", 36.8665, 10.1647, 1),
    Location::new("Ben Arous", 36.7531, 10.2189, 1),
    Location::new("Rades", 36.7683, 10.2753, 1),
];

// ============================================================================
// Sahel coast, far from the depot (zone 2)
// ============================================================================

pub const SAHEL: &[Location] = &[
    Location::new("Sousse Medina", 35.8254, 10.6360, 2),
    Location::new("Monastir Marina", 35.7775, 10.8262, 2),
    Location::new("Sfax Centre", 34.7406, 10.7603, 2),
];
