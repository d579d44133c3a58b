//! Wayguard Geofence Core
//!
//! Proximity evaluation for tourist-safety hotspots: great-circle distance,
//! containment checks against circular risk zones, a seeded hotspot registry
//! with JSON loading, and a weighted safety score.
//!
//! # Proximity Model
//!
//! Distance is haversine over a spherical Earth (mean radius 6,371,000 m).
//! A reading is inside a hotspot when its distance to the center is strictly
//! less than the radius; a reading exactly on the boundary is outside.
//!
//! # Safety Score (3-Factor)
//!
//! ```text
//! Score = 100 · (w₁·P + w₂·Z + w₃·D)
//! ```
//!
//! | Factor | Weight | Description |
//! |--------|--------|-------------|
//! | P      | 0.45   | Proximity to nearest hotspot edge |
//! | Z      | 0.35   | Containment (currently-inside zones, risk weighted) |
//! | D      | 0.20   | Hotspot density within the survey radius |
//!
//! Evaluation is pure and synchronous; callers own all shared-state policy.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

pub mod loader;
pub mod proximity;
pub mod registry;
pub mod score;

pub use proximity::{evaluate, Hotspot, ProximityResult, RiskLevel};
pub use registry::{to_geojson, HotspotRegistry};
pub use score::{SafetyAssessment, SafetyBand, SafetyScorer, ScoreWeights};

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Error, Debug)]
pub enum GeofenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
    #[error("Invalid radius: {0} (must be finite and > 0)")]
    InvalidRadius(f64),
    #[error("Hotspot not found: {0}")]
    NotFound(String),
    #[error("No hotspots loaded")]
    NoHotspots,
}

pub type Result<T> = std::result::Result<T, GeofenceError>;

/// A geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check latitude/longitude are finite and in range.
    ///
    /// Evaluation itself never validates; callers at trust boundaries
    /// (loaders, HTTP handlers) do.
    pub fn validate(&self) -> Result<()> {
        let lat_ok = (-90.0..=90.0).contains(&self.latitude) && self.latitude.is_finite();
        let lon_ok = (-180.0..=180.0).contains(&self.longitude) && self.longitude.is_finite();
        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(GeofenceError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }

    /// Great-circle distance to another point in meters
    pub fn distance_m(&self, other: GeoPoint) -> f64 {
        haversine_m(*self, other)
    }
}

/// Haversine distance between two points in meters
///
/// atan2 form, clamped against float drift for near-antipodal pairs.
/// Identical inputs return exactly 0.0.
pub fn haversine_m(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1_rad = from.latitude * PI / 180.0;
    let lat2_rad = to.latitude * PI / 180.0;
    let dlat = (to.latitude - from.latitude) * PI / 180.0;
    let dlon = (to.longitude - from.longitude) * PI / 180.0;

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}
