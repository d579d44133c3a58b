//! Hotspot proximity evaluation
//!
//! Pure containment checks of a position against circular risk zones.
//! One sweep produces one result per hotspot, in input order, so callers
//! can diff successive sweeps for enter/exit transitions.

use crate::{haversine_m, GeoPoint, GeofenceError, Result};
use serde::{Deserialize, Serialize};

/// Risk classification of a hotspot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    /// Scoring weight (0-1) used by the safety score and alert copy
    pub fn weight(&self) -> f64 {
        match self {
            Self::Low => 0.25,
            Self::Moderate => 0.50,
            Self::High => 0.80,
            Self::Critical => 1.00,
        }
    }

    /// Human-readable label for alert text
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// A circular risk zone, externally supplied and never mutated here
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotspot {
    pub id: String,
    pub name: String,
    pub center: GeoPoint,
    /// Zone radius in meters, > 0
    pub radius_m: f64,
    pub risk: RiskLevel,
}

impl Hotspot {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        center: GeoPoint,
        radius_m: f64,
        risk: RiskLevel,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            center,
            radius_m,
            risk,
        }
    }

    /// Check the definition is usable: valid center, positive finite radius
    pub fn validate(&self) -> Result<()> {
        self.center.validate()?;
        if self.radius_m.is_finite() && self.radius_m > 0.0 {
            Ok(())
        } else {
            Err(GeofenceError::InvalidRadius(self.radius_m))
        }
    }
}

/// Outcome of checking one position against one hotspot
///
/// Derived data, recomputed per reading. Invariant:
/// `inside == (distance_m < hotspot.radius_m)`, strictly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProximityResult {
    pub hotspot: Hotspot,
    /// Great-circle distance from the reading to the hotspot center, meters
    pub distance_m: f64,
    /// Strict containment; a reading exactly on the boundary is outside
    pub inside: bool,
}

/// Check a single position against a single hotspot
pub fn proximity(position: GeoPoint, hotspot: &Hotspot) -> ProximityResult {
    let distance_m = haversine_m(position, hotspot.center);
    ProximityResult {
        hotspot: hotspot.clone(),
        distance_m,
        inside: distance_m < hotspot.radius_m,
    }
}

/// Sweep a position against every hotspot, preserving input order
///
/// Total over any f64 input: a non-finite reading yields NaN distances and
/// `inside == false` rather than a panic.
pub fn evaluate(position: GeoPoint, hotspots: &[Hotspot]) -> Vec<ProximityResult> {
    hotspots.iter().map(|h| proximity(position, h)).collect()
}
