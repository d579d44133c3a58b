//! Safety scoring
//!
//! Weighted multi-factor safety assessment for a single position against
//! the hotspot catalog. Produces a 0-100 score (higher is safer) with a
//! banded verdict for display.
//!
//! ```text
//! Score = 100 · (w₁·P + w₂·Z + w₃·D)
//! ```
//!
//! P decays exponentially as the reading approaches the nearest zone edge,
//! scaled by that zone's risk weight. Z penalizes currently-contained zones.
//! D penalizes dense clusters of zones around the reading.

use crate::proximity::{evaluate, Hotspot, ProximityResult};
use crate::{haversine_m, GeoPoint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Factor weights (3-factor model)
/// Sum = 1.0
pub const W_PROXIMITY: f64 = 0.45;
pub const W_CONTAINMENT: f64 = 0.35;
pub const W_DENSITY: f64 = 0.20;

/// Proximity decay constant in meters: how quickly safety recovers
/// with distance from a zone edge
const PROXIMITY_DECAY_M: f64 = 500.0;

/// Containment penalty applied per inside zone, scaled by risk weight
const CONTAINMENT_PENALTY: f64 = 0.6;

/// Survey radius for the density factor, meters
pub const DENSITY_SURVEY_RADIUS_M: f64 = 2_000.0;

/// Zone count at which the density factor saturates to 0
const DENSITY_SATURATION: f64 = 8.0;

/// Scoring weights for the three factor categories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Proximity to the nearest zone edge
    pub proximity: f64,
    /// Containment in zones right now
    pub containment: f64,
    /// Zone density around the reading
    pub density: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            proximity: W_PROXIMITY,
            containment: W_CONTAINMENT,
            density: W_DENSITY,
        }
    }
}

impl ScoreWeights {
    /// Normalize weights to sum to 1.0
    pub fn normalize(&mut self) {
        let sum = self.proximity + self.containment + self.density;
        if sum > 0.0 {
            self.proximity /= sum;
            self.containment /= sum;
            self.density /= sum;
        }
    }
}

/// Banded verdict derived from the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyBand {
    Safe,
    Caution,
    Risk,
    Danger,
}

impl SafetyBand {
    /// Fixed thresholds; non-finite scores band as Danger
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 75.0 => Self::Safe,
            s if s >= 50.0 => Self::Caution,
            s if s >= 25.0 => Self::Risk,
            _ => Self::Danger,
        }
    }
}

/// Complete safety assessment for one reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyAssessment {
    /// Weighted score (0-100, higher is safer)
    pub score: f64,
    pub band: SafetyBand,
    /// Proximity factor P (0-1)
    pub proximity_factor: f64,
    /// Containment factor Z (0-1)
    pub containment_factor: f64,
    /// Density factor D (0-1)
    pub density_factor: f64,
    /// Closest hotspot by center distance, if any are registered
    pub nearest: Option<ProximityResult>,
    /// Zones the reading is currently inside
    pub inside: Vec<ProximityResult>,
    pub generated_at: DateTime<Utc>,
}

/// Safety score calculator
pub struct SafetyScorer {
    weights: ScoreWeights,
}

impl SafetyScorer {
    pub fn new() -> Self {
        Self {
            weights: ScoreWeights::default(),
        }
    }

    pub fn with_weights(mut self, mut weights: ScoreWeights) -> Self {
        weights.normalize();
        self.weights = weights;
        self
    }

    /// Assess a position against the hotspot catalog
    ///
    /// An empty catalog yields the maximum score. Total over any f64
    /// input; callers validate coordinates at trust boundaries.
    pub fn assess(&self, position: GeoPoint, hotspots: &[Hotspot]) -> SafetyAssessment {
        let results = evaluate(position, hotspots);

        let nearest = results
            .iter()
            .min_by(|a, b| {
                a.distance_m
                    .partial_cmp(&b.distance_m)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .cloned();
        let inside: Vec<ProximityResult> = results.iter().filter(|r| r.inside).cloned().collect();

        let proximity_factor = proximity_factor(nearest.as_ref());
        let containment_factor = containment_factor(&inside);
        let density_factor = density_factor(position, hotspots);

        let score = 100.0
            * (self.weights.proximity * proximity_factor
                + self.weights.containment * containment_factor
                + self.weights.density * density_factor);

        SafetyAssessment {
            score,
            band: SafetyBand::from_score(score),
            proximity_factor,
            containment_factor,
            density_factor,
            nearest,
            inside,
            generated_at: Utc::now(),
        }
    }
}

impl Default for SafetyScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// P: exponential decay of safety with closeness to the nearest zone edge,
/// scaled by that zone's risk weight. 1.0 when no zones are registered.
fn proximity_factor(nearest: Option<&ProximityResult>) -> f64 {
    match nearest {
        Some(result) => {
            let edge_m = (result.distance_m - result.hotspot.radius_m).max(0.0);
            1.0 - result.hotspot.risk.weight() * (-edge_m / PROXIMITY_DECAY_M).exp()
        }
        None => 1.0,
    }
}

/// Z: penalty per currently-inside zone, risk weighted, floored at 0
fn containment_factor(inside: &[ProximityResult]) -> f64 {
    let penalty: f64 = inside
        .iter()
        .map(|r| r.hotspot.risk.weight() * CONTAINMENT_PENALTY)
        .sum();
    (1.0 - penalty).max(0.0)
}

/// D: hotspot centers within the survey radius, normalized and inverted
fn density_factor(position: GeoPoint, hotspots: &[Hotspot]) -> f64 {
    let count = hotspots
        .iter()
        .filter(|h| haversine_m(position, h.center) <= DENSITY_SURVEY_RADIUS_M)
        .count();
    1.0 - (count as f64 / DENSITY_SATURATION).min(1.0)
}
