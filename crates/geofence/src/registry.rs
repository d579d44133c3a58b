//! Hotspot registry
//!
//! Ordered catalog of risk zones with lookup, proximity sweeps, and
//! GeoJSON export for the map overlay.

use crate::proximity::{evaluate, proximity, Hotspot, ProximityResult, RiskLevel};
use crate::{GeoPoint, GeofenceError, Result};
use std::path::Path;
use tracing::warn;

pub struct HotspotRegistry {
    hotspots: Vec<Hotspot>,
}

impl HotspotRegistry {
    pub fn new() -> Self {
        Self {
            hotspots: Vec::new(),
        }
    }

    /// Registry seeded with the Delhi pilot network
    pub fn with_delhi_network() -> Self {
        let mut registry = Self::new();
        registry.load_delhi_network();
        registry
    }

    /// Load a registry from a hotspot JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let hotspots = crate::loader::load_hotspots(path)?;
        Self::from_hotspots(hotspots)
    }

    /// Build a registry from pre-constructed hotspots, validating each
    pub fn from_hotspots(hotspots: Vec<Hotspot>) -> Result<Self> {
        let mut registry = Self::new();
        for hotspot in hotspots {
            registry.register(hotspot)?;
        }
        Ok(registry)
    }

    fn load_delhi_network(&mut self) {
        // Seeded risk zones for the Delhi pilot
        // In production, this would load from the zone config store
        let zones = vec![
            ("HS-001", "Red Fort Area", 28.6562, 77.2410, 500.0, RiskLevel::High),
            ("HS-002", "Chandni Chowk Market", 28.6506, 77.2303, 400.0, RiskLevel::Moderate),
            ("HS-003", "Jama Masjid Gate 3", 28.6507, 77.2334, 250.0, RiskLevel::Moderate),
            ("HS-004", "Paharganj Main Bazaar", 28.6449, 77.2139, 350.0, RiskLevel::High),
            ("HS-005", "New Delhi Railway Station", 28.6428, 77.2197, 300.0, RiskLevel::Critical),
            ("HS-006", "Kashmere Gate ISBT", 28.6676, 77.2296, 300.0, RiskLevel::High),
            ("HS-007", "Connaught Place Outer Circle", 28.6315, 77.2167, 450.0, RiskLevel::Low),
            ("HS-008", "Majnu ka Tilla", 28.7006, 77.2270, 250.0, RiskLevel::Low),
        ];

        for (id, name, lat, lon, radius_m, risk) in zones {
            self.hotspots
                .push(Hotspot::new(id, name, GeoPoint::new(lat, lon), radius_m, risk));
        }
    }

    /// Add a hotspot, rejecting invalid definitions. Re-registering an
    /// existing id replaces the earlier entry; catalog ids are unique.
    pub fn register(&mut self, hotspot: Hotspot) -> Result<()> {
        hotspot.validate()?;
        if let Some(existing) = self.hotspots.iter_mut().find(|h| h.id == hotspot.id) {
            warn!("Replacing hotspot {} ({})", hotspot.id, existing.name);
            *existing = hotspot;
        } else {
            self.hotspots.push(hotspot);
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&Hotspot> {
        self.hotspots
            .iter()
            .find(|h| h.id == id)
            .ok_or_else(|| GeofenceError::NotFound(id.to_string()))
    }

    pub fn hotspots(&self) -> &[Hotspot] {
        &self.hotspots
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hotspot> {
        self.hotspots.iter()
    }

    pub fn len(&self) -> usize {
        self.hotspots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hotspots.is_empty()
    }

    /// Sweep a position against every registered hotspot
    pub fn evaluate(&self, position: GeoPoint) -> Vec<ProximityResult> {
        evaluate(position, &self.hotspots)
    }

    /// Closest hotspot to a position, by center distance
    pub fn nearest(&self, position: GeoPoint) -> Option<ProximityResult> {
        self.hotspots
            .iter()
            .map(|h| proximity(position, h))
            .min_by(|a, b| {
                a.distance_m
                    .partial_cmp(&b.distance_m)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}

impl Default for HotspotRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Export hotspots to GeoJSON for the map overlay
pub fn to_geojson(hotspots: &[Hotspot]) -> serde_json::Value {
    let features: Vec<serde_json::Value> = hotspots
        .iter()
        .map(|h| {
            serde_json::json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [h.center.longitude, h.center.latitude]
                },
                "properties": {
                    "id": h.id,
                    "name": h.name,
                    "radius_m": h.radius_m,
                    "risk": format!("{:?}", h.risk)
                }
            })
        })
        .collect();

    serde_json::json!({
        "type": "FeatureCollection",
        "features": features
    })
}
