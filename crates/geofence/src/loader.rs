//! Hotspot loading from JSON files

use crate::proximity::{Hotspot, RiskLevel};
use crate::{GeoPoint, GeofenceError, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Validate latitude is in valid range
fn is_valid_latitude(lat: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && lat.is_finite()
}

/// Validate longitude is in valid range
fn is_valid_longitude(lon: f64) -> bool {
    (-180.0..=180.0).contains(&lon) && lon.is_finite()
}

/// Sanitize ID to prevent injection (alphanumeric, dash, underscore only)
fn sanitize_id(id: String) -> String {
    id.chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .take(128) // Max length
        .collect()
}

/// Sanitize name (allow more chars but still limit)
fn sanitize_name(name: String) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || " -_.,()&'".contains(*c))
        .take(256)
        .collect()
}

/// Parse a risk label, defaulting unknown values to moderate
fn parse_risk(risk: Option<String>) -> RiskLevel {
    match risk.as_deref().map(str::to_lowercase).as_deref() {
        Some("low") => RiskLevel::Low,
        Some("high") => RiskLevel::High,
        Some("critical") => RiskLevel::Critical,
        _ => RiskLevel::Moderate,
    }
}

/// Raw hotspot record from JSON
#[derive(Debug, Deserialize)]
struct RawHotspot {
    id: Option<String>,
    name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    radius_m: Option<f64>,
    risk: Option<String>,
}

/// Load hotspots from a JSON file
///
/// Accepts either a bare array or an object with a `hotspots` field.
/// Records with missing or out-of-range coordinates, or a non-positive
/// radius, are skipped and counted rather than failing the load.
pub fn load_hotspots(path: impl AsRef<Path>) -> Result<Vec<Hotspot>> {
    let path = path.as_ref();
    info!("Loading hotspots from {:?}", path);

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let raw: serde_json::Value = serde_json::from_reader(reader)?;

    let records: Vec<RawHotspot> = if let Some(list) = raw.get("hotspots") {
        serde_json::from_value(list.clone())?
    } else if raw.is_array() {
        serde_json::from_value(raw)?
    } else {
        return Err(GeofenceError::NoHotspots);
    };

    let mut hotspots = Vec::new();
    let mut skipped = 0;

    for (i, record) in records.into_iter().enumerate() {
        let lat = match record.latitude {
            Some(l) if is_valid_latitude(l) => l,
            _ => {
                skipped += 1;
                continue;
            }
        };
        let lon = match record.longitude {
            Some(l) if is_valid_longitude(l) => l,
            _ => {
                skipped += 1;
                continue;
            }
        };
        let radius_m = match record.radius_m {
            Some(r) if r.is_finite() && r > 0.0 => r,
            _ => {
                skipped += 1;
                continue;
            }
        };

        let id = sanitize_id(record.id.unwrap_or_else(|| format!("hs-{}", i)));
        let name = sanitize_name(record.name.unwrap_or_else(|| "Unknown".to_string()));
        let risk = parse_risk(record.risk);

        hotspots.push(Hotspot::new(id, name, GeoPoint::new(lat, lon), radius_m, risk));
    }

    info!(
        "Loaded {} hotspots ({} skipped for invalid fields)",
        hotspots.len(),
        skipped
    );

    if hotspots.is_empty() {
        return Err(GeofenceError::NoHotspots);
    }

    Ok(hotspots)
}
