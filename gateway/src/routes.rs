//! Geofence query routes
//!
//! Read-only views over the hotspot catalog plus stateless checks:
//! - GET hotspots (list, single, GeoJSON export)
//! - POST proximity/check (sweep one position against the catalog)
//! - POST safety-score (composite assessment, optional custom weights)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use geofence::{
    to_geojson, GeoPoint, Hotspot, ProximityResult, SafetyAssessment, SafetyScorer, ScoreWeights,
};

use crate::AppState;

// ========== Request/Response Types ==========

#[derive(Serialize)]
pub struct HotspotsResponse {
    pub hotspots: Vec<Hotspot>,
    pub count: usize,
}

#[derive(Deserialize)]
pub struct CheckRequest {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub position: GeoPoint,
    pub results: Vec<ProximityResult>,
    pub inside_any: bool,
}

#[derive(Deserialize)]
pub struct ScoreRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub weights: Option<ScoreWeights>,
}

// ========== Route Handlers ==========

/// List the full hotspot catalog
pub async fn list_hotspots(State(state): State<AppState>) -> Json<HotspotsResponse> {
    let hotspots = state.registry.hotspots().to_vec();
    let count = hotspots.len();

    Json(HotspotsResponse { hotspots, count })
}

/// Get a single hotspot by id
pub async fn get_hotspot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Hotspot>, (StatusCode, String)> {
    let hotspot = state
        .registry
        .get(&id)
        .map_err(|e| (StatusCode::NOT_FOUND, e.to_string()))?;

    Ok(Json(hotspot.clone()))
}

/// Export the catalog as a GeoJSON FeatureCollection
pub async fn export_geojson(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(to_geojson(state.registry.hotspots()))
}

/// Sweep one position against every hotspot
pub async fn check_proximity(
    State(state): State<AppState>,
    Json(req): Json<CheckRequest>,
) -> Result<Json<CheckResponse>, (StatusCode, String)> {
    let position = parse_position(req.latitude, req.longitude)?;

    let results = state.registry.evaluate(position);
    let inside_any = results.iter().any(|r| r.inside);

    Ok(Json(CheckResponse {
        position,
        results,
        inside_any,
    }))
}

/// Composite safety assessment for one position
pub async fn safety_score(
    State(state): State<AppState>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<SafetyAssessment>, (StatusCode, String)> {
    let position = parse_position(req.latitude, req.longitude)?;

    let assessment = match req.weights {
        Some(weights) => {
            SafetyScorer::new()
                .with_weights(weights)
                .assess(position, state.registry.hotspots())
        }
        None => state.scorer.assess(position, state.registry.hotspots()),
    };

    Ok(Json(assessment))
}

fn parse_position(latitude: f64, longitude: f64) -> Result<GeoPoint, (StatusCode, String)> {
    let position = GeoPoint::new(latitude, longitude);
    position
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geofence::{HotspotRegistry, SafetyBand};
    use std::sync::Arc;

    fn test_state() -> AppState {
        AppState {
            registry: Arc::new(HotspotRegistry::with_delhi_network()),
            scorer: Arc::new(SafetyScorer::new()),
        }
    }

    #[tokio::test]
    async fn test_list_hotspots_returns_catalog() {
        let Json(resp) = list_hotspots(State(test_state())).await;
        assert_eq!(resp.count, 8);
        assert!(resp.hotspots.iter().any(|h| h.id == "HS-001"));
    }

    #[tokio::test]
    async fn test_get_hotspot_found_and_missing() {
        let state = test_state();

        let Json(hotspot) = get_hotspot(State(state.clone()), Path("HS-001".to_string()))
            .await
            .unwrap();
        assert_eq!(hotspot.name, "Red Fort Area");

        let err = get_hotspot(State(state), Path("HS-999".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
        assert!(err.1.contains("HS-999"));
    }

    #[tokio::test]
    async fn test_check_proximity_inside_red_fort() {
        let req = CheckRequest {
            latitude: 28.6562,
            longitude: 77.2410,
        };
        let Json(resp) = check_proximity(State(test_state()), Json(req)).await.unwrap();

        assert!(resp.inside_any);
        assert_eq!(resp.results.len(), 8);
        let fort = resp.results.iter().find(|r| r.hotspot.id == "HS-001").unwrap();
        assert!(fort.inside);
        assert!(fort.distance_m < 1.0);
    }

    #[tokio::test]
    async fn test_check_proximity_rejects_bad_latitude() {
        let req = CheckRequest {
            latitude: 95.0,
            longitude: 77.0,
        };
        let err = check_proximity(State(test_state()), Json(req)).await.unwrap_err();

        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert!(err.1.contains("Invalid coordinate"));
    }

    #[tokio::test]
    async fn test_safety_score_with_custom_weights() {
        let req = ScoreRequest {
            latitude: 28.6562,
            longitude: 77.2410,
            weights: None,
        };
        let Json(default_score) = safety_score(State(test_state()), Json(req)).await.unwrap();
        assert_eq!(default_score.band, SafetyBand::Risk);

        let req = ScoreRequest {
            latitude: 28.6562,
            longitude: 77.2410,
            weights: Some(ScoreWeights {
                proximity: 1.0,
                containment: 0.0,
                density: 0.0,
            }),
        };
        let Json(proximity_only) = safety_score(State(test_state()), Json(req)).await.unwrap();
        assert!(proximity_only.score < default_score.score);
    }

    #[tokio::test]
    async fn test_export_geojson_shape() {
        let Json(geojson) = export_geojson(State(test_state())).await;
        assert_eq!(geojson["type"], "FeatureCollection");
        assert_eq!(geojson["features"].as_array().unwrap().len(), 8);
    }
}
