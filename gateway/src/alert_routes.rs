//! Panic alert routes
//!
//! The SOS path: a tourist's device posts its identity and position, the
//! gateway records the alert and pushes it out the notification channel.
//! - POST panic (raise an alert)
//! - GET / (list alerts received this process lifetime)
//!
//! Recording always succeeds if the request is well-formed; a failing
//! notification channel is logged, never surfaced to the device.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use alerting::NotificationChannel;
use geofence::GeoPoint;

/// Shared alert log
#[derive(Clone)]
pub struct AlertState {
    channel: Arc<dyn NotificationChannel>,
    alerts: Arc<RwLock<Vec<PanicAlert>>>,
}

impl AlertState {
    pub fn new(channel: Arc<dyn NotificationChannel>) -> Self {
        Self {
            channel,
            alerts: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

// ========== Request/Response Types ==========

#[derive(Deserialize)]
pub struct PanicRequest {
    #[serde(rename = "touristId")]
    pub tourist_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// RFC 3339 timestamp from the device clock
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct PanicResponse {
    pub success: bool,
    #[serde(rename = "alertId")]
    pub alert_id: String,
    pub message: String,
}

/// One recorded SOS
#[derive(Debug, Clone, Serialize)]
pub struct PanicAlert {
    pub id: String,
    #[serde(rename = "touristId")]
    pub tourist_id: String,
    pub position: GeoPoint,
    /// Device-reported time
    pub reported_at: DateTime<Utc>,
    /// Gateway receive time
    pub received_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<PanicAlert>,
    pub count: usize,
}

// ========== Route Handlers ==========

/// Raise a panic alert
pub async fn raise_panic(
    State(state): State<AlertState>,
    Json(req): Json<PanicRequest>,
) -> Result<Json<PanicResponse>, (StatusCode, String)> {
    if req.tourist_id.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "touristId must not be empty".to_string(),
        ));
    }

    let position = GeoPoint::new(req.latitude, req.longitude);
    position
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let reported_at = DateTime::parse_from_rfc3339(&req.timestamp)
        .map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Invalid timestamp {:?}: {}", req.timestamp, e),
            )
        })?
        .with_timezone(&Utc);

    let alert = PanicAlert {
        id: Uuid::new_v4().simple().to_string(),
        tourist_id: req.tourist_id.clone(),
        position,
        reported_at,
        received_at: Utc::now(),
    };
    let alert_id = alert.id.clone();

    state.alerts.write().await.push(alert);

    // Push to the channel; delivery problems never fail the SOS itself
    if state.channel.available() {
        let body = format!(
            "Tourist {} raised a panic alert at ({:.4}, {:.4})",
            req.tourist_id, req.latitude, req.longitude
        );
        if let Err(e) = state.channel.notify("🆘 Panic alert", &body) {
            warn!("Panic alert {} recorded but channel delivery failed: {}", alert_id, e);
        }
    } else {
        warn!("Panic alert {} recorded with no available channel", alert_id);
    }

    Ok(Json(PanicResponse {
        success: true,
        alert_id,
        message: "Alert received. Nearest response unit has been notified.".to_string(),
    }))
}

/// List alerts received since startup
pub async fn list_alerts(State(state): State<AlertState>) -> Json<AlertsResponse> {
    let alerts = state.alerts.read().await.clone();
    let count = alerts.len();

    Json(AlertsResponse { alerts, count })
}

// ========== Router ==========

pub fn alert_routes(state: AlertState) -> Router {
    Router::new()
        .route("/panic", post(raise_panic))
        .route("/", get(list_alerts))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::MockChannel;

    fn panic_req() -> PanicRequest {
        PanicRequest {
            tourist_id: "T-4821".to_string(),
            latitude: 28.6562,
            longitude: 77.2410,
            timestamp: "2025-11-14T09:30:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn test_panic_records_and_notifies() {
        let channel = Arc::new(MockChannel::granting());
        let state = AlertState::new(channel.clone());

        let Json(resp) = raise_panic(State(state.clone()), Json(panic_req()))
            .await
            .unwrap();
        assert!(resp.success);
        assert!(!resp.alert_id.is_empty());

        let Json(listed) = list_alerts(State(state)).await;
        assert_eq!(listed.count, 1);
        assert_eq!(listed.alerts[0].tourist_id, "T-4821");
        assert_eq!(listed.alerts[0].id, resp.alert_id);

        let delivered = channel.delivered();
        assert_eq!(delivered.len(), 1);
        assert!(delivered[0].1.contains("T-4821"));
    }

    #[tokio::test]
    async fn test_panic_rejects_malformed_timestamp() {
        let state = AlertState::new(Arc::new(MockChannel::granting()));
        let mut req = panic_req();
        req.timestamp = "yesterday at nine".to_string();

        let err = raise_panic(State(state.clone()), Json(req)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert!(err.1.contains("timestamp"));

        // Nothing half-recorded
        let Json(listed) = list_alerts(State(state)).await;
        assert_eq!(listed.count, 0);
    }

    #[tokio::test]
    async fn test_panic_rejects_bad_position_and_blank_id() {
        let state = AlertState::new(Arc::new(MockChannel::granting()));

        let mut req = panic_req();
        req.latitude = 112.0;
        let err = raise_panic(State(state.clone()), Json(req)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let mut req = panic_req();
        req.tourist_id = "   ".to_string();
        let err = raise_panic(State(state), Json(req)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert!(err.1.contains("touristId"));
    }

    #[tokio::test]
    async fn test_panic_succeeds_when_channel_unavailable() {
        let state = AlertState::new(Arc::new(MockChannel::unavailable()));

        let Json(resp) = raise_panic(State(state), Json(panic_req())).await.unwrap();
        assert!(resp.success);
    }
}
