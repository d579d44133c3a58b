//! Tracking session routes
//!
//! Server-side tracking for devices that post positions instead of
//! evaluating locally:
//! - POST sessions (open a session)
//! - POST sessions/:id/location (feed one reading, get the full update back)
//! - GET sessions/:id (snapshot)
//! - DELETE sessions/:id (close)
//!
//! Each session owns its own dispatcher, so transition state and cached
//! permission never leak between tourists.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use alerting::{NotificationChannel, PermissionPolicy, SessionSnapshot, SessionUpdate, TrackingSession};
use geofence::{GeoPoint, HotspotRegistry};

/// Shared session table
#[derive(Clone)]
pub struct TrackerState {
    registry: Arc<HotspotRegistry>,
    channel: Arc<dyn NotificationChannel>,
    policy: PermissionPolicy,
    sessions: Arc<RwLock<HashMap<Uuid, TrackingSession>>>,
}

impl TrackerState {
    pub fn new(registry: Arc<HotspotRegistry>, channel: Arc<dyn NotificationChannel>) -> Self {
        Self::with_policy(registry, channel, PermissionPolicy::default())
    }

    pub fn with_policy(
        registry: Arc<HotspotRegistry>,
        channel: Arc<dyn NotificationChannel>,
        policy: PermissionPolicy,
    ) -> Self {
        Self {
            registry,
            channel,
            policy,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

// ========== Request/Response Types ==========

#[derive(Deserialize)]
pub struct LocationRequest {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize)]
pub struct StartSessionResponse {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
}

// ========== Route Handlers ==========

/// Open a tracking session
pub async fn start_session(
    State(state): State<TrackerState>,
) -> (StatusCode, Json<StartSessionResponse>) {
    let session = TrackingSession::with_policy(
        state.registry.clone(),
        state.channel.clone(),
        state.policy,
    );
    let session_id = Uuid::new_v4();
    let started_at = session.started_at();

    state.sessions.write().await.insert(session_id, session);
    info!("Started tracking session {}", session_id);

    (
        StatusCode::CREATED,
        Json(StartSessionResponse {
            session_id,
            started_at,
        }),
    )
}

/// Feed one position reading into a session
pub async fn post_location(
    State(state): State<TrackerState>,
    Path(id): Path<Uuid>,
    Json(req): Json<LocationRequest>,
) -> Result<Json<SessionUpdate>, (StatusCode, String)> {
    let position = GeoPoint::new(req.latitude, req.longitude);
    position
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&id)
        .ok_or((StatusCode::NOT_FOUND, format!("Session {} not found", id)))?;

    Ok(Json(session.update(position)))
}

/// Point-in-time session view
pub async fn get_session(
    State(state): State<TrackerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, (StatusCode, String)> {
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&id)
        .ok_or((StatusCode::NOT_FOUND, format!("Session {} not found", id)))?;

    Ok(Json(session.snapshot()))
}

/// Close a session
pub async fn end_session(
    State(state): State<TrackerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let session = state
        .sessions
        .write()
        .await
        .remove(&id)
        .ok_or((StatusCode::NOT_FOUND, format!("Session {} not found", id)))?;

    info!("Ended tracking session {} after {} updates", id, session.updates());

    Ok(Json(serde_json::json!({
        "success": true,
        "session_id": id,
        "updates": session.updates()
    })))
}

// ========== Router ==========

pub fn track_routes(state: TrackerState) -> Router {
    Router::new()
        .route("/sessions", post(start_session))
        .route("/sessions/:id", get(get_session))
        .route("/sessions/:id", delete(end_session))
        .route("/sessions/:id/location", post(post_location))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::MockChannel;

    fn test_state(channel: Arc<MockChannel>) -> TrackerState {
        TrackerState::new(Arc::new(HotspotRegistry::with_delhi_network()), channel)
    }

    async fn open_session(state: &TrackerState) -> Uuid {
        let (status, Json(resp)) = start_session(State(state.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        resp.session_id
    }

    #[tokio::test]
    async fn test_location_post_drives_the_dispatcher() {
        let channel = Arc::new(MockChannel::granting());
        let state = test_state(channel.clone());
        let id = open_session(&state).await;

        let Json(update) = post_location(
            State(state.clone()),
            Path(id),
            Json(LocationRequest {
                latitude: 28.6562,
                longitude: 77.2410,
            }),
        )
        .await
        .unwrap();

        assert_eq!(update.outcome.entered, vec!["HS-001"]);
        assert_eq!(update.outcome.notified, 1);
        assert!(update.assessment.score < 50.0);

        // Dwelling inside stays quiet
        let Json(update) = post_location(
            State(state.clone()),
            Path(id),
            Json(LocationRequest {
                latitude: 28.6560,
                longitude: 77.2408,
            }),
        )
        .await
        .unwrap();
        assert_eq!(update.outcome.notified, 0);
        assert_eq!(channel.delivered().len(), 1);

        let Json(snapshot) = get_session(State(state), Path(id)).await.unwrap();
        assert_eq!(snapshot.updates, 2);
        assert_eq!(snapshot.inside, vec!["HS-001"]);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let state = test_state(Arc::new(MockChannel::granting()));
        let id = Uuid::new_v4();

        let err = post_location(
            State(state.clone()),
            Path(id),
            Json(LocationRequest {
                latitude: 28.6562,
                longitude: 77.2410,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
        assert!(err.1.contains("not found"));

        let err = get_session(State(state), Path(id)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_reading_is_rejected_before_lookup() {
        let state = test_state(Arc::new(MockChannel::granting()));
        let id = open_session(&state).await;

        let err = post_location(
            State(state),
            Path(id),
            Json(LocationRequest {
                latitude: 123.0,
                longitude: 77.0,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert!(err.1.contains("Invalid coordinate"));
    }

    #[tokio::test]
    async fn test_end_session_removes_it() {
        let state = test_state(Arc::new(MockChannel::granting()));
        let id = open_session(&state).await;

        let Json(resp) = end_session(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(resp["success"], true);

        let err = end_session(State(state), Path(id)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_denied_channel_records_entry_without_delivery() {
        let channel = Arc::new(MockChannel::denying());
        let state = test_state(channel.clone());
        let id = open_session(&state).await;

        let Json(update) = post_location(
            State(state),
            Path(id),
            Json(LocationRequest {
                latitude: 28.6562,
                longitude: 77.2410,
            }),
        )
        .await
        .unwrap();

        assert_eq!(update.outcome.entered, vec!["HS-001"]);
        assert_eq!(update.outcome.notified, 0);
        assert!(channel.delivered().is_empty());
    }
}
