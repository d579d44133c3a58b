use anyhow::Result;
use axum::{
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use alerting::{LogChannel, NotificationChannel, WebhookChannel};
use geofence::{HotspotRegistry, SafetyScorer};

mod alert_routes;
mod auth_routes;
mod routes;
mod track_routes;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<HotspotRegistry>,
    pub scorer: Arc<SafetyScorer>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "wayguard_gateway=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = std::env::var("WAYGUARD_GATEWAY_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "18750".to_string());
    let addr = format!("0.0.0.0:{}", port);

    tracing::info!("🧭 Wayguard Gateway starting on {}", addr);
    tracing::info!("   Pilot region: Delhi NCR");
    tracing::info!("   Fallback position: Connaught Place");

    // Hotspot catalog: file override, or the seeded Delhi pilot network
    let registry = match std::env::var("WAYGUARD_HOTSPOTS") {
        Ok(path) => {
            tracing::info!("   Loading hotspots from {}", path);
            HotspotRegistry::from_file(&path)?
        }
        Err(_) => HotspotRegistry::with_delhi_network(),
    };
    let registry = Arc::new(registry);
    tracing::info!("   Hotspot catalog: {} risk zones", registry.len());

    // Alert channel: webhook if configured, otherwise the tracing log
    let channel: Arc<dyn NotificationChannel> = match std::env::var("WAYGUARD_ALERT_WEBHOOK") {
        Ok(endpoint) => {
            tracing::info!("   Alert webhook: {}", endpoint);
            Arc::new(WebhookChannel::new(endpoint)?)
        }
        Err(_) => {
            tracing::info!("   Alert channel: log (set WAYGUARD_ALERT_WEBHOOK to forward)");
            Arc::new(LogChannel::new())
        }
    };

    let state = AppState {
        registry: registry.clone(),
        scorer: Arc::new(SafetyScorer::new()),
    };

    let auth_state = auth_routes::AuthState::new();
    let alert_state = alert_routes::AlertState::new(channel.clone());
    let tracker_state = track_routes::TrackerState::new(registry.clone(), channel);

    // API routes for geofence queries
    let geofence_routes = Router::new()
        .route("/hotspots", get(routes::list_hotspots))
        .route("/hotspots/:id", get(routes::get_hotspot))
        .route("/hotspots/export/geojson", get(routes::export_geojson))
        .route("/proximity/check", post(routes::check_proximity))
        .route("/safety-score", post(routes::safety_score))
        .with_state(state);

    // Combine all routes
    let api_routes = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", geofence_routes)
        .nest("/api/v1/auth", auth_routes::auth_routes(auth_state))
        .nest("/api/v1/alerts", alert_routes::alert_routes(alert_state))
        .nest("/api/v1/track", track_routes::track_routes(tracker_state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // Static file serving for the map UI (if dist exists)
    let ui_path = std::path::Path::new("ui/map/dist");
    let app = if ui_path.exists() {
        tracing::info!("   Serving UI from {}", ui_path.display());
        api_routes.nest_service("/", ServeDir::new(ui_path))
    } else {
        api_routes
    };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "wayguard-gateway",
        "region": "delhi-ncr",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
