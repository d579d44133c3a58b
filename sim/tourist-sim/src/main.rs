//! Tourist Walk Simulator
//!
//! Replays a scripted walk through central Delhi against the hotspot
//! catalog: Connaught Place, past New Delhi Railway Station and Chandni
//! Chowk, into the Red Fort zone, then east out of every zone. After the
//! scripted readings run out, two extra ticks demonstrate the fallback
//! position kicking in on signal loss.
//!
//! Usage:
//!   tourist-sim --tick-sec 0.5 --steps-per-leg 8
//!   tourist-sim --hotspots data/hotspots.json --ask-every-update

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use alerting::{
    FallbackProvider, LogChannel, PermissionPolicy, ScriptedProvider, TrackingSession,
};
use geofence::{GeoPoint, HotspotRegistry};

/// Waypoints of the scripted walk (name, latitude, longitude)
const ROUTE: [(&str, f64, f64); 5] = [
    ("Connaught Place", 28.6315, 77.2167),
    ("New Delhi Railway Station", 28.6428, 77.2197),
    ("Chandni Chowk", 28.6506, 77.2303),
    ("Red Fort", 28.6562, 77.2410),
    ("Raj Ghat", 28.6406, 77.2495),
];

/// Extra ticks after the route drains, served by the fallback position
const SIGNAL_LOSS_TICKS: usize = 2;

#[derive(Parser, Debug)]
#[command(
    name = "tourist-sim",
    about = "Replay a scripted tourist walk through the Wayguard Delhi pilot zones"
)]
struct Args {
    /// Path to a hotspots JSON file (defaults to the seeded Delhi network)
    #[arg(short = 'H', long)]
    hotspots: Option<PathBuf>,

    /// Seconds between position readings
    #[arg(long, default_value_t = 1.0)]
    tick_sec: f64,

    /// Interpolated readings per route leg
    #[arg(long, default_value_t = 6)]
    steps_per_leg: usize,

    /// Re-ask notification permission on every update instead of once
    #[arg(long)]
    ask_every_update: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{}", "=".repeat(60));
    info!("Wayguard Tourist Walk Simulator");
    info!("{}", "=".repeat(60));

    // Load catalog
    let registry = match &args.hotspots {
        Some(path) => HotspotRegistry::from_file(path)?,
        None => HotspotRegistry::with_delhi_network(),
    };
    info!("Catalog: {} risk zones", registry.len());

    let route = build_route(args.steps_per_leg);
    info!(
        "Route: {} readings across {} waypoints",
        route.len(),
        ROUTE.len()
    );
    for (name, lat, lon) in &ROUTE {
        info!("  {:28} ({:.4}, {:.4})", name, lat, lon);
    }

    let policy = if args.ask_every_update {
        PermissionPolicy::EveryUpdate
    } else {
        PermissionPolicy::OncePerSession
    };

    let total = route.len();
    let mut session =
        TrackingSession::with_policy(Arc::new(registry), Arc::new(LogChannel::new()), policy);
    let provider = FallbackProvider::with_default(Box::new(ScriptedProvider::new(route)));

    // Walk loop
    let mut interval = time::interval(tick_interval(args.tick_sec)?);
    let mut entries = 0usize;
    let mut notifications = 0usize;
    let mut lowest_score = f64::MAX;

    for step in 0..total + SIGNAL_LOSS_TICKS {
        interval.tick().await;

        let Some(update) = session.poll(&provider) else {
            break;
        };

        if step == total {
            info!("GPS signal lost, falling back to Connaught Place");
        }

        entries += update.outcome.entered.len();
        notifications += update.outcome.notified;
        lowest_score = lowest_score.min(update.assessment.score);

        info!(
            "[{:>3}] ({:.4}, {:.4}) score {:>5.1} {:?}",
            step,
            update.position.latitude,
            update.position.longitude,
            update.assessment.score,
            update.assessment.band
        );
        if !update.outcome.entered.is_empty() {
            info!("      entered {:?}", update.outcome.entered);
        }
        if !update.outcome.exited.is_empty() {
            info!("      exited {:?}", update.outcome.exited);
        }
    }

    // Summary
    let snapshot = session.snapshot();
    info!("{}", "=".repeat(60));
    info!("SUMMARY");
    info!("{}", "=".repeat(60));
    info!("Readings processed: {}", snapshot.updates);
    info!("Zone entries: {}", entries);
    info!("Notifications delivered: {}", notifications);
    info!("Lowest safety score: {:.1}", lowest_score);
    info!("Final zones: {:?}", snapshot.inside);

    Ok(())
}

/// Clamp the tick interval to a sane range, rejecting non-finite input
/// (`Duration::from_secs_f64` panics on infinity and NaN)
fn tick_interval(tick_sec: f64) -> Result<Duration> {
    anyhow::ensure!(
        tick_sec.is_finite(),
        "--tick-sec must be a finite number of seconds, got {}",
        tick_sec
    );
    Ok(Duration::from_secs_f64(tick_sec.clamp(0.05, 3600.0)))
}

/// Interpolate the waypoint route into evenly spaced readings
fn build_route(steps_per_leg: usize) -> Vec<GeoPoint> {
    let steps = steps_per_leg.max(1);
    let mut route = Vec::new();

    for pair in ROUTE.windows(2) {
        let (_, lat0, lon0) = pair[0];
        let (_, lat1, lon1) = pair[1];
        for i in 0..steps {
            let t = i as f64 / steps as f64;
            route.push(GeoPoint::new(
                lat0 + (lat1 - lat0) * t,
                lon0 + (lon1 - lon0) * t,
            ));
        }
    }

    let (_, lat, lon) = ROUTE[ROUTE.len() - 1];
    route.push(GeoPoint::new(lat, lon));
    route
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_interval_clamps_to_sane_range() {
        assert_eq!(tick_interval(1.0).unwrap(), Duration::from_secs(1));
        assert_eq!(tick_interval(0.0).unwrap(), Duration::from_secs_f64(0.05));
        assert_eq!(tick_interval(-3.0).unwrap(), Duration::from_secs_f64(0.05));
        assert_eq!(tick_interval(86_400.0).unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn test_tick_interval_rejects_non_finite() {
        assert!(tick_interval(f64::INFINITY).is_err());
        assert!(tick_interval(f64::NEG_INFINITY).is_err());
        assert!(tick_interval(f64::NAN).is_err());
    }
}
