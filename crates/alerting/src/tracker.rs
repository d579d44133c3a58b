//! Per-tourist tracking sessions.
//!
//! A session ties the pieces together for one tracked tourist: each
//! position update is swept against the hotspot catalog, fed to the
//! dispatcher for transition alerts, and scored for an overall safety
//! assessment. Sessions are driven either by explicit position posts
//! (the gateway) or by polling a [`LocationProvider`] (the simulator).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use geofence::{GeoPoint, HotspotRegistry, ProximityResult, SafetyAssessment, SafetyScorer};
use serde::Serialize;
use tracing::debug;

use crate::dispatcher::{AlertDispatcher, DispatchOutcome, PermissionPolicy};
use crate::location::LocationProvider;
use crate::notify::NotificationChannel;

/// Everything produced by one position update.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUpdate {
    pub position: GeoPoint,
    /// Sweep of the position against the full catalog, in catalog order.
    pub results: Vec<ProximityResult>,
    /// Transitions and deliveries this update caused.
    pub outcome: DispatchOutcome,
    pub assessment: SafetyAssessment,
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub started_at: DateTime<Utc>,
    pub updates: u64,
    pub last_position: Option<GeoPoint>,
    /// Hotspot ids the last position was inside, sorted.
    pub inside: Vec<String>,
}

/// Tracking state for one tourist.
pub struct TrackingSession {
    registry: Arc<HotspotRegistry>,
    dispatcher: AlertDispatcher,
    scorer: SafetyScorer,
    last_position: Option<GeoPoint>,
    updates: u64,
    started_at: DateTime<Utc>,
}

impl TrackingSession {
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
            dispatcher: AlertDispatcher::with_policy(channel, policy),
            scorer: SafetyScorer::new(),
            last_position: None,
            updates: 0,
            started_at: Utc::now(),
        }
    }

    /// Replace the default scorer (e.g. custom factor weights).
    pub fn with_scorer(mut self, scorer: SafetyScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn last_position(&self) -> Option<GeoPoint> {
        self.last_position
    }

    /// Process one position reading.
    pub fn update(&mut self, position: GeoPoint) -> SessionUpdate {
        let results = self.registry.evaluate(position);
        let outcome = self.dispatcher.dispatch(&results);
        let assessment = self.scorer.assess(position, self.registry.hotspots());

        self.last_position = Some(position);
        self.updates += 1;

        if !outcome.is_quiet() {
            debug!(
                "Session update: entered {:?}, exited {:?}, score {:.1}",
                outcome.entered, outcome.exited, assessment.score
            );
        }

        SessionUpdate {
            position,
            results,
            outcome,
            assessment,
        }
    }

    /// Pull the next reading from a provider, if it has one.
    pub fn poll(&mut self, provider: &dyn LocationProvider) -> Option<SessionUpdate> {
        provider.current().map(|position| self.update(position))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            started_at: self.started_at,
            updates: self.updates,
            last_position: self.last_position,
            inside: self.dispatcher.inside(),
        }
    }

    /// Forget transition state, cached permission, and position history.
    pub fn reset(&mut self) {
        self.dispatcher.reset();
        self.last_position = None;
        self.updates = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{FallbackProvider, ScriptedProvider, DEFAULT_LOCATION};
    use crate::notify::MockChannel;

    fn delhi_session(channel: Arc<MockChannel>) -> TrackingSession {
        TrackingSession::new(Arc::new(HotspotRegistry::with_delhi_network()), channel)
    }

    #[test]
    fn test_walk_into_red_fort_alerts_once() {
        let channel = Arc::new(MockChannel::granting());
        let mut session = delhi_session(channel.clone());

        // Well south of every zone
        let update = session.update(GeoPoint::new(28.55, 77.24));
        assert!(update.outcome.is_quiet());

        // At the Red Fort center: HS-001 entry plus a safety assessment
        let update = session.update(GeoPoint::new(28.6562, 77.2410));
        assert_eq!(update.outcome.entered, vec!["HS-001"]);
        assert_eq!(update.outcome.notified, 1);
        assert!(update.assessment.score < 50.0);
        assert!(update.results.iter().any(|r| r.inside));

        // Dwelling inside stays quiet
        let update = session.update(GeoPoint::new(28.6560, 77.2408));
        assert_eq!(update.outcome.notified, 0);
        assert_eq!(channel.delivered().len(), 1);
    }

    #[test]
    fn test_snapshot_reflects_session_state() {
        let channel = Arc::new(MockChannel::granting());
        let mut session = delhi_session(channel);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.updates, 0);
        assert!(snapshot.last_position.is_none());
        assert!(snapshot.inside.is_empty());

        session.update(GeoPoint::new(28.6562, 77.2410));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.updates, 1);
        assert_eq!(snapshot.inside, vec!["HS-001"]);
        assert!((snapshot.last_position.unwrap().latitude - 28.6562).abs() < 1e-9);
    }

    #[test]
    fn test_poll_drains_provider_then_stops() {
        let channel = Arc::new(MockChannel::granting());
        let mut session = delhi_session(channel);
        let provider = ScriptedProvider::new([
            GeoPoint::new(28.55, 77.24),
            GeoPoint::new(28.6562, 77.2410),
        ]);

        assert!(session.poll(&provider).is_some());
        let update = session.poll(&provider).unwrap();
        assert_eq!(update.outcome.entered, vec!["HS-001"]);
        assert!(session.poll(&provider).is_none());
        assert_eq!(session.updates(), 2);
    }

    #[test]
    fn test_poll_with_fallback_lands_in_connaught_place() {
        let channel = Arc::new(MockChannel::granting());
        let mut session = delhi_session(channel);
        let provider = FallbackProvider::with_default(Box::new(ScriptedProvider::new([])));

        // Empty stream: the fallback fix is inside the Connaught Place zone
        let update = session.poll(&provider).unwrap();
        assert_eq!(update.position.latitude, DEFAULT_LOCATION.latitude);
        assert_eq!(update.outcome.entered, vec!["HS-007"]);
    }

    #[test]
    fn test_reset_starts_over() {
        let channel = Arc::new(MockChannel::granting());
        let mut session = delhi_session(channel.clone());

        session.update(GeoPoint::new(28.6562, 77.2410));
        session.reset();
        assert_eq!(session.updates(), 0);

        let update = session.update(GeoPoint::new(28.6562, 77.2410));
        assert_eq!(update.outcome.notified, 1);
        assert_eq!(channel.delivered().len(), 2);
    }
}
