//! Location sources.
//!
//! Position readings arrive from outside the core (device GPS, a gateway
//! request body, a scripted walk in the simulator). The [`LocationProvider`]
//! trait is that boundary: the tracker polls it and never cares where the
//! fix came from. A provider that has no fix answers `None`, and
//! [`FallbackProvider`] turns that into a fixed last-resort position.

use std::collections::VecDeque;
use std::sync::Mutex;

use geofence::GeoPoint;

/// Last-resort position when no provider has a fix: Connaught Place,
/// central Delhi.
pub const DEFAULT_LOCATION: GeoPoint = GeoPoint {
    latitude: 28.6315,
    longitude: 77.2167,
};

/// Source of position readings for a tracking session.
pub trait LocationProvider: Send + Sync {
    /// The most recent fix, or `None` if the source has nothing.
    fn current(&self) -> Option<GeoPoint>;
}

/// Provider pinned to a single position.
#[derive(Debug, Clone, Copy)]
pub struct FixedProvider {
    position: GeoPoint,
}

impl FixedProvider {
    pub fn new(position: GeoPoint) -> Self {
        Self { position }
    }
}

impl LocationProvider for FixedProvider {
    fn current(&self) -> Option<GeoPoint> {
        Some(self.position)
    }
}

/// Wraps a primary provider and substitutes a fixed fallback position
/// whenever the primary has no fix. Never answers `None`.
pub struct FallbackProvider {
    primary: Box<dyn LocationProvider>,
    fallback: GeoPoint,
}

impl FallbackProvider {
    pub fn new(primary: Box<dyn LocationProvider>, fallback: GeoPoint) -> Self {
        Self { primary, fallback }
    }

    /// Fall back to [`DEFAULT_LOCATION`].
    pub fn with_default(primary: Box<dyn LocationProvider>) -> Self {
        Self::new(primary, DEFAULT_LOCATION)
    }
}

impl LocationProvider for FallbackProvider {
    fn current(&self) -> Option<GeoPoint> {
        Some(self.primary.current().unwrap_or(self.fallback))
    }
}

/// Provider that replays a fixed sequence of readings, then runs dry.
///
/// Drives the simulator and transition tests. In production, this slot is
/// filled by the device GPS stream.
pub struct ScriptedProvider {
    readings: Mutex<VecDeque<GeoPoint>>,
}

impl ScriptedProvider {
    pub fn new(readings: impl IntoIterator<Item = GeoPoint>) -> Self {
        Self {
            readings: Mutex::new(readings.into_iter().collect()),
        }
    }

    /// Readings not yet consumed.
    pub fn remaining(&self) -> usize {
        self.readings
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

impl LocationProvider for ScriptedProvider {
    fn current(&self) -> Option<GeoPoint> {
        self.readings
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front()
    }
}
