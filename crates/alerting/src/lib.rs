//! Alert delivery and tracking-session library for Wayguard.
//!
//! Turns proximity sweeps from the `geofence` crate into user-facing
//! notifications:
//! - Zone transition detection (outside -> inside fires, dwelling stays quiet)
//! - Permission-gated channels modeled on the browser notification API
//! - Pluggable location sources with a fixed fallback position
//! - Per-tourist tracking sessions combining all of the above
//!
//! Channels are injected behind the [`NotificationChannel`] trait so the
//! dispatcher can run against a real delivery path in the gateway, a log
//! sink in the simulator, and a scripted mock in tests.

pub mod dispatcher;
pub mod location;
pub mod notify;
pub mod tracker;

#[cfg(feature = "webhook")]
pub mod webhook;

pub use dispatcher::{AlertDispatcher, DispatchOutcome, PermissionPolicy};
pub use location::{
    FallbackProvider, FixedProvider, LocationProvider, ScriptedProvider, DEFAULT_LOCATION,
};
pub use notify::{LogChannel, MockChannel, NotificationChannel, Permission};
pub use tracker::{SessionSnapshot, SessionUpdate, TrackingSession};

#[cfg(feature = "webhook")]
pub use webhook::WebhookChannel;

/// Errors surfaced by alert channels.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("notification channel unavailable")]
    ChannelUnavailable,

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[cfg(feature = "webhook")]
    #[error("webhook error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AlertError>;
