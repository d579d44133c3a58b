//! Zone-transition detection and alert dispatch.
//!
//! The dispatcher consumes proximity sweeps and fires a notification the
//! moment a position crosses from outside a hotspot to inside it. Dwelling
//! inside a zone stays silent; leaving and re-entering fires again.
//!
//! Delivery is permission-gated. The channel is asked at most once per
//! dispatch cycle, and [`PermissionPolicy`] controls whether that answer
//! is cached for the rest of the session or refreshed on every update.
//! A denied or undecided answer suppresses delivery without erroring, and
//! a failing channel is logged and swallowed; dispatch itself never fails.

use std::collections::HashSet;
use std::sync::Arc;

use geofence::ProximityResult;
use serde::Serialize;
use tracing::{debug, warn};

use crate::notify::{NotificationChannel, Permission};

/// How often the channel is asked for notification permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionPolicy {
    /// Ask on the first delivery attempt and reuse the answer until reset.
    OncePerSession,
    /// Ask again on every update cycle that attempts a delivery.
    EveryUpdate,
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        Self::OncePerSession
    }
}

/// What one dispatch cycle did.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    /// Hotspot ids newly entered this cycle, in sweep order.
    pub entered: Vec<String>,
    /// Hotspot ids left since the previous cycle.
    pub exited: Vec<String>,
    /// Notifications actually delivered.
    pub notified: usize,
    /// Permission state after this cycle, if it has been resolved.
    pub permission: Option<Permission>,
}

impl DispatchOutcome {
    pub fn is_quiet(&self) -> bool {
        self.entered.is_empty() && self.exited.is_empty()
    }
}

/// Stateful alert dispatcher for one tracked tourist.
///
/// Holds the set of hotspots the previous position was inside, so each
/// sweep can be diffed against it. The notification channel is injected
/// at construction and never swapped mid-session.
pub struct AlertDispatcher {
    channel: Arc<dyn NotificationChannel>,
    policy: PermissionPolicy,
    /// Cached permission answer; `None` until first resolved.
    permission: Option<Permission>,
    /// Hotspot ids the previous reading was inside.
    inside: HashSet<String>,
}

impl AlertDispatcher {
    pub fn new(channel: Arc<dyn NotificationChannel>) -> Self {
        Self::with_policy(channel, PermissionPolicy::default())
    }

    pub fn with_policy(channel: Arc<dyn NotificationChannel>, policy: PermissionPolicy) -> Self {
        Self {
            channel,
            policy,
            permission: None,
            inside: HashSet::new(),
        }
    }

    pub fn policy(&self) -> PermissionPolicy {
        self.policy
    }

    /// Hotspot ids the most recent reading was inside, sorted.
    pub fn inside(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inside.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Forget all transition state and any cached permission answer.
    pub fn reset(&mut self) {
        self.inside.clear();
        self.permission = None;
    }

    /// Diff a proximity sweep against the previous one and alert on every
    /// outside -> inside transition.
    pub fn dispatch(&mut self, results: &[ProximityResult]) -> DispatchOutcome {
        if self.policy == PermissionPolicy::EveryUpdate {
            self.permission = None;
        }

        let current: HashSet<String> = results
            .iter()
            .filter(|r| r.inside)
            .map(|r| r.hotspot.id.clone())
            .collect();

        let mut exited: Vec<String> = self
            .inside
            .iter()
            .filter(|id| !current.contains(*id))
            .cloned()
            .collect();
        exited.sort();

        let mut entered = Vec::new();
        let mut notified = 0;
        for result in results.iter().filter(|r| r.inside) {
            // A duplicated id in one sweep counts as a single zone
            if self.inside.contains(&result.hotspot.id) || entered.contains(&result.hotspot.id) {
                continue;
            }
            entered.push(result.hotspot.id.clone());
            if self.try_notify(result) {
                notified += 1;
            }
        }

        self.inside = current;

        DispatchOutcome {
            entered,
            exited,
            notified,
            permission: self.permission,
        }
    }

    /// Attempt one delivery. Returns whether the notification went out;
    /// unavailability, refusal, and channel errors all come back `false`.
    fn try_notify(&mut self, result: &ProximityResult) -> bool {
        if !self.channel.available() {
            debug!(
                "Channel unavailable, skipping alert for {}",
                result.hotspot.id
            );
            return false;
        }

        let permission = match self.permission {
            Some(p) => p,
            None => {
                let p = self.channel.request_permission();
                self.permission = Some(p);
                p
            }
        };

        if !permission.is_granted() {
            debug!(
                "Notification permission {:?}, suppressing alert for {}",
                permission, result.hotspot.id
            );
            return false;
        }

        let title = format!("Safety alert: {}", result.hotspot.name);
        let body = format!(
            "You have entered {}, a {} risk zone ({:.0} m from center). Stay alert.",
            result.hotspot.name,
            result.hotspot.risk.label(),
            result.distance_m
        );

        match self.channel.notify(&title, &body) {
            Ok(()) => true,
            Err(e) => {
                warn!("Alert delivery failed for {}: {}", result.hotspot.id, e);
                false
            }
        }
    }
}
