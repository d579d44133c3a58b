//! Notification channels and the permission model.
//!
//! Mirrors the permission flow of browser-style notification APIs: a
//! channel must be asked for permission before delivery, and the answer
//! is one of `granted`, `denied`, or `default` (undecided). How often the
//! dispatcher re-asks is governed by [`PermissionPolicy`].
//!
//! [`PermissionPolicy`]: crate::dispatcher::PermissionPolicy

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Result;

/// Outcome of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// User accepted; notifications may be delivered.
    Granted,
    /// User refused; nothing may be delivered.
    Denied,
    /// User has not decided yet. Treated as not-granted.
    Default,
}

impl Permission {
    pub fn is_granted(self) -> bool {
        matches!(self, Permission::Granted)
    }
}

/// A delivery path for safety alerts.
///
/// Implementations decide what "delivery" means: a webhook POST, a log
/// line, or a recorded entry in a test mock. All of them share the
/// permission handshake.
pub trait NotificationChannel: Send + Sync {
    /// Whether the channel can deliver at all right now.
    ///
    /// An unavailable channel is skipped silently; the dispatcher never
    /// asks it for permission.
    fn available(&self) -> bool {
        true
    }

    /// Ask the user for permission to deliver notifications.
    fn request_permission(&self) -> Permission;

    /// Deliver one notification.
    fn notify(&self, title: &str, body: &str) -> Result<()>;
}

/// Channel that writes alerts to the tracing log.
///
/// Used by the simulator and as the gateway fallback when no webhook is
/// configured. Always grants permission.
#[derive(Debug, Default)]
pub struct LogChannel;

impl LogChannel {
    pub fn new() -> Self {
        Self
    }
}

impl NotificationChannel for LogChannel {
    fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    fn notify(&self, title: &str, body: &str) -> Result<()> {
        warn!("🔔 {}: {}", title, body);
        Ok(())
    }
}

/// Scripted in-memory channel for tests.
///
/// Answers permission requests from a queue of scripted responses,
/// falling back to a fixed answer once the queue is drained, and records
/// every delivered notification.
pub struct MockChannel {
    fallback: Permission,
    scripted: Mutex<VecDeque<Permission>>,
    delivered: Mutex<Vec<(String, String)>>,
    requests: AtomicUsize,
    available: bool,
}

impl MockChannel {
    /// Channel that always answers with `permission`.
    pub fn new(permission: Permission) -> Self {
        Self {
            fallback: permission,
            scripted: Mutex::new(VecDeque::new()),
            delivered: Mutex::new(Vec::new()),
            requests: AtomicUsize::new(0),
            available: true,
        }
    }

    /// Channel that grants every request.
    pub fn granting() -> Self {
        Self::new(Permission::Granted)
    }

    /// Channel that denies every request.
    pub fn denying() -> Self {
        Self::new(Permission::Denied)
    }

    /// Channel that answers from `responses` in order, then `fallback`.
    pub fn with_permissions(
        responses: impl IntoIterator<Item = Permission>,
        fallback: Permission,
    ) -> Self {
        Self {
            fallback,
            scripted: Mutex::new(responses.into_iter().collect()),
            delivered: Mutex::new(Vec::new()),
            requests: AtomicUsize::new(0),
            available: true,
        }
    }

    /// Channel that reports itself unavailable.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::granting()
        }
    }

    /// Every `(title, body)` pair delivered so far.
    pub fn delivered(&self) -> Vec<(String, String)> {
        self.delivered
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// How many times permission has been requested.
    pub fn permission_requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl NotificationChannel for MockChannel {
    fn available(&self) -> bool {
        self.available
    }

    fn request_permission(&self) -> Permission {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.scripted
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front()
            .unwrap_or(self.fallback)
    }

    fn notify(&self, title: &str, body: &str) -> Result<()> {
        self.delivered
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}
