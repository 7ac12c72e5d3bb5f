//! User-facing notifications raised by interceptors.
//!
//! # Design
//! - The center only queues messages; rendering is the embedding UI's job.
//! - Identifiers are monotonic per center so dismissals never hit a newer entry.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

/// Severity of a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Informational message.
    Info,
    /// Success confirmation.
    Success,
    /// Error message.
    Error,
}

/// A queued notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Identifier unique within the emitting center.
    pub id: u64,
    /// Localised message.
    pub message: String,
    /// Severity.
    pub kind: NotificationKind,
}

/// Sink for user-facing messages.
pub trait Notifier: Send + Sync {
    /// Emit a message and return its identifier.
    fn notify(&self, kind: NotificationKind, message: String) -> u64;

    /// Emit an error message.
    fn error(&self, message: String) -> u64 {
        self.notify(NotificationKind::Error, message)
    }
}

#[derive(Debug, Default)]
struct CenterState {
    next_id: u64,
    pending: Vec<Notification>,
}

/// In-process notification queue.
#[derive(Clone, Debug, Default)]
pub struct NotificationCenter {
    state: Arc<Mutex<CenterState>>,
}

impl NotificationCenter {
    /// Empty center.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending notifications without removing them.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Notification> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .clone()
    }

    /// Remove and return every pending notification.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(
            &mut self
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pending,
        )
    }

    /// Dismiss one notification; returns whether it was pending.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let before = state.pending.len();
        state.pending.retain(|notification| notification.id != id);
        state.pending.len() != before
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, kind: NotificationKind, message: String) -> u64 {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.next_id += 1;
        let id = state.next_id;
        match kind {
            NotificationKind::Error => tracing::warn!(id, message = %message, "notification"),
            NotificationKind::Info | NotificationKind::Success => {
                tracing::info!(id, message = %message, "notification");
            }
        }
        state.pending.push(Notification { id, message, kind });
        id
    }
}
