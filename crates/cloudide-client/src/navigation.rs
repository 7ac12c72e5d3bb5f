//! Router seam used by the status guard to redirect after session loss.

use std::sync::{Arc, PoisonError, RwLock};

/// Route the user is sent to when the session is rejected.
pub const LOGIN_ROUTE: &str = "/login";

/// Minimal router surface needed by interceptors.
pub trait Navigator: Send + Sync {
    /// Navigate to `route`.
    fn push(&self, route: &str);
    /// Current location.
    fn current(&self) -> String;
}

/// In-process router that records every navigation.
#[derive(Clone, Debug)]
pub struct MemoryRouter {
    history: Arc<RwLock<Vec<String>>>,
}

impl MemoryRouter {
    /// Router starting at `initial`.
    #[must_use]
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            history: Arc::new(RwLock::new(vec![initial.into()])),
        }
    }

    /// Every location visited, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MemoryRouter {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryRouter {
    fn push(&self, route: &str) {
        let mut history = self.history.write().unwrap_or_else(PoisonError::into_inner);
        if history.last().is_some_and(|current| current == route) {
            tracing::debug!(route, "navigation to current route skipped");
            return;
        }
        tracing::debug!(route, "navigating");
        history.push(route.to_string());
    }

    fn current(&self) -> String {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_records_history() {
        let router = MemoryRouter::new("/dashboard");
        router.push(LOGIN_ROUTE);
        assert_eq!(router.current(), LOGIN_ROUTE);
        assert_eq!(router.history(), vec!["/dashboard", LOGIN_ROUTE]);
    }

    #[test]
    fn duplicate_navigation_is_ignored() {
        let router = MemoryRouter::default();
        router.push(LOGIN_ROUTE);
        router.clone().push(LOGIN_ROUTE);
        assert_eq!(router.history(), vec!["/", LOGIN_ROUTE]);
    }
}
