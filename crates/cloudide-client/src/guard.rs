//! Reactions to failed calls: session loss and rejected parameters.

use std::fmt;
use std::sync::Arc;

use reqwest::StatusCode;

use crate::error::ClientError;
use crate::i18n::{INVALID_PARAMS_KEY, LOGIN_REQUIRED_KEY, TranslationBundle};
use crate::interceptor::ResponseInterceptor;
use crate::navigation::{LOGIN_ROUTE, Navigator};
use crate::notify::Notifier;
use crate::session::SessionStore;

/// Response stage that turns HTTP failures into user-visible side effects.
///
/// | status | effect |
/// |---|---|
/// | 401 | session cleared, router sent to [`LOGIN_ROUTE`], one "login required" notification |
/// | 400 | one "invalid parameters" notification |
/// | anything else | none |
///
/// The received error is always handed back unchanged.
#[derive(Clone)]
pub struct StatusGuard {
    session: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    messages: TranslationBundle,
}

impl fmt::Debug for StatusGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusGuard")
            .field("locale", &self.messages.locale())
            .finish_non_exhaustive()
    }
}

impl StatusGuard {
    /// Guard wired to the given collaborators.
    #[must_use]
    pub fn new(
        session: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
        messages: TranslationBundle,
    ) -> Self {
        Self {
            session,
            navigator,
            notifier,
            messages,
        }
    }

    fn session_expired(&self) {
        self.session.clear();
        self.navigator.push(LOGIN_ROUTE);
        self.notifier
            .error(self.messages.text(LOGIN_REQUIRED_KEY, "Please log in first"));
    }

    fn invalid_params(&self) {
        self.notifier
            .error(self.messages.text(INVALID_PARAMS_KEY, "Invalid request parameters"));
    }
}

impl ResponseInterceptor for StatusGuard {
    fn on_error(&self, error: ClientError) -> ClientError {
        match error.status() {
            Some(StatusCode::UNAUTHORIZED) => {
                tracing::info!("session rejected by server; redirecting to login");
                self.session_expired();
            }
            Some(StatusCode::BAD_REQUEST) => self.invalid_params(),
            _ => {}
        }
        error
    }
}
