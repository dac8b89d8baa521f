//! Route guard for member-only pages.

use parking_lot::Mutex;
use tracing::{info, warn};

use super::{SessionBackend, SessionClient};
use crate::identity::User;

/// Performs a hard navigation, e.g. to the login page.
pub trait Navigator: Send + Sync {
    fn redirect(&self, path: &str);
}

/// Headless navigator: records where the session would have navigated.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> Vec<String> {
        self.visited.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, path: &str) {
        info!(target: "session", "navigate -> {}", path);
        self.visited.lock().push(path.to_string());
    }
}

/// Outcome of one guard evaluation. Pages render nothing unless `Allowed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Loading,
    Allowed(User),
    Redirected,
}

impl<B: SessionBackend> SessionClient<B> {
    /// Evaluate the guard against the current state. A settled, signed-out session
    /// clears the persisted token and redirects to the login page.
    pub fn require_auth(&self) -> GuardDecision {
        let snapshot = self.state();
        if snapshot.is_loading {
            return GuardDecision::Loading;
        }
        match snapshot.user {
            Some(u) => GuardDecision::Allowed(u),
            None => {
                if let Err(e) = self.store.remove() {
                    warn!(target: "session", "could not remove persisted token: {}", e);
                }
                self.navigator.redirect(&self.config.login_path);
                GuardDecision::Redirected
            }
        }
    }

    /// Re-evaluate on every state change until the guard redirects.
    pub async fn enforce_auth(&self) {
        let mut rx = self.subscribe();
        loop {
            if self.require_auth() == GuardDecision::Redirected {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}
