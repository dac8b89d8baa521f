//! Member session client.
//!
//! Holds one [`AuthState`] per process and exposes exactly four transitions on
//! [`SessionClient`]: `init`, `login`, `logout` and `update`. Everything else only reads.
//! A route guard built on the same state redirects unauthenticated viewers to the
//! login page.

mod error;
mod state;
mod storage;
mod api;
mod client;
mod guard;

use std::time::Duration;

pub use error::SessionError;
pub use state::AuthState;
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
pub use api::{ChangePasswordRequest, RegisterRequest, RelayApi};
pub use client::{SessionBackend, SessionClient};
pub use guard::{GuardDecision, Navigator, RecordingNavigator};

pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:3000";
pub const LOGIN_PATH: &str = "/login";
/// Pause between clearing state on logout and navigating, so listeners observe the change first.
pub const LOGOUT_NAVIGATION_DELAY: Duration = Duration::from_millis(150);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub relay_base: String,
    pub login_path: String,
    pub logout_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_base: DEFAULT_RELAY_URL.to_string(),
            login_path: LOGIN_PATH.to_string(),
            logout_delay: LOGOUT_NAVIGATION_DELAY,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(u) = std::env::var("PORTAL_RELAY_URL") { cfg.relay_base = u; }
        cfg
    }
}
