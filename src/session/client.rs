use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{AuthState, ClientConfig, Navigator, RelayApi, SessionError, TokenStore};
use crate::identity::{peek_unverified_claims, User, UserPatch};

/// What the session client needs from the relay.
pub trait SessionBackend: Send + Sync {
    /// Authoritative user for the bearer (or for the relay's cookies when `None`).
    fn fetch_me(&self, token: Option<&str>) -> impl Future<Output = Result<User, SessionError>> + Send;
    /// Have the relay clear its cookies.
    fn end_session(&self) -> impl Future<Output = Result<(), SessionError>> + Send;
}

impl SessionBackend for RelayApi {
    async fn fetch_me(&self, token: Option<&str>) -> Result<User, SessionError> {
        self.get_me(token).await
    }
    async fn end_session(&self) -> Result<(), SessionError> {
        self.logout().await
    }
}

/// Process-wide session. `init`, `login`, `logout` and `update` are the only mutation points.
///
/// Each transition that fetches takes a generation number first. A fetch result is applied
/// only if no newer `login` or `logout` started while it was in flight, so a slow `init`
/// can never overwrite a fresh login or resurrect a logged-out user.
pub struct SessionClient<B> {
    pub(super) backend: B,
    pub(super) store: Arc<dyn TokenStore>,
    pub(super) navigator: Arc<dyn Navigator>,
    pub(super) config: ClientConfig,
    state: watch::Sender<AuthState>,
    generation: AtomicU64,
    initialized: AtomicBool,
}

impl<B: SessionBackend> SessionClient<B> {
    pub fn new(backend: B, store: Arc<dyn TokenStore>, navigator: Arc<dyn Navigator>, config: ClientConfig) -> Self {
        let (state, _) = watch::channel(AuthState::start());
        Self {
            backend,
            store,
            navigator,
            config,
            state,
            generation: AtomicU64::new(0),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Persisted bearer, if any.
    pub fn token(&self) -> Option<String> {
        self.store.get()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Hydrate from the persisted token. Runs once; later calls return immediately.
    ///
    /// A decodable token seeds an optimistic user, then the relay's "me" route is asked for
    /// the authoritative record. A failed fetch keeps whatever was there.
    pub async fn init(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return;
        }
        let generation = self.generation.load(Ordering::SeqCst);
        let token = self.store.get();
        if let Some(user) = token.as_deref().and_then(peek_unverified_claims).and_then(|c| c.optimistic_user()) {
            debug!(target: "session", "optimistic user from token claims: {}", user.id);
            self.state.send_if_modified(|s| {
                if !self.is_current(generation) {
                    return false;
                }
                s.user = Some(user);
                true
            });
        }

        let fetched = self.backend.fetch_me(token.as_deref()).await;
        if !self.is_current(generation) {
            debug!(target: "session", "init result superseded by a newer transition");
            return;
        }
        self.state.send_modify(|s| {
            match fetched {
                Ok(me) => s.user = Some(me),
                Err(e) => warn!(target: "session", "profile fetch failed during init: {}", e),
            }
            s.is_loading = false;
        });
    }

    /// Record a fresh token from the login or signup flow, then confirm with "me".
    pub async fn login(&self, token: &str, user: Option<User>) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|s| {
            s.is_loading = true;
            if let Some(u) = user {
                s.user = Some(u);
            }
        });
        if let Err(e) = self.store.set(token) {
            warn!(target: "session", "could not persist token: {}", e);
        }

        let fetched = self.backend.fetch_me(Some(token)).await;
        if !self.is_current(generation) {
            debug!(target: "session", "login result superseded by a newer transition");
            return;
        }
        self.state.send_modify(|s| {
            match fetched {
                Ok(me) => {
                    info!(target: "session", "signed in as {}", me.email);
                    s.user = Some(me);
                }
                Err(e) => warn!(target: "session", "profile fetch failed after login: {}", e),
            }
            s.is_loading = false;
        });
    }

    /// Clear the session locally first so guards react at once, then tell the relay and
    /// navigate to the login page.
    pub async fn logout(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|s| {
            s.user = None;
            s.is_loading = false;
        });
        if let Err(e) = self.store.remove() {
            warn!(target: "session", "could not remove persisted token: {}", e);
        }
        if let Err(e) = self.backend.end_session().await {
            warn!(target: "session", "relay logout failed: {}", e);
        }
        tokio::time::sleep(self.config.logout_delay).await;
        self.navigator.redirect(&self.config.login_path);
    }

    /// Shallow-merge into the current user. No-op when signed out; never touches storage
    /// or the network.
    pub fn update(&self, patch: &UserPatch) {
        self.state.send_if_modified(|s| match s.user.as_mut() {
            Some(u) => {
                u.apply(patch);
                true
            }
            None => false,
        });
    }
}
