use crate::identity::User;

/// Authentication state shared by everything rendering for this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub is_loading: bool,
}

impl AuthState {
    /// Process start: loading, nobody signed in.
    pub fn start() -> Self {
        Self { user: None, is_loading: true }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::start()
    }
}
