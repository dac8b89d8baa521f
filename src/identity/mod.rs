//! Identity helpers shared by the relay and the session client.
//! Keep the public surface thin and split implementation across sub-modules.

mod credential;
mod claims;
mod user;
pub mod upstream;

pub use credential::{bearer, resolve_authorization, AUTH_TOKEN_COOKIE, UPSTREAM_SESSION_COOKIE};
pub use claims::{peek_unverified_claims, TokenClaims};
pub use user::{User, UserPatch};
