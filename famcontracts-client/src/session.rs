//! Session store: who is logged in and with which token.

use famcontracts_shared::api::AuthResp;
use famcontracts_shared::auth::Role;
use famcontracts_shared::domain::User;
use famcontracts_shared::jwt;
use tracing::info;

pub const LOGIN_FAILED: &str = "login failed";
pub const REGISTER_FAILED: &str = "registration failed";
pub const LOGOUT_FAILED: &str = "logout failed";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Session {
    /// Initial state from a persisted token. Returns the session and whether the
    /// token was discarded because its `exp` claim is in the past. Tokens that
    /// are not JWTs are kept as-is.
    pub fn restore(token: Option<String>, now_unix: i64) -> (Self, bool) {
        let Some(token) = token else {
            return (Self::default(), false);
        };
        match jwt::decode_unverified(&token) {
            Ok(claims) if claims.is_expired(now_unix) => {
                info!(exp = claims.exp, "persisted token expired; starting logged out");
                (Self::default(), true)
            }
            _ => (
                Self {
                    token: Some(token),
                    ..Default::default()
                },
                false,
            ),
        }
    }

    pub fn begin(&mut self) {
        self.is_loading = true;
        self.error = None;
    }

    pub fn succeed(&mut self, resp: AuthResp) {
        self.user = Some(resp.user);
        self.token = Some(resp.token);
    }

    /// Records the error; user and token stay as they were.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn finish(&mut self) {
        self.is_loading = false;
    }

    pub fn clear(&mut self) {
        self.user = None;
        self.token = None;
        self.error = None;
    }

    /// The stored token was rejected; the next protected call needs a new login.
    pub fn on_unauthorized(&mut self) {
        self.token = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }
}
