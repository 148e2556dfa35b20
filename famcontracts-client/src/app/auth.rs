use famcontracts_shared::api::{AuthResp, LoginReq, RegisterReq};
use famcontracts_shared::api::rest::RestError;
use famcontracts_shared::domain::User;
use tracing::info;

use super::{App, Navigation};
use crate::AppError;
use crate::contracts::ContractStore;
use crate::session::{LOGIN_FAILED, LOGOUT_FAILED, REGISTER_FAILED};

impl App {
    pub async fn login(&mut self, email: &str, password: &str) -> Result<&User, AppError> {
        self.session.begin();
        let req = LoginReq {
            email: email.to_string(),
            password: password.to_string(),
        };
        let res = self.api.login(&req).await;
        self.finish_auth(res, LOGIN_FAILED)?;
        info!(%email, "logged in");
        self.current_user()
    }

    pub async fn register(&mut self, req: RegisterReq) -> Result<&User, AppError> {
        self.session.begin();
        let res = self.api.register(&req).await;
        self.finish_auth(res, REGISTER_FAILED)?;
        info!(email=%req.email, role=%req.role, "registered");
        self.current_user()
    }

    fn finish_auth(
        &mut self,
        res: Result<AuthResp, RestError>,
        fallback: &str,
    ) -> Result<(), AppError> {
        let out = match res {
            Ok(resp) => match self.api.store_token(&resp.token) {
                Ok(()) => {
                    self.session.succeed(resp);
                    Ok(())
                }
                Err(e) => {
                    self.session.fail(fallback);
                    Err(AppError::from(e))
                }
            },
            Err(e) => {
                let message = e.server_message().unwrap_or(fallback).to_string();
                self.session.fail(message.clone());
                Err(match e {
                    // a rejected login is not an expired session
                    RestError::Status { status, .. } => AppError::Api { status, message },
                    other => AppError::from(other),
                })
            }
        };
        self.session.finish();
        if out.is_ok() {
            self.drain_events();
        } else {
            self.discard_events();
        }
        out
    }

    pub(super) fn current_user(&self) -> Result<&User, AppError> {
        self.session.user.as_ref().ok_or(AppError::NotAuthenticated)
    }

    /// Fetches the profile behind the stored token.
    pub async fn whoami(&mut self) -> Result<&User, AppError> {
        self.require_auth()?;
        let res = self.api.me().await;
        self.drain_events();
        let user = res.map_err(AppError::from)?;
        self.session.user = Some(user);
        self.current_user()
    }

    /// Clears the session, the persisted token and the cached contracts.
    pub fn logout(&mut self) -> Result<Navigation, AppError> {
        self.session.is_loading = true;
        let res = self.api.clear_token();
        self.session.is_loading = false;
        if let Err(e) = res {
            self.session.fail(LOGOUT_FAILED);
            return Err(AppError::from(e));
        }
        self.session.clear();
        self.contracts = ContractStore::new();
        self.drain_events();
        info!("logged out");
        Ok(Navigation::Login)
    }
}
