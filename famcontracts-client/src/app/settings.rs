use famcontracts_shared::api::{ChangePasswordReq, UpdateProfileReq};
use famcontracts_shared::domain::User;
use tracing::info;

use super::{App, Navigation};
use crate::AppError;
use crate::contracts::ContractStore;

const PROFILE_FAILED: &str = "failed to update profile";
const PASSWORD_FAILED: &str = "failed to change password";
const ACCOUNT_FAILED: &str = "failed to delete account";

impl App {
    /// Reloads the profile from the settings resource into the session.
    pub async fn profile(&mut self) -> Result<&User, AppError> {
        self.require_auth()?;
        let res = self.api.profile().await;
        self.drain_events();
        self.session.user = Some(res?);
        self.current_user()
    }

    /// Only name, email and phone are editable; id and role stay fixed.
    pub async fn update_profile(&mut self, req: UpdateProfileReq) -> Result<&User, AppError> {
        self.require_auth()?;
        if req.is_empty() {
            return Err(AppError::Input("nothing to update".into()));
        }
        self.session.begin();
        let res = self.api.update_profile(&req).await;
        self.session.finish();
        self.drain_events();
        match res {
            Ok(user) => {
                info!(user=%user.id, "profile updated");
                self.session.user = Some(user);
                self.current_user()
            }
            Err(e) => {
                self.session
                    .fail(e.server_message().unwrap_or(PROFILE_FAILED).to_string());
                Err(e.into())
            }
        }
    }

    pub async fn change_password(&mut self, current: &str, new: &str) -> Result<(), AppError> {
        self.require_auth()?;
        let req = ChangePasswordReq {
            current_password: current.to_string(),
            new_password: new.to_string(),
        };
        self.session.begin();
        let res = self.api.change_password(&req).await;
        self.session.finish();
        self.drain_events();
        if let Err(e) = res {
            self.session
                .fail(e.server_message().unwrap_or(PASSWORD_FAILED).to_string());
            return Err(e.into());
        }
        info!("password changed");
        Ok(())
    }

    /// Deletes the account server-side, then forgets everything like a logout.
    pub async fn delete_account(&mut self) -> Result<Navigation, AppError> {
        self.require_auth()?;
        let res = self.api.delete_account().await;
        self.drain_events();
        if let Err(e) = res {
            self.session
                .fail(e.server_message().unwrap_or(ACCOUNT_FAILED).to_string());
            return Err(e.into());
        }
        self.api.clear_token()?;
        self.session.clear();
        self.contracts = ContractStore::new();
        self.drain_events();
        info!("account deleted");
        Ok(Navigation::Login)
    }
}
