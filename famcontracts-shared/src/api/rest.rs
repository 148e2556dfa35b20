//! Authenticated REST client used by the family-contracts front ends.
//!
//! The bearer token is re-read from the [`KeyValueStore`] on every request, so
//! whatever persisted it last wins. A 401 from any endpoint clears the stored
//! token and broadcasts [`SessionEvent::Unauthorized`]; redirecting to a login
//! screen is left to whoever listens.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::endpoints as ep;
use super::{
    AuthResp, ChangePasswordReq, CreateContractReq, CreateRewardReq, CreateTaskReq, LoginReq,
    RegisterReq, RewardDto, UpdateContractReq, UpdateProfileReq, UpdateRewardReq, UpdateTaskReq,
    error_message_from_body, unwrap_envelope,
};
use crate::domain::{Contract, Task, User};
use crate::storage::{self, KeyValueStore, StorageError};

pub use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("http: {0}")]
    Http(String),
    #[error("status {status}: {body}")]
    Status {
        status: u16,
        /// Message extracted from the JSON error body; empty when there was none.
        message: String,
        body: String,
    },
    #[error("serde: {0}")]
    Serde(String),
    #[error("storage: {0}")]
    Storage(#[from] StorageError),
}

impl RestError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RestError::Status { status: 401, .. })
    }

    /// Message supplied by the server, if this was a non-2xx response with one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            RestError::Status { message, .. } if !message.trim().is_empty() => Some(message.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A response came back 401 and the persisted token was dropped.
    Unauthorized,
    TokenStored,
    TokenCleared,
}

pub struct ApiClient {
    base: String,
    http: reqwest::Client,
    tokens: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    pub fn new(
        base: &str,
        tokens: Arc<dyn KeyValueStore>,
        timeout: Duration,
    ) -> Result<Self, RestError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .tcp_keepalive(Some(Duration::from_secs(180)))
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(180))
            .timeout(timeout)
            .build()
            .map_err(|e| RestError::Http(e.to_string()))?;
        let (events, _) = broadcast::channel(16);
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            http,
            tokens,
            events,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn token(&self) -> Result<Option<String>, RestError> {
        Ok(storage::read_token(self.tokens.as_ref())?)
    }

    pub fn store_token(&self, token: &str) -> Result<(), RestError> {
        storage::write_token(self.tokens.as_ref(), token)?;
        let _ = self.events.send(SessionEvent::TokenStored);
        Ok(())
    }

    pub fn clear_token(&self) -> Result<(), RestError> {
        storage::clear_token(self.tokens.as_ref())?;
        let _ = self.events.send(SessionEvent::TokenCleared);
        Ok(())
    }

    fn on_unauthorized(&self, url: &str) {
        warn!(%url, "unauthorized response; clearing stored token");
        if let Err(e) = storage::clear_token(self.tokens.as_ref()) {
            warn!(error=%e, "failed to clear stored token");
        }
        let _ = self.events.send(SessionEvent::Unauthorized);
    }

    async fn send(
        &self,
        method: reqwest::Method,
        url: String,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response, RestError> {
        debug!(%method, %url, "api request");
        let mut rb = self.http.request(method, &url);
        if let Some(token) = self.token()? {
            rb = rb.bearer_auth(token);
        }
        if let Some(b) = body {
            rb = rb.body(b);
        }
        let res = rb.send().await.map_err(|e| RestError::Http(e.to_string()))?;
        let status = res.status();
        if status == StatusCode::UNAUTHORIZED {
            self.on_unauthorized(&url);
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let message = error_message_from_body(&body).unwrap_or_default();
            debug!(status = status.as_u16(), %body, "api error response");
            return Err(RestError::Status {
                status: status.as_u16(),
                message,
                body,
            });
        }
        Ok(res)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: String,
        body: Option<Vec<u8>>,
        envelope: &str,
    ) -> Result<T, RestError> {
        let res = self.send(method, url, body).await?;
        let text = res
            .text()
            .await
            .map_err(|e| RestError::Http(e.to_string()))?;
        let value: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| RestError::Serde(e.to_string()))?;
        serde_json::from_value(unwrap_envelope(value, envelope))
            .map_err(|e| RestError::Serde(e.to_string()))
    }

    // Auth
    pub async fn login(&self, req: &LoginReq) -> Result<AuthResp, RestError> {
        self.fetch(reqwest::Method::POST, ep::auth_login(&self.base), json_body(req)?, "auth")
            .await
    }

    pub async fn register(&self, req: &RegisterReq) -> Result<AuthResp, RestError> {
        self.fetch(
            reqwest::Method::POST,
            ep::auth_register(&self.base),
            json_body(req)?,
            "auth",
        )
        .await
    }

    pub async fn me(&self) -> Result<User, RestError> {
        self.fetch(reqwest::Method::GET, ep::auth_me(&self.base), None, "user")
            .await
    }

    // Settings
    pub async fn profile(&self) -> Result<User, RestError> {
        self.fetch(reqwest::Method::GET, ep::settings_profile(&self.base), None, "user")
            .await
    }

    pub async fn update_profile(&self, req: &UpdateProfileReq) -> Result<User, RestError> {
        self.fetch(
            reqwest::Method::PUT,
            ep::settings_profile(&self.base),
            json_body(req)?,
            "user",
        )
        .await
    }

    pub async fn change_password(&self, req: &ChangePasswordReq) -> Result<(), RestError> {
        self.send(
            reqwest::Method::PUT,
            ep::settings_password(&self.base),
            json_body(req)?,
        )
        .await
        .map(|_| ())
    }

    pub async fn delete_account(&self) -> Result<(), RestError> {
        self.send(reqwest::Method::DELETE, ep::settings_account(&self.base), None)
            .await
            .map(|_| ())
    }

    // Contracts
    pub async fn list_contracts(&self) -> Result<Vec<Contract>, RestError> {
        self.fetch(reqwest::Method::GET, ep::contracts(&self.base), None, "contracts")
            .await
    }

    pub async fn get_contract(&self, id: &str) -> Result<Contract, RestError> {
        self.fetch(reqwest::Method::GET, ep::contract(&self.base, id), None, "contract")
            .await
    }

    pub async fn create_contract(&self, req: &CreateContractReq) -> Result<Contract, RestError> {
        self.fetch(
            reqwest::Method::POST,
            ep::contracts(&self.base),
            json_body(req)?,
            "contract",
        )
        .await
    }

    pub async fn update_contract(
        &self,
        id: &str,
        req: &UpdateContractReq,
    ) -> Result<Contract, RestError> {
        self.fetch(
            reqwest::Method::PUT,
            ep::contract(&self.base, id),
            json_body(req)?,
            "contract",
        )
        .await
    }

    pub async fn delete_contract(&self, id: &str) -> Result<(), RestError> {
        self.send(reqwest::Method::DELETE, ep::contract(&self.base, id), None)
            .await
            .map(|_| ())
    }

    // Tasks
    pub async fn list_tasks(&self, contract_id: Option<&str>) -> Result<Vec<Task>, RestError> {
        self.fetch(
            reqwest::Method::GET,
            ep::tasks(&self.base, contract_id),
            None,
            "tasks",
        )
        .await
    }

    pub async fn get_task(&self, id: &str) -> Result<Task, RestError> {
        self.fetch(reqwest::Method::GET, ep::task(&self.base, id), None, "task")
            .await
    }

    pub async fn create_task(&self, req: &CreateTaskReq) -> Result<Task, RestError> {
        self.fetch(
            reqwest::Method::POST,
            ep::tasks(&self.base, None),
            json_body(req)?,
            "task",
        )
        .await
    }

    pub async fn update_task(&self, id: &str, req: &UpdateTaskReq) -> Result<Task, RestError> {
        self.fetch(
            reqwest::Method::PUT,
            ep::task(&self.base, id),
            json_body(req)?,
            "task",
        )
        .await
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), RestError> {
        self.send(reqwest::Method::DELETE, ep::task(&self.base, id), None)
            .await
            .map(|_| ())
    }

    pub async fn complete_task(&self, id: &str) -> Result<Task, RestError> {
        self.fetch(
            reqwest::Method::POST,
            ep::task_complete(&self.base, id),
            None,
            "task",
        )
        .await
    }

    // Rewards
    pub async fn list_rewards(
        &self,
        contract_id: Option<&str>,
    ) -> Result<Vec<RewardDto>, RestError> {
        self.fetch(
            reqwest::Method::GET,
            ep::rewards(&self.base, contract_id),
            None,
            "rewards",
        )
        .await
    }

    pub async fn get_reward(&self, id: &str) -> Result<RewardDto, RestError> {
        self.fetch(reqwest::Method::GET, ep::reward(&self.base, id), None, "reward")
            .await
    }

    pub async fn create_reward(&self, req: &CreateRewardReq) -> Result<RewardDto, RestError> {
        self.fetch(
            reqwest::Method::POST,
            ep::rewards(&self.base, None),
            json_body(req)?,
            "reward",
        )
        .await
    }

    pub async fn update_reward(
        &self,
        id: &str,
        req: &UpdateRewardReq,
    ) -> Result<RewardDto, RestError> {
        self.fetch(
            reqwest::Method::PUT,
            ep::reward(&self.base, id),
            json_body(req)?,
            "reward",
        )
        .await
    }

    pub async fn delete_reward(&self, id: &str) -> Result<(), RestError> {
        self.send(reqwest::Method::DELETE, ep::reward(&self.base, id), None)
            .await
            .map(|_| ())
    }

    pub async fn claim_reward(&self, id: &str) -> Result<RewardDto, RestError> {
        self.fetch(
            reqwest::Method::POST,
            ep::reward_claim(&self.base, id),
            None,
            "reward",
        )
        .await
    }
}

fn json_body<T: Serialize>(value: &T) -> Result<Option<Vec<u8>>, RestError> {
    serde_json::to_vec(value)
        .map(Some)
        .map_err(|e| RestError::Serde(e.to_string()))
}
