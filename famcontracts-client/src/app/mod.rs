//! The state owner. One [`App`] is built at start-up and handed by `&mut` to
//! whatever drives it; there is no ambient global state.

mod actions;
mod auth;
mod settings;

use std::time::Duration;

use famcontracts_shared::api::rest::{ApiClient, RestError, SessionEvent};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::contracts::ContractStore;
use crate::notify::{Notice, Notifier};
use crate::session::Session;
use crate::{AppError, storage};

/// Where the UI should go after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Stay,
    Login,
}

pub struct App {
    api: ApiClient,
    session: Session,
    contracts: ContractStore,
    events: broadcast::Receiver<SessionEvent>,
    notice: Box<dyn Notice>,
}

impl App {
    pub fn new(api: ApiClient, notice: Box<dyn Notice>) -> Result<Self, AppError> {
        let events = api.subscribe();
        let (session, expired) = Session::restore(api.token()?, chrono::Utc::now().timestamp());
        if expired {
            api.clear_token()?;
        }
        let mut app = Self {
            api,
            session,
            contracts: ContractStore::new(),
            events,
            notice,
        };
        app.drain_events();
        Ok(app)
    }

    pub fn from_config(cfg: &ClientConfig) -> Result<Self, AppError> {
        let store = storage::open_store(cfg)?;
        let api = ApiClient::new(
            &cfg.server_url,
            store,
            Duration::from_secs(cfg.timeout_secs),
        )?;
        debug!(server=%api.base_url(), "api client ready");
        Self::new(api, Box::new(Notifier::new(cfg.desktop_notices)))
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn contracts(&self) -> &ContractStore {
        &self.contracts
    }

    pub fn contracts_mut(&mut self) -> &mut ContractStore {
        &mut self.contracts
    }

    pub fn require_auth(&self) -> Result<(), AppError> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(AppError::NotAuthenticated)
        }
    }

    /// Applies token-loss notifications from the API client to the session.
    fn drain_events(&mut self) {
        self.apply_events(true);
    }

    /// Drains events without touching the in-memory session. A 401 from a
    /// rejected login or registration says nothing about the token already
    /// held; the client has still dropped the persisted copy.
    fn discard_events(&mut self) {
        self.apply_events(false);
    }

    fn apply_events(&mut self, honor_unauthorized: bool) {
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::Unauthorized) if honor_unauthorized => {
                    warn!("server rejected the session token; login required");
                    self.session.on_unauthorized();
                }
                Ok(ev) => debug!(?ev, "session event"),
                Err(TryRecvError::Lagged(n)) => {
                    warn!(missed = n, "session events lagged; resyncing from storage");
                    if honor_unauthorized && matches!(self.api.token(), Ok(None)) {
                        self.session.on_unauthorized();
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    /// Settles a contract-family call: drains session events and records the
    /// server message (or `fallback`) as the store error on failure.
    fn settle<T>(&mut self, res: Result<T, RestError>, fallback: &str) -> Result<T, AppError> {
        self.contracts.set_loading(false);
        self.drain_events();
        res.map_err(|e| {
            let msg = e.server_message().unwrap_or(fallback).to_string();
            self.contracts.set_error(Some(msg));
            AppError::from(e)
        })
    }

    fn begin_contracts(&mut self) {
        self.contracts.set_loading(true);
        self.contracts.set_error(None);
    }

    async fn notify(&mut self, summary: &str, body: &str) {
        self.notice.show(summary, body).await;
    }

    pub async fn notify_session_expired(&mut self) {
        self.notify("Session expired", "Run `famcontracts login` to sign in.")
            .await;
    }

    /// Tears the owner down. The persisted token outlives the process unless
    /// the user logged out.
    pub fn shutdown(mut self) -> Session {
        self.drain_events();
        debug!(authenticated = self.session.is_authenticated(), "app shut down");
        self.session
    }
}
