use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Shows short-lived notices to the user ("task completed", "session expired").
#[async_trait]
pub trait Notice: Send {
    async fn show(&mut self, summary: &str, body: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    Desktop,
    LogOnly,
}

#[derive(Debug)]
pub struct Notifier {
    kind: NotifierKind,
}

impl Notifier {
    pub fn new(desktop: bool) -> Self {
        let kind = if desktop && cfg!(not(target_os = "windows")) {
            NotifierKind::Desktop
        } else {
            NotifierKind::LogOnly
        };
        debug!(?kind, "notifier created");
        Self { kind }
    }

    pub fn kind(&self) -> NotifierKind {
        self.kind
    }
}

#[async_trait]
impl Notice for Notifier {
    async fn show(&mut self, summary: &str, body: &str) {
        match self.kind {
            NotifierKind::Desktop => {
                if let Err(e) = show_desktop(summary, body).await {
                    warn!(error=%e, "desktop notification failed; downgrading to log-only");
                    self.kind = NotifierKind::LogOnly;
                    info!("[NOTICE] {summary}: {body}");
                }
            }
            NotifierKind::LogOnly => {
                info!("[NOTICE] {summary}: {body}");
            }
        }
    }
}

#[cfg(not(target_os = "windows"))]
async fn show_desktop(summary: &str, body: &str) -> Result<(), String> {
    notify_rust::Notification::new()
        .appname("Family Contracts")
        .summary(summary)
        .body(body)
        .timeout(notify_rust::Timeout::Milliseconds(4000))
        .show_async()
        .await
        .map(|_| ())
        .map_err(|e| e.to_string())
}

#[cfg(target_os = "windows")]
async fn show_desktop(_summary: &str, _body: &str) -> Result<(), String> {
    Err("desktop notices are not supported on this platform".into())
}

/// Collects notices instead of showing them. Clones share one log, so a
/// handle kept outside an [`App`](crate::App) sees what the app showed.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotice {
    shown: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingNotice {
    pub fn shown(&self) -> Vec<(String, String)> {
        self.shown.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notice for RecordingNotice {
    async fn show(&mut self, summary: &str, body: &str) {
        if let Ok(mut v) = self.shown.lock() {
            v.push((summary.to_string(), body.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_only_never_downgrades() {
        let mut n = Notifier::new(false);
        assert_eq!(n.kind(), NotifierKind::LogOnly);
        n.show("Task completed", "Vacuum").await;
        assert_eq!(n.kind(), NotifierKind::LogOnly);
    }

    #[tokio::test]
    async fn recording_keeps_order() {
        let mut r = RecordingNotice::default();
        r.show("a", "1").await;
        r.show("b", "2").await;
        assert_eq!(r.shown(), vec![("a".into(), "1".into()), ("b".into(), "2".into())]);
    }
}
