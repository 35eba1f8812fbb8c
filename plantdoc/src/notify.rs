//! Toast notifications for the presentation layer.
//!
//! A [`Notifier`] is handed to whoever needs to raise a toast; front ends
//! subscribe and render. Publishing is best-effort: with no subscribers the
//! toast is dropped.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    #[default]
    Default,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
}

impl Toast {
    #[must_use]
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into(), variant: ToastVariant::Default }
    }

    #[must_use]
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into(), variant: ToastVariant::Destructive }
    }
}

#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Toast>,
}

impl Notifier {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, toast: Toast) {
        // Best-effort: no subscribers means nobody is showing toasts.
        if self.tx.send(toast).is_err() {
            debug!("notify: toast dropped, no subscribers");
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.tx.subscribe()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "notify_test.rs"]
mod tests;
