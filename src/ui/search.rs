//! Search box whose value is committed after the user stops typing.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::UiConfig;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

/// Immediate value plus a debounced stream of committed values.
///
/// Every keystroke restarts the idle timer; dropping the input cancels it.
pub struct SearchInput {
    value: String,
    delay: Duration,
    committed: mpsc::UnboundedSender<String>,
    pending: Option<JoinHandle<()>>,
}

impl SearchInput {
    #[must_use]
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (committed, rx) = mpsc::unbounded_channel();
        (
            Self {
                value: String::new(),
                delay,
                committed,
                pending: None,
            },
            rx,
        )
    }

    /// Input using the configured `search_debounce_ms`.
    #[must_use]
    pub fn from_config(config: &UiConfig) -> (Self, mpsc::UnboundedReceiver<String>) {
        Self::new(config.search_debounce())
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Sets the value shown in the box and restarts the idle timer.
    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cancel();

        let delay = self.delay;
        let value = self.value.clone();
        let committed = self.committed.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = committed.send(value);
        }));
    }

    /// Commits the current value right away, as on Enter.
    pub fn submit(&mut self) {
        self.cancel();
        let _ = self.committed.send(self.value.clone());
    }

    fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

impl Drop for SearchInput {
    fn drop(&mut self) {
        self.cancel();
    }
}
