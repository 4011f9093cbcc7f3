//! Tracking lifecycle signal.
//!
//! A latest-value channel of [`TrackingState`]. Late subscribers see only the
//! most recent state and whatever is published after they subscribe; there is
//! no history. The signal is owned by [`AppState`](crate::AppState) and passed
//! explicitly to the sampling loop and the presentation surface.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use loctrack_types::TrackingState;

/// Publish/subscribe holder for the current [`TrackingState`].
#[derive(Debug)]
pub struct TrackingSignal {
    tx: watch::Sender<Option<TrackingState>>,
}

impl TrackingSignal {
    /// Create a signal with nothing published yet.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Publish a state. Never blocks and never fails, even with no observers.
    pub fn publish(&self, state: TrackingState) {
        debug!("Tracking state: {}", state);
        self.tx.send_replace(Some(state));
    }

    /// The most recently published state.
    pub fn current(&self) -> Option<TrackingState> {
        *self.tx.borrow()
    }

    /// Whether tracking should be shown as active.
    ///
    /// Active unless the last published state is `Stopped`; inactive when
    /// nothing has been published.
    pub fn is_active(&self) -> bool {
        matches!(self.current(), Some(state) if state != TrackingState::Stopped)
    }

    /// Raw receiver for async consumers.
    pub fn subscribe(&self) -> watch::Receiver<Option<TrackingState>> {
        self.tx.subscribe()
    }

    /// Invoke `callback` with the current state (if any) and on every later
    /// publish.
    ///
    /// Runs on a spawned task until the returned handle is stopped or
    /// dropped. Must be called from within a Tokio runtime.
    pub fn observe<F>(&self, mut callback: F) -> ObserverHandle
    where
        F: FnMut(TrackingState) + Send + 'static,
    {
        let mut rx = self.tx.subscribe();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let initial = *rx.borrow_and_update();
            if let Some(state) = initial {
                callback(state);
            }

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let state = *rx.borrow_and_update();
                        if let Some(state) = state {
                            callback(state);
                        }
                    }
                }
            }
        });

        ObserverHandle {
            cancel,
            handle: Some(handle),
        }
    }
}

impl Default for TrackingSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a listener registered with [`TrackingSignal::observe`].
///
/// Dropping the handle stops the listener.
#[must_use = "dropping the handle stops the observer"]
#[derive(Debug)]
pub struct ObserverHandle {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ObserverHandle {
    /// Stop the listener and wait for it to exit.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    /// Whether the listener task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
