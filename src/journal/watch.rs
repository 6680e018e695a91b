//! # Watch handles: live row delivery with prompt cancellation.
//!
//! A `watch` call yields a [`WatchHandle`]: a [`WatchStream`] the consumer
//! receives rows from, and a [`WatchCancel`] that tears the subscription
//! down. [`WatchStream::recv`] races three outcomes — a delivered row, the
//! subscription being cancelled, and the caller's own token firing — so a
//! watcher task can never leak waiting on a dead subscription.
//!
//! ## Rules
//! - **No replay**: a stream only observes rows written after subscription.
//! - **Idle handles**: [`WatchHandle::idle`] returns a stream that pends
//!   forever (it is *not* closed) until cancelled. This is the "journal
//!   disabled" behavior: callers block in their select as if waiting for
//!   events that may never come.
//! - **Idempotent cancel**: calling [`WatchCancel::cancel`] twice is safe;
//!   dropping the handle without cancelling leaves cleanup to the caller's
//!   token.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::rows::Row;

/// Receive side of a subscription.
///
/// Rows arrive in the write order of the watched queue. `recv` returns
/// `None` once the subscription is cancelled (via its [`WatchCancel`] or the
/// caller's token) or the delivering side is gone.
pub struct WatchStream {
    rx: mpsc::Receiver<Row>,
    token: CancellationToken,
}

impl WatchStream {
    pub(crate) fn new(rx: mpsc::Receiver<Row>, token: CancellationToken) -> Self {
        Self { rx, token }
    }

    /// Waits for the next row.
    ///
    /// Suspends until a row arrives, the subscription is cancelled, or the
    /// caller's cancellation token fires — whichever happens first.
    /// Cancellation wins over rows still sitting in the queue: delivery
    /// stops promptly rather than draining.
    pub async fn recv(&mut self) -> Option<Row> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            row = self.rx.recv() => row,
        }
    }
}

/// Inner cancel state, shared so the handle can be cloned into tasks.
struct CancelInner {
    token: CancellationToken,
    /// Keeps an idle stream's channel open until cancel; `None` for real
    /// subscriptions, whose delivery side lives in the backend.
    keep_open: Mutex<Option<mpsc::Sender<Row>>>,
}

/// Cancellation side of a subscription.
///
/// Cheap to clone; all clones cancel the same subscription. Safe and
/// idempotent: the second and later calls are no-ops.
#[derive(Clone)]
pub struct WatchCancel {
    inner: Arc<CancelInner>,
}

impl WatchCancel {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self {
            inner: Arc::new(CancelInner {
                token,
                keep_open: Mutex::new(None),
            }),
        }
    }

    fn keeping(token: CancellationToken, tx: mpsc::Sender<Row>) -> Self {
        Self {
            inner: Arc::new(CancelInner {
                token,
                keep_open: Mutex::new(Some(tx)),
            }),
        }
    }

    /// Cancels the subscription and releases its delivery resources.
    pub fn cancel(&self) {
        self.inner.token.cancel();
        if let Ok(mut keep) = self.inner.keep_open.lock() {
            keep.take();
        }
    }

    /// True once the subscription has been cancelled (by any clone or the
    /// caller's token).
    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }
}

/// A live subscription: delivery stream plus cancellation handle.
pub struct WatchHandle {
    /// Stream of rows written to the watched queue after subscription.
    pub stream: WatchStream,
    /// Tears the subscription down; safe to call from anywhere.
    pub cancel: WatchCancel,
}

impl WatchHandle {
    /// Builds a handle around an existing delivery channel.
    ///
    /// `token` must be the subscription's own (child) token: cancelling it
    /// stops delivery for this subscription only.
    pub fn new(rx: mpsc::Receiver<Row>, token: CancellationToken) -> Self {
        Self {
            stream: WatchStream::new(rx, token.clone()),
            cancel: WatchCancel::new(token),
        }
    }

    /// A handle that never yields a row.
    ///
    /// Used when no journal or no backend is configured: the stream pends
    /// (the channel stays open) until the handle or `caller_token` is
    /// cancelled, then ends cleanly.
    pub fn idle(caller_token: &CancellationToken) -> Self {
        let token = caller_token.child_token();
        let (tx, rx) = mpsc::channel(1);
        Self {
            stream: WatchStream::new(rx, token.clone()),
            cancel: WatchCancel::keeping(token, tx),
        }
    }

    /// Splits the handle into its stream and cancel sides.
    pub fn into_parts(self) -> (WatchStream, WatchCancel) {
        (self.stream, self.cancel)
    }
}
