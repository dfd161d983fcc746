// ── Reactive status stream ──
//
// Subscription type for consuming live-status changes from the poller.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::LiveStatus;

/// A subscription to the poller's live status.
///
/// Provides both point-in-time snapshot access and change notification via
/// [`changed()`](Self::changed) or by converting to a `Stream`.
pub struct StatusStream {
    current: Arc<LiveStatus>,
    receiver: watch::Receiver<Arc<LiveStatus>>,
}

impl StatusStream {
    pub(crate) fn new(mut receiver: watch::Receiver<Arc<LiveStatus>>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// Snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Arc<LiveStatus> {
        &self.current
    }

    /// Latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Arc<LiveStatus> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change. Returns `None` once the poller is dropped.
    pub async fn changed(&mut self) -> Option<Arc<LiveStatus>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    ///
    /// The stream yields the current snapshot first, then one item per change.
    pub fn into_stream(self) -> StatusWatchStream {
        StatusWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct StatusWatchStream {
    inner: WatchStream<Arc<LiveStatus>>,
}

impl Stream for StatusWatchStream {
    type Item = Arc<LiveStatus>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
