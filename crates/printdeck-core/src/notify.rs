// ── User-facing notifications ──
//
// Fire-and-forget message sink. The dispatcher reports every intent outcome
// here exactly once; how messages are shown is up to the consumer.

use serde::Serialize;
use strum::Display;
use tokio::sync::broadcast;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotificationKind, message: &str);
}

impl<F> Notifier for F
where
    F: Fn(NotificationKind, &str) + Send + Sync,
{
    fn notify(&self, kind: NotificationKind, message: &str) {
        self(kind, message);
    }
}

/// Routes notifications into the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        match kind {
            NotificationKind::Error => warn!(%kind, "{message}"),
            NotificationKind::Success | NotificationKind::Info => info!(%kind, "{message}"),
        }
    }
}

/// Broadcasts notifications to any number of subscribers.
///
/// Sending with no subscribers is not an error; the message is dropped.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: broadcast::Sender<Notification>,
}

impl ChannelNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        let _ = self.tx.send(Notification {
            kind,
            message: message.to_owned(),
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn channel_fans_out() {
        let notifier = ChannelNotifier::new(8);
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();
        notifier.notify(NotificationKind::Success, "Paused");

        for rx in [&mut a, &mut b] {
            let n = rx.try_recv().unwrap();
            assert_eq!(n.kind, NotificationKind::Success);
            assert_eq!(n.message, "Paused");
        }
    }

    #[test]
    fn closures_are_notifiers() {
        let seen = std::sync::Mutex::new(Vec::new());
        let sink = |kind: NotificationKind, msg: &str| {
            seen.lock().unwrap().push(format!("{kind}: {msg}"));
        };
        sink.notify(NotificationKind::Error, "No active printer");
        assert_eq!(seen.lock().unwrap().as_slice(), ["error: No active printer"]);
    }
}
