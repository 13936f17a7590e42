//! Progress notifications for export and import runs.
//!
//! Runs push [`ProgressEvent`]s into an unbounded channel; the caller drains
//! the receiver on its own schedule. Sending never blocks the worker, and a
//! dropped receiver is ignored.

use serde::Serialize;
use tokio::sync::mpsc;

/// One notification from a running transfer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A record type finished; `percent` never decreases within a run.
    Progress { message: String, percent: f64 },
    /// The run hit a fatal error.
    Failure { kind: String, detail: String },
    /// The run reached its terminal state with `failures` non-fatal errors.
    Finished { message: String, failures: usize },
}

pub type EventReceiver = mpsc::UnboundedReceiver<ProgressEvent>;

/// Sending half of the progress channel.
///
/// A disconnected sender (see [`EventSender::disabled`]) drops every event.
#[derive(Debug, Clone, Default)]
pub struct EventSender {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl EventSender {
    /// A sender with nobody listening.
    #[must_use]
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn send(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            // Receiver may be gone; the run continues regardless.
            let _ = tx.send(event);
        }
    }

    pub fn progress(&self, message: impl Into<String>, percent: f64) {
        self.send(ProgressEvent::Progress {
            message: message.into(),
            percent,
        });
    }

    pub fn failure(&self, kind: &str, detail: impl Into<String>) {
        self.send(ProgressEvent::Failure {
            kind: kind.to_string(),
            detail: detail.into(),
        });
    }

    pub fn finished(&self, message: impl Into<String>, failures: usize) {
        self.send(ProgressEvent::Finished {
            message: message.into(),
            failures,
        });
    }
}

/// Create a connected sender/receiver pair.
#[must_use]
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx: Some(tx) }, rx)
}

/// Percentage after `done` of `total` steps. An empty run is complete.
#[must_use]
pub fn percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let pct = done as f64 / total as f64 * 100.0;
    pct.min(100.0)
}

/// Drain every event currently queued on `rx`.
pub fn drain(rx: &mut EventReceiver) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_delivered_in_order() {
        let (tx, mut rx) = event_channel();
        tx.progress("a", 50.0);
        tx.finished("done", 0);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ProgressEvent::Progress { percent, .. } if percent == 50.0));
        assert!(matches!(events[1], ProgressEvent::Finished { failures: 0, .. }));
    }

    #[test]
    fn test_disabled_sender_drops_events() {
        let tx = EventSender::disabled();
        tx.progress("ignored", 10.0);
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (tx, rx) = event_channel();
        drop(rx);
        tx.failure("sink", "gone");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 4), 25.0);
        assert_eq!(percent(4, 4), 100.0);
        assert_eq!(percent(0, 0), 100.0);
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(ProgressEvent::Progress {
            message: "m".into(),
            percent: 10.0,
        })
        .unwrap();
        assert_eq!(json["event"], "progress");
        assert_eq!(json["percent"], 10.0);
    }
}
