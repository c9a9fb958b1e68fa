//! Outbound interfaces: display, alerts, browser.
//!
//! The scheduler only talks to these traits.  The terminal UI implements the
//! first two with [`ChannelSink`], which forwards everything to the UI
//! thread as [`PollMsg`]s.

use std::sync::mpsc;

use crate::poll::PollMsg;
use crate::reconcile::{AlertEvent, DisplayState};

/// Receives the display state after every reconciliation.
pub trait DisplaySink: Send {
    fn update(&self, display: DisplayState);

    /// Free-form status line ("3 notifications at 12:00:00 ...").
    fn status(&self, _line: String) {}
}

/// Shows an alert.  Implementations keep at most one alert visible and
/// replace it in place when a new one arrives.
pub trait AlertSink: Send {
    fn raise(&self, alert: AlertEvent);
}

/// Opens a URL for the user.
pub trait Browser {
    fn open(&self, url: &str);
}

/// Forwards scheduler output to the UI thread.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<PollMsg>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<PollMsg>) -> Self {
        Self { tx }
    }

    fn send(&self, msg: PollMsg) {
        // The UI thread has exited; nothing left to show.
        if self.tx.send(msg).is_err() {
            tracing::debug!(event = "sink.channel_closed");
        }
    }
}

impl DisplaySink for ChannelSink {
    fn update(&self, display: DisplayState) {
        self.send(PollMsg::Display(display));
    }

    fn status(&self, line: String) {
        self.send(PollMsg::Status(line));
    }
}

impl AlertSink for ChannelSink {
    fn raise(&self, alert: AlertEvent) {
        self.send(PollMsg::Alert(alert));
    }
}

/// The system's default browser, via the `open` crate.
pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&self, url: &str) {
        match open::that_detached(url) {
            Ok(()) => tracing::info!(event = "browser.opened", url),
            Err(e) => tracing::error!(event = "browser.open_failed", url, error = %e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_forwards_messages() {
        let (tx, rx) = mpsc::channel();
        let sink = ChannelSink::new(tx);

        sink.update(DisplayState::default());
        sink.raise(AlertEvent::new_notifications(2));
        sink.status("ok".into());

        assert!(matches!(rx.recv().unwrap(), PollMsg::Display(_)));
        assert!(matches!(rx.recv().unwrap(), PollMsg::Alert(a) if a.count == 2));
        assert!(matches!(rx.recv().unwrap(), PollMsg::Status(s) if s == "ok"));
    }

    #[test]
    fn channel_sink_survives_closed_receiver() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        ChannelSink::new(tx).update(DisplayState::default());
    }
}
