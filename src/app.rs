//! UI-thread state.
//!
//! Holds the last display state pushed by the poller, the single alert
//! slot, and the status line.  Everything here is plain data; the poller
//! never touches it directly, it only sends [`PollMsg`]s.

use crate::poll::PollMsg;
use crate::reconcile::{AlertEvent, DisplayState};

pub struct App {
    pub display: DisplayState,
    /// At most one alert is visible.  A newer alert replaces it in place.
    pub alert: Option<AlertEvent>,
    /// Last poll status message.
    pub status: String,
    pub paused: bool,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Page opened on click-through.
    pub web_url: String,
}

impl App {
    pub fn new(web_url: String, display: DisplayState) -> Self {
        Self {
            display,
            alert: None,
            status: "Starting…".into(),
            paused: false,
            quit: false,
            web_url,
        }
    }

    pub fn apply(&mut self, msg: PollMsg) {
        match msg {
            PollMsg::Display(display) => self.display = display,
            PollMsg::Alert(alert) => self.raise_alert(alert),
            PollMsg::Status(status) => self.status = status,
        }
    }

    pub fn raise_alert(&mut self, alert: AlertEvent) {
        if self.alert.is_some() {
            tracing::debug!(event = "app.alert_replaced", count = alert.count);
        }
        self.alert = Some(alert);
    }

    pub fn dismiss_alert(&mut self) -> Option<AlertEvent> {
        self.alert.take()
    }

    /// Flip the paused flag; returns the new value.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new(
            "https://github.com/notifications".into(),
            DisplayState::default(),
        )
    }

    #[test]
    fn new_app_has_no_alert() {
        let app = app();
        assert!(app.alert.is_none());
        assert!(!app.quit);
        assert!(!app.paused);
        assert_eq!(app.display.count, 0);
    }

    #[test]
    fn second_alert_replaces_the_first() {
        let mut app = app();
        app.apply(PollMsg::Alert(AlertEvent::new_notifications(2)));
        app.apply(PollMsg::Alert(AlertEvent::new_notifications(5)));

        let shown = app.alert.as_ref().expect("one alert visible");
        assert_eq!(shown.count, 5);
        assert_eq!(shown.message, "You have 5 new notifications");

        assert!(app.dismiss_alert().is_some());
        assert!(app.dismiss_alert().is_none(), "nothing stacked behind it");
    }

    #[test]
    fn display_and_status_messages_overwrite() {
        let mut app = app();
        app.apply(PollMsg::Display(DisplayState {
            count: 7,
            visible: true,
            count_visible: true,
            error_glyph: false,
        }));
        app.apply(PollMsg::Status("7 notifications".into()));
        assert_eq!(app.display.count, 7);
        assert_eq!(app.status, "7 notifications");
    }

    #[test]
    fn toggle_pause_flips() {
        let mut app = app();
        assert!(app.toggle_pause());
        assert!(!app.toggle_pause());
    }
}
