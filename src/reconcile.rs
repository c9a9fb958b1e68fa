//! Fold a fetch outcome into what the panel shows.
//!
//! Only a fresh list changes the count.  Every other outcome keeps the
//! previous count, so a flaky network shows a stale number rather than
//! zero.  An alert is raised when a fresh count is larger than the one on
//! screen.

use crate::config::DisplayFlags;
use crate::source::FetchOutcome;

pub const ALERT_TITLE: &str = "Github Notifications";

/// What the panel renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayState {
    pub count: usize,
    /// Whether the panel is shown at all.
    pub visible: bool,
    /// Whether the count label is shown.
    pub count_visible: bool,
    /// Show `!` in place of the count (bad credentials).
    pub error_glyph: bool,
}

impl DisplayState {
    /// State before the first fetch completes.
    pub fn initial(flags: &DisplayFlags) -> Self {
        refresh_visibility(&DisplayState::default(), flags)
    }

    /// Text of the count label.
    pub fn label(&self) -> String {
        if self.error_glyph {
            "!".into()
        } else {
            self.count.to_string()
        }
    }
}

/// A popup announcing new notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEvent {
    pub title: String,
    pub message: String,
    pub count: usize,
}

impl AlertEvent {
    pub fn new_notifications(count: usize) -> Self {
        Self {
            title: ALERT_TITLE.into(),
            message: format!("You have {count} new notifications"),
            count,
        }
    }
}

/// Reconcile `outcome` against what is currently displayed.
pub fn apply(
    outcome: &FetchOutcome,
    prior: &DisplayState,
    flags: &DisplayFlags,
) -> (DisplayState, Option<AlertEvent>) {
    let mut next = *prior;
    let mut alert = None;

    match outcome {
        FetchOutcome::Fresh { notifications, .. } => {
            next.count = notifications.len();
            next.error_glyph = false;
            if flags.show_alert && next.count > prior.count {
                alert = Some(AlertEvent::new_notifications(next.count));
            }
        }
        FetchOutcome::NotModified { .. } => next.error_glyph = false,
        FetchOutcome::Unauthorized => next.error_glyph = true,
        // Count goes stale; the glyph is left as it was.
        FetchOutcome::HttpError(_) | FetchOutcome::TransportError(_) => {}
    }

    (refresh_visibility(&next, flags), alert)
}

/// Re-evaluate visibility, e.g. after the settings changed.
pub fn refresh_visibility(prior: &DisplayState, flags: &DisplayFlags) -> DisplayState {
    DisplayState {
        visible: !flags.hide_widget || prior.count != 0,
        count_visible: !flags.hide_count,
        ..*prior
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Notification;

    fn fresh(count: usize) -> FetchOutcome {
        FetchOutcome::Fresh {
            notifications: vec![Notification::default(); count],
            last_modified: None,
            min_interval: None,
        }
    }

    fn flags() -> DisplayFlags {
        DisplayFlags::default()
    }

    fn showing(count: usize) -> DisplayState {
        DisplayState {
            count,
            visible: true,
            count_visible: true,
            error_glyph: false,
        }
    }

    #[test]
    fn fresh_sets_count_and_alerts_on_growth() {
        let (display, alert) = apply(&fresh(3), &showing(1), &flags());
        assert_eq!(display.count, 3);
        let alert = alert.expect("count grew");
        assert_eq!(alert.title, ALERT_TITLE);
        assert_eq!(alert.message, "You have 3 new notifications");
    }

    #[test]
    fn no_alert_when_count_shrinks_or_holds() {
        assert!(apply(&fresh(3), &showing(3), &flags()).1.is_none());
        let (display, alert) = apply(&fresh(0), &showing(3), &flags());
        assert_eq!(display.count, 0);
        assert!(alert.is_none());
    }

    #[test]
    fn no_alert_when_disabled() {
        let quiet = DisplayFlags {
            show_alert: false,
            ..flags()
        };
        let (display, alert) = apply(&fresh(5), &showing(0), &quiet);
        assert_eq!(display.count, 5);
        assert!(alert.is_none());
    }

    #[test]
    fn failures_carry_the_count_over() {
        for outcome in [
            FetchOutcome::Unauthorized,
            FetchOutcome::HttpError(500),
            FetchOutcome::TransportError("reset".into()),
            FetchOutcome::NotModified { min_interval: None },
        ] {
            let (display, alert) = apply(&outcome, &showing(3), &flags());
            assert_eq!(display.count, 3, "{outcome:?}");
            assert!(alert.is_none());
        }
    }

    #[test]
    fn not_modified_is_idempotent() {
        let outcome = FetchOutcome::NotModified { min_interval: Some(60) };
        let (once, _) = apply(&outcome, &showing(4), &flags());
        let (twice, _) = apply(&outcome, &once, &flags());
        assert_eq!(once, twice);
        assert_eq!(twice.count, 4);
    }

    #[test]
    fn unauthorized_sets_glyph_until_next_success() {
        let (bad, _) = apply(&FetchOutcome::Unauthorized, &showing(2), &flags());
        assert!(bad.error_glyph);
        assert_eq!(bad.label(), "!");

        let (still_bad, _) = apply(&FetchOutcome::HttpError(502), &bad, &flags());
        assert!(still_bad.error_glyph);

        let (good, _) = apply(&fresh(2), &still_bad, &flags());
        assert!(!good.error_glyph);
        assert_eq!(good.label(), "2");
    }

    #[test]
    fn hide_widget_only_hides_when_empty() {
        let hiding = DisplayFlags {
            hide_widget: true,
            ..flags()
        };
        let (empty, _) = apply(&fresh(0), &showing(2), &hiding);
        assert!(!empty.visible);
        let (busy, _) = apply(&fresh(1), &empty, &hiding);
        assert!(busy.visible);
    }

    #[test]
    fn hide_count_hides_label() {
        let hiding = DisplayFlags {
            hide_count: true,
            ..flags()
        };
        let display = refresh_visibility(&showing(3), &hiding);
        assert!(display.visible);
        assert!(!display.count_visible);
        assert_eq!(display.count, 3);
    }

    #[test]
    fn initial_state() {
        let display = DisplayState::initial(&flags());
        assert_eq!(display.count, 0);
        assert!(display.visible);
        assert!(display.count_visible);

        let hidden = DisplayState::initial(&DisplayFlags {
            hide_widget: true,
            ..flags()
        });
        assert!(!hidden.visible);
    }
}
