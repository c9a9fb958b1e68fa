//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] changes and to [`Action`]s that need
//! the outside world (browser, scheduler).  Adding a new keybinding is a
//! single match arm in [`handle_key_event`].
//!
//! ## For contributors
//!
//! To add a new keybinding:
//!
//! 1. If it only changes UI state, add a method on [`App`].  If it needs the
//!    scheduler or the OS, add an [`Action`] variant and handle it in
//!    `main.rs`.
//! 2. Add a `KeyCode` match arm in [`handle_key_event`].
//! 3. Update the help text in [`crate::ui`].

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::App;

/// Side effects requested by a keypress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Open the notifications page.
    OpenBrowser,
    /// Open the settings file in the default editor.
    OpenSettings,
    /// Fetch again shortly.
    Refresh,
    Pause,
    Resume,
}

/// Process a single key event.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char('q') => app.quit = true,
        KeyCode::Esc => {
            if app.dismiss_alert().is_none() {
                app.quit = true;
            }
        }
        KeyCode::Char('x') => {
            app.dismiss_alert();
        }
        // Clicking through an alert also dismisses it.
        KeyCode::Enter | KeyCode::Char('o') => {
            app.dismiss_alert();
            return Some(Action::OpenBrowser);
        }
        KeyCode::Char('r') => return Some(Action::Refresh),
        KeyCode::Char('p') => return Some(Action::OpenSettings),
        KeyCode::Char(' ') => {
            return Some(if app.toggle_pause() {
                Action::Pause
            } else {
                Action::Resume
            })
        }
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{AlertEvent, DisplayState};
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        App::new("https://github.com/notifications".into(), DisplayState::default())
    }

    #[test]
    fn q_quits() {
        let mut app = app();
        assert_eq!(handle_key_event(&mut app, press(KeyCode::Char('q'))), None);
        assert!(app.quit);
    }

    #[test]
    fn esc_dismisses_alert_before_quitting() {
        let mut app = app();
        app.raise_alert(AlertEvent::new_notifications(1));

        handle_key_event(&mut app, press(KeyCode::Esc));
        assert!(app.alert.is_none());
        assert!(!app.quit);

        handle_key_event(&mut app, press(KeyCode::Esc));
        assert!(app.quit);
    }

    #[test]
    fn enter_clicks_through_the_alert() {
        let mut app = app();
        app.raise_alert(AlertEvent::new_notifications(3));
        assert_eq!(
            handle_key_event(&mut app, press(KeyCode::Enter)),
            Some(Action::OpenBrowser)
        );
        assert!(app.alert.is_none());
    }

    #[test]
    fn space_toggles_pause() {
        let mut app = app();
        assert_eq!(handle_key_event(&mut app, press(KeyCode::Char(' '))), Some(Action::Pause));
        assert!(app.paused);
        assert_eq!(handle_key_event(&mut app, press(KeyCode::Char(' '))), Some(Action::Resume));
        assert!(!app.paused);
    }

    #[test]
    fn refresh_and_settings() {
        let mut app = app();
        assert_eq!(handle_key_event(&mut app, press(KeyCode::Char('r'))), Some(Action::Refresh));
        assert_eq!(
            handle_key_event(&mut app, press(KeyCode::Char('p'))),
            Some(Action::OpenSettings)
        );
    }

    #[test]
    fn key_release_is_ignored() {
        let mut app = app();
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(handle_key_event(&mut app, release), None);
        assert!(!app.quit);
    }
}
