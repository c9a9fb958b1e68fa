//! Settings file watcher.
//!
//! Watches the directory containing the settings file (editors usually
//! replace files rather than write them in place) and reports whether the
//! file itself was touched.  The main loop drains it once per tick and, on
//! a change, reloads the settings and replans the scheduler.

use std::ffi::OsString;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, TryRecvError};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

pub struct SettingsWatcher {
    /// Must be kept alive for events to keep flowing.
    _watcher: RecommendedWatcher,
    receiver: Receiver<Result<Event, notify::Error>>,
    file_name: OsString,
}

impl SettingsWatcher {
    /// Watch `path`.  Returns `None` if its directory cannot be watched
    /// (for example because it does not exist yet).
    pub fn new(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_os_string();
        let dir = path.parent().filter(|d| d.is_dir())?;

        let (tx, rx) = mpsc::channel();
        let mut watcher = match notify::recommended_watcher(tx) {
            Ok(w) => w,
            Err(e) => {
                tracing::warn!(event = "watch.create_failed", error = %e);
                return None;
            }
        };
        if let Err(e) = watcher.watch(dir, RecursiveMode::NonRecursive) {
            tracing::warn!(event = "watch.watch_failed", path = %dir.display(), error = %e);
            return None;
        }

        tracing::info!(event = "watch.watching", path = %path.display());
        Some(Self {
            _watcher: watcher,
            receiver: rx,
            file_name,
        })
    }

    /// Non-blocking.  Drains all pending events and returns `true` if any
    /// of them touched the settings file.
    pub fn has_pending_changes(&self) -> bool {
        let mut changed = false;

        loop {
            match self.receiver.try_recv() {
                Ok(Ok(event)) => {
                    if !changed && Self::is_relevant(&event, &self.file_name) {
                        tracing::debug!(
                            event = "watch.change_detected",
                            kind = ?event.kind,
                            paths = ?event.paths
                        );
                        changed = true;
                    }
                }
                Ok(Err(e)) => tracing::warn!(event = "watch.event_error", error = %e),
                Err(TryRecvError::Empty) => return changed,
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!(event = "watch.channel_disconnected");
                    return changed;
                }
            }
        }
    }

    fn is_relevant(event: &Event, file_name: &OsString) -> bool {
        let relevant_kind = matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        );
        relevant_kind
            && event
                .paths
                .iter()
                .any(|p| p.file_name() == Some(file_name.as_os_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind};
    use std::fs;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn only_the_settings_file_is_relevant() {
        let name = OsString::from("config.toml");

        let ours = Event::new(EventKind::Modify(ModifyKind::Any)).add_path("/x/config.toml".into());
        let other = Event::new(EventKind::Create(CreateKind::File)).add_path("/x/other.toml".into());
        let access = Event::new(EventKind::Access(AccessKind::Any)).add_path("/x/config.toml".into());

        assert!(SettingsWatcher::is_relevant(&ours, &name));
        assert!(!SettingsWatcher::is_relevant(&other, &name));
        assert!(!SettingsWatcher::is_relevant(&access, &name));
    }

    #[test]
    fn missing_directory_is_not_watched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent").join("config.toml");
        assert!(SettingsWatcher::new(&path).is_none());
    }

    #[test]
    fn detects_writes_to_the_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let watcher = SettingsWatcher::new(&path).expect("temp dir is watchable");
        assert!(!watcher.has_pending_changes());

        fs::write(&path, "handle = \"octocat\"\n").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = false;
        while Instant::now() < deadline {
            if watcher.has_pending_changes() {
                seen = true;
                break;
            }
            thread::sleep(Duration::from_millis(50));
        }
        assert!(seen, "write should be reported");
    }
}
