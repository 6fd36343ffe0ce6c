//! Change watch over the data directory
//!
//! Filesystem events are reduced to restart signals. The first event whose
//! content differs from the last signalled fingerprint opens a quiet window;
//! events inside the window are dropped and the file is hashed again when it
//! closes, so the signal carries the latest content.

use mock_api_core::{MockApiError, IGNORED_NAMES};
use mock_api_types::{ControlMessage, Fingerprint};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

/// A settled change that should restart the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSignal {
    /// Changed file, relative to the data root
    pub file: String,
    pub fingerprint: Fingerprint,
}

impl From<ChangeSignal> for ControlMessage {
    fn from(signal: ChangeSignal) -> Self {
        ControlMessage::restart_for(signal.file, signal.fingerprint)
    }
}

#[derive(Debug)]
enum WatchState {
    Idle,
    Debouncing {
        deadline: Instant,
        path: PathBuf,
        fingerprint: Fingerprint,
    },
}

/// Debouncing state machine turning file events into [`ChangeSignal`]s
pub struct ChangeWatch {
    root: PathBuf,
    quiet_period: Duration,
    previous: Option<Fingerprint>,
}

impl ChangeWatch {
    pub fn new(root: impl Into<PathBuf>, quiet_period: Duration) -> Self {
        Self {
            root: root.into(),
            quiet_period,
            previous: None,
        }
    }

    /// Consume events until the event channel closes or nobody listens for signals
    pub async fn run(mut self, mut events: mpsc::Receiver<PathBuf>, signals: mpsc::Sender<ChangeSignal>) {
        let mut state = WatchState::Idle;

        loop {
            state = match state {
                WatchState::Idle => match events.recv().await {
                    Some(path) => self.on_event(path),
                    None => break,
                },
                WatchState::Debouncing {
                    deadline,
                    path,
                    fingerprint,
                } => {
                    tokio::select! {
                        event = events.recv() => match event {
                            Some(dropped) => {
                                debug!("Change to {} dropped while settling", dropped.display());
                                WatchState::Debouncing { deadline, path, fingerprint }
                            }
                            None => break,
                        },
                        _ = time::sleep_until(deadline) => {
                            let signal = self.settle(path, fingerprint);
                            if signals.send(signal).await.is_err() {
                                break;
                            }
                            WatchState::Idle
                        }
                    }
                }
            };
        }

        debug!("Change watch stopped");
    }

    fn on_event(&self, path: PathBuf) -> WatchState {
        let fingerprint = match Fingerprint::of_file(&path) {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                debug!("Ignoring change to {}: {}", path.display(), e);
                return WatchState::Idle;
            }
        };

        if self.previous.as_ref() == Some(&fingerprint) {
            debug!("Content of {} unchanged", path.display());
            return WatchState::Idle;
        }

        WatchState::Debouncing {
            deadline: Instant::now() + self.quiet_period,
            path,
            fingerprint,
        }
    }

    fn settle(&mut self, path: PathBuf, fallback: Fingerprint) -> ChangeSignal {
        let fingerprint = Fingerprint::of_file(&path).unwrap_or(fallback);
        self.previous = Some(fingerprint.clone());

        ChangeSignal {
            file: self.relative(&path),
            fingerprint,
        }
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }
}

/// Watch `root` recursively, forwarding changed paths to `tx`
///
/// The returned watcher stops when dropped.
pub fn spawn_watcher(root: &Path, tx: mpsc::Sender<PathBuf>) -> Result<RecommendedWatcher, MockApiError> {
    let mut watcher = RecommendedWatcher::new(
        move |result: Result<Event, notify::Error>| match result {
            Ok(event) => {
                if !(event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove()) {
                    return;
                }
                for path in event.paths {
                    if is_ignored(&path) {
                        continue;
                    }
                    // A full channel means a change is already pending
                    let _ = tx.try_send(path);
                }
            }
            Err(e) => warn!("File watcher error: {}", e),
        },
        Config::default(),
    )
    .map_err(|e| MockApiError::Watch(format!("Failed to create file watcher: {}", e)))?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|e| MockApiError::Watch(format!("Failed to watch {}: {}", root.display(), e)))?;

    Ok(watcher)
}

fn is_ignored(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| IGNORED_NAMES.contains(&name))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const QUIET: Duration = Duration::from_millis(100);

    fn start(root: &Path) -> (mpsc::Sender<PathBuf>, mpsc::Receiver<ChangeSignal>) {
        let (event_tx, event_rx) = mpsc::channel(16);
        let (signal_tx, signal_rx) = mpsc::channel(16);
        tokio::spawn(ChangeWatch::new(root, QUIET).run(event_rx, signal_tx));
        (event_tx, signal_rx)
    }

    async fn next_signal(rx: &mut mpsc::Receiver<ChangeSignal>) -> Option<ChangeSignal> {
        time::timeout(Duration::from_millis(600), rx.recv())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn test_identical_content_signals_once() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("die.json");
        fs::write(&file, "{}").unwrap();

        let (events, mut signals) = start(dir.path());
        events.send(file.clone()).await.unwrap();

        let signal = next_signal(&mut signals).await.unwrap();
        assert_eq!(signal.file, "die.json");
        assert_eq!(signal.fingerprint, Fingerprint::of_bytes(b"{}"));

        events.send(file.clone()).await.unwrap();
        events.send(file).await.unwrap();
        assert!(next_signal(&mut signals).await.is_none());
    }

    #[tokio::test]
    async fn test_changes_in_window_signal_latest_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("die.json");
        fs::write(&file, r#"{"a": 1}"#).unwrap();

        let (events, mut signals) = start(dir.path());
        events.send(file.clone()).await.unwrap();
        time::sleep(Duration::from_millis(20)).await;
        fs::write(&file, r#"{"a": 2}"#).unwrap();
        events.send(file.clone()).await.unwrap();

        let signal = next_signal(&mut signals).await.unwrap();
        assert_eq!(signal.fingerprint, Fingerprint::of_bytes(br#"{"a": 2}"#));
        assert!(next_signal(&mut signals).await.is_none());
    }

    #[tokio::test]
    async fn test_new_content_after_window_signals_again() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("die.graphql");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "type Query { a: Int }").unwrap();

        let (events, mut signals) = start(dir.path());
        events.send(file.clone()).await.unwrap();
        assert!(next_signal(&mut signals).await.is_some());

        fs::write(&file, "type Query { b: Int }").unwrap();
        events.send(file).await.unwrap();
        let signal = next_signal(&mut signals).await.unwrap();
        assert_eq!(
            PathBuf::from(signal.file),
            PathBuf::from("nested").join("die.graphql")
        );
    }

    #[tokio::test]
    async fn test_unreadable_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let (events, mut signals) = start(dir.path());
        events.send(dir.path().join("deleted.json")).await.unwrap();
        assert!(next_signal(&mut signals).await.is_none());
    }

    #[test]
    fn test_signal_into_control_message() {
        let message: ControlMessage = ChangeSignal {
            file: "die.json".to_string(),
            fingerprint: Fingerprint::of_bytes(b"{}"),
        }
        .into();
        assert!(message.to_line().contains(r#""file":"die.json""#));
    }

    #[test]
    fn test_ignored_paths() {
        assert!(is_ignored(Path::new("/data/.DS_Store")));
        assert!(is_ignored(Path::new("Thumbs.db")));
        assert!(!is_ignored(Path::new("/data/die.json")));
    }

    #[tokio::test]
    async fn test_watcher_forwards_file_events() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::channel(64);
        let _watcher = spawn_watcher(dir.path(), tx).unwrap();

        fs::write(dir.path().join("die.json"), "{}").unwrap();

        let path = time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "die.json");
    }
}
