//! Config watcher - polls the rules file and signals changes on a channel
//!
//! The watcher only reports; reloading is the receiver's job.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEvent {
    /// The file was modified, created or removed
    Changed(PathBuf),
}

/// Modification time and size, `None` while the file is absent
type Fingerprint = Option<(SystemTime, u64)>;

fn fingerprint(path: &Path) -> Fingerprint {
    let metadata = std::fs::metadata(path).ok()?;
    let modified = metadata.modified().ok()?;
    Some((modified, metadata.len()))
}

/// Polling watcher for a single file
pub struct ConfigWatcher {
    path: PathBuf,
    poll_interval: Duration,
    last: Fingerprint,
}

impl ConfigWatcher {
    /// The file's current state is the baseline; only later changes are reported
    pub fn new(path: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        let path = path.into();
        let last = fingerprint(&path);
        Self {
            path,
            poll_interval,
            last,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Poll once. True when the file differs from the previous poll.
    pub fn check(&mut self) -> bool {
        let current = fingerprint(&self.path);
        if current == self.last {
            return false;
        }
        debug!(path = %self.path.display(), present = current.is_some(), "Watched file changed");
        self.last = current;
        true
    }

    /// Poll on a dedicated thread until the receiver is dropped
    pub fn spawn(mut self, events: mpsc::Sender<ConfigEvent>) -> Result<JoinHandle<()>> {
        info!(
            path = %self.path.display(),
            interval_ms = self.poll_interval.as_millis() as u64,
            "Watching rules file"
        );

        let handle = std::thread::Builder::new()
            .name("config-watcher".to_string())
            .spawn(move || loop {
                std::thread::sleep(self.poll_interval);
                if events.is_closed() {
                    break;
                }
                if self.check()
                    && events
                        .blocking_send(ConfigEvent::Changed(self.path.clone()))
                        .is_err()
                {
                    break;
                }
            })?;
        Ok(handle)
    }
}
