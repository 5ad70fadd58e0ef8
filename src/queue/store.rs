//! Queue persistence - JSON array file read/write

use anyhow::{anyhow, Context, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{NotificationQueue, QueuePolicy};
use crate::notification::Notification;

impl NotificationQueue {
    /// Load a queue bound to `path`, using the default policy
    pub fn load(path: impl Into<PathBuf>) -> Self {
        Self::load_with_policy(path, QueuePolicy::default())
    }

    /// Load a queue bound to `path`
    ///
    /// A missing file gives an empty queue. So does a corrupt one: losing the
    /// backlog beats refusing to start.
    pub fn load_with_policy(path: impl Into<PathBuf>, policy: QueuePolicy) -> Self {
        let path = path.into();

        if !path.exists() {
            info!(path = %path.display(), "Creating empty notification queue");
            return Self::new(Vec::new(), Some(path), policy);
        }

        let entries = match read_entries(&path) {
            Ok(entries) => {
                info!(path = %path.display(), count = entries.len(), "Loaded notification queue");
                entries
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load notification queue");
                Vec::new()
            }
        };

        Self::new(entries, Some(path), policy)
    }

    /// Write every live entry to `path`, or to the bound queue file
    ///
    /// The data goes to a sibling temporary file that is renamed over the
    /// target. On failure the temporary file is removed and the dirty state
    /// is kept.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let target = path
            .map(Path::to_path_buf)
            .or_else(|| self.queue_file.clone())
            .ok_or_else(|| anyhow!("no queue file configured"))?;

        let (entries, revision) = {
            let state = self.lock();
            let mut entries: Vec<Notification> = state.entries.values().cloned().collect();
            entries.sort_by_key(|n| n.id);
            (entries, state.revision)
        };

        info!(path = %target.display(), count = entries.len(), "Saving notification queue");
        if let Err(e) = write_atomically(&target, &entries) {
            warn!(path = %target.display(), error = %e, "Failed to save notification queue");
            return Err(e);
        }

        let mut state = self.lock();
        if state.saved_revision < revision {
            state.saved_revision = revision;
        }
        Ok(())
    }

    /// Save to the bound file only when something changed. Returns whether
    /// a save happened.
    pub fn save_if_dirty(&self) -> Result<bool> {
        if !self.is_dirty() {
            return Ok(false);
        }
        self.save(None)?;
        Ok(true)
    }
}

fn read_entries(path: &Path) -> Result<Vec<Notification>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let entries = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(entries)
}

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "queue".into());
    name.push(".tmp");
    target.with_file_name(name)
}

fn write_atomically(target: &Path, entries: &[Notification]) -> Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }

    let temp = temp_path(target);
    let result = write_entries(&temp, entries).and_then(|()| {
        fs::rename(&temp, target)
            .with_context(|| format!("renaming {} to {}", temp.display(), target.display()))
    });

    if result.is_err() && temp.exists() {
        let _ = fs::remove_file(&temp);
    }
    result
}

fn write_entries(path: &Path, entries: &[Notification]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, entries)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}
