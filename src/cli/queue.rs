//! Offline queue commands - inspect and edit the persisted queue file

use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;

use super::output::format_notification;
use crate::config::RouterConfig;
use crate::daemon::InstanceLock;
use crate::queue::NotificationQueue;

/// Queue file selection shared by the queue commands
#[derive(Args, Debug, Clone)]
pub struct QueueArgs {
    /// Queue file (default: ~/.cache/notification-router/queue.json)
    #[arg(long)]
    pub queue: Option<PathBuf>,
}

impl QueueArgs {
    pub fn queue_file(&self) -> PathBuf {
        self.queue
            .clone()
            .unwrap_or_else(|| RouterConfig::default().queue_file)
    }
}

pub fn handle_list(args: &QueueArgs, json: bool) -> Result<()> {
    let queue = NotificationQueue::load(args.queue_file());
    let entries = queue.snapshot();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for notification in &entries {
            println!("{}", format_notification(notification));
        }
    }
    Ok(())
}

pub fn handle_count(args: &QueueArgs) -> Result<()> {
    let queue = NotificationQueue::load(args.queue_file());
    println!("{}", queue.len());
    Ok(())
}

/// Load the queue under the instance lock, apply `edit`, save if it changed
fn edit_queue<F>(args: &QueueArgs, edit: F) -> Result<()>
where
    F: FnOnce(&NotificationQueue) -> Result<()>,
{
    let path = args.queue_file();
    let _lock = InstanceLock::acquire(&RouterConfig::lock_file_for(&path))?;
    let queue = NotificationQueue::load(path);
    edit(&queue)?;
    queue.save_if_dirty()?;
    Ok(())
}

pub fn handle_see(args: &QueueArgs, ids: &[u32]) -> Result<()> {
    edit_queue(args, |queue| {
        let missing: Vec<u32> = ids.iter().copied().filter(|nid| !queue.see(*nid)).collect();
        if !missing.is_empty() {
            bail!("unknown notification id(s): {:?}", missing);
        }
        Ok(())
    })
}

pub fn handle_remove(args: &QueueArgs, ids: &[u32]) -> Result<()> {
    edit_queue(args, |queue| {
        let removed = queue.remove_all(ids.iter().copied());
        println!("removed {}", removed);
        Ok(())
    })
}

pub fn handle_cleanup(args: &QueueArgs) -> Result<()> {
    edit_queue(args, |queue| {
        let expired = queue.cleanup();
        println!("expired {}", expired.len());
        Ok(())
    })
}
