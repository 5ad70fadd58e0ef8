//! Notification queue - concurrent, persisted, deduplicating store
//!
//! All entries and the id counter live behind one mutex, so `put`, `see`,
//! `remove` and the destructive part of `cleanup` are linearized. Hooks
//! fire after the lock is released.

pub mod events;
mod store;

pub use events::{ClosedNotification, Hook};

use chrono::{DateTime, SubsecRound, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::notification::{CloseReason, Notification, Urgency};

/// Applications that may only have one live notification
pub const SINGLE_INSTANCE_APPS: &[&str] = &["VLC media player"];

/// Applications whose notifications are dropped once their deadline passes
pub const ALLOWED_TO_EXPIRE: &[&str] = &["notify-send"];

/// Per-application queue behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuePolicy {
    pub single_instance: Vec<String>,
    pub allowed_to_expire: Vec<String>,
}

impl QueuePolicy {
    pub fn is_single_instance(&self, application: &str) -> bool {
        self.single_instance.iter().any(|app| app == application)
    }

    pub fn may_expire(&self, application: &str) -> bool {
        self.allowed_to_expire.iter().any(|app| app == application)
    }
}

impl Default for QueuePolicy {
    fn default() -> Self {
        Self {
            single_instance: SINGLE_INSTANCE_APPS.iter().map(|s| s.to_string()).collect(),
            allowed_to_expire: ALLOWED_TO_EXPIRE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Identifies one particular `put`, not just the id it landed on
///
/// Replacing an entry keeps its id but gives it a new stamp, so a ticket
/// held across a long presentation can tell whether the entry it refers
/// to is still the one that was shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub id: u32,
    pub stamp: u64,
}

struct QueueState {
    entries: HashMap<u32, Notification>,
    /// Stamp of the `put` that produced each entry; loaded entries have none
    stamps: HashMap<u32, u64>,
    next_id: u32,
    /// Bumped on every mutation
    revision: u64,
    /// Revision captured by the last successful save
    saved_revision: u64,
}

impl QueueState {
    fn touch(&mut self) {
        self.revision += 1;
    }

    fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    fn take(&mut self, nid: u32) -> Option<Notification> {
        self.stamps.remove(&nid);
        self.entries.remove(&nid)
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        self.entries.contains_key(&ticket.id) && self.stamps.get(&ticket.id) == Some(&ticket.stamp)
    }

    /// Next unused id. 0 is reserved for "unset".
    fn allocate_id(&mut self) -> u32 {
        loop {
            let candidate = self.next_id;
            self.next_id = self.next_id.checked_add(1).unwrap_or(1);
            if candidate != 0 && !self.entries.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}

/// Notification queue
pub struct NotificationQueue {
    state: Mutex<QueueState>,
    policy: QueuePolicy,
    queue_file: Option<PathBuf>,
    /// Fired by `see`
    pub notification_seen: Hook<Notification>,
    /// Fired by `cleanup` (EXPIRED) and `dismiss` (DISMISSED)
    pub notification_closed: Hook<ClosedNotification>,
}

impl NotificationQueue {
    /// Create a queue from existing entries
    ///
    /// The id counter starts one above the highest id present. Entries
    /// without an id get a fresh one.
    pub fn new(
        entries: impl IntoIterator<Item = Notification>,
        queue_file: Option<PathBuf>,
        policy: QueuePolicy,
    ) -> Self {
        let mut map = HashMap::new();
        let mut unnumbered = Vec::new();
        for mut notification in entries {
            notification.deadline = notification.deadline.map(stored_deadline);
            if notification.id == 0 {
                unnumbered.push(notification);
            } else {
                map.insert(notification.id, notification);
            }
        }

        let next_id = map.keys().max().map_or(1, |max| max.checked_add(1).unwrap_or(1));
        let mut state = QueueState {
            entries: map,
            stamps: HashMap::new(),
            next_id,
            revision: 0,
            saved_revision: 0,
        };
        for mut notification in unnumbered {
            notification.id = state.allocate_id();
            state.entries.insert(notification.id, notification);
        }

        Self {
            state: Mutex::new(state),
            policy,
            queue_file,
            notification_seen: Hook::new(),
            notification_closed: Hook::new(),
        }
    }

    /// Empty queue with the default policy, not bound to a file
    pub fn in_memory() -> Self {
        Self::new(Vec::new(), None, QueuePolicy::default())
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // Every critical section leaves the map consistent, so a panicking
        // listener elsewhere must not wedge the queue.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn policy(&self) -> &QueuePolicy {
        &self.policy
    }

    pub fn queue_file(&self) -> Option<&Path> {
        self.queue_file.as_deref()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().is_dirty()
    }

    pub fn contains(&self, nid: u32) -> bool {
        self.lock().entries.contains_key(&nid)
    }

    pub fn get(&self, nid: u32) -> Option<Notification> {
        self.lock().entries.get(&nid).cloned()
    }

    /// Copy of all live notifications, ordered by id
    pub fn snapshot(&self) -> Vec<Notification> {
        let state = self.lock();
        let mut entries: Vec<Notification> = state.entries.values().cloned().collect();
        entries.sort_by_key(|n| n.id);
        entries
    }

    /// Insert or replace a notification and return its final id
    ///
    /// Single-instance applications replace their existing entry. Otherwise
    /// a notification whose id is already live replaces that entry, and
    /// anything else gets the next unused id.
    pub fn put(&self, notification: Notification) -> u32 {
        self.insert(notification).id
    }

    /// `put`, returning a ticket for this exact entry
    ///
    /// The deadline is truncated to milliseconds, the precision it is
    /// persisted with.
    pub fn insert(&self, mut notification: Notification) -> Ticket {
        notification.deadline = notification.deadline.map(stored_deadline);

        let mut state = self.lock();
        state.touch();

        let to_replace = if self.policy.is_single_instance(&notification.application) {
            state
                .entries
                .values()
                .find(|n| n.application == notification.application)
                .map(|n| n.id)
        } else if notification.id != 0 && state.entries.contains_key(&notification.id) {
            Some(notification.id)
        } else {
            None
        };

        let nid = match to_replace {
            Some(nid) => {
                info!(id = nid, application = %notification.application, "Replacing notification");
                nid
            }
            None => {
                let nid = state.allocate_id();
                info!(id = nid, application = %notification.application, "Adding notification");
                nid
            }
        };
        notification.id = nid;
        let stamp = state.revision;
        state.entries.insert(nid, notification);
        state.stamps.insert(nid, stamp);
        Ticket { id: nid, stamp }
    }

    /// The entry behind `ticket`, unless it was replaced or removed since
    pub fn get_current(&self, ticket: Ticket) -> Option<Notification> {
        let state = self.lock();
        if state.is_current(ticket) {
            state.entries.get(&ticket.id).cloned()
        } else {
            None
        }
    }

    /// Downgrade to NORMAL and fire `notification_seen`
    pub fn see(&self, nid: u32) -> bool {
        self.see_where(nid, |_| true)
    }

    /// `see`, but only while `ticket` still names the live entry
    pub fn see_current(&self, ticket: Ticket) -> bool {
        self.see_where(ticket.id, |state| state.is_current(ticket))
    }

    fn see_where<F>(&self, nid: u32, check: F) -> bool
    where
        F: FnOnce(&QueueState) -> bool,
    {
        let seen = {
            let mut state = self.lock();
            if !check(&*state) {
                debug!(id = nid, "Entry was replaced, not marking seen");
                return false;
            }
            let Some(notification) = state.entries.get_mut(&nid) else {
                warn!(id = nid, "Unable to find notification");
                return false;
            };
            notification.urgency = Urgency::Normal;
            let seen = notification.clone();
            state.touch();
            seen
        };

        debug!(id = nid, "Seeing notification");
        self.notification_seen.notify(&seen);
        true
    }

    pub fn remove(&self, nid: u32) -> Option<Notification> {
        let mut state = self.lock();
        match state.take(nid) {
            Some(removed) => {
                state.touch();
                info!(id = nid, "Removing notification");
                Some(removed)
            }
            None => {
                warn!(id = nid, "Unable to find notification");
                None
            }
        }
    }

    /// Remove several entries under one lock, returning how many existed
    pub fn remove_all(&self, nids: impl IntoIterator<Item = u32>) -> usize {
        let mut state = self.lock();
        let mut removed = 0;
        for nid in nids {
            if state.take(nid).is_some() {
                info!(id = nid, "Removing notification");
                removed += 1;
            } else {
                warn!(id = nid, "Unable to find notification");
            }
        }
        if removed > 0 {
            state.touch();
        }
        removed
    }

    /// Remove an entry the user dealt with and fire `notification_closed`
    pub fn dismiss(&self, nid: u32) -> bool {
        let removed = self.remove(nid);
        self.close_dismissed(removed)
    }

    /// `dismiss`, but only while `ticket` still names the live entry
    pub fn dismiss_current(&self, ticket: Ticket) -> bool {
        let removed = {
            let mut state = self.lock();
            if !state.is_current(ticket) {
                debug!(id = ticket.id, "Entry was replaced, not dismissing");
                return false;
            }
            state.touch();
            info!(id = ticket.id, "Removing notification");
            state.take(ticket.id)
        };
        self.close_dismissed(removed)
    }

    fn close_dismissed(&self, removed: Option<Notification>) -> bool {
        match removed {
            Some(notification) => {
                self.notification_closed.notify(&ClosedNotification {
                    notification,
                    reason: CloseReason::Dismissed,
                });
                true
            }
            None => false,
        }
    }

    /// Drop expired entries from applications allowed to expire
    pub fn cleanup(&self) -> Vec<u32> {
        self.cleanup_at(Utc::now())
    }

    pub fn cleanup_at(&self, now: DateTime<Utc>) -> Vec<u32> {
        let expired: Vec<Notification> = {
            let mut state = self.lock();
            let ids: Vec<u32> = state
                .entries
                .values()
                .filter(|n| n.is_expired_at(now) && self.policy.may_expire(&n.application))
                .map(|n| n.id)
                .collect();
            if ids.is_empty() {
                return Vec::new();
            }
            state.touch();
            ids.iter().filter_map(|nid| state.take(*nid)).collect()
        };

        let ids: Vec<u32> = expired.iter().map(|n| n.id).collect();
        info!(ids = ?ids, "Expired notifications");
        for notification in expired {
            self.notification_closed.notify(&ClosedNotification {
                notification,
                reason: CloseReason::Expired,
            });
        }
        ids
    }
}

/// Deadlines are persisted with millisecond precision; keep the live copy identical
fn stored_deadline(deadline: DateTime<Utc>) -> DateTime<Utc> {
    deadline.trunc_subsecs(3)
}
