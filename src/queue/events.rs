//! Listener hooks fired by the queue after a mutation is committed

use std::sync::{Arc, Mutex, PoisonError};

use crate::notification::{CloseReason, Notification};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// One-to-many notify hook
///
/// Listeners are called in subscription order on the thread that fired the
/// event. The listener list is cloned before dispatch, so a listener may
/// subscribe further listeners without deadlocking.
pub struct Hook<T> {
    listeners: Mutex<Vec<Listener<T>>>,
}

impl<T> Hook<T> {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    pub fn notify(&self, event: &T) {
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<T> Default for Hook<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload of the "notification closed" hook
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedNotification {
    pub notification: Notification,
    pub reason: CloseReason,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_every_listener_is_called() {
        let hook: Hook<u32> = Hook::new();
        let total = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let total = total.clone();
            hook.subscribe(move |v| {
                total.fetch_add(*v as usize, Ordering::SeqCst);
            });
        }

        hook.notify(&2);
        assert_eq!(total.load(Ordering::SeqCst), 6);
        assert_eq!(hook.listener_count(), 3);
    }

    #[test]
    fn test_notify_without_listeners_is_noop() {
        let hook: Hook<String> = Hook::default();
        hook.notify(&"nobody home".to_string());
        assert_eq!(hook.listener_count(), 0);
    }
}
