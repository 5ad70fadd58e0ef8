//! Router - ties the queue, the interceptor and the periodic maintenance together

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::RouterConfig;
use crate::daemon::InstanceLock;
use crate::interceptor::{Acknowledgement, Interceptor};
use crate::notification::Notification;
use crate::queue::{NotificationQueue, Ticket};
use crate::watcher::ConfigWatcher;

/// Cheap to clone; clones share the queue and the interceptor
#[derive(Clone)]
pub struct Router {
    queue: Arc<NotificationQueue>,
    interceptor: Arc<Interceptor>,
}

impl Router {
    pub fn new(queue: Arc<NotificationQueue>, interceptor: Arc<Interceptor>) -> Self {
        Self { queue, interceptor }
    }

    pub fn queue(&self) -> &Arc<NotificationQueue> {
        &self.queue
    }

    pub fn interceptor(&self) -> &Arc<Interceptor> {
        &self.interceptor
    }

    /// Queue a notification, run it through the interceptor and apply the
    /// acknowledgement. Returns the queue id.
    ///
    /// Blocks for as long as an escalated presentation is on screen.
    pub async fn ingest(&self, notification: Notification) -> u32 {
        let ticket = self.queue.insert(notification);
        self.escalate(ticket).await;
        ticket.id
    }

    /// Run the entry behind `ticket` through the interceptor and apply the
    /// acknowledgement. Does nothing if the entry was replaced meanwhile.
    pub async fn escalate(&self, ticket: Ticket) {
        let Some(stored) = self.queue.get_current(ticket) else {
            debug!(id = ticket.id, "Entry replaced before escalation");
            return;
        };

        if let Some(ack) = self.interceptor.intercept(&stored).await {
            self.acknowledge(ticket, ack);
        }
    }

    /// consumed → dismissed from the queue; dismissed → marked seen;
    /// anything else leaves the entry alone. An entry replaced while it was
    /// on screen is never touched.
    pub fn acknowledge(&self, ticket: Ticket, ack: Acknowledgement) {
        if ack.consumed {
            self.queue.dismiss_current(ticket);
        } else if ack.dismissed {
            self.queue.see_current(ticket);
        } else {
            debug!(id = ticket.id, code = ack.outcome.code(), "Presentation not dismissed, keeping notification");
        }
    }

    /// One maintenance round: expiry sweep, then save if anything changed
    pub fn tick(&self) {
        self.queue.cleanup();
        if let Err(e) = self.queue.save_if_dirty() {
            warn!(error = %e, "Periodic queue save failed");
        }
    }

    /// Run `tick` every `interval` until the task is dropped
    pub async fn maintain(self, interval: Duration) {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            timer.tick().await;
            self.tick();
        }
    }
}

/// Run the daemon until Ctrl-C
///
/// Notifications arrive as JSON lines on stdin. After stdin closes the
/// daemon keeps sweeping and watching the rules file.
pub async fn run(config: RouterConfig) -> Result<()> {
    let _lock = InstanceLock::acquire(&config.lock_file)?;

    let queue = Arc::new(NotificationQueue::load_with_policy(
        &config.queue_file,
        config.policy.clone(),
    ));
    queue.notification_seen.subscribe(|n| {
        info!(id = n.id, application = %n.application, "Notification seen");
    });
    queue.notification_closed.subscribe(|closed| {
        info!(
            id = closed.notification.id,
            reason = %closed.reason,
            code = closed.reason.code(),
            "Notification closed"
        );
    });

    let (interceptor, report) =
        Interceptor::from_file(&config.rules_file, config.interceptor_options());
    let interceptor = Arc::new(interceptor);
    if !report.is_clean() {
        let engine = interceptor.clone();
        tokio::spawn(async move {
            engine.report_diagnostics(&report).await;
        });
    }

    let (events_tx, events_rx) = mpsc::channel(8);
    ConfigWatcher::new(&config.rules_file, config.watch_interval).spawn(events_tx)?;
    let reloads = tokio::spawn(interceptor.clone().run_reloads(events_rx));

    let router = Router::new(queue.clone(), interceptor);
    let maintenance = tokio::spawn(router.clone().maintain(config.cleanup_interval));

    info!(
        queue = %config.queue_file.display(),
        rules = %config.rules_file.display(),
        live = queue.len(),
        "Notification router started"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => accept_line(&router, &line),
                Ok(None) => {
                    info!("Input closed, continuing in maintenance mode");
                    stdin_open = false;
                }
                Err(e) => {
                    error!(error = %e, "Failed to read input");
                    stdin_open = false;
                }
            },
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
        }
    }

    maintenance.abort();
    reloads.abort();
    router.queue().cleanup();
    router.queue().save(None)?;
    Ok(())
}

/// Parse one inbound JSON line, queue it in arrival order and escalate it
/// on its own task
fn accept_line(router: &Router, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    match serde_json::from_str::<Notification>(line) {
        Ok(notification) => {
            let ticket = router.queue().insert(notification);
            let router = router.clone();
            tokio::spawn(async move {
                router.escalate(ticket).await;
            });
        }
        Err(e) => warn!(error = %e, "Ignoring malformed notification"),
    }
}
