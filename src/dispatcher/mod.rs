//! Dispatcher - runs one presentation process with a bounded timeout
//!
//! The process is spawned asynchronously and awaited for at most
//! `timeout`. On expiry it gets SIGTERM, then SIGKILL after a short grace
//! period. Either way the child is reaped and the completion callback
//! fires exactly once.

pub mod command;

pub use command::{CommandLine, PresentationCommand};

use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Reported exit code when the process was terminated by the dispatcher
pub const TERMINATED_EXIT_CODE: i32 = -15;
/// Reported exit code when the process could not be started
pub const SPAWN_FAILED_EXIT_CODE: i32 = -1;

/// How long a terminated process gets before it is killed outright
const KILL_GRACE: Duration = Duration::from_secs(2);

/// How a presentation process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Exited on its own with this status
    Exited(i32),
    /// Timed out (or died from a signal)
    Terminated,
    SpawnFailed,
}

impl DispatchOutcome {
    pub fn code(&self) -> i32 {
        match self {
            DispatchOutcome::Exited(code) => *code,
            DispatchOutcome::Terminated => TERMINATED_EXIT_CODE,
            DispatchOutcome::SpawnFailed => SPAWN_FAILED_EXIT_CODE,
        }
    }

    /// Exit status 0 means the user explicitly dismissed the notification
    pub fn is_dismissed(&self) -> bool {
        matches!(self, DispatchOutcome::Exited(0))
    }
}

/// Runs presentation processes
#[derive(Debug, Clone)]
pub struct Dispatcher {
    /// `Duration::ZERO` waits forever
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `command`, wait for it within the timeout and hand the outcome
    /// to `on_exit`. The same outcome is returned.
    ///
    /// A process that outlives the timeout gets SIGTERM and up to
    /// `KILL_GRACE` (2s) to exit before it is killed, so this can take up to
    /// `timeout + 2s`.
    pub async fn run<F>(&self, command: &CommandLine, on_exit: F) -> DispatchOutcome
    where
        F: FnOnce(DispatchOutcome),
    {
        let outcome = self.supervise(command).await;
        on_exit(outcome);
        outcome
    }

    /// Run `command` on a background task and return a receiver for the outcome
    pub fn spawn(&self, command: CommandLine) -> oneshot::Receiver<DispatchOutcome> {
        let (tx, rx) = oneshot::channel();
        let dispatcher = self.clone();
        tokio::spawn(async move {
            let outcome = dispatcher.supervise(&command).await;
            // Receiver may have been dropped; the child is reaped regardless
            let _ = tx.send(outcome);
        });
        rx
    }

    async fn supervise(&self, command: &CommandLine) -> DispatchOutcome {
        let spawned = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                warn!(command = %command, error = %e, "Failed to start presentation process");
                return DispatchOutcome::SpawnFailed;
            }
        };
        debug!(command = %command, pid = ?child.id(), "Presentation process started");

        let waited = if self.timeout.is_zero() {
            Some(child.wait().await)
        } else {
            tokio::time::timeout(self.timeout, child.wait()).await.ok()
        };

        let outcome = match waited {
            Some(Ok(status)) => status
                .code()
                .map(DispatchOutcome::Exited)
                .unwrap_or(DispatchOutcome::Terminated),
            Some(Err(e)) => {
                warn!(command = %command, error = %e, "Failed to wait for presentation process");
                terminate(&mut child).await;
                DispatchOutcome::Terminated
            }
            None => {
                info!(
                    command = %command,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Presentation process timed out, terminating"
                );
                terminate(&mut child).await;
                DispatchOutcome::Terminated
            }
        };

        debug!(command = %command, code = outcome.code(), "Presentation process finished");
        outcome
    }
}

/// SIGTERM, then SIGKILL if the process outlives the grace period
async fn terminate(child: &mut Child) {
    if let Some(pid) = child.id() {
        let _ = Command::new("kill")
            .args(["-TERM", &pid.to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        if tokio::time::timeout(KILL_GRACE, child.wait()).await.is_ok() {
            return;
        }
    }

    if let Err(e) = child.kill().await {
        warn!(error = %e, "Failed to kill presentation process");
    }
}
