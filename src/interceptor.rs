//! Match & dispatch engine
//!
//! Decides whether a notification escalates to an on-screen presentation
//! and, if so, runs the presentation command and reports how it ended.
//!
//! The active ruleset is an `Arc<Ruleset>` behind an `RwLock`. Each
//! evaluation clones the `Arc` once, so a reload only affects evaluations
//! that start after it.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dispatcher::{CommandLine, DispatchOutcome, Dispatcher, PresentationCommand};
use crate::notification::{Notification, Urgency};
use crate::rules::{load_rules, LoadReport, Ruleset};
use crate::watcher::ConfigEvent;

/// Application name used for notifications the router synthesizes itself
pub const ROUTER_APPLICATION: &str = "notification-router";

/// Why a notification escalates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationReason {
    /// CRITICAL with `always_display_critical` on
    Critical,
    /// Index of the first matching (whitelist) matcher
    Whitelisted { rule: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Escalate(EscalationReason),
    Suppress,
}

/// Evaluate `ruleset` against `notification`
///
/// Critical override first (when enabled), then matchers in file order with
/// the first match deciding. No match suppresses.
pub fn decide(ruleset: &Ruleset, notification: &Notification) -> Decision {
    if notification.urgency == Urgency::Critical && ruleset.config.always_display_critical() {
        return Decision::Escalate(EscalationReason::Critical);
    }

    match ruleset.first_match(notification) {
        Some((rule, matcher)) if matcher.whitelist => {
            Decision::Escalate(EscalationReason::Whitelisted { rule })
        }
        _ => Decision::Suppress,
    }
}

/// Result of an escalation, handed back to whoever owns the notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acknowledgement {
    pub outcome: DispatchOutcome,
    /// The user explicitly dismissed the presentation
    pub dismissed: bool,
    /// Dismissed and `consume_on_dismiss` is on: drop it from the queue
    pub consumed: bool,
}

impl Acknowledgement {
    pub fn new(outcome: DispatchOutcome, consume_on_dismiss: bool) -> Self {
        let dismissed = outcome.is_dismissed();
        Self {
            outcome,
            dismissed,
            consumed: dismissed && consume_on_dismiss,
        }
    }
}

/// Engine settings that do not come from the rules file
#[derive(Debug, Clone, Default)]
pub struct InterceptorOptions {
    pub presentation: PresentationCommand,
    /// Best-effort command that leaves full-screen mode before presenting
    pub fullscreen_off: Option<CommandLine>,
    /// Overrides the rules file's `dispatch_timeout`
    pub timeout: Option<Duration>,
}

/// Rule-driven interceptor
pub struct Interceptor {
    rules_path: Option<PathBuf>,
    ruleset: RwLock<Arc<Ruleset>>,
    options: InterceptorOptions,
}

impl Interceptor {
    /// Engine with a fixed ruleset and no backing file
    pub fn new(ruleset: Ruleset, options: InterceptorOptions) -> Self {
        Self {
            rules_path: None,
            ruleset: RwLock::new(Arc::new(ruleset)),
            options,
        }
    }

    /// Engine backed by a rules file; the load report is returned alongside
    pub fn from_file(path: impl Into<PathBuf>, options: InterceptorOptions) -> (Self, LoadReport) {
        let path = path.into();
        let report = load_rules(&path);
        let interceptor = Self {
            rules_path: Some(path),
            ruleset: RwLock::new(Arc::new(report.ruleset.clone())),
            options,
        };
        (interceptor, report)
    }

    pub fn rules_path(&self) -> Option<&Path> {
        self.rules_path.as_deref()
    }

    /// Current snapshot
    pub fn ruleset(&self) -> Arc<Ruleset> {
        self.ruleset
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Publish a new snapshot
    pub fn replace_ruleset(&self, ruleset: Ruleset) {
        let fresh = Arc::new(ruleset);
        *self.ruleset.write().unwrap_or_else(PoisonError::into_inner) = fresh;
    }

    /// Re-read the rules file and publish the result, even when it has
    /// errors. Returns `None` for engines without a file.
    pub fn reload(&self) -> Option<LoadReport> {
        let path = self.rules_path.as_ref()?;
        let report = load_rules(path);
        self.replace_ruleset(report.ruleset.clone());
        info!(
            path = %path.display(),
            matchers = report.ruleset.matchers.len(),
            "Rules reloaded"
        );
        Some(report)
    }

    pub fn decide(&self, notification: &Notification) -> Decision {
        decide(&self.ruleset(), notification)
    }

    /// Escalate or suppress `notification`
    ///
    /// `None` means suppressed. Otherwise the presentation ran to completion
    /// (or timed out) and the acknowledgement says how. May block for the
    /// dispatch timeout.
    pub async fn intercept(&self, notification: &Notification) -> Option<Acknowledgement> {
        let ruleset = self.ruleset();

        match decide(&ruleset, notification) {
            Decision::Suppress => {
                debug!(id = notification.id, summary = %notification.summary, "Notification suppressed");
                None
            }
            Decision::Escalate(reason) => {
                info!(
                    id = notification.id,
                    summary = %notification.summary,
                    reason = ?reason,
                    "Escalating notification"
                );
                Some(self.present(notification, &ruleset).await)
            }
        }
    }

    /// Show the aggregated rules diagnostic through the presentation path.
    /// Does nothing for a clean report.
    pub async fn report_diagnostics(&self, report: &LoadReport) -> Option<Acknowledgement> {
        let summary = report.summary()?;
        warn!(diagnostics = %summary, "Rules file has problems");

        let notification = Notification::new(ROUTER_APPLICATION, "Notification rules have errors")
            .with_body(summary)
            .with_urgency(Urgency::Critical);
        let ruleset = self.ruleset();
        Some(self.present(&notification, &ruleset).await)
    }

    /// Reload for every change event until the sender side closes
    pub async fn run_reloads(self: Arc<Self>, mut events: mpsc::Receiver<ConfigEvent>) {
        while let Some(event) = events.recv().await {
            let ConfigEvent::Changed(path) = event;
            info!(path = %path.display(), "Rules file changed");

            let Some(report) = self.reload() else {
                continue;
            };
            if !report.is_clean() {
                let engine = self.clone();
                tokio::spawn(async move {
                    engine.report_diagnostics(&report).await;
                });
            }
        }
        debug!("Rules reload loop finished");
    }

    async fn present(&self, notification: &Notification, ruleset: &Ruleset) -> Acknowledgement {
        self.disable_fullscreen();

        let timeout = self
            .options
            .timeout
            .unwrap_or_else(|| ruleset.config.dispatch_timeout());
        let command = self.options.presentation.render(notification);
        let consume_on_dismiss = ruleset.config.consume_on_dismiss();

        let nid = notification.id;
        let outcome = Dispatcher::new(timeout)
            .run(&command, |outcome| {
                info!(id = nid, code = outcome.code(), "Presentation closed");
            })
            .await;
        Acknowledgement::new(outcome, consume_on_dismiss)
    }

    /// Fire and forget; the child is reaped on a background task.
    fn disable_fullscreen(&self) {
        let Some(command) = &self.options.fullscreen_off else {
            return;
        };

        let spawned = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(mut child) => {
                tokio::spawn(async move {
                    let _ = child.wait().await;
                });
            }
            Err(e) => debug!(command = %command, error = %e, "Full-screen disable failed"),
        }
    }
}
