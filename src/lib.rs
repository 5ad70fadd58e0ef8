//! Notification Router - queues desktop notifications and escalates the ones
//! that match user rules to an on-screen presentation command

pub mod cli;
pub mod config;
pub mod daemon;
pub mod dispatcher;
pub mod interceptor;
pub mod notification;
pub mod queue;
pub mod router;
pub mod rules;
pub mod watcher;

pub use config::RouterConfig;
pub use daemon::InstanceLock;
pub use dispatcher::{CommandLine, DispatchOutcome, Dispatcher, PresentationCommand};
pub use interceptor::{Acknowledgement, Decision, EscalationReason, Interceptor, InterceptorOptions};
pub use notification::{CloseReason, Notification, Urgency};
pub use queue::{ClosedNotification, NotificationQueue, QueuePolicy, Ticket};
pub use router::Router;
pub use rules::{load_rules, parse_rules, LoadReport, Matcher, RuleError, Ruleset};
pub use watcher::{ConfigEvent, ConfigWatcher};
