//! `run` command - start the router daemon

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::RouterConfig;
use crate::dispatcher::PresentationCommand;

/// Run command arguments
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Queue file (default: ~/.cache/notification-router/queue.json)
    #[arg(long)]
    pub queue: Option<PathBuf>,

    /// Rules file (default: ~/.config/notification-router/rules)
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Seconds between expiry sweeps
    #[arg(long, default_value = "10")]
    pub cleanup_interval: u64,

    /// Seconds between rules file polls
    #[arg(long, default_value = "2")]
    pub watch_interval: u64,

    /// Presentation timeout in seconds, overriding the rules file (0 = forever)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Presentation program (default: i3-nagbar)
    #[arg(long)]
    pub present_cmd: Option<String>,

    /// Presentation argument, repeatable; supports {summary} {body}
    /// {application} {icon} {urgency} {id}
    #[arg(long = "present-arg", allow_hyphen_values = true)]
    pub present_args: Vec<String>,

    /// Do not leave full-screen mode before presenting
    #[arg(long)]
    pub no_fullscreen_off: bool,
}

impl RunArgs {
    pub fn into_config(self) -> RouterConfig {
        let mut config = RouterConfig::default();

        if let Some(queue) = self.queue {
            config.lock_file = RouterConfig::lock_file_for(&queue);
            config.queue_file = queue;
        }
        if let Some(rules) = self.rules {
            config.rules_file = rules;
        }
        config.cleanup_interval = Duration::from_secs(self.cleanup_interval.max(1));
        config.watch_interval = Duration::from_secs(self.watch_interval.max(1));
        config.dispatch_timeout = self.timeout.map(Duration::from_secs);

        if let Some(program) = self.present_cmd {
            config.presentation = PresentationCommand::new(program, self.present_args);
        } else if !self.present_args.is_empty() {
            config.presentation.args = self.present_args;
        }
        if self.no_fullscreen_off {
            config.fullscreen_off = None;
        }

        config.resolve_programs()
    }
}

pub async fn handle_run(args: RunArgs) -> Result<()> {
    crate::router::run(args.into_config()).await
}
