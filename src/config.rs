//! Runtime configuration for the router daemon
//!
//! Everything the library needs is passed in explicitly through
//! `RouterConfig`. Only `RouterConfig::default` looks at the user's
//! directories.

use std::path::PathBuf;
use std::time::Duration;

use crate::dispatcher::{CommandLine, PresentationCommand};
use crate::interceptor::InterceptorOptions;
use crate::queue::QueuePolicy;

pub const APP_DIR: &str = "notification-router";

#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Persisted queue (JSON array)
    pub queue_file: PathBuf,
    /// Hot-reloaded rules file
    pub rules_file: PathBuf,
    /// Held exclusively while a daemon owns `queue_file`
    pub lock_file: PathBuf,
    /// Period of the expiry sweep + save
    pub cleanup_interval: Duration,
    /// Period of the rules file poll
    pub watch_interval: Duration,
    /// Overrides the rules file's `dispatch_timeout`
    pub dispatch_timeout: Option<Duration>,
    pub presentation: PresentationCommand,
    pub fullscreen_off: Option<CommandLine>,
    pub policy: QueuePolicy,
}

impl RouterConfig {
    /// `~/.cache/notification-router`, falling back to the working directory
    pub fn default_data_dir() -> PathBuf {
        dirs::cache_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    /// `~/.config/notification-router`, falling back to the working directory
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    /// Lock file path derived from the queue file
    pub fn lock_file_for(queue_file: &std::path::Path) -> PathBuf {
        let mut name = queue_file
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "queue".into());
        name.push(".lock");
        queue_file.with_file_name(name)
    }

    pub fn interceptor_options(&self) -> InterceptorOptions {
        InterceptorOptions {
            presentation: self.presentation.clone(),
            fullscreen_off: self.fullscreen_off.clone(),
            timeout: self.dispatch_timeout,
        }
    }

    /// Replace bare program names with absolute paths where `which` finds them
    pub fn resolve_programs(mut self) -> Self {
        self.presentation.program = resolve_program(&self.presentation.program);
        if let Some(cmd) = self.fullscreen_off.as_mut() {
            cmd.program = resolve_program(&cmd.program);
        }
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        let queue_file = Self::default_data_dir().join("queue.json");
        Self {
            lock_file: Self::lock_file_for(&queue_file),
            queue_file,
            rules_file: Self::default_config_dir().join("rules"),
            cleanup_interval: Duration::from_secs(10),
            watch_interval: Duration::from_secs(2),
            dispatch_timeout: None,
            presentation: PresentationCommand::default(),
            fullscreen_off: Some(CommandLine::new("i3-msg", ["fullscreen", "disable"])),
            policy: QueuePolicy::default(),
        }
    }
}

/// Absolute path of `program` if it is on PATH, otherwise the name unchanged
pub fn resolve_program(program: &str) -> String {
    match which::which(program) {
        Ok(path) => path.to_string_lossy().to_string(),
        Err(_) => program.to_string(),
    }
}
