//! `check-rules` command - parse a rules file and report problems

use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;

use crate::config::RouterConfig;
use crate::rules::load_rules;

#[derive(Args, Debug)]
pub struct CheckRulesArgs {
    /// Rules file (default: ~/.config/notification-router/rules)
    pub path: Option<PathBuf>,
}

pub fn handle_check_rules(args: CheckRulesArgs) -> Result<()> {
    let path = args
        .path
        .unwrap_or_else(|| RouterConfig::default().rules_file);
    let report = load_rules(&path);

    println!("[config]");
    for (key, value) in report.ruleset.config.entries() {
        println!("{}={}", key, value);
    }
    println!("[list]");
    for matcher in &report.ruleset.matchers {
        println!("{}", matcher);
    }

    if let Some(summary) = report.summary() {
        eprintln!("{}", summary);
        bail!("{} has problems", path.display());
    }
    Ok(())
}
