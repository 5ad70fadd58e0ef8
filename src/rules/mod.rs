//! Rule set - options and ordered matchers read from the rules file
//!
//! A `Ruleset` is an immutable snapshot. Reloading builds a new one; nothing
//! mutates a ruleset after parsing.

pub mod error;
pub mod parser;

pub use error::{RuleError, RuleErrorKind};
pub use parser::{load_rules, parse_rules, LoadReport};

use regex::Regex;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::notification::{Notification, Urgency};

pub const ALWAYS_DISPLAY_CRITICAL: &str = "always_display_critical";
pub const CONSUME_ON_DISMISS: &str = "consume_on_dismiss";
pub const DISPATCH_TIMEOUT: &str = "dispatch_timeout";

/// Seconds to wait for the presentation process when the rules file
/// does not say otherwise
pub const DEFAULT_DISPATCH_TIMEOUT_SECS: u64 = 30;

/// Which notification field(s) a matcher looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSelector {
    /// summary, body or application
    All,
    Summary,
    Body,
    Application,
    Urgency,
}

impl FieldSelector {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldSelector::All => "all",
            FieldSelector::Summary => "summary",
            FieldSelector::Body => "body",
            FieldSelector::Application => "application",
            FieldSelector::Urgency => "urgency",
        }
    }
}

impl FromStr for FieldSelector {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(FieldSelector::All),
            "summary" => Ok(FieldSelector::Summary),
            "body" => Ok(FieldSelector::Body),
            "application" => Ok(FieldSelector::Application),
            "urgency" => Ok(FieldSelector::Urgency),
            _ => Err(()),
        }
    }
}

/// What a matcher tests the selected field against
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Regular expression anchored at the start of the field
    Pattern(Regex),
    /// Exact urgency level
    Urgency(Urgency),
}

/// One line of the `[list]` section
#[derive(Debug, Clone)]
pub struct Matcher {
    pub field: FieldSelector,
    pub predicate: Predicate,
    /// Whitelist rules escalate, blacklist rules suppress
    pub whitelist: bool,
    /// Pattern text as written in the file
    pub source: String,
    /// 1-based line number in the rules file
    pub line: usize,
}

impl Matcher {
    pub fn matches(&self, notification: &Notification) -> bool {
        match &self.predicate {
            Predicate::Urgency(level) => notification.urgency == *level,
            Predicate::Pattern(re) => match self.field {
                FieldSelector::All => {
                    re.is_match(&notification.summary)
                        || re.is_match(&notification.body)
                        || re.is_match(&notification.application)
                }
                FieldSelector::Summary => re.is_match(&notification.summary),
                FieldSelector::Body => re.is_match(&notification.body),
                FieldSelector::Application => re.is_match(&notification.application),
                FieldSelector::Urgency => re.is_match(notification.urgency.as_str()),
            },
        }
    }
}

impl std::fmt::Display for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bang = if self.whitelist { "" } else { "!" };
        write!(f, "{}{}:{}", bang, self.field.as_str(), self.source)
    }
}

/// Interpret a boolean option value
///
/// Case-sensitive: `True` is not recognized.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "1" | "t" | "y" | "yes" => Some(true),
        "false" | "0" | "f" | "n" | "no" => Some(false),
        _ => None,
    }
}

/// `[config]` section key/value pairs
///
/// Unknown keys are kept so they can be listed, but nothing reads them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleConfig {
    values: HashMap<String, String>,
}

impl RuleConfig {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Unset or unrecognized values read as `false`
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).and_then(parse_bool).unwrap_or(false)
    }

    pub fn always_display_critical(&self) -> bool {
        self.get_bool(ALWAYS_DISPLAY_CRITICAL)
    }

    pub fn consume_on_dismiss(&self) -> bool {
        self.get_bool(CONSUME_ON_DISMISS)
    }

    /// `Duration::ZERO` means wait for the presentation process forever
    pub fn dispatch_timeout(&self) -> Duration {
        let secs = self
            .get(DISPATCH_TIMEOUT)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_DISPATCH_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// Entries sorted by key
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .values
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        entries.sort();
        entries
    }
}

/// Immutable options + matcher list produced by one parse
#[derive(Debug, Clone, Default)]
pub struct Ruleset {
    pub config: RuleConfig,
    pub matchers: Vec<Matcher>,
}

impl Ruleset {
    /// First matcher, in file order, that fires for `notification`
    pub fn first_match(&self, notification: &Notification) -> Option<(usize, &Matcher)> {
        self.matchers
            .iter()
            .enumerate()
            .find(|(_, m)| m.matches(notification))
    }
}
