//! Rules file parser
//!
//! ```text
//! # comment
//! [config]
//! always_display_critical=yes
//! [list]
//! summary:^Build failed
//! !application:Spotify
//! ```
//!
//! Parsing never fails as a whole. Bad lines are collected as `RuleError`s
//! and the rest of the file still loads.

use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::error::{RuleError, RuleErrorKind};
use super::{
    parse_bool, FieldSelector, Matcher, Predicate, RuleConfig, Ruleset, ALWAYS_DISPLAY_CRITICAL,
    CONSUME_ON_DISMISS, DISPATCH_TIMEOUT,
};
use crate::notification::Urgency;

/// Result of reading a rules file
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub ruleset: Ruleset,
    pub errors: Vec<RuleError>,
    /// Set when the file could not be read at all
    pub unreadable: Option<(PathBuf, String)>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.unreadable.is_none()
    }

    /// All problems as one message, one line each
    pub fn summary(&self) -> Option<String> {
        if self.is_clean() {
            return None;
        }
        let mut lines = Vec::with_capacity(self.errors.len() + 1);
        if let Some((path, reason)) = &self.unreadable {
            lines.push(format!("cannot read {}: {}", path.display(), reason));
        }
        lines.extend(self.errors.iter().map(|e| e.to_string()));
        Some(lines.join("\n"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Config,
    List,
    Whitelist,
    Blacklist,
    Unknown,
}

impl Section {
    fn from_header(header: &str) -> Self {
        match header {
            "[config]" => Section::Config,
            "[list]" => Section::List,
            "[whitelist]" => Section::Whitelist,
            "[blacklist]" => Section::Blacklist,
            _ => Section::Unknown,
        }
    }
}

/// Read and parse a rules file. A missing file yields an empty ruleset.
pub fn load_rules(path: &Path) -> LoadReport {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let report = parse_rules(&text);
            info!(
                path = %path.display(),
                matchers = report.ruleset.matchers.len(),
                errors = report.errors.len(),
                "Loaded rules"
            );
            report
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unable to read rules file");
            LoadReport {
                unreadable: Some((path.to_path_buf(), e.to_string())),
                ..LoadReport::default()
            }
        }
    }
}

pub fn parse_rules(text: &str) -> LoadReport {
    let mut report = LoadReport::default();
    let mut section = Section::None;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim_end();
        let trimmed = line.trim_start();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fail = |kind| RuleError {
            line: line_no,
            content: line.to_string(),
            kind,
        };

        if trimmed.starts_with('[') {
            section = Section::from_header(trimmed);
            if section == Section::Unknown {
                report.errors.push(fail(RuleErrorKind::UnknownSection));
            }
            continue;
        }

        let outcome = match section {
            Section::None => Err(RuleErrorKind::NoSection),
            // Reported once at the header
            Section::Unknown => Ok(()),
            Section::Config => parse_option(trimmed, &mut report.ruleset.config),
            Section::List | Section::Whitelist => parse_matcher(trimmed, line_no, true)
                .map(|m| report.ruleset.matchers.push(m)),
            Section::Blacklist => parse_matcher(trimmed, line_no, false)
                .map(|m| report.ruleset.matchers.push(Matcher { whitelist: false, ..m })),
        };

        if let Err(kind) = outcome {
            report.errors.push(fail(kind));
        }
    }

    for matcher in &report.ruleset.matchers {
        debug!(line = matcher.line, rule = %matcher, "Loaded matcher");
    }
    report
}

fn parse_option(line: &str, config: &mut RuleConfig) -> Result<(), RuleErrorKind> {
    let (key, value) = line.split_once('=').ok_or(RuleErrorKind::MalformedOption)?;
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() {
        return Err(RuleErrorKind::MalformedOption);
    }

    // The value is stored even when invalid; readers fall back to defaults.
    config.insert(key, value);
    debug!(key = %key, value = %value, "Config entry");

    let valid = match key {
        ALWAYS_DISPLAY_CRITICAL | CONSUME_ON_DISMISS => parse_bool(value).is_some(),
        DISPATCH_TIMEOUT => value.parse::<u64>().is_ok(),
        _ => true,
    };
    if valid {
        Ok(())
    } else {
        Err(RuleErrorKind::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

fn parse_matcher(line: &str, line_no: usize, whitelist: bool) -> Result<Matcher, RuleErrorKind> {
    let (whitelist, rule) = match line.strip_prefix('!') {
        Some(rest) => (false, rest),
        None => (whitelist, line),
    };

    let (field, pattern) = rule.split_once(':').ok_or(RuleErrorKind::MalformedMatcher)?;
    let field: FieldSelector = field
        .trim()
        .parse()
        .map_err(|()| RuleErrorKind::UnknownField(field.trim().to_string()))?;

    let predicate = match field {
        FieldSelector::Urgency => {
            let level: Urgency = pattern
                .parse()
                .map_err(|_| RuleErrorKind::InvalidUrgency(pattern.trim().to_string()))?;
            Predicate::Urgency(level)
        }
        _ => Predicate::Pattern(compile_anchored(pattern)?),
    };

    Ok(Matcher {
        field,
        predicate,
        whitelist,
        source: pattern.to_string(),
        line: line_no,
    })
}

/// Validate the pattern on its own, then anchor it at the start of the field.
fn compile_anchored(pattern: &str) -> Result<Regex, RuleErrorKind> {
    let describe = |e: regex::Error| {
        let text = e.to_string();
        let last = text.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or(text.as_str());
        RuleErrorKind::InvalidRegex(last.trim().trim_start_matches("error: ").to_string())
    };
    Regex::new(pattern).map_err(describe)?;
    Regex::new(&format!("^(?:{pattern})")).map_err(describe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Notification;

    #[test]
    fn test_sections_options_and_matchers() {
        let report = parse_rules(
            "# router rules\n\
             [config]\n\
             always_display_critical=yes\n\
             consume_on_dismiss = no\n\
             theme=dark\n\
             \n\
             [list]\n\
             summary:^Build\n\
             !application:Spotify\n\
             urgency:critical\n",
        );

        assert!(report.is_clean(), "{:?}", report.errors);
        let ruleset = &report.ruleset;
        assert!(ruleset.config.always_display_critical());
        assert!(!ruleset.config.consume_on_dismiss());
        assert_eq!(ruleset.config.get("theme"), Some("dark"));

        assert_eq!(ruleset.matchers.len(), 3);
        assert!(ruleset.matchers[0].whitelist);
        assert!(!ruleset.matchers[1].whitelist);
        assert_eq!(ruleset.matchers[1].field, FieldSelector::Application);
        assert_eq!(ruleset.matchers[2].line, 10);
    }

    #[test]
    fn test_legacy_whitelist_and_blacklist_sections() {
        let report = parse_rules("[whitelist]\nsummary:a\n!body:b\n[blacklist]\napplication:c\n");
        assert!(report.is_clean());
        let flags: Vec<bool> = report.ruleset.matchers.iter().map(|m| m.whitelist).collect();
        assert_eq!(flags, vec![true, false, false]);
    }

    #[test]
    fn test_invalid_regex_is_line_error() {
        let report = parse_rules("[list]\nsummary:(unclosed\nbody:ok\n");
        assert_eq!(report.ruleset.matchers.len(), 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].line, 2);
        assert!(matches!(report.errors[0].kind, RuleErrorKind::InvalidRegex(_)));
    }

    #[test]
    fn test_pattern_cannot_escape_anchor() {
        // Unbalanced on its own, balanced once wrapped; must still be rejected.
        let report = parse_rules("[list]\nsummary:a)|(?:b\n");
        assert!(report.ruleset.matchers.is_empty());
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_unknown_field_and_missing_colon() {
        let report = parse_rules("[list]\ntitle:foo\nsummary\n");
        let kinds: Vec<&RuleErrorKind> = report.errors.iter().map(|e| &e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &RuleErrorKind::UnknownField("title".to_string()),
                &RuleErrorKind::MalformedMatcher
            ]
        );
    }

    #[test]
    fn test_urgency_matcher_requires_known_level() {
        let report = parse_rules("[list]\nurgency:HIGH\nurgency:Low\n");
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, RuleErrorKind::InvalidUrgency("HIGH".to_string()));
        let low = Notification::new("a", "s").with_urgency(Urgency::Low);
        assert!(report.ruleset.matchers[0].matches(&low));
    }

    #[test]
    fn test_unknown_section_reported_once_and_skipped() {
        let report = parse_rules("[colors]\nred=1\nblue\n[list]\nall:.*\n");
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, RuleErrorKind::UnknownSection);
        assert_eq!(report.ruleset.matchers.len(), 1);
    }

    #[test]
    fn test_entry_before_any_section() {
        let report = parse_rules("summary:foo\n");
        assert_eq!(report.errors[0].kind, RuleErrorKind::NoSection);
    }

    #[test]
    fn test_invalid_boolean_is_reported_and_reads_false() {
        let report = parse_rules("[config]\nconsume_on_dismiss=True\n");
        assert_eq!(report.errors.len(), 1);
        assert!(!report.ruleset.config.consume_on_dismiss());
    }

    #[test]
    fn test_summary_of_clean_report_is_none() {
        assert!(parse_rules("[list]\nall:.*\n").summary().is_none());
    }

    #[test]
    fn test_missing_file_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        let report = load_rules(&dir.path().join("absent"));
        assert!(report.ruleset.matchers.is_empty());
        assert!(report.unreadable.is_some());
        assert!(report.summary().unwrap().starts_with("cannot read"));
    }
}
