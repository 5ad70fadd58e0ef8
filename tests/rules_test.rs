//! Rules file parsing and evaluation through the public API

use notification_router::interceptor::decide;
use notification_router::{load_rules, parse_rules, Decision, EscalationReason, Notification, Urgency};
use std::time::Duration;

#[test]
fn test_one_bad_line_one_aggregated_error() {
    let report = parse_rules("[list]\nsummary:build (passed|failed\napplication:mail\n");

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.ruleset.matchers.len(), 1);

    let summary = report.summary().unwrap();
    assert!(summary.contains("summary:build (passed|failed"));
    assert!(summary.contains("line 2"));
}

#[test]
fn test_first_match_wins() {
    let report = parse_rules("[list]\n!body:spam\nbody:.*\n");
    assert!(report.is_clean());
    let ruleset = report.ruleset;

    let spam = Notification::new("mail", "offer").with_body("spam spam");
    let normal = Notification::new("mail", "hello").with_body("see you");

    assert_eq!(decide(&ruleset, &spam), Decision::Suppress);
    assert_eq!(
        decide(&ruleset, &normal),
        Decision::Escalate(EscalationReason::Whitelisted { rule: 1 })
    );
}

#[test]
fn test_no_match_suppresses() {
    let ruleset = parse_rules("[list]\napplication:pager\n").ruleset;
    assert_eq!(decide(&ruleset, &Notification::new("mail", "x")), Decision::Suppress);
}

#[test]
fn test_critical_override_is_gated() {
    let critical = Notification::new("mail", "x").with_urgency(Urgency::Critical);

    let off = parse_rules("[list]\n!application:mail\n").ruleset;
    assert_eq!(decide(&off, &critical), Decision::Suppress);

    let on = parse_rules("[config]\nalways_display_critical=yes\n[list]\n!application:mail\n").ruleset;
    assert_eq!(decide(&on, &critical), Decision::Escalate(EscalationReason::Critical));
}

#[test]
fn test_urgency_matcher() {
    let ruleset = parse_rules("[list]\nurgency:critical\n").ruleset;
    let low = Notification::new("mail", "x").with_urgency(Urgency::Low);
    let critical = Notification::new("mail", "x").with_urgency(Urgency::Critical);

    assert_eq!(decide(&ruleset, &low), Decision::Suppress);
    assert!(matches!(decide(&ruleset, &critical), Decision::Escalate(_)));
}

#[test]
fn test_config_options() {
    let report = parse_rules("[config]\nconsume_on_dismiss=1\ndispatch_timeout=5\n");
    assert!(report.is_clean());
    assert!(report.ruleset.config.consume_on_dismiss());
    assert_eq!(report.ruleset.config.dispatch_timeout(), Duration::from_secs(5));
}

#[test]
fn test_missing_file_fails_open() {
    let dir = tempfile::tempdir().unwrap();
    let report = load_rules(&dir.path().join("rules"));

    assert!(report.ruleset.matchers.is_empty());
    assert!(!report.is_clean());
    assert!(report.summary().unwrap().starts_with("cannot read"));
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules");
    std::fs::write(&path, "# escalate chat\n[list]\napplication:chat\n\n").unwrap();

    let report = load_rules(&path);
    assert!(report.is_clean());
    assert_eq!(report.ruleset.matchers.len(), 1);
}
