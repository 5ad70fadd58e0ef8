//! Output formatting for CLI commands

use crate::notification::Notification;

/// One-line listing: id, urgency, application and summary
pub fn format_notification(notification: &Notification) -> String {
    let deadline = notification
        .deadline
        .map(|d| format!("  (until {})", d.format("%Y-%m-%d %H:%M:%S")))
        .unwrap_or_default();
    format!(
        "{:>5}  {:<8}  {}: {}{}",
        notification.id,
        notification.urgency.as_str(),
        notification.application,
        notification.summary,
        deadline
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_format_notification() {
        let n = Notification::new("mail", "hello").with_id(3);
        assert_eq!(format_notification(&n), "    3  NORMAL    mail: hello");
    }

    #[test]
    fn test_format_notification_with_deadline() {
        let n = Notification::new("notify-send", "tea")
            .with_id(12)
            .with_deadline(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap());
        assert!(format_notification(&n).ends_with("(until 2026-01-02 03:04:05)"));
    }
}
