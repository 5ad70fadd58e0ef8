//! Urgency levels for notifications
//!
//! The router only distinguishes three levels, mirroring the desktop
//! notification hint of the same name:
//! - LOW: background chatter
//! - NORMAL: regular notifications, and anything the user has already seen
//! - CRITICAL: may bypass the matcher list when `always_display_critical` is on

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Urgency level for notifications
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    Critical,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "LOW",
            Urgency::Normal => "NORMAL",
            Urgency::Critical => "CRITICAL",
        }
    }
}

/// Error returned when a string does not name an urgency level
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown urgency '{0}', expected LOW, NORMAL or CRITICAL")]
pub struct ParseUrgencyError(pub String);

impl FromStr for Urgency {
    type Err = ParseUrgencyError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        [Urgency::Low, Urgency::Normal, Urgency::Critical]
            .into_iter()
            .find(|u| u.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseUrgencyError(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_display() {
        assert_eq!(format!("{}", Urgency::Low), "LOW");
        assert_eq!(format!("{}", Urgency::Normal), "NORMAL");
        assert_eq!(format!("{}", Urgency::Critical), "CRITICAL");
    }

    #[test]
    fn test_urgency_parse_is_case_insensitive() {
        assert_eq!("critical".parse::<Urgency>(), Ok(Urgency::Critical));
        assert_eq!("Normal".parse::<Urgency>(), Ok(Urgency::Normal));
        assert_eq!(" LOW ".parse::<Urgency>(), Ok(Urgency::Low));
    }

    #[test]
    fn test_urgency_parse_rejects_unknown() {
        let err = "HIGH".parse::<Urgency>().unwrap_err();
        assert_eq!(err, ParseUrgencyError("HIGH".to_string()));
    }

    #[test]
    fn test_urgency_serde_uses_uppercase_names() {
        assert_eq!(serde_json::to_string(&Urgency::Critical).unwrap(), "\"CRITICAL\"");
        let parsed: Urgency = serde_json::from_str("\"LOW\"").unwrap();
        assert_eq!(parsed, Urgency::Low);
    }

    #[test]
    fn test_default_is_normal() {
        assert_eq!(Urgency::default(), Urgency::Normal);
    }
}
