//! Notification data model
//!
//! `Notification` is the unit every other module works on: the queue stores
//! it, the rule engine reads it and the dispatcher renders it into a command line.

pub mod urgency;

pub use urgency::{ParseUrgencyError, Urgency};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single desktop notification
///
/// `id == 0` means the id is unset. The queue assigns the final id on `put`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub body: String,
    /// Name of the sending application
    #[serde(default)]
    pub application: String,
    /// Icon name or path, empty when the sender gave none
    #[serde(default)]
    pub app_icon: String,
    #[serde(default)]
    pub urgency: Urgency,
    /// Absolute expiry time, persisted as epoch seconds
    #[serde(default, with = "epoch_seconds")]
    pub deadline: Option<DateTime<Utc>>,
}

impl Notification {
    /// Create a NORMAL notification with no body, icon or deadline
    pub fn new(application: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: 0,
            summary: summary.into(),
            body: String::new(),
            application: application.into(),
            app_icon: String::new(),
            urgency: Urgency::Normal,
            deadline: None,
        }
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.app_icon = icon.into();
        self
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn icon(&self) -> Option<&str> {
        if self.app_icon.is_empty() {
            None
        } else {
            Some(&self.app_icon)
        }
    }

    /// True when the deadline lies strictly before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| deadline < now)
    }
}

/// Why a notification left the queue
///
/// Codes follow the desktop notification `NotificationClosed` reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    Expired,
    Dismissed,
    Closed,
    Undefined,
}

impl CloseReason {
    pub fn code(&self) -> u32 {
        match self {
            CloseReason::Expired => 1,
            CloseReason::Dismissed => 2,
            CloseReason::Closed => 3,
            CloseReason::Undefined => 4,
        }
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CloseReason::Expired => "expired",
            CloseReason::Dismissed => "dismissed",
            CloseReason::Closed => "closed",
            CloseReason::Undefined => "undefined",
        };
        f.write_str(name)
    }
}

/// Deadlines travel as (possibly fractional) epoch seconds, `null` when absent.
mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_f64(ts.timestamp_millis() as f64 / 1000.0),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let Some(secs) = Option::<f64>::deserialize(deserializer)? else {
            return Ok(None);
        };
        if !secs.is_finite() {
            return Err(D::Error::custom("deadline is not a finite number"));
        }
        DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("deadline out of range: {secs}")))
    }
}
