//! Subscriber types for HNTLDR.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::HntldrError;

/// Subscription state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriberStatus {
    Active,
    Inactive,
}

impl SubscriberStatus {
    /// Value stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriberStatus::Active => "active",
            SubscriberStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for SubscriberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriberStatus {
    type Err = HntldrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriberStatus::Active),
            "inactive" => Ok(SubscriberStatus::Inactive),
            other => Err(HntldrError::Validation(format!(
                "unknown subscriber status: {other}"
            ))),
        }
    }
}

/// A newsletter subscriber. Rows are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    /// UUID, used in unsubscribe links.
    pub id: String,
    pub email: String,
    pub status: SubscriberStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscriber {
    /// Check if the subscriber receives the newsletter.
    pub fn is_active(&self) -> bool {
        self.status == SubscriberStatus::Active
    }
}

/// What a subscribe request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// First time this address subscribed.
    Created,
    /// A previously unsubscribed address came back.
    Reactivated,
    /// The address was already subscribed; nothing changed.
    AlreadyActive,
}

impl SubscribeOutcome {
    /// Message shown to the user.
    pub fn message(&self) -> &'static str {
        match self {
            SubscribeOutcome::Created => "Successfully subscribed",
            SubscribeOutcome::Reactivated => "Your subscription has been reactivated",
            SubscribeOutcome::AlreadyActive => "You are already subscribed",
        }
    }
}

/// Normalize an email for storage: trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
