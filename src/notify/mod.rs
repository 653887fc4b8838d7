//! Notification and explanation streams.
//!
//! The feeder, the reasoners and the engine publish [`Event`]s to a
//! [`NotificationHub`]; every subscriber owns an [`EventStream`] backed by a
//! bounded channel. Publishing never blocks: a full subscriber loses the
//! event and the hub counts the drop.

/// Fan-out hub.
pub mod hub;
/// Subscriber stream handle.
pub mod stream;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::Explanation;

pub use hub::{NotificationHub, SubscriptionId};
pub use stream::EventStream;

/// Importance of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    Info,
    /// Something was ignored or refused.
    Warning,
    /// A statement or reasoner failed.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// A severity-tagged message from the feeder, a reasoner or the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Importance.
    pub severity: Severity,
    /// Emitter, e.g. `feeder` or a reasoner name.
    pub source: String,
    /// Free text.
    pub message: String,
    /// Emission time.
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Builds a notification stamped now.
    #[must_use]
    pub fn new(severity: Severity, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            source: source.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}][{}] {}", self.severity, self.source, self.message)
    }
}

/// Everything a subscriber can receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A notification.
    Notification(Notification),
    /// A derivation or retraction step.
    Explanation(Explanation),
    /// A statement that was applied, in its text form.
    Echo(String),
    /// The feed queue was drained and post reasoners ran.
    BatchEnd,
}

impl Event {
    /// The notification carried by this event, if any.
    #[must_use]
    pub const fn as_notification(&self) -> Option<&Notification> {
        match self {
            Self::Notification(n) => Some(n),
            _ => None,
        }
    }
}
