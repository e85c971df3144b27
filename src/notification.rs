//! # Notification value routed from receivers to senders.
//!
//! A [`Notification`] is immutable once built. The runtime moves it around as
//! `Arc<Notification>` so every delivery task reads the same allocation.
//!
//! ## Wire format
//! ```text
//! {"title": "disk", "severity": "WARN", "message": "90% used"}
//! ```
//! - `severity` is upper-case on output and case-insensitive on input;
//! - missing fields default to `""` / `INFO`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de};

/// How urgent a notification is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

const SEVERITIES: [Severity; 4] = [
    Severity::Debug,
    Severity::Info,
    Severity::Warn,
    Severity::Error,
];

impl Severity {
    /// Lower-case label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        SEVERITIES
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(&raw))
            .ok_or_else(|| de::Error::unknown_variant(&raw, &["DEBUG", "INFO", "WARN", "ERROR"]))
    }
}

/// A single notification.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    title: String,
    #[serde(default)]
    severity: Severity,
    #[serde(default)]
    message: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            severity,
            message: message.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.title, self.message)
    }
}
