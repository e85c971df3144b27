//! # Relay configuration.
//!
//! Provides [`Config`], parsed once at startup from a YAML file and immutable
//! afterwards:
//!
//! ```yaml
//! receivers:
//!   - id: inbox
//!     kind: HTTP
//!     properties:
//!       listenAddress: 127.0.0.1:8080
//! senders:
//!   - id: log
//!     kind: dummy
//! runtime:            # optional, see RuntimeConfig
//!   queueCapacity: 1
//!   drainGraceMs: 5000
//!   backoff: { firstMs: 1000, maxMs: 1000, factor: 1.0, jitter: none }
//! ```
//!
//! ## Validation
//! [`Config::validate`] runs before any component is constructed and rejects:
//! - an absent `receivers`/`senders` section;
//! - an empty section;
//! - an entry with an empty `id` or `kind`.

use std::{path::Path, time::Duration};

use serde::Deserialize;

use crate::{
    channel::{Properties, Role},
    error::ConfigError,
    policies::BackoffPolicy,
};

/// One receiver or sender entry.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ComponentConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub properties: Properties,
}

impl ComponentConfig {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            properties: Properties::default(),
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Checks that `id` and `kind` are non-empty.
    pub fn validate(&self, role: Role, index: usize) -> Result<(), ConfigError> {
        if self.id.is_empty() {
            return Err(ConfigError::MissingField {
                role,
                index,
                field: "id",
            });
        }
        if self.kind.is_empty() {
            return Err(ConfigError::MissingField {
                role,
                index,
                field: "kind",
            });
        }
        Ok(())
    }
}

/// Tunables of the supervision and routing core.
///
/// ## Field semantics
/// - `queue_capacity`: buffer of every supervisor queue and of the shared router
///   input (min 1). Small values keep backpressure close to the source.
/// - `drain_grace`: how long shutdown waits for in-flight notifications to reach
///   the sender queues before the senders are stopped.
/// - `backoff`: restart delay after an abnormal stop (default fixed 1s).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeConfig {
    pub queue_capacity: usize,
    #[serde(rename = "drainGraceMs", with = "millis")]
    pub drain_grace: Duration,
    pub backoff: BackoffPolicy,
}

impl RuntimeConfig {
    /// Queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }
}

impl Default for RuntimeConfig {
    /// - `queue_capacity = 1` (hand-off, close to a rendezvous)
    /// - `drain_grace = 5s`
    /// - `backoff = BackoffPolicy::default()` (fixed 1s)
    fn default() -> Self {
        Self {
            queue_capacity: 1,
            drain_grace: Duration::from_secs(5),
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Whole configuration file.
///
/// Sections are `Option` so that "absent" and "empty" produce distinct errors.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    pub receivers: Option<Vec<ComponentConfig>>,
    pub senders: Option<Vec<ComponentConfig>>,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl Config {
    pub fn new(receivers: Vec<ComponentConfig>, senders: Vec<ComponentConfig>) -> Self {
        Self {
            receivers: Some(receivers),
            senders: Some(senders),
            runtime: RuntimeConfig::default(),
        }
    }

    pub fn with_runtime(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = runtime;
        self
    }

    /// Reads, parses and validates a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    /// Parses and validates YAML text.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_section(self.receivers.as_deref(), "receivers", Role::Receiver)?;
        validate_section(self.senders.as_deref(), "senders", Role::Sender)?;
        Ok(())
    }

    pub fn receivers(&self) -> &[ComponentConfig] {
        self.receivers.as_deref().unwrap_or_default()
    }

    pub fn senders(&self) -> &[ComponentConfig] {
        self.senders.as_deref().unwrap_or_default()
    }
}

fn validate_section(
    entries: Option<&[ComponentConfig]>,
    section: &'static str,
    role: Role,
) -> Result<(), ConfigError> {
    let entries = entries.ok_or(ConfigError::Undefined { section })?;
    if entries.is_empty() {
        return Err(ConfigError::Empty { section, role });
    }
    entries
        .iter()
        .enumerate()
        .try_for_each(|(index, entry)| entry.validate(role, index))
}

/// Serde helper: `Duration` as an integer number of milliseconds.
pub(crate) mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
