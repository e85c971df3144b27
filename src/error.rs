//! Error types used by the notifier runtime and its channel components.
//!
//! Two failure classes never mix:
//!
//! - build-time: [`ConfigError`], [`PropertyError`], [`BuildError`] abort startup
//!   before any component runs;
//! - run-time: [`ChannelError`] ends one attempt of a component and triggers a
//!   restart, [`RuntimeError`] reports problems of the shutdown sequence itself.
//!
//! Every enum provides `as_label` (a stable snake_case label for logs).

use std::{path::PathBuf, time::Duration};

use thiserror::Error;

use crate::channel::Role;

/// # Errors produced by one attempt of a channel component.
///
/// All variants are treated alike by the supervisor: logged, then restarted
/// after the backoff delay unless a shutdown is in progress.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The component gave up on this attempt.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Socket or file failure inside the component.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// The attempt panicked; the panic was contained by the attempt runner.
    #[error("component panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The communication queue was closed under the component.
    #[error("communication queue closed")]
    Closed,
}

impl ChannelError {
    /// Shorthand for [`ChannelError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        ChannelError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use notifier::ChannelError;
    ///
    /// assert_eq!(ChannelError::fail("boom").as_label(), "channel_failed");
    /// assert_eq!(ChannelError::Closed.as_label(), "channel_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ChannelError::Fail { .. } => "channel_failed",
            ChannelError::Io(_) => "channel_io",
            ChannelError::Panicked { .. } => "channel_panicked",
            ChannelError::Closed => "channel_closed",
        }
    }
}

/// # Errors raised by a kind-specific builder while validating `properties`.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    #[error("{key} is required")]
    Missing { key: String },

    #[error("{key} should be {expected}")]
    Mistyped { key: String, expected: &'static str },

    #[error("{key} is invalid: {reason}")]
    Invalid { key: String, reason: String },
}

impl PropertyError {
    pub fn as_label(&self) -> &'static str {
        match self {
            PropertyError::Missing { .. } => "property_missing",
            PropertyError::Mistyped { .. } => "property_mistyped",
            PropertyError::Invalid { .. } => "property_invalid",
        }
    }
}

/// # Errors produced while loading or validating the configuration file.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A required section is absent.
    #[error("{section} is not defined")]
    Undefined { section: &'static str },

    /// A required section is present but empty.
    #[error("at least one {role} is required")]
    Empty { section: &'static str, role: Role },

    /// An entry is missing `id` or `kind`.
    #[error("{role} #{index}: {field} is required")]
    MissingField {
        role: Role,
        index: usize,
        field: &'static str,
    },
}

impl ConfigError {
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "config_read",
            ConfigError::Parse(_) => "config_parse",
            ConfigError::Undefined { .. } => "config_undefined",
            ConfigError::Empty { .. } => "config_empty",
            ConfigError::MissingField { .. } => "config_missing_field",
        }
    }
}

/// # Errors produced while turning configuration entries into supervisors.
///
/// Any of them aborts the whole build: no partial fleet is returned.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BuildError {
    /// No builder is registered for the kind.
    #[error("{role} kind: {kind} for {id} is not found")]
    UnknownKind { role: Role, id: String, kind: String },

    /// The kind's builder rejected the entry's properties.
    #[error("failed to build {role} id: {id}, kind: {kind}: {source}")]
    Component {
        role: Role,
        id: String,
        kind: String,
        #[source]
        source: PropertyError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BuildError {
    pub fn as_label(&self) -> &'static str {
        match self {
            BuildError::UnknownKind { .. } => "build_unknown_kind",
            BuildError::Component { .. } => "build_component",
            BuildError::Config(_) => "build_config",
        }
    }
}

/// # Errors produced by the orchestrator itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// In-flight notifications were not drained before the senders stopped.
    #[error("router drain exceeded {grace:?}; in-flight notifications may be lost")]
    DrainExceeded { grace: Duration },

    /// Installing the process signal handlers failed.
    #[error("failed to install shutdown signal handlers: {0}")]
    Signal(#[source] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use notifier::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::DrainExceeded { grace: Duration::from_secs(5) };
    /// assert_eq!(err.as_label(), "runtime_drain_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::DrainExceeded { .. } => "runtime_drain_exceeded",
            RuntimeError::Signal(_) => "runtime_signal",
        }
    }
}
