//! Channel components: the pluggable receivers and senders.
//!
//! ## Contents
//! - [`ChannelComponent`] the contract shared by both directions;
//! - [`Receive`] / [`Deliver`] with their [`Receiver`] / [`Sender`] adapters;
//! - [`Queue`], [`Inlet`], [`Outlet`] the supervisor-owned communication queue;
//! - [`Properties`] typed access to an entry's open key-value map;
//! - [`ComponentContext`] identity + logging span injected at construction.

mod component;
mod faults;
mod properties;
mod queue;

use std::fmt;

use serde::Serialize;

pub use component::{ChannelComponent, ComponentContext, Deliver, Receive, Receiver, Sender};
pub(crate) use faults::Faults;
pub use properties::Properties;
pub use queue::{Inlet, Outlet, Queue};

/// Direction of a component in the relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Produces notifications from an external source.
    Receiver,
    /// Consumes notifications towards an external destination.
    Sender,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Receiver => "receiver",
            Role::Sender => "sender",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
