//! Built-in receiver kinds.
//!
//! | kind    | properties                                    |
//! |---------|-----------------------------------------------|
//! | `dummy` | `intervalMs`, `failAfterMs`, `shutdownDelayMs` |
//! | `HTTP`  | `listenAddress` (required)                    |

pub mod dummy;
pub mod http;

pub use dummy::DummyReceiver;
pub use http::HttpReceiver;

use crate::core::RegistryBuilder;

/// Registers every built-in receiver kind.
pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .receiver(dummy::KIND, dummy::build)
        .receiver(http::KIND, http::build)
}
