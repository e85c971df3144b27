//! Built-in sender kinds.
//!
//! | kind      | properties                                                      |
//! |-----------|-----------------------------------------------------------------|
//! | `dummy`   | `failAfterMs`, `shutdownDelayMs`                                |
//! | `webPush` | `listenAddress`, `repositoryType`, `path`, `defaultSubscriber`  |
//!
//! `webPush` is only available with the `web-push` feature (on by default).

pub mod dummy;
#[cfg(feature = "web-push")]
pub mod web_push;

pub use dummy::DummySender;
#[cfg(feature = "web-push")]
pub use web_push::WebPushSender;

use crate::core::RegistryBuilder;

/// Registers every built-in sender kind.
pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    let builder = builder.sender(dummy::KIND, dummy::build);
    #[cfg(feature = "web-push")]
    let builder = builder.sender(web_push::KIND, web_push::build);
    builder
}
