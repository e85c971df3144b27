//! Runtime core: supervision, routing and orchestration.
//!
//! Internal modules:
//! - [`runner`]: launches one attempt of a component, contains panics;
//! - [`supervisor`]: keeps one component alive, start/shutdown handshake;
//! - [`registry`]: kind → builder lookup, turns configuration into supervisors;
//! - [`router`]: fans one notification out to every sender with a barrier;
//! - [`orchestrator`]: wires receivers → router → senders, ordered shutdown;
//! - [`shutdown`]: cross-platform termination signal handling.

mod orchestrator;
mod registry;
mod router;
mod runner;
mod shutdown;
mod supervisor;

pub use orchestrator::{Orchestrator, Running};
pub use registry::{BuildFn, Fleet, Registry, RegistryBuilder};
pub use router::Router;
pub use shutdown::ShutdownSignal;
pub use supervisor::{Completion, Supervisor, SupervisorParams};
