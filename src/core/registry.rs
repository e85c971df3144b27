//! # Kind registry: configuration entries → supervised components.
//!
//! The [`Registry`] maps a symbolic `kind` to a builder function, separately for
//! receivers and senders. It is populated once through [`RegistryBuilder`] and is
//! immutable afterwards; there is no global registration state.
//!
//! ## Build flow
//! ```text
//! Config ──► validate()
//!   └─► for each entry, in order:
//!         ├─► lookup kind        (UnknownKind → abort)
//!         ├─► ComponentContext   (span: type, kind, id)
//!         ├─► builder(ctx, props) (PropertyError → Component → abort)
//!         └─► Arc<Supervisor>
//! ```
//!
//! ## Rules
//! - Output order matches the configuration order.
//! - The first error aborts the whole build; no partial [`Fleet`] is returned.
//! - Kinds are matched case-sensitively (`dummy`, `HTTP`, `webPush`).

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    channel::{ChannelComponent, ComponentContext, Properties, Role},
    config::{ComponentConfig, Config},
    core::supervisor::{Supervisor, SupervisorParams},
    error::{BuildError, PropertyError},
    events::Bus,
};

/// Kind-specific constructor: validates `properties` and returns the component.
pub type BuildFn = Arc<
    dyn Fn(ComponentContext, &Properties) -> Result<Arc<dyn ChannelComponent>, PropertyError>
        + Send
        + Sync,
>;

/// Supervisors produced by [`Registry::build`], in configuration order.
#[derive(Debug)]
pub struct Fleet {
    pub receivers: Vec<Arc<Supervisor>>,
    pub senders: Vec<Arc<Supervisor>>,
}

/// Populates a [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    receivers: HashMap<String, BuildFn>,
    senders: HashMap<String, BuildFn>,
}

impl RegistryBuilder {
    /// Registers (or replaces) a receiver kind.
    pub fn receiver<F>(mut self, kind: impl Into<String>, build: F) -> Self
    where
        F: Fn(ComponentContext, &Properties) -> Result<Arc<dyn ChannelComponent>, PropertyError>
            + Send
            + Sync
            + 'static,
    {
        self.receivers.insert(kind.into(), Arc::new(build));
        self
    }

    /// Registers (or replaces) a sender kind.
    pub fn sender<F>(mut self, kind: impl Into<String>, build: F) -> Self
    where
        F: Fn(ComponentContext, &Properties) -> Result<Arc<dyn ChannelComponent>, PropertyError>
            + Send
            + Sync
            + 'static,
    {
        self.senders.insert(kind.into(), Arc::new(build));
        self
    }

    /// Registers every kind shipped with the crate.
    pub fn with_standard_kinds(self) -> Self {
        crate::senders::register(crate::receivers::register(self))
    }

    pub fn build(self) -> Registry {
        Registry {
            receivers: self.receivers,
            senders: self.senders,
        }
    }
}

/// Immutable kind → builder mapping.
pub struct Registry {
    receivers: HashMap<String, BuildFn>,
    senders: HashMap<String, BuildFn>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("receivers", &self.kinds(Role::Receiver))
            .field("senders", &self.kinds(Role::Sender))
            .finish()
    }
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry with the built-in kinds only.
    pub fn standard() -> Self {
        Self::builder().with_standard_kinds().build()
    }

    /// Registered kinds for `role`, sorted.
    pub fn kinds(&self, role: Role) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.table(role).keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Validates `config` and builds one supervisor per entry.
    pub fn build(&self, config: &Config, bus: &Bus) -> Result<Fleet, BuildError> {
        config.validate()?;
        let params = SupervisorParams::from(&config.runtime);

        let receivers = self.build_role(Role::Receiver, config.receivers(), &params, bus)?;
        let senders = self.build_role(Role::Sender, config.senders(), &params, bus)?;
        tracing::debug!(
            receivers = receivers.len(),
            senders = senders.len(),
            "fleet built"
        );
        Ok(Fleet { receivers, senders })
    }

    fn build_role(
        &self,
        role: Role,
        entries: &[ComponentConfig],
        params: &SupervisorParams,
        bus: &Bus,
    ) -> Result<Vec<Arc<Supervisor>>, BuildError> {
        let table = self.table(role);
        entries
            .iter()
            .map(|entry| {
                let build = table
                    .get(&entry.kind)
                    .ok_or_else(|| BuildError::UnknownKind {
                        role,
                        id: entry.id.clone(),
                        kind: entry.kind.clone(),
                    })?;

                let ctx = ComponentContext::new(role, entry.kind.as_str(), entry.id.as_str());
                let component =
                    build(ctx, &entry.properties).map_err(|source| BuildError::Component {
                        role,
                        id: entry.id.clone(),
                        kind: entry.kind.clone(),
                        source,
                    })?;

                Ok(Arc::new(Supervisor::new(
                    role,
                    component,
                    params.clone(),
                    bus.clone(),
                )))
            })
            .collect()
    }

    fn table(&self, role: Role) -> &HashMap<String, BuildFn> {
        match role {
            Role::Receiver => &self.receivers,
            Role::Sender => &self.senders,
        }
    }
}
