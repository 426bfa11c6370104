//! Provider capability contract and registry
//!
//! Every resource kind is backed by exactly one [`Provider`]. Optional
//! capabilities (root discovery, dependent discovery) are declared through
//! [`Capabilities`] and resolved once when the provider is registered, so
//! the scheduler never probes for them at call sites.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::info;

use crate::config::Settings;
use crate::resource::{Entity, Kind};

/// Bound on how long a provider may wait for a resource to reach a terminal
/// state after issuing its delete call.
pub const DEFAULT_DELETE_WAIT: Duration = Duration::from_secs(5 * 60);

/// Optional capabilities a provider may implement.
///
/// A provider that overrides `find_roots` or `find_dependents` must also
/// report the matching flag here; the registry stores the flags so callers
/// check a bool instead of probing the trait object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Provider can list all existing entities of its kind.
    pub roots: bool,
    /// Provider can list entities that must be removed before one of its own.
    pub dependents: bool,
}

impl Capabilities {
    pub const NONE: Capabilities = Capabilities {
        roots: false,
        dependents: false,
    };

    pub const ROOTS: Capabilities = Capabilities {
        roots: true,
        dependents: false,
    };

    pub const ROOTS_AND_DEPENDENTS: Capabilities = Capabilities {
        roots: true,
        dependents: true,
    };

    pub const DEPENDENTS: Capabilities = Capabilities {
        roots: false,
        dependents: true,
    };
}

/// The capability set for one resource kind.
#[async_trait]
pub trait Provider: Send + Sync {
    /// The kind this provider is responsible for.
    fn kind(&self) -> Kind;

    /// Which optional capabilities this provider implements.
    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE
    }

    /// Kinds that must be fully processed before this kind may start,
    /// independent of any discovered relationship.
    fn static_dependencies(&self) -> Vec<Kind> {
        Vec::new()
    }

    /// Whether this kind lives in a partition-wide namespace rather than a
    /// regional one. Global kinds are only scanned from an allow-listed set
    /// of regions (see [`Settings::is_global_region`]).
    fn is_global(&self) -> bool {
        false
    }

    /// Delete one entity. May block on a terminal-state waiter, bounded by
    /// [`DEFAULT_DELETE_WAIT`] unless the kind needs longer.
    async fn delete(&self, settings: &Settings, entity: &Entity) -> Result<()>;

    /// List all currently existing entities of this kind, tags populated.
    async fn find_roots(&self, _settings: &Settings) -> Result<Vec<Entity>> {
        Ok(Vec::new())
    }

    /// List entities (of any kind) that must be removed before `entity`.
    async fn find_dependents(&self, _settings: &Settings, _entity: &Entity) -> Result<Vec<Entity>> {
        Ok(Vec::new())
    }
}

/// A provider plus its capability descriptor, resolved at registration.
pub struct Registered {
    pub provider: Arc<dyn Provider>,
    pub caps: Capabilities,
    pub static_deps: Vec<Kind>,
    pub global: bool,
}

impl Registered {
    pub fn kind(&self) -> Kind {
        self.provider.kind()
    }
}

/// One registry per run, built from an explicit provider list.
pub struct ProviderRegistry {
    by_kind: HashMap<Kind, Registered>,
    // registration order, for deterministic discovery
    order: Vec<Kind>,
}

impl ProviderRegistry {
    /// Build a registry from provider instances. Registering two providers
    /// for the same kind is a configuration error.
    pub fn new(providers: impl IntoIterator<Item = Arc<dyn Provider>>) -> Result<Self> {
        let mut by_kind = HashMap::new();
        let mut order = Vec::new();

        for provider in providers {
            let kind = provider.kind();
            let registered = Registered {
                caps: provider.capabilities(),
                static_deps: provider.static_dependencies(),
                global: provider.is_global(),
                provider,
            };
            if by_kind.insert(kind, registered).is_some() {
                bail!("duplicate provider registered for kind {kind}");
            }
            order.push(kind);
        }

        info!(providers = order.len(), "provider registry built");
        Ok(Self { by_kind, order })
    }

    pub fn get(&self, kind: Kind) -> Option<&Registered> {
        self.by_kind.get(&kind)
    }

    pub fn contains(&self, kind: Kind) -> bool {
        self.by_kind.contains_key(&kind)
    }

    /// Registered providers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Registered> {
        self.order.iter().map(|k| &self.by_kind[k])
    }

    pub fn kinds(&self) -> impl Iterator<Item = Kind> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Per-entity execution callback. This is where dry-run vs. real deletion
/// and user-facing output are decided; the scheduler only sees the result.
#[async_trait]
pub trait Action: Send + Sync {
    async fn run(&self, settings: &Settings, provider: &dyn Provider, entity: &Entity)
        -> Result<()>;
}

/// Performs the real deletion, logging each entity as it goes.
pub struct DeleteAction;

#[async_trait]
impl Action for DeleteAction {
    async fn run(
        &self,
        settings: &Settings,
        provider: &dyn Provider,
        entity: &Entity,
    ) -> Result<()> {
        info!(entity = %entity, "deleting");
        provider.delete(settings, entity).await
    }
}

/// Prints what would be deleted without touching anything.
pub struct DryRunAction;

#[async_trait]
impl Action for DryRunAction {
    async fn run(
        &self,
        _settings: &Settings,
        _provider: &dyn Provider,
        entity: &Entity,
    ) -> Result<()> {
        println!("{entity}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullProvider(Kind);

    #[async_trait]
    impl Provider for NullProvider {
        fn kind(&self) -> Kind {
            self.0
        }

        async fn delete(&self, _settings: &Settings, _entity: &Entity) -> Result<()> {
            Ok(())
        }
    }

    const KIND_A: Kind = Kind::new("Test::Kind::A");
    const KIND_B: Kind = Kind::new("Test::Kind::B");

    #[test]
    fn registry_preserves_registration_order() {
        let registry = ProviderRegistry::new([
            Arc::new(NullProvider(KIND_A)) as Arc<dyn Provider>,
            Arc::new(NullProvider(KIND_B)),
        ])
        .unwrap();

        let kinds: Vec<_> = registry.kinds().collect();
        assert_eq!(kinds, vec![KIND_A, KIND_B]);
        assert!(registry.contains(KIND_A));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn duplicate_kind_is_rejected() {
        let err = ProviderRegistry::new([
            Arc::new(NullProvider(KIND_A)) as Arc<dyn Provider>,
            Arc::new(NullProvider(KIND_A)),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate provider"));
    }

    #[test]
    fn capabilities_are_resolved_once() {
        let registry =
            ProviderRegistry::new([Arc::new(NullProvider(KIND_A)) as Arc<dyn Provider>]).unwrap();
        let registered = registry.get(KIND_A).unwrap();
        assert_eq!(registered.caps, Capabilities::NONE);
        assert!(!registered.global);
        assert!(registered.static_deps.is_empty());
    }
}
