//! Root and dependent entity discovery
//!
//! Walks every provider with root discovery, filters the results through
//! the caller's selection predicate, and expands dependent entities with an
//! explicit work-stack. Acceptance into the working set is memoized on
//! `(kind, identity)`, which both deduplicates entities discovered through
//! multiple paths and bounds expansion when providers answer cyclically.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::graph::KindGraph;
use crate::config::Settings;
use crate::provider::ProviderRegistry;
use crate::resource::{Entity, Kind};

/// Entities accepted for deletion, grouped by kind.
#[derive(Debug, Default)]
pub struct WorkingSet {
    by_kind: HashMap<Kind, HashMap<String, Entity>>,
}

impl WorkingSet {
    /// Accept an entity. Returns false if an entity with the same
    /// `(kind, identity)` was already accepted.
    pub fn insert(&mut self, entity: Entity) -> bool {
        let by_key = self.by_kind.entry(entity.kind).or_default();
        let key = entity.key();
        if by_key.contains_key(&key) {
            return false;
        }
        by_key.insert(key, entity);
        true
    }

    /// Remove and return all accepted entities of a kind.
    pub fn take(&mut self, kind: Kind) -> Vec<Entity> {
        self.by_kind
            .remove(&kind)
            .map(|m| m.into_values().collect())
            .unwrap_or_default()
    }

    pub fn count(&self, kind: Kind) -> usize {
        self.by_kind.get(&kind).map_or(0, HashMap::len)
    }

    pub fn len(&self) -> usize {
        self.by_kind.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Discover everything to delete, merging implied edges into `graph`.
///
/// Discovery failures are fatal: the error propagates before any deletion
/// has been issued. Providers are scanned sequentially in registration
/// order; the work is I/O bound and order keeps logs readable.
pub(crate) async fn collect(
    registry: &ProviderRegistry,
    settings: &Settings,
    filter: &(dyn Fn(&Entity) -> bool + Send + Sync),
    graph: &mut KindGraph,
    cancel: &CancellationToken,
) -> Result<WorkingSet> {
    let mut set = WorkingSet::default();

    for registered in registry.iter().filter(|r| r.caps.roots) {
        let kind = registered.kind();
        if registered.global && !settings.is_global_region() {
            debug!(kind = %kind, region = %settings.region, "skipping global kind in regional scan");
            continue;
        }
        if cancel.is_cancelled() {
            bail!("discovery canceled");
        }

        let roots = registered
            .provider
            .find_roots(settings)
            .await
            .with_context(|| format!("finding root entities for {kind}"))?;
        debug!(kind = %kind, count = roots.len(), "scanned root entities");

        for root in roots {
            // entities failing the selection predicate are dropped whole:
            // no expansion, no implied edges
            if !filter(&root) {
                continue;
            }
            expand(registry, settings, graph, &mut set, root).await?;
        }
    }

    info!(entities = set.len(), "discovery complete");
    Ok(set)
}

/// Accept one root entity and everything transitively dependent on it.
async fn expand(
    registry: &ProviderRegistry,
    settings: &Settings,
    graph: &mut KindGraph,
    set: &mut WorkingSet,
    root: Entity,
) -> Result<()> {
    let mut work = vec![root];

    while let Some(entity) = work.pop() {
        let Some(registered) = registry.get(entity.kind) else {
            bail!("no provider registered for kind {} (entity {entity})", entity.kind);
        };
        if !set.insert(entity.clone()) {
            // already accepted via another path; do not re-expand
            continue;
        }
        if !registered.caps.dependents {
            continue;
        }

        let dependents = registered
            .provider
            .find_dependents(settings, &entity)
            .await
            .with_context(|| format!("finding entities dependent on {entity}"))?;

        for dependent in dependents {
            if !registry.contains(dependent.kind) {
                bail!(
                    "no provider registered for kind {} (entity {dependent})",
                    dependent.kind
                );
            }
            // the dependent must be removed before the entity referencing it
            graph
                .add_edge(dependent.kind, entity.kind)
                .with_context(|| format!("recording implied dependency of {entity}"))?;
            work.push(dependent);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Kind = Kind::new("Test::A");

    fn entity(id: &str) -> Entity {
        Entity::new(A, vec![id.to_string()])
    }

    #[test]
    fn working_set_accepts_once() {
        let mut set = WorkingSet::default();
        assert!(set.insert(entity("x1")));
        assert!(!set.insert(entity("x1")));
        assert!(set.insert(entity("x2")));
        assert_eq!(set.count(A), 2);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn take_drains_a_kind() {
        let mut set = WorkingSet::default();
        set.insert(entity("x1"));
        let taken = set.take(A);
        assert_eq!(taken.len(), 1);
        assert!(set.take(A).is_empty());
        assert!(set.is_empty());
    }
}
