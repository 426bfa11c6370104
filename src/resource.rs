//! Resource kinds and entities
//!
//! A [`Kind`] names a category of deletable resource and doubles as a vertex
//! in the dependency graph. An [`Entity`] is one concrete resource of a kind,
//! identified by an ordered tuple of id segments whose meaning is
//! kind-specific (e.g. `[cluster, nodegroup]` for an EKS nodegroup).

use std::collections::HashMap;
use std::fmt;

/// Identifies a resource kind; also the vertex identity in the kind graph.
///
/// Kinds are CloudFormation-style type names declared as constants by the
/// provider modules, so the wrapped string is always `'static`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub struct Kind(&'static str);

impl Kind {
    pub const fn new(name: &'static str) -> Self {
        Kind(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// One concrete, identified resource instance.
///
/// Equality for deduplication purposes is `(kind, id)`; tags are carried
/// along so the selection predicate can evaluate root entities.
#[derive(Debug, Clone)]
pub struct Entity {
    pub kind: Kind,
    /// Ordered id segments; kind-specific meaning.
    pub id: Vec<String>,
    pub tags: HashMap<String, String>,
}

impl Entity {
    pub fn new(kind: Kind, id: Vec<String>) -> Self {
        Self {
            kind,
            id,
            tags: HashMap::new(),
        }
    }

    pub fn with_tags(mut self, tags: HashMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    /// The identity key within a kind, used for accept-once deduplication.
    pub fn key(&self) -> String {
        self.id.join("/")
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIND_A: Kind = Kind::new("Test::Kind::A");

    #[test]
    fn entity_key_joins_id_segments() {
        let e = Entity::new(KIND_A, vec!["cluster".into(), "nodegroup".into()]);
        assert_eq!(e.key(), "cluster/nodegroup");
    }

    #[test]
    fn entity_display_includes_kind() {
        let e = Entity::new(KIND_A, vec!["x1".into()]);
        assert_eq!(e.to_string(), "Test::Kind::A/x1");
    }

    #[test]
    fn kind_display_is_the_name() {
        assert_eq!(KIND_A.to_string(), "Test::Kind::A");
        assert_eq!(KIND_A.as_str(), "Test::Kind::A");
    }
}
