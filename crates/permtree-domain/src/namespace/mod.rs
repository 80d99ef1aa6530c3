//! Namespace manager: revision-pinned resolution of relation definitions.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{DomainError, DomainResult};
use crate::graph::NamespaceReader;
use crate::model::{NamespaceDefinition, RelationDefinition, Revision, ELLIPSIS};

/// Resolves relation definitions for the expansion engine and validates
/// namespace/relation pairs for request validators.
#[async_trait]
pub trait NamespaceManager: Send + Sync {
    /// Resolves the [`RelationDefinition`] for `(namespace, relation)` as of
    /// `at_revision`.
    async fn read_namespace_and_relation(
        &self,
        namespace: &str,
        relation: &str,
        at_revision: Revision,
    ) -> DomainResult<RelationDefinition>;

    /// Verifies that the namespace exists and, unless `relation` is the
    /// ellipsis and `allow_ellipsis` is set, that the relation is defined on
    /// it.
    async fn check_namespace_and_relation(
        &self,
        namespace: &str,
        relation: &str,
        allow_ellipsis: bool,
        at_revision: Revision,
    ) -> DomainResult<()>;
}

/// A namespace manager that memoises definitions by `(name, revision)`.
///
/// Definitions are immutable once written at a revision, so entries never
/// need invalidation. Lookups the engine repeats while fanning out hit the
/// cache.
pub struct CachingNamespaceManager<R> {
    reader: Arc<R>,
    cache: DashMap<(String, Revision), Arc<NamespaceDefinition>>,
}

impl<R: NamespaceReader> CachingNamespaceManager<R> {
    /// Creates a caching manager over the given reader.
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            reader,
            cache: DashMap::new(),
        }
    }

    async fn namespace(
        &self,
        name: &str,
        at_revision: Revision,
    ) -> DomainResult<Arc<NamespaceDefinition>> {
        let key = (name.to_string(), at_revision);
        if let Some(found) = self.cache.get(&key) {
            return Ok(Arc::clone(found.value()));
        }

        let definition = self.reader.read_namespace(name, at_revision).await?;
        self.cache.insert(key, Arc::clone(&definition));
        Ok(definition)
    }
}

#[async_trait]
impl<R: NamespaceReader + 'static> NamespaceManager for CachingNamespaceManager<R> {
    async fn read_namespace_and_relation(
        &self,
        namespace: &str,
        relation: &str,
        at_revision: Revision,
    ) -> DomainResult<RelationDefinition> {
        let definition = self.namespace(namespace, at_revision).await?;
        definition
            .relation(relation)
            .cloned()
            .ok_or_else(|| DomainError::UnknownRelation {
                namespace: namespace.to_string(),
                relation: relation.to_string(),
            })
    }

    async fn check_namespace_and_relation(
        &self,
        namespace: &str,
        relation: &str,
        allow_ellipsis: bool,
        at_revision: Revision,
    ) -> DomainResult<()> {
        let definition = self.namespace(namespace, at_revision).await?;

        if relation == ELLIPSIS {
            if allow_ellipsis {
                return Ok(());
            }
            return Err(DomainError::UnknownRelation {
                namespace: namespace.to_string(),
                relation: relation.to_string(),
            });
        }

        if definition.relation(relation).is_some() {
            Ok(())
        } else {
            Err(DomainError::UnknownRelation {
                namespace: namespace.to_string(),
                relation: relation.to_string(),
            })
        }
    }
}
