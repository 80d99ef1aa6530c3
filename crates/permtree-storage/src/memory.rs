//! In-memory datastore with changelog-style versioning.
//!
//! Every write bumps the head revision; tuple and namespace entries carry
//! the revision interval they were live for. A read pinned to a revision
//! sees exactly the entries whose interval covers it, so concurrent writes at
//! higher revisions stay invisible to in-flight expansions.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use permtree_domain::graph::{GraphDatastore, NamespaceReader, TupleIterator, TupleQuery};
use permtree_domain::model::{NamespaceDefinition, RelationTuple, Revision};
use permtree_domain::{DomainError, DomainResult};

use crate::error::{StorageError, StorageResult};
use crate::traits::{validate_namespace, validate_tuple, Datastore, TupleUpdate};

#[derive(Debug)]
struct TupleEntry {
    tuple: RelationTuple,
    created_at: Revision,
    deleted_at: Option<Revision>,
}

#[derive(Debug)]
struct NamespaceEntry {
    definition: Arc<NamespaceDefinition>,
    created_at: Revision,
    deleted_at: Option<Revision>,
}

fn live_at(created_at: Revision, deleted_at: Option<Revision>, revision: Revision) -> bool {
    created_at <= revision && deleted_at.is_none_or(|deleted| deleted > revision)
}

impl TupleEntry {
    fn live_at(&self, revision: Revision) -> bool {
        live_at(self.created_at, self.deleted_at, revision)
    }

    fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

impl NamespaceEntry {
    fn live_at(&self, revision: Revision) -> bool {
        live_at(self.created_at, self.deleted_at, revision)
    }

    fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    head: Revision,
    tuples: Vec<TupleEntry>,
    namespaces: Vec<NamespaceEntry>,
}

/// In-memory implementation of [`Datastore`].
///
/// Entries are kept in insertion order, which is also the iteration order of
/// tuple queries.
#[derive(Debug, Default)]
pub struct MemoryDatastore {
    state: RwLock<MemoryState>,
}

impl MemoryDatastore {
    /// Creates an empty datastore at revision zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty datastore wrapped in an [`Arc`].
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl GraphDatastore for MemoryDatastore {
    async fn query_tuples(
        &self,
        query: TupleQuery,
        at_revision: Revision,
    ) -> DomainResult<TupleIterator> {
        let state = self.state.read().await;
        let matched: Vec<RelationTuple> = state
            .tuples
            .iter()
            .filter(|entry| entry.live_at(at_revision) && query.matches(&entry.tuple))
            .map(|entry| entry.tuple.clone())
            .collect();
        Ok(TupleIterator::new(matched))
    }
}

#[async_trait]
impl NamespaceReader for MemoryDatastore {
    async fn read_namespace(
        &self,
        name: &str,
        at_revision: Revision,
    ) -> DomainResult<Arc<NamespaceDefinition>> {
        let state = self.state.read().await;
        state
            .namespaces
            .iter()
            .find(|entry| entry.definition.name == name && entry.live_at(at_revision))
            .map(|entry| Arc::clone(&entry.definition))
            .ok_or_else(|| DomainError::UnknownNamespace {
                name: name.to_string(),
            })
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    #[instrument(level = "debug", skip(self, preconditions, updates))]
    async fn write_tuples(
        &self,
        preconditions: &[RelationTuple],
        updates: &[TupleUpdate],
    ) -> StorageResult<Revision> {
        for update in updates {
            validate_tuple(update.tuple())?;
        }

        let mut state = self.state.write().await;

        for expected in preconditions {
            let found = state
                .tuples
                .iter()
                .any(|entry| entry.is_live() && &entry.tuple == expected);
            if !found {
                return Err(StorageError::PreconditionFailed {
                    tuple: expected.to_string(),
                });
            }
        }

        // Reject duplicate creates before applying anything, so a failed
        // batch leaves no entries behind at an unclaimed revision.
        for update in updates {
            if let TupleUpdate::Create(tuple) = update {
                let exists = state
                    .tuples
                    .iter()
                    .any(|entry| entry.is_live() && &entry.tuple == tuple);
                if exists {
                    return Err(StorageError::DuplicateTuple {
                        tuple: tuple.to_string(),
                    });
                }
            }
        }

        let revision = state.head.next();
        for update in updates {
            match update {
                TupleUpdate::Create(tuple) => {
                    state.tuples.push(TupleEntry {
                        tuple: tuple.clone(),
                        created_at: revision,
                        deleted_at: None,
                    });
                }
                TupleUpdate::Touch(tuple) => {
                    if let Some(existing) = state
                        .tuples
                        .iter_mut()
                        .find(|entry| entry.is_live() && &entry.tuple == tuple)
                    {
                        existing.deleted_at = Some(revision);
                    }
                    state.tuples.push(TupleEntry {
                        tuple: tuple.clone(),
                        created_at: revision,
                        deleted_at: None,
                    });
                }
                TupleUpdate::Delete(tuple) => {
                    if let Some(existing) = state
                        .tuples
                        .iter_mut()
                        .find(|entry| entry.is_live() && &entry.tuple == tuple)
                    {
                        existing.deleted_at = Some(revision);
                    }
                }
            }
        }

        state.head = revision;
        debug!(revision = %revision, updates = updates.len(), "tuples written");
        Ok(revision)
    }

    #[instrument(level = "debug", skip(self, definition), fields(namespace = %definition.name))]
    async fn write_namespace(&self, definition: NamespaceDefinition) -> StorageResult<Revision> {
        validate_namespace(&definition)?;

        let mut state = self.state.write().await;
        let revision = state.head.next();

        if let Some(existing) = state
            .namespaces
            .iter_mut()
            .find(|entry| entry.definition.name == definition.name && entry.is_live())
        {
            existing.deleted_at = Some(revision);
        }
        state.namespaces.push(NamespaceEntry {
            definition: Arc::new(definition),
            created_at: revision,
            deleted_at: None,
        });

        state.head = revision;
        Ok(revision)
    }

    async fn head_revision(&self) -> StorageResult<Revision> {
        Ok(self.state.read().await.head)
    }

    async fn check_revision(&self, revision: Revision) -> StorageResult<()> {
        let head = self.state.read().await.head;
        if revision > head {
            return Err(StorageError::InvalidRevision {
                revision,
                reason: "revision is in the future".to_string(),
            });
        }
        Ok(())
    }
}
