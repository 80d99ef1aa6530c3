//! Datastore trait definition and input validation.

use async_trait::async_trait;

use permtree_domain::graph::{GraphDatastore, NamespaceReader};
use permtree_domain::model::{NamespaceDefinition, RelationTuple, Revision, ELLIPSIS};

use crate::error::{StorageError, StorageResult};

/// A tuple mutation applied by [`Datastore::write_tuples`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TupleUpdate {
    /// Insert a tuple that must not already be live.
    Create(RelationTuple),
    /// Insert a tuple, superseding any live version of it.
    Touch(RelationTuple),
    /// Remove the live version of a tuple, if any.
    Delete(RelationTuple),
}

impl TupleUpdate {
    /// The tuple this mutation applies to.
    pub fn tuple(&self) -> &RelationTuple {
        match self {
            TupleUpdate::Create(tuple) | TupleUpdate::Touch(tuple) | TupleUpdate::Delete(tuple) => {
                tuple
            }
        }
    }
}

/// Full datastore interface: revisioned writes on top of the read traits the
/// expansion engine consumes.
#[async_trait]
pub trait Datastore: GraphDatastore + NamespaceReader {
    /// Atomically applies `updates`, provided every precondition tuple is
    /// live. Returns the revision at which the mutations became visible.
    async fn write_tuples(
        &self,
        preconditions: &[RelationTuple],
        updates: &[TupleUpdate],
    ) -> StorageResult<Revision>;

    /// Writes (or supersedes) a namespace definition. Returns the revision
    /// at which the definition became visible.
    async fn write_namespace(&self, definition: NamespaceDefinition) -> StorageResult<Revision>;

    /// The newest revision in the store.
    async fn head_revision(&self) -> StorageResult<Revision>;

    /// Verifies that `revision` identifies a readable snapshot.
    async fn check_revision(&self, revision: Revision) -> StorageResult<()>;
}

/// Validates a tuple at the storage layer: every field present, and the
/// object side carrying a real named relation. Only the user side may be the
/// ellipsis.
pub fn validate_tuple(tuple: &RelationTuple) -> StorageResult<()> {
    if tuple.object.namespace.is_empty()
        || tuple.object.object_id.is_empty()
        || tuple.object.relation.is_empty()
    {
        return Err(StorageError::InvalidInput {
            message: format!("tuple object is incomplete: {}", tuple.object),
        });
    }
    if tuple.object.relation == ELLIPSIS {
        return Err(StorageError::InvalidInput {
            message: format!("tuple object may not use the ellipsis relation: {}", tuple.object),
        });
    }
    if tuple.user.namespace.is_empty()
        || tuple.user.object_id.is_empty()
        || tuple.user.relation.is_empty()
    {
        return Err(StorageError::InvalidInput {
            message: format!("tuple user is incomplete: {}", tuple.user),
        });
    }
    Ok(())
}

/// Validates a namespace definition before it is written.
pub fn validate_namespace(definition: &NamespaceDefinition) -> StorageResult<()> {
    if definition.name.is_empty() {
        return Err(StorageError::InvalidInput {
            message: "namespace name cannot be empty".to_string(),
        });
    }
    for relation in &definition.relations {
        if relation.name.is_empty() {
            return Err(StorageError::InvalidInput {
                message: format!("namespace '{}' has a relation without a name", definition.name),
            });
        }
        if relation.name == ELLIPSIS {
            return Err(StorageError::InvalidInput {
                message: format!(
                    "namespace '{}' may not define the ellipsis relation",
                    definition.name
                ),
            });
        }
    }
    Ok(())
}
