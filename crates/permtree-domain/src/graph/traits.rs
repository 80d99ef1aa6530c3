//! Read-side traits the expansion engine consumes.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DomainResult;
use crate::model::{NamespaceDefinition, ObjectAndRelation, RelationTuple, Revision};

/// A point query over stored tuples within one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleQuery {
    /// The namespace to query.
    pub namespace: String,
    /// Restrict to a single object ID.
    pub object_id: Option<String>,
    /// Restrict to a single relation.
    pub relation: Option<String>,
}

impl TupleQuery {
    /// Creates a query over every tuple in a namespace.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            object_id: None,
            relation: None,
        }
    }

    /// Restricts the query to one object ID.
    pub fn with_object_id(mut self, object_id: impl Into<String>) -> Self {
        self.object_id = Some(object_id.into());
        self
    }

    /// Restricts the query to one relation.
    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    /// Whether a tuple's object side satisfies this query.
    pub fn matches(&self, tuple: &RelationTuple) -> bool {
        tuple.object.namespace == self.namespace
            && self
                .object_id
                .as_ref()
                .is_none_or(|id| &tuple.object.object_id == id)
            && self
                .relation
                .as_ref()
                .is_none_or(|rel| &tuple.object.relation == rel)
    }
}

/// Iterator over the tuples matched by a query, in the backend's iteration
/// order. Yielding zero rows is not an error. The underlying read is released
/// when the iterator is dropped.
#[derive(Debug)]
pub struct TupleIterator {
    inner: std::vec::IntoIter<RelationTuple>,
}

impl TupleIterator {
    /// Creates an iterator over an already-materialised result set.
    pub fn new(tuples: Vec<RelationTuple>) -> Self {
        Self {
            inner: tuples.into_iter(),
        }
    }
}

impl Iterator for TupleIterator {
    type Item = RelationTuple;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// The minimal datastore interface the expansion engine consumes: point
/// queries pinned to a revision.
#[async_trait]
pub trait GraphDatastore: Send + Sync {
    /// Executes a tuple query against the snapshot identified by
    /// `at_revision`. Returns the tuples that were live at that revision.
    async fn query_tuples(
        &self,
        query: TupleQuery,
        at_revision: Revision,
    ) -> DomainResult<TupleIterator>;
}

/// Revision-pinned access to namespace definitions.
#[async_trait]
pub trait NamespaceReader: Send + Sync {
    /// Resolves the namespace definition live at `at_revision`, or
    /// [`DomainError::UnknownNamespace`](crate::DomainError::UnknownNamespace).
    async fn read_namespace(
        &self,
        name: &str,
        at_revision: Revision,
    ) -> DomainResult<Arc<NamespaceDefinition>>;
}

/// Convenience used by the expander: the query for the tuples stored under
/// one object-and-relation.
pub(crate) fn direct_query(start: &ObjectAndRelation) -> TupleQuery {
    TupleQuery::new(start.namespace.clone())
        .with_object_id(start.object_id.clone())
        .with_relation(start.relation.clone())
}
