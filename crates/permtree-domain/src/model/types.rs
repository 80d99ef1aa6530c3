//! Object, tuple, and revision types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The sentinel relation meaning "the subject themselves". A user reference
/// carrying this relation is terminal: it cannot be expanded any further.
pub const ELLIPSIS: &str = "...";

/// An object-and-relation triple (e.g. `folder:company#viewer`).
///
/// Identity is by all three fields. With `relation == "..."` the triple
/// denotes a concrete subject rather than a computed user-set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectAndRelation {
    /// The namespace (object type) portion (e.g. "folder").
    pub namespace: String,
    /// The object ID portion (e.g. "company").
    pub object_id: String,
    /// The relation portion (e.g. "viewer", or `...` for a subject).
    pub relation: String,
}

impl ObjectAndRelation {
    /// Creates a new object-and-relation triple.
    pub fn new(
        namespace: impl Into<String>,
        object_id: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            object_id: object_id.into(),
            relation: relation.into(),
        }
    }

    /// Creates a terminal subject reference (`namespace:object_id#...`).
    pub fn terminal(namespace: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self::new(namespace, object_id, ELLIPSIS)
    }

    /// Whether this reference is a terminal subject.
    pub fn is_terminal(&self) -> bool {
        self.relation == ELLIPSIS
    }

    /// Returns a copy of this triple with the relation replaced.
    pub fn with_relation(&self, relation: impl Into<String>) -> Self {
        Self {
            namespace: self.namespace.clone(),
            object_id: self.object_id.clone(),
            relation: relation.into(),
        }
    }
}

impl fmt::Display for ObjectAndRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}#{}", self.namespace, self.object_id, self.relation)
    }
}

/// A stored relationship: `user` holds `object.relation` on `object`.
///
/// The user side is itself an [`ObjectAndRelation`]: terminal (`...`) for a
/// concrete subject, or carrying a named relation for a user-set that can be
/// expanded transitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationTuple {
    /// The object and relation being granted.
    pub object: ObjectAndRelation,
    /// The subject the grant applies to.
    pub user: ObjectAndRelation,
}

impl RelationTuple {
    /// Creates a new relation tuple.
    pub fn new(object: ObjectAndRelation, user: ObjectAndRelation) -> Self {
        Self { object, user }
    }
}

impl fmt::Display for RelationTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.object, self.user)
    }
}

/// An opaque, totally-ordered token identifying a consistent datastore
/// snapshot. All reads within a single expansion are pinned to one revision.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Revision(u64);

impl Revision {
    /// The revision before any write.
    pub const ZERO: Revision = Revision(0);

    /// Creates a revision from its ordinal value.
    pub fn new(value: u64) -> Self {
        Revision(value)
    }

    /// The ordinal value of this revision.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The revision immediately following this one.
    pub fn next(&self) -> Revision {
        Revision(self.0 + 1)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
