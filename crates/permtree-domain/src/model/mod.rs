//! Core model types: objects, tuples, revisions, and the schema rewrite
//! algebra.

mod schema;
mod types;

pub use schema::{
    ComputedObject, ComputedUserset, NamespaceDefinition, RelationDefinition, RewriteChild,
    UsersetRewrite,
};
pub use types::{ObjectAndRelation, RelationTuple, Revision, ELLIPSIS};
