//! Graph expansion engine.
//!
//! Given a starting `(object, relation)` pair and a datastore revision, the
//! engine materialises the full tree of user-sets holding that relation. The
//! tree mirrors the schema's rewrite algebra so consumers can render a
//! "who has access" view, audit policies, or drive membership checks.
//!
//! Sub-expansions are routed through the [`Dispatcher`] seam, which enforces
//! the depth budget and is the substitution point for a distributed engine.

mod dispatch;
mod expand;
mod reduce;
mod traits;
mod tree;
mod types;

#[cfg(test)]
mod tests;

pub use dispatch::{Dispatcher, LocalDispatcher};
pub use traits::{GraphDatastore, NamespaceReader, TupleIterator, TupleQuery};
pub use tree::{ExpandNode, SetOperation};
pub use types::{BoxFuture, ExpandRequest, ExpandResult, ExpansionMode, RequestContext};
