//! permtree-domain: core authorization domain logic
//!
//! This crate contains the heart of the permtree service:
//! - Schema model: namespaces, relations, and the userset rewrite algebra
//! - Graph engine: concurrent expansion of `(object, relation)` into a
//!   labelled set-algebra tree of user-sets
//! - Namespace manager: revision-pinned resolution of relation definitions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 permtree-domain                  │
//! ├─────────────────────────────────────────────────┤
//! │  model/      - Namespaces, tuples, rewrites     │
//! │  graph/      - Expansion engine & dispatcher    │
//! │  namespace/  - Caching namespace manager        │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod graph;
pub mod model;
pub mod namespace;

// Re-export commonly used types at the crate root
pub use error::{DomainError, DomainResult};
