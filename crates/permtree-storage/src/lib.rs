//! permtree-storage: versioned tuple and namespace storage.
//!
//! Every write produces a new [`Revision`](permtree_domain::model::Revision);
//! reads are pinned to a revision and see exactly the entries live at that
//! point. The in-memory backend implements the read traits the expansion
//! engine consumes (`GraphDatastore`, `NamespaceReader`) directly.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryDatastore;
pub use traits::{validate_namespace, validate_tuple, Datastore, TupleUpdate};
