//! The dispatcher seam: every sub-expansion is routed through here.
//!
//! The dispatcher is the single place the depth budget is enforced and the
//! relation definition is resolved, and it is the extension point for a
//! distributed engine: the engine never assumes a sub-request is served
//! locally.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::error::DomainError;
use crate::namespace::NamespaceManager;

use super::expand::ConcurrentExpander;
use super::reduce::expand_one;
use super::traits::GraphDatastore;
use super::types::{ExpandRequest, ExpandResult, RequestContext};

/// Routes one expansion request. Implementations must enforce the depth
/// budget before doing any work.
#[async_trait]
pub trait Dispatcher: Send + Sync + 'static {
    /// Expands the request, returning the tree or the first error.
    async fn expand(self: Arc<Self>, ctx: RequestContext, req: ExpandRequest) -> ExpandResult;
}

/// A dispatcher serving every sub-request in-process.
pub struct LocalDispatcher<D, M> {
    namespaces: Arc<M>,
    datastore: Arc<D>,
}

impl<D, M> LocalDispatcher<D, M>
where
    D: GraphDatastore + 'static,
    M: NamespaceManager + 'static,
{
    /// Creates a local dispatcher over the given namespace manager and
    /// datastore.
    pub fn new(namespaces: Arc<M>, datastore: Arc<D>) -> Arc<Self> {
        Arc::new(Self {
            namespaces,
            datastore,
        })
    }
}

#[async_trait]
impl<D, M> Dispatcher for LocalDispatcher<D, M>
where
    D: GraphDatastore + 'static,
    M: NamespaceManager + 'static,
{
    #[instrument(
        level = "debug",
        skip(self, ctx, req),
        fields(start = %req.start, depth_remaining = req.depth_remaining)
    )]
    async fn expand(self: Arc<Self>, ctx: RequestContext, req: ExpandRequest) -> ExpandResult {
        // The budget covers object-traversal hops; a request arriving with
        // nothing left is fatal for the whole expansion.
        if req.depth_remaining == 0 {
            return Err(DomainError::MaxDepthExceeded);
        }

        let relation = self
            .namespaces
            .read_namespace_and_relation(&req.start.namespace, &req.start.relation, req.at_revision)
            .await?;

        let expander = ConcurrentExpander::new(
            Arc::clone(&self) as Arc<dyn Dispatcher>,
            Arc::clone(&self.datastore),
        );
        let request = expander.expand(&req, &relation);
        expand_one(ctx, request).await
    }
}
