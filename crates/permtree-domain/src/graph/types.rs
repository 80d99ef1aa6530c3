//! Request, result, and context types for the expansion engine.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::DomainResult;
use crate::model::{ObjectAndRelation, Revision};

use super::tree::ExpandNode;

/// Type alias for boxed futures, needed for async recursion and deferred
/// child expansions.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of one expansion: the tree, or the first error encountered.
pub type ExpandResult = DomainResult<ExpandNode>;

/// A deferred child expansion. Reducers own when execution actually starts,
/// which keeps cancellation scoped tightly to the reducer that spawned the
/// child.
pub(crate) type ReduceableExpandFunc =
    Box<dyn FnOnce(RequestContext) -> BoxFuture<'static, ExpandResult> + Send + 'static>;

/// A reducer combining deferred child expansions into one tree node.
pub(crate) type ExpandReducer = fn(
    RequestContext,
    ObjectAndRelation,
    Vec<ReduceableExpandFunc>,
) -> BoxFuture<'static, ExpandResult>;

/// How far direct expansion dereferences the subjects it finds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionMode {
    /// Stop at the subjects stored in direct tuples; rewrite arms are still
    /// followed.
    Shallow,
    /// Transitively dereference non-terminal subjects found in direct tuples.
    Recursive,
}

/// A request to expand `(start, at_revision)` within a depth budget.
///
/// Revision, depth, and mode are copied into every sub-request; they are
/// never shared mutable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandRequest {
    /// The object and relation to expand.
    pub start: ObjectAndRelation,
    /// The snapshot every tuple read is pinned to.
    pub at_revision: Revision,
    /// Remaining traversal hops. Zero means the budget is exhausted.
    pub depth_remaining: u16,
    /// Shallow or recursive expansion.
    pub mode: ExpansionMode,
}

/// Cooperative cancellation scope for one request.
///
/// Reducers derive a child scope per fan-out; dropping the scope guard on any
/// exit path cancels still-running children, which observe it at their next
/// suspension point.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    token: CancellationToken,
}

impl RequestContext {
    /// Creates a fresh, uncancelled context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels this context and everything derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Derives a child scope. The returned guard cancels the child scope when
    /// dropped, on every exit path of the caller.
    pub(crate) fn child(&self) -> (RequestContext, DropGuard) {
        let token = self.token.child_token();
        let guard = token.clone().drop_guard();
        (RequestContext { token }, guard)
    }
}
