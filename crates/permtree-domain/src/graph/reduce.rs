//! Reducers combining deferred child expansions into tree nodes.
//!
//! All set-operation reducers share one protocol: every child is spawned
//! concurrently under a cancellation scope derived from the caller's context,
//! and results are awaited strictly in list order so that child order in the
//! produced tree matches the rewrite expression's source order and the first
//! error (in that order) wins. Exiting the reducer on any path drops the
//! scope guard, cancelling still-running children.
//!
//! Reducers label the node they build with the set operation's meaning; they
//! do not themselves evaluate set semantics. Interpreting intersection or
//! exclusion over the produced tree is the consumer's concern.

use tokio::sync::oneshot;

use crate::error::DomainError;
use crate::model::ObjectAndRelation;

use super::tree::{ExpandNode, SetOperation};
use super::types::{BoxFuture, ExpandResult, ReduceableExpandFunc, RequestContext};

async fn reduce_set_operation(
    ctx: RequestContext,
    start: ObjectAndRelation,
    requests: Vec<ReduceableExpandFunc>,
    operation: SetOperation,
) -> ExpandResult {
    if requests.is_empty() {
        return Ok(ExpandNode::intermediate(operation, Some(start), Vec::new()));
    }

    let (child_ctx, _scope) = ctx.child();

    // One buffered channel per child: a cancelled reducer can never block a
    // child that is completing.
    let mut receivers = Vec::with_capacity(requests.len());
    for request in requests {
        let (tx, rx) = oneshot::channel();
        let request_ctx = child_ctx.clone();
        tokio::spawn(async move {
            let _ = tx.send(request(request_ctx).await);
        });
        receivers.push(rx);
    }

    let mut children = Vec::with_capacity(receivers.len());
    for receiver in receivers {
        tokio::select! {
            result = receiver => match result {
                Ok(Ok(tree)) => children.push(tree),
                Ok(Err(err)) => return Err(err),
                Err(_) => return Err(DomainError::RequestCanceled),
            },
            _ = ctx.cancelled() => return Err(DomainError::RequestCanceled),
        }
    }

    Ok(ExpandNode::intermediate(operation, Some(start), children))
}

/// Reduces children into a union node.
pub(crate) fn expand_any(
    ctx: RequestContext,
    start: ObjectAndRelation,
    requests: Vec<ReduceableExpandFunc>,
) -> BoxFuture<'static, ExpandResult> {
    Box::pin(reduce_set_operation(
        ctx,
        start,
        requests,
        SetOperation::Union,
    ))
}

/// Reduces children into an intersection node.
pub(crate) fn expand_all(
    ctx: RequestContext,
    start: ObjectAndRelation,
    requests: Vec<ReduceableExpandFunc>,
) -> BoxFuture<'static, ExpandResult> {
    Box::pin(reduce_set_operation(
        ctx,
        start,
        requests,
        SetOperation::Intersection,
    ))
}

/// Reduces children into an exclusion node.
pub(crate) fn expand_difference(
    ctx: RequestContext,
    start: ObjectAndRelation,
    requests: Vec<ReduceableExpandFunc>,
) -> BoxFuture<'static, ExpandResult> {
    Box::pin(reduce_set_operation(
        ctx,
        start,
        requests,
        SetOperation::Exclusion,
    ))
}

/// Runs a single deferred expansion to completion, or returns
/// [`DomainError::RequestCanceled`] if the caller's context is cancelled
/// first.
pub(crate) async fn expand_one(ctx: RequestContext, request: ReduceableExpandFunc) -> ExpandResult {
    let (child_ctx, _scope) = ctx.child();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let _ = tx.send(request(child_ctx).await);
    });

    tokio::select! {
        result = rx => result.unwrap_or(Err(DomainError::RequestCanceled)),
        _ = ctx.cancelled() => Err(DomainError::RequestCanceled),
    }
}
