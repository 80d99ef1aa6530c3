//! The concurrent expander: turns a relation's rewrite into deferred child
//! expansions and composes their results.

use std::sync::Arc;

use tracing::trace;

use crate::error::DomainError;
use crate::model::{
    ComputedObject, ComputedUserset, RelationDefinition, RelationTuple, RewriteChild,
    UsersetRewrite,
};

use super::dispatch::Dispatcher;
use super::reduce::{expand_all, expand_any, expand_difference};
use super::traits::{direct_query, GraphDatastore};
use super::tree::{ExpandNode, SetOperation};
use super::types::{ExpandReducer, ExpandRequest, ExpansionMode, ReduceableExpandFunc};

/// Whether the start ONR labels the leaf a direct expansion produces.
///
/// A `_this` arm nested inside a rewrite excludes the start: the enclosing
/// intermediate already carries the label, and consumers rely on the
/// unlabelled leaf to spot the direct-tuples contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StartInclusion {
    Include,
    Exclude,
}

/// Expands rewrites into deferred child expansions, reading tuples at the
/// request's pinned revision and routing every sub-expansion through the
/// dispatcher.
pub(crate) struct ConcurrentExpander<D> {
    dispatcher: Arc<dyn Dispatcher>,
    datastore: Arc<D>,
}

impl<D> Clone for ConcurrentExpander<D> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            datastore: Arc::clone(&self.datastore),
        }
    }
}

impl<D: GraphDatastore + 'static> ConcurrentExpander<D> {
    pub(crate) fn new(dispatcher: Arc<dyn Dispatcher>, datastore: Arc<D>) -> Self {
        Self {
            dispatcher,
            datastore,
        }
    }

    /// Entry point: a relation without a rewrite is read directly; otherwise
    /// the rewrite decides.
    pub(crate) fn expand(
        &self,
        req: &ExpandRequest,
        relation: &RelationDefinition,
    ) -> ReduceableExpandFunc {
        trace!(start = %req.start, "expand");
        match &relation.rewrite {
            None => self.expand_direct(req.clone(), StartInclusion::Include),
            Some(rewrite) => self.expand_userset_rewrite(req, rewrite),
        }
    }

    /// Expands the tuples stored directly under the request's start.
    ///
    /// Subjects are partitioned into terminals and non-terminals. In shallow
    /// mode, or when no non-terminal was found, the result is a single leaf
    /// holding terminals followed by non-terminals. In recursive mode each
    /// non-terminal is dispatched as a sub-expansion and the results form a
    /// union, with the direct leaf riding along as the final member.
    fn expand_direct(
        &self,
        req: ExpandRequest,
        start_behavior: StartInclusion,
    ) -> ReduceableExpandFunc {
        trace!(start = %req.start, "direct");
        let expander = self.clone();
        Box::new(move |ctx| {
            Box::pin(async move {
                let it = expander
                    .datastore
                    .query_tuples(direct_query(&req.start), req.at_revision)
                    .await?;

                let mut terminal_users = Vec::new();
                let mut non_terminal_users = Vec::new();
                for tuple in it {
                    if tuple.user.is_terminal() {
                        terminal_users.push(tuple.user);
                    } else {
                        non_terminal_users.push(tuple.user);
                    }
                }

                let start = match start_behavior {
                    StartInclusion::Include => Some(req.start.clone()),
                    StartInclusion::Exclude => None,
                };

                // Shallow expansion, or nothing further to dereference.
                if req.mode != ExpansionMode::Recursive || non_terminal_users.is_empty() {
                    let mut users = terminal_users;
                    users.extend(non_terminal_users);
                    return Ok(ExpandNode::leaf(start, users));
                }

                let mut requests_to_dispatch: Vec<ReduceableExpandFunc> =
                    Vec::with_capacity(non_terminal_users.len() + 1);
                for non_terminal in &non_terminal_users {
                    requests_to_dispatch.push(expander.dispatch(ExpandRequest {
                        start: non_terminal.clone(),
                        at_revision: req.at_revision,
                        depth_remaining: req.depth_remaining - 1,
                        mode: req.mode,
                    }));
                }

                // The direct leaf joins the union as its final member, so the
                // tree arrives fully formed.
                let mut users = terminal_users;
                users.extend(non_terminal_users);
                let direct_leaf = ExpandNode::leaf(start, users);
                requests_to_dispatch
                    .push(Box::new(move |_ctx| Box::pin(async move { Ok(direct_leaf) })));

                expand_any(ctx, req.start, requests_to_dispatch).await
            })
        })
    }

    fn expand_userset_rewrite(
        &self,
        req: &ExpandRequest,
        rewrite: &UsersetRewrite,
    ) -> ReduceableExpandFunc {
        match rewrite {
            UsersetRewrite::Union(children) => {
                trace!("union");
                self.expand_set_operation(req, children, SetOperation::Union)
            }
            UsersetRewrite::Intersection(children) => {
                trace!("intersection");
                self.expand_set_operation(req, children, SetOperation::Intersection)
            }
            UsersetRewrite::Exclusion(children) => {
                trace!("exclusion");
                self.expand_set_operation(req, children, SetOperation::Exclusion)
            }
        }
    }

    /// Builds the deferred child list for a set operation without executing
    /// anything; the returned closure hands the whole list to the reducer.
    fn expand_set_operation(
        &self,
        req: &ExpandRequest,
        children: &[RewriteChild],
        operation: SetOperation,
    ) -> ReduceableExpandFunc {
        let mut requests: Vec<ReduceableExpandFunc> = Vec::with_capacity(children.len());
        for child in children {
            match child {
                RewriteChild::This => {
                    requests.push(self.expand_direct(req.clone(), StartInclusion::Exclude));
                }
                RewriteChild::ComputedUserset(computed) => {
                    requests.push(self.expand_computed_userset(req, computed, None));
                }
                RewriteChild::TupleToUserset {
                    tupleset,
                    computed_userset,
                } => {
                    requests.push(self.expand_tuple_to_userset(req, tupleset, computed_userset));
                }
                // Nested rewrites describe the same relation; they recurse
                // without consuming depth.
                RewriteChild::Rewrite(inner) => {
                    requests.push(self.expand_userset_rewrite(req, inner));
                }
            }
        }

        let reducer: ExpandReducer = match operation {
            SetOperation::Union => expand_any,
            SetOperation::Intersection => expand_all,
            SetOperation::Exclusion => expand_difference,
        };
        let start = req.start.clone();
        Box::new(move |ctx| reducer(ctx, start, requests))
    }

    fn dispatch(&self, req: ExpandRequest) -> ReduceableExpandFunc {
        let dispatcher = Arc::clone(&self.dispatcher);
        Box::new(move |ctx| {
            Box::pin(async move {
                trace!(start = %req.start, depth_remaining = req.depth_remaining, "dispatch expand");
                dispatcher.expand(ctx, req).await
            })
        })
    }

    /// Pivots to another relation. The target object is the request's own
    /// object, or, inside a tupleset arm, the subject of the tuple that
    /// produced this pivot. A tupleset pivot without its tuple is a schema or
    /// engine bug and must fail the expansion rather than produce a partial
    /// tree.
    fn expand_computed_userset(
        &self,
        req: &ExpandRequest,
        computed: &ComputedUserset,
        tpl: Option<&RelationTuple>,
    ) -> ReduceableExpandFunc {
        trace!(relation = %computed.relation, "computed userset");
        let start = match computed.object {
            ComputedObject::TupleUsersetObject => match tpl {
                Some(tpl) => tpl.user.clone(),
                None => {
                    let message =
                        "computed userset resolved against a tupleset subject without a tuple"
                            .to_string();
                    return Box::new(move |_ctx| {
                        Box::pin(async move { Err(DomainError::AlwaysFail { message }) })
                    });
                }
            },
            ComputedObject::TupleObject => match tpl {
                Some(tpl) => tpl.object.clone(),
                None => req.start.clone(),
            },
        };

        self.dispatch(ExpandRequest {
            start: start.with_relation(computed.relation.as_str()),
            at_revision: req.at_revision,
            depth_remaining: req.depth_remaining - 1,
            mode: req.mode,
        })
    }

    /// Walks the tuples of the tupleset relation, pivoting each subject found
    /// through the computed userset, and unions the results. An empty
    /// tupleset yields an empty union.
    fn expand_tuple_to_userset(
        &self,
        req: &ExpandRequest,
        tupleset: &str,
        computed_userset: &ComputedUserset,
    ) -> ReduceableExpandFunc {
        let expander = self.clone();
        let req = req.clone();
        let tupleset = tupleset.to_string();
        let computed_userset = computed_userset.clone();
        Box::new(move |ctx| {
            Box::pin(async move {
                let query = direct_query(&req.start).with_relation(tupleset);
                let it = expander
                    .datastore
                    .query_tuples(query, req.at_revision)
                    .await?;

                let mut requests_to_dispatch: Vec<ReduceableExpandFunc> = Vec::new();
                for tpl in it {
                    requests_to_dispatch.push(expander.expand_computed_userset(
                        &req,
                        &computed_userset,
                        Some(&tpl),
                    ));
                }

                expand_any(ctx, req.start, requests_to_dispatch).await
            })
        })
    }
}
