//! HTTP route definitions and handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;

use permtree_domain::graph::{
    Dispatcher, ExpandNode, ExpandRequest, ExpansionMode, RequestContext,
    SetOperation, TupleQuery,
};
use permtree_domain::model::{NamespaceDefinition, ObjectAndRelation, RelationTuple, Revision, ELLIPSIS};
use permtree_domain::namespace::NamespaceManager;
use permtree_storage::{Datastore, TupleUpdate};

use crate::errors::{ApiError, ApiResult};
use crate::token::{decode_revision, encode_revision};

use super::state::AppState;

/// Header carrying the client's depth budget, a decimal string in
/// `[1, 65535]`.
pub const DEPTH_REMAINING_HEADER: &str = "permtree-depth-remaining";

/// Default request body size limit (1MB), protecting against oversized
/// payloads.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Creates the HTTP router with the default body size limit.
pub fn create_router<S: Datastore + 'static>(state: AppState<S>) -> Router {
    create_router_with_body_limit(state, DEFAULT_BODY_LIMIT)
}

/// Creates the HTTP router with a custom body size limit.
pub fn create_router_with_body_limit<S: Datastore + 'static>(
    state: AppState<S>,
    body_limit: usize,
) -> Router {
    let shared_state = Arc::new(state);
    Router::new()
        .route("/v1/expand", post(expand::<S>))
        .route("/v1/read", post(read_tuples::<S>))
        .route("/v1/write", post(write_tuples::<S>))
        .route("/v1/namespaces", post(write_namespace::<S>))
        .route("/health", get(health_check))
        .with_state(shared_state)
        .layer(RequestBodyLimitLayer::new(body_limit))
}

// ============================================================
// Expand
// ============================================================

#[derive(Debug, Deserialize)]
pub struct ExpandRequestBody {
    pub userset: ObjectAndRelation,
    #[serde(default)]
    pub at_revision: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExpandResponseBody {
    pub tree: ExpandNodeBody,
    pub revision: String,
}

/// Wire form of an expansion tree node. Object-and-relation labels and users
/// are rendered as `namespace:object_id#relation` strings.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExpandNodeBody {
    Leaf {
        expanded: Option<String>,
        users: Vec<String>,
    },
    Union {
        expanded: Option<String>,
        children: Vec<ExpandNodeBody>,
    },
    Intersection {
        expanded: Option<String>,
        children: Vec<ExpandNodeBody>,
    },
    Exclusion {
        expanded: Option<String>,
        children: Vec<ExpandNodeBody>,
    },
}

fn expand_node_to_body(node: ExpandNode) -> ExpandNodeBody {
    match node {
        ExpandNode::Leaf { expanded, users } => ExpandNodeBody::Leaf {
            expanded: expanded.map(|onr| onr.to_string()),
            users: users.into_iter().map(|user| user.to_string()).collect(),
        },
        ExpandNode::Intermediate {
            expanded,
            operation,
            children,
        } => {
            let expanded = expanded.map(|onr| onr.to_string());
            let children = children.into_iter().map(expand_node_to_body).collect();
            match operation {
                SetOperation::Union => ExpandNodeBody::Union { expanded, children },
                SetOperation::Intersection => ExpandNodeBody::Intersection { expanded, children },
                SetOperation::Exclusion => ExpandNodeBody::Exclusion { expanded, children },
            }
        }
    }
}

async fn expand<S: Datastore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(body): Json<ExpandRequestBody>,
) -> ApiResult<Json<ExpandResponseBody>> {
    validate_onr(&body.userset)?;
    let depth_remaining = request_depth(&headers, state.default_depth)?;
    let at_revision = pick_best_revision(state.datastore.as_ref(), body.at_revision.as_deref()).await?;

    // The root must be a real named relation; the ellipsis is rejected here.
    state
        .namespaces
        .check_namespace_and_relation(
            &body.userset.namespace,
            &body.userset.relation,
            false,
            at_revision,
        )
        .await?;

    let tree = Arc::clone(&state.dispatcher)
        .expand(
            RequestContext::new(),
            ExpandRequest {
                start: body.userset,
                at_revision,
                depth_remaining,
                mode: ExpansionMode::Shallow,
            },
        )
        .await?;

    Ok(Json(ExpandResponseBody {
        tree: expand_node_to_body(tree),
        revision: encode_revision(at_revision),
    }))
}

// ============================================================
// Read
// ============================================================

#[derive(Debug, Deserialize)]
pub struct ReadRequestBody {
    pub namespace: String,
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub relation: Option<String>,
    #[serde(default)]
    pub at_revision: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReadResponseBody {
    pub tuples: Vec<TupleBody>,
    pub revision: String,
}

#[derive(Debug, Serialize)]
pub struct TupleBody {
    pub object: String,
    pub user: String,
}

async fn read_tuples<S: Datastore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<ReadRequestBody>,
) -> ApiResult<Json<ReadResponseBody>> {
    if body.namespace.is_empty() {
        return Err(ApiError::invalid_argument("namespace must not be empty"));
    }

    // Reads pin to exactly the requested revision, falling back to head.
    let at_revision = match body.at_revision.as_deref() {
        Some(token) => decode_revision(token)
            .map_err(|_| ApiError::invalid_argument("bad request revision"))?,
        None => state.datastore.head_revision().await?,
    };
    state.datastore.check_revision(at_revision).await?;

    match body.relation.as_deref() {
        Some(relation) => {
            state
                .namespaces
                .check_namespace_and_relation(&body.namespace, relation, false, at_revision)
                .await?;
        }
        None => {
            state
                .namespaces
                .check_namespace_and_relation(&body.namespace, ELLIPSIS, true, at_revision)
                .await?;
        }
    }

    let mut query = TupleQuery::new(body.namespace);
    if let Some(object_id) = body.object_id {
        query = query.with_object_id(object_id);
    }
    if let Some(relation) = body.relation {
        query = query.with_relation(relation);
    }

    let tuples = state
        .datastore
        .query_tuples(query, at_revision)
        .await?
        .map(|tuple| TupleBody {
            object: tuple.object.to_string(),
            user: tuple.user.to_string(),
        })
        .collect();

    Ok(Json(ReadResponseBody {
        tuples,
        revision: encode_revision(at_revision),
    }))
}

// ============================================================
// Write
// ============================================================

#[derive(Debug, Deserialize)]
pub struct WriteRequestBody {
    #[serde(default)]
    pub preconditions: Vec<RelationTuple>,
    pub updates: Vec<TupleUpdateBody>,
}

#[derive(Debug, Deserialize)]
pub struct TupleUpdateBody {
    pub operation: UpdateOperation,
    pub tuple: RelationTuple,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOperation {
    Create,
    Touch,
    Delete,
}

#[derive(Debug, Serialize)]
pub struct WriteResponseBody {
    pub revision: String,
}

async fn write_tuples<S: Datastore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<WriteRequestBody>,
) -> ApiResult<Json<WriteResponseBody>> {
    let head = state.datastore.head_revision().await?;

    // Both sides of every tuple must name known namespaces and relations;
    // only the user side may be the ellipsis.
    for update in &body.updates {
        let tuple = &update.tuple;
        state
            .namespaces
            .check_namespace_and_relation(
                &tuple.object.namespace,
                &tuple.object.relation,
                false,
                head,
            )
            .await?;
        state
            .namespaces
            .check_namespace_and_relation(&tuple.user.namespace, &tuple.user.relation, true, head)
            .await?;
    }

    let updates: Vec<TupleUpdate> = body
        .updates
        .into_iter()
        .map(|update| match update.operation {
            UpdateOperation::Create => TupleUpdate::Create(update.tuple),
            UpdateOperation::Touch => TupleUpdate::Touch(update.tuple),
            UpdateOperation::Delete => TupleUpdate::Delete(update.tuple),
        })
        .collect();

    let revision = state
        .datastore
        .write_tuples(&body.preconditions, &updates)
        .await?;
    info!(revision = %revision, updates = updates.len(), "tuples written");

    Ok(Json(WriteResponseBody {
        revision: encode_revision(revision),
    }))
}

// ============================================================
// Namespaces
// ============================================================

async fn write_namespace<S: Datastore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(definition): Json<NamespaceDefinition>,
) -> ApiResult<Json<WriteResponseBody>> {
    let revision = state.datastore.write_namespace(definition).await?;
    Ok(Json(WriteResponseBody {
        revision: encode_revision(revision),
    }))
}

// ============================================================
// Health
// ============================================================

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Helpers
// ============================================================

fn validate_onr(onr: &ObjectAndRelation) -> ApiResult<()> {
    if onr.namespace.is_empty() || onr.object_id.is_empty() || onr.relation.is_empty() {
        return Err(ApiError::invalid_argument(format!(
            "object and relation must be fully specified, got '{onr}'"
        )));
    }
    Ok(())
}

/// Parses the depth header, or falls back to the server default. At most one
/// header value is accepted, and it must be a decimal in `[1, 65535]`.
fn request_depth(headers: &HeaderMap, default_depth: u16) -> ApiResult<u16> {
    let mut values = headers.get_all(DEPTH_REMAINING_HEADER).iter();
    let Some(value) = values.next() else {
        return Ok(default_depth);
    };
    if values.next().is_some() {
        return Err(ApiError::invalid_argument(format!(
            "invalid {DEPTH_REMAINING_HEADER} header"
        )));
    }

    let decoded = value
        .to_str()
        .ok()
        .and_then(|raw| raw.parse::<u16>().ok())
        .filter(|decoded| *decoded >= 1)
        .ok_or_else(|| {
            ApiError::invalid_argument(format!("invalid {DEPTH_REMAINING_HEADER} header"))
        })?;

    Ok(decoded)
}

/// Picks the revision to serve: the newer of the client's requested revision
/// and the store's head, or just the head when the client sent none.
async fn pick_best_revision<S: Datastore>(
    datastore: &S,
    requested: Option<&str>,
) -> ApiResult<Revision> {
    let head = datastore.head_revision().await?;
    match requested {
        Some(token) => {
            let requested = decode_revision(token)
                .map_err(|_| ApiError::invalid_argument("bad request revision"))?;
            Ok(requested.max(head))
        }
        None => Ok(head),
    }
}
