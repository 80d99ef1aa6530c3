//! End-to-end API flow: configure a schema, write tuples, expand.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use permtree_api::http::{create_router, AppState};
use permtree_storage::MemoryDatastore;

async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn tuple_json(
    object: (&str, &str, &str),
    user: (&str, &str, &str),
) -> serde_json::Value {
    serde_json::json!({
        "object": { "namespace": object.0, "object_id": object.1, "relation": object.2 },
        "user": { "namespace": user.0, "object_id": user.1, "relation": user.2 },
    })
}

/// The folder schema in wire form: owner and parent are direct, editor and
/// viewer are rewrites, viewer walking `parent` to the parent's viewer.
fn folder_namespace_json(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "relations": [
            { "name": "owner" },
            { "name": "parent" },
            {
                "name": "editor",
                "rewrite": { "union": [
                    "this",
                    { "computed_userset": { "relation": "owner" } },
                ]},
            },
            {
                "name": "viewer",
                "rewrite": { "union": [
                    "this",
                    { "computed_userset": { "relation": "editor" } },
                    { "tuple_to_userset": {
                        "tupleset": "parent",
                        "computed_userset": { "relation": "viewer", "object": "tuple_userset_object" },
                    }},
                ]},
            },
        ],
    })
}

async fn configured_app() -> (Router, String) {
    let state = AppState::new(MemoryDatastore::new_shared());
    let app = create_router(state);

    for namespace in [
        serde_json::json!({ "name": "user", "relations": [] }),
        folder_namespace_json("folder"),
    ] {
        let (status, _body) = post_json(&app, "/v1/namespaces", namespace).await;
        assert_eq!(status, StatusCode::OK);
    }

    let updates: Vec<serde_json::Value> = [
        tuple_json(("folder", "company", "owner"), ("user", "owner", "...")),
        tuple_json(("folder", "company", "viewer"), ("user", "legal", "...")),
        tuple_json(
            ("folder", "company", "viewer"),
            ("folder", "auditors", "viewer"),
        ),
        tuple_json(("folder", "auditors", "viewer"), ("user", "auditor", "...")),
        tuple_json(("folder", "strategy", "parent"), ("folder", "company", "...")),
    ]
    .into_iter()
    .map(|tuple| serde_json::json!({ "operation": "create", "tuple": tuple }))
    .collect();

    let (status, body) = post_json(&app, "/v1/write", serde_json::json!({ "updates": updates })).await;
    assert_eq!(status, StatusCode::OK);
    let revision = body["revision"].as_str().unwrap().to_string();

    (app, revision)
}

async fn expand(app: &Router, object_id: &str, relation: &str, at_revision: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "userset": { "namespace": "folder", "object_id": object_id, "relation": relation },
    });
    if let Some(token) = at_revision {
        body["at_revision"] = serde_json::json!(token);
    }
    let (status, json) = post_json(app, "/v1/expand", body).await;
    assert_eq!(status, StatusCode::OK, "expand failed: {json}");
    json
}

#[tokio::test]
async fn test_expand_composite_viewer_tree() {
    let (app, revision) = configured_app().await;

    let json = expand(&app, "company", "viewer", Some(&revision)).await;
    assert_eq!(json["revision"], serde_json::json!(revision));

    let tree = &json["tree"];
    assert_eq!(tree["type"], "union");
    assert_eq!(tree["expanded"], "folder:company#viewer");

    let children = tree["children"].as_array().unwrap();
    assert_eq!(children.len(), 3);

    // Direct contribution: unlabelled leaf, terminals before non-terminals.
    assert_eq!(children[0]["type"], "leaf");
    assert!(children[0]["expanded"].is_null());
    assert_eq!(
        children[0]["users"],
        serde_json::json!(["user:legal#...", "folder:auditors#viewer"])
    );

    // Editor arm: its own labelled union.
    assert_eq!(children[1]["type"], "union");
    assert_eq!(children[1]["expanded"], "folder:company#editor");

    // Tupleset arm: company has no parent, so the union is vacuous.
    assert_eq!(children[2]["type"], "union");
    assert_eq!(children[2]["expanded"], "folder:company#viewer");
    assert_eq!(children[2]["children"], serde_json::json!([]));
}

#[tokio::test]
async fn test_expand_walks_the_parent_folder() {
    let (app, _revision) = configured_app().await;

    // folder:strategy has folder:company as parent; its viewer tree embeds
    // the company viewer expansion under the tupleset arm.
    let json = expand(&app, "strategy", "viewer", None).await;
    let tupleset_arm = &json["tree"]["children"][2];
    assert_eq!(tupleset_arm["type"], "union");
    let embedded = &tupleset_arm["children"][0];
    assert_eq!(embedded["expanded"], "folder:company#viewer");
    assert_eq!(
        embedded["children"][0]["users"],
        serde_json::json!(["user:legal#...", "folder:auditors#viewer"])
    );
}

#[tokio::test]
async fn test_read_at_an_old_revision_ignores_later_writes() {
    let (app, revision) = configured_app().await;

    // A later write adds another direct viewer.
    let (status, _body) = post_json(
        &app,
        "/v1/write",
        serde_json::json!({
            "updates": [{
                "operation": "create",
                "tuple": tuple_json(("folder", "company", "viewer"), ("user", "intern", "...")),
            }],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Reading through /v1/read at the old revision shows the old state.
    let (status, json) = post_json(
        &app,
        "/v1/read",
        serde_json::json!({
            "namespace": "folder",
            "object_id": "company",
            "relation": "viewer",
            "at_revision": revision,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["tuples"].as_array().unwrap().len(), 2);
}
