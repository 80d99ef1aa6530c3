//! End-to-end revision pinning: expansions against the versioned store see
//! exactly the snapshot they were pinned to.

use std::sync::Arc;

use permtree_domain::graph::{
    Dispatcher, ExpandNode, ExpandRequest, ExpansionMode, LocalDispatcher, RequestContext,
};
use permtree_domain::model::{
    ComputedUserset, NamespaceDefinition, ObjectAndRelation, RelationDefinition, RelationTuple,
    RewriteChild, Revision, UsersetRewrite,
};
use permtree_domain::namespace::CachingNamespaceManager;
use permtree_storage::{Datastore, MemoryDatastore, TupleUpdate};

fn onr(namespace: &str, object_id: &str, relation: &str) -> ObjectAndRelation {
    ObjectAndRelation::new(namespace, object_id, relation)
}

fn subject(namespace: &str, object_id: &str) -> ObjectAndRelation {
    ObjectAndRelation::terminal(namespace, object_id)
}

fn folder_namespace() -> NamespaceDefinition {
    NamespaceDefinition::new(
        "folder",
        vec![
            RelationDefinition::direct("owner"),
            RelationDefinition::with_rewrite(
                "editor",
                UsersetRewrite::Union(vec![
                    RewriteChild::This,
                    RewriteChild::ComputedUserset(ComputedUserset::relation("owner")),
                ]),
            ),
        ],
    )
}

async fn expand_at(
    datastore: &Arc<MemoryDatastore>,
    start: ObjectAndRelation,
    revision: Revision,
) -> ExpandNode {
    let namespaces = Arc::new(CachingNamespaceManager::new(Arc::clone(datastore)));
    let dispatcher = LocalDispatcher::new(namespaces, Arc::clone(datastore));
    dispatcher
        .expand(
            RequestContext::new(),
            ExpandRequest {
                start,
                at_revision: revision,
                depth_remaining: 50,
                mode: ExpansionMode::Recursive,
            },
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_expansion_sees_only_the_pinned_snapshot() {
    let datastore = MemoryDatastore::new_shared();
    datastore.write_namespace(folder_namespace()).await.unwrap();

    let with_alice = datastore
        .write_tuples(
            &[],
            &[TupleUpdate::Create(RelationTuple::new(
                onr("folder", "company", "owner"),
                subject("user", "alice"),
            ))],
        )
        .await
        .unwrap();
    let with_bob = datastore
        .write_tuples(
            &[],
            &[TupleUpdate::Create(RelationTuple::new(
                onr("folder", "company", "owner"),
                subject("user", "bob"),
            ))],
        )
        .await
        .unwrap();

    let old_tree = expand_at(&datastore, onr("folder", "company", "owner"), with_alice).await;
    assert_eq!(
        old_tree,
        ExpandNode::leaf(
            Some(onr("folder", "company", "owner")),
            vec![subject("user", "alice")],
        )
    );

    let new_tree = expand_at(&datastore, onr("folder", "company", "owner"), with_bob).await;
    assert_eq!(
        new_tree,
        ExpandNode::leaf(
            Some(onr("folder", "company", "owner")),
            vec![subject("user", "alice"), subject("user", "bob")],
        )
    );

    // The older expansion is reproducible after newer writes: same request,
    // same revision, same tree.
    let replayed = expand_at(&datastore, onr("folder", "company", "owner"), with_alice).await;
    assert_eq!(replayed, old_tree);
}

#[tokio::test]
async fn test_rewrite_expansion_through_the_versioned_store() {
    let datastore = MemoryDatastore::new_shared();
    datastore.write_namespace(folder_namespace()).await.unwrap();
    let revision = datastore
        .write_tuples(
            &[],
            &[
                TupleUpdate::Create(RelationTuple::new(
                    onr("folder", "company", "owner"),
                    subject("user", "alice"),
                )),
                TupleUpdate::Create(RelationTuple::new(
                    onr("folder", "company", "editor"),
                    subject("user", "carol"),
                )),
            ],
        )
        .await
        .unwrap();

    let tree = expand_at(&datastore, onr("folder", "company", "editor"), revision).await;
    assert_eq!(
        tree,
        ExpandNode::union(
            onr("folder", "company", "editor"),
            vec![
                ExpandNode::leaf(None, vec![subject("user", "carol")]),
                ExpandNode::leaf(
                    Some(onr("folder", "company", "owner")),
                    vec![subject("user", "alice")],
                ),
            ],
        )
    );
}

#[tokio::test]
async fn test_schema_changes_are_versioned_too() {
    let datastore = MemoryDatastore::new_shared();

    // First schema version: owner only.
    datastore
        .write_namespace(NamespaceDefinition::new(
            "folder",
            vec![RelationDefinition::direct("owner")],
        ))
        .await
        .unwrap();
    let before = datastore
        .write_tuples(
            &[],
            &[TupleUpdate::Create(RelationTuple::new(
                onr("folder", "company", "owner"),
                subject("user", "alice"),
            ))],
        )
        .await
        .unwrap();

    // Second schema version adds the editor rewrite.
    let after = datastore.write_namespace(folder_namespace()).await.unwrap();

    // At the old revision the editor relation does not exist yet.
    let namespaces = Arc::new(CachingNamespaceManager::new(Arc::clone(&datastore)));
    let dispatcher = LocalDispatcher::new(namespaces, Arc::clone(&datastore));
    let result = Arc::clone(&dispatcher)
        .expand(
            RequestContext::new(),
            ExpandRequest {
                start: onr("folder", "company", "editor"),
                at_revision: before,
                depth_remaining: 50,
                mode: ExpansionMode::Shallow,
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(permtree_domain::DomainError::UnknownRelation { .. })
    ));

    // At the new revision it expands.
    let tree = dispatcher
        .expand(
            RequestContext::new(),
            ExpandRequest {
                start: onr("folder", "company", "editor"),
                at_revision: after,
                depth_remaining: 50,
                mode: ExpansionMode::Shallow,
            },
        )
        .await
        .unwrap();
    assert_eq!(
        tree,
        ExpandNode::union(
            onr("folder", "company", "editor"),
            vec![
                ExpandNode::leaf(None, vec![]),
                ExpandNode::leaf(
                    Some(onr("folder", "company", "owner")),
                    vec![subject("user", "alice")],
                ),
            ],
        )
    );
}
