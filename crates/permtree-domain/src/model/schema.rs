//! Namespace definitions and the userset rewrite algebra.

use serde::{Deserialize, Serialize};

/// A namespace (object type) definition: a name plus its relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceDefinition {
    /// The namespace name (e.g. "folder", "document").
    pub name: String,
    /// Relations defined on this namespace.
    pub relations: Vec<RelationDefinition>,
}

impl NamespaceDefinition {
    /// Creates a new namespace definition.
    pub fn new(name: impl Into<String>, relations: Vec<RelationDefinition>) -> Self {
        Self {
            name: name.into(),
            relations,
        }
    }

    /// Looks up a relation by name.
    pub fn relation(&self, name: &str) -> Option<&RelationDefinition> {
        self.relations.iter().find(|r| r.name == name)
    }
}

/// A relation definition on a namespace.
///
/// A relation without a rewrite is *direct*: its members are exactly the
/// tuples stored for it. With a rewrite, membership is computed by the
/// rewrite expression instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDefinition {
    /// The relation name.
    pub name: String,
    /// The userset rewrite computing this relation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<UsersetRewrite>,
}

impl RelationDefinition {
    /// Creates a direct relation backed only by stored tuples.
    pub fn direct(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rewrite: None,
        }
    }

    /// Creates a relation computed by a rewrite expression.
    pub fn with_rewrite(name: impl Into<String>, rewrite: UsersetRewrite) -> Self {
        Self {
            name: name.into(),
            rewrite: Some(rewrite),
        }
    }
}

/// A userset rewrite expression: set algebra over rewrite children.
///
/// Children are ordered; the expansion engine preserves this order in the
/// trees it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsersetRewrite {
    /// Members of any child.
    Union(Vec<RewriteChild>),
    /// Members of every child.
    Intersection(Vec<RewriteChild>),
    /// Members of the first child minus members of the rest.
    Exclusion(Vec<RewriteChild>),
}

/// One arm of a set operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteChild {
    /// The tuples stored directly for this relation.
    This,
    /// Pivot to another relation, normally on the same object.
    ComputedUserset(ComputedUserset),
    /// Walk the tuples of `tupleset`, then apply `computed_userset` to each
    /// subject found.
    TupleToUserset {
        tupleset: String,
        computed_userset: ComputedUserset,
    },
    /// A nested rewrite on the same relation.
    Rewrite(Box<UsersetRewrite>),
}

/// A relation pivot, with the object it resolves against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedUserset {
    /// The relation to pivot to.
    pub relation: String,
    /// How the target object is chosen.
    #[serde(default)]
    pub object: ComputedObject,
}

impl ComputedUserset {
    /// Pivot on the same object as the enclosing expansion.
    pub fn relation(relation: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            object: ComputedObject::TupleObject,
        }
    }

    /// Pivot on the subject of a tupleset tuple. Only meaningful inside a
    /// [`RewriteChild::TupleToUserset`] arm.
    pub fn on_tupleset_user(relation: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            object: ComputedObject::TupleUsersetObject,
        }
    }
}

/// Object-resolution mode for a computed userset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputedObject {
    /// Resolve against the object under expansion.
    #[default]
    TupleObject,
    /// Resolve against the subject of the tupleset tuple that produced this
    /// pivot.
    TupleUsersetObject,
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_relation_lookup() {
        let ns = folder_namespace();
        assert!(ns.relation("owner").is_some());
        assert!(ns.relation("owner").unwrap().rewrite.is_none());
        assert!(ns.relation("editor").unwrap().rewrite.is_some());
        assert!(ns.relation("missing").is_none());
    }

    #[test]
    fn test_namespace_json_shape() {
        // Namespace configs are accepted over the wire; the rewrite algebra
        // must stay readable in JSON form.
        let ns = folder_namespace();
        let json = serde_json::to_value(&ns).unwrap();
        assert_eq!(json["name"], "folder");
        assert_eq!(json["relations"][0]["name"], "owner");
        assert!(json["relations"][0].get("rewrite").is_none());
        assert_eq!(json["relations"][1]["rewrite"]["union"][0], "this");
    }

    #[test]
    fn test_computed_object_defaults_to_tuple_object() {
        let parsed: ComputedUserset =
            serde_json::from_value(serde_json::json!({ "relation": "viewer" })).unwrap();
        assert_eq!(parsed.object, ComputedObject::TupleObject);
    }
}
