//! The expansion result tree.

use std::fmt;

use crate::model::ObjectAndRelation;

/// The set operation an intermediate node applies to its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperation {
    Union,
    Intersection,
    Exclusion,
}

/// A node in an expansion tree.
///
/// The `expanded` label records which `(object, relation)` a subtree answers.
/// It is absent on leaves produced by a `_this` arm nested inside a rewrite:
/// the enclosing intermediate already carries the label, and an unlabelled
/// leaf is how consumers recognise the direct-tuples contribution inside a
/// composite.
///
/// Trees are built bottom-up and never mutated afterwards; equality is
/// structural. Child order follows the rewrite expression's source order, and
/// user order inside a leaf follows the tuple query's iteration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandNode {
    /// Users found directly, terminal subjects first.
    Leaf {
        expanded: Option<ObjectAndRelation>,
        users: Vec<ObjectAndRelation>,
    },
    /// A set operation over child subtrees. An empty child list is legal and
    /// means "no contributors".
    Intermediate {
        expanded: Option<ObjectAndRelation>,
        operation: SetOperation,
        children: Vec<ExpandNode>,
    },
}

impl ExpandNode {
    /// Creates a leaf node.
    pub fn leaf(expanded: Option<ObjectAndRelation>, users: Vec<ObjectAndRelation>) -> Self {
        ExpandNode::Leaf { expanded, users }
    }

    /// Creates an intermediate node.
    pub fn intermediate(
        operation: SetOperation,
        expanded: Option<ObjectAndRelation>,
        children: Vec<ExpandNode>,
    ) -> Self {
        ExpandNode::Intermediate {
            expanded,
            operation,
            children,
        }
    }

    /// Creates a union node labelled with the expanded start.
    pub fn union(expanded: ObjectAndRelation, children: Vec<ExpandNode>) -> Self {
        Self::intermediate(SetOperation::Union, Some(expanded), children)
    }

    /// Creates an intersection node labelled with the expanded start.
    pub fn intersection(expanded: ObjectAndRelation, children: Vec<ExpandNode>) -> Self {
        Self::intermediate(SetOperation::Intersection, Some(expanded), children)
    }

    /// Creates an exclusion node labelled with the expanded start.
    pub fn exclusion(expanded: ObjectAndRelation, children: Vec<ExpandNode>) -> Self {
        Self::intermediate(SetOperation::Exclusion, Some(expanded), children)
    }

    /// The `(object, relation)` this subtree answers, if labelled.
    pub fn expanded(&self) -> Option<&ObjectAndRelation> {
        match self {
            ExpandNode::Leaf { expanded, .. } => expanded.as_ref(),
            ExpandNode::Intermediate { expanded, .. } => expanded.as_ref(),
        }
    }
}

/// Canonical rendering used in test diagnostics: `U(...)`, `I(...)`, `E(...)`
/// for intermediates, `Leaf(...)` with `User(...)` entries, `_` for an absent
/// label.
impl fmt::Display for ExpandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn label(expanded: &Option<ObjectAndRelation>) -> String {
            match expanded {
                Some(onr) => onr.to_string(),
                None => "_".to_string(),
            }
        }

        match self {
            ExpandNode::Leaf { expanded, users } => {
                write!(f, "Leaf({}", label(expanded))?;
                for user in users {
                    write!(f, ", User({user})")?;
                }
                write!(f, ")")
            }
            ExpandNode::Intermediate {
                expanded,
                operation,
                children,
            } => {
                let name = match operation {
                    SetOperation::Union => "U",
                    SetOperation::Intersection => "I",
                    SetOperation::Exclusion => "E",
                };
                write!(f, "{name}({}", label(expanded))?;
                for child in children {
                    write!(f, ", {child}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn onr(namespace: &str, object_id: &str, relation: &str) -> ObjectAndRelation {
        ObjectAndRelation::new(namespace, object_id, relation)
    }

    #[test]
    fn test_structural_equality() {
        let left = ExpandNode::union(
            onr("folder", "company", "editor"),
            vec![
                ExpandNode::leaf(None, vec![]),
                ExpandNode::leaf(
                    Some(onr("folder", "company", "owner")),
                    vec![ObjectAndRelation::terminal("user", "owner")],
                ),
            ],
        );
        let right = ExpandNode::union(
            onr("folder", "company", "editor"),
            vec![
                ExpandNode::leaf(None, vec![]),
                ExpandNode::leaf(
                    Some(onr("folder", "company", "owner")),
                    vec![ObjectAndRelation::terminal("user", "owner")],
                ),
            ],
        );
        assert_eq!(left, right);

        // Child order is part of the structure.
        let reordered = ExpandNode::union(
            onr("folder", "company", "editor"),
            vec![
                ExpandNode::leaf(
                    Some(onr("folder", "company", "owner")),
                    vec![ObjectAndRelation::terminal("user", "owner")],
                ),
                ExpandNode::leaf(None, vec![]),
            ],
        );
        assert_ne!(left, reordered);
    }

    #[test]
    fn test_canonical_display() {
        let tree = ExpandNode::union(
            onr("folder", "company", "viewer"),
            vec![
                ExpandNode::leaf(
                    None,
                    vec![
                        ObjectAndRelation::terminal("user", "legal"),
                        onr("folder", "auditors", "viewer"),
                    ],
                ),
                ExpandNode::union(onr("folder", "company", "viewer"), vec![]),
            ],
        );
        assert_eq!(
            tree.to_string(),
            "U(folder:company#viewer, \
             Leaf(_, User(user:legal#...), User(folder:auditors#viewer)), \
             U(folder:company#viewer))"
        );
    }

    #[test]
    fn test_empty_intermediate_is_legal() {
        let node = ExpandNode::intersection(onr("folder", "x", "viewer"), vec![]);
        match node {
            ExpandNode::Intermediate { ref children, .. } => assert!(children.is_empty()),
            _ => panic!("expected intermediate"),
        }
    }
}
