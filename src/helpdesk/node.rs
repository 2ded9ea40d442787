//! Tree vertices and their out-edges

use crate::transport::RoleId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the node every conversation starts at
pub const ROOT_ID: &str = "root";

/// Stable node identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn root() -> Self {
        Self(ROOT_ID.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ID
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One labeled out-edge of a node. Its position in the node's branch list
/// is the number the user types to follow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub target: NodeId,
    pub label: String,
}

impl Branch {
    pub fn new(target: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            label: label.into(),
        }
    }
}

/// A vertex of the decision tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub title: String,
    pub branches: Vec<Branch>,
    /// Role granted (temporarily) to a user reaching this node
    pub role_id: Option<RoleId>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            branches: Vec::new(),
            role_id: None,
        }
    }

    #[must_use]
    pub fn with_branch(mut self, target: impl Into<NodeId>, label: impl Into<String>) -> Self {
        self.branches.push(Branch::new(target, label));
        self
    }

    #[must_use]
    pub fn with_role(mut self, role_id: impl Into<RoleId>) -> Self {
        self.role_id = Some(role_id.into());
        self
    }

    pub fn is_root(&self) -> bool {
        self.id.is_root()
    }
}
