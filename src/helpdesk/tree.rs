//! Dialogue tree model and loader

use super::node::{Branch, Node, NodeId};
use crate::transport::RoleId;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Failed to read helpdesk model: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid YAML helpdesk model: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid JSON helpdesk model: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported helpdesk model format: {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),
    #[error("Helpdesk model has no \"root\" node")]
    MissingRoot,
    #[error("Duplicate node id: {0}")]
    DuplicateNode(NodeId),
}

/// A branch whose target is not a node of the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingBranch {
    pub from: NodeId,
    pub index: usize,
    pub target: NodeId,
}

/// Node as written in a model file; the id is the map key
#[derive(Debug, Deserialize)]
struct RawNode {
    title: String,
    #[serde(default)]
    branches: Vec<RawBranch>,
    #[serde(default)]
    role_id: Option<RoleId>,
}

#[derive(Debug, Deserialize)]
struct RawBranch {
    target: NodeId,
    #[serde(alias = "message")]
    label: String,
}

/// Immutable mapping from node id to node. Always contains `root`.
#[derive(Debug, Clone)]
pub struct DialogueTree {
    nodes: HashMap<NodeId, Node>,
}

impl DialogueTree {
    /// Build a tree from nodes. Fails without a root node or on duplicate ids.
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Result<Self, TreeError> {
        let mut map = HashMap::new();
        for node in nodes {
            if map.contains_key(&node.id) {
                return Err(TreeError::DuplicateNode(node.id));
            }
            map.insert(node.id.clone(), node);
        }
        if !map.contains_key(&NodeId::root()) {
            return Err(TreeError::MissingRoot);
        }

        let tree = Self { nodes: map };
        for dangling in tree.dangling_branches() {
            tracing::warn!(
                node = %dangling.from,
                branch = dangling.index,
                target = %dangling.target,
                "Helpdesk branch points at a node that does not exist"
            );
        }
        Ok(tree)
    }

    /// Load a model file; the format is picked by extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TreeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let tree = match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml(&text)?,
            "json" => Self::from_json(&text)?,
            _ => return Err(TreeError::UnsupportedFormat(path.display().to_string())),
        };
        tracing::info!(path = %path.display(), nodes = tree.len(), "Loaded helpdesk model");
        Ok(tree)
    }

    pub fn from_yaml(text: &str) -> Result<Self, TreeError> {
        let raw: BTreeMap<NodeId, RawNode> = serde_yaml::from_str(text)?;
        Self::from_raw(raw)
    }

    pub fn from_json(text: &str) -> Result<Self, TreeError> {
        let raw: BTreeMap<NodeId, RawNode> = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: BTreeMap<NodeId, RawNode>) -> Result<Self, TreeError> {
        Self::from_nodes(raw.into_iter().map(|(id, node)| Node {
            id,
            title: node.title,
            branches: node
                .branches
                .into_iter()
                .map(|b| Branch {
                    target: b.target,
                    label: b.label,
                })
                .collect(),
            role_id: node.role_id,
        }))
    }

    pub fn lookup(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// The entry node. Present by construction.
    pub fn root(&self) -> &Node {
        &self.nodes[&NodeId::root()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every branch whose target is missing, ordered by node id then index
    pub fn dangling_branches(&self) -> Vec<DanglingBranch> {
        let mut ids: Vec<&NodeId> = self.nodes.keys().collect();
        ids.sort();

        ids.into_iter()
            .flat_map(|id| {
                self.nodes[id]
                    .branches
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| !self.nodes.contains_key(&b.target))
                    .map(move |(index, b)| DanglingBranch {
                        from: id.clone(),
                        index,
                        target: b.target.clone(),
                    })
            })
            .collect()
    }
}
