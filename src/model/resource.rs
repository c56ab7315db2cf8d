//! Resource tree.

use std::collections::BTreeMap;

use super::method::{HttpMethod, MethodNode};

/// Path of the root resource.
pub const ROOT_PATH: &str = "/";

/// A path node of the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNode {
    /// Remote id (`dry-run` placeholder for nodes not yet created).
    pub id: String,
    /// Full path, no trailing slash.
    pub path: String,
    /// Parent id; `None` for the root.
    pub parent_id: Option<String>,
    /// Last path segment; empty for the root.
    pub path_part: String,
    /// Methods on this node.
    pub methods: BTreeMap<HttpMethod, MethodNode>,
}

impl ResourceNode {
    /// Creates a node without methods.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        path: impl Into<String>,
        parent_id: Option<String>,
        path_part: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            parent_id,
            path_part: path_part.into(),
            methods: BTreeMap::new(),
        }
    }

    /// Returns true for the root resource.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.path == ROOT_PATH
    }
}

/// Resources of an API keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceTree {
    nodes: BTreeMap<String, ResourceNode>,
}

impl ResourceTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a node.
    pub fn insert(&mut self, node: ResourceNode) {
        self.nodes.insert(node.path.clone(), node);
    }

    /// Looks a node up by path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&ResourceNode> {
        self.nodes.get(path)
    }

    /// Looks a node up by path, mutably.
    pub fn get_mut(&mut self, path: &str) -> Option<&mut ResourceNode> {
        self.nodes.get_mut(path)
    }

    /// The root node, if the tree has one.
    #[must_use]
    pub fn root(&self) -> Option<&ResourceNode> {
        self.nodes.get(ROOT_PATH)
    }

    /// Returns true if any node has `id` as its parent.
    #[must_use]
    pub fn has_children(&self, id: &str) -> bool {
        self.nodes
            .values()
            .any(|node| node.parent_id.as_deref() == Some(id))
    }

    /// Iterates nodes in path order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.values()
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl FromIterator<ResourceNode> for ResourceTree {
    fn from_iter<I: IntoIterator<Item = ResourceNode>>(iter: I) -> Self {
        let mut tree = Self::new();
        for node in iter {
            tree.insert(node);
        }
        tree
    }
}

/// Joins a parent path and a segment.
#[must_use]
pub fn child_path(parent: &str, segment: &str) -> String {
    if parent == ROOT_PATH {
        format!("/{segment}")
    } else {
        format!("{parent}/{segment}")
    }
}
