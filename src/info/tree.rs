/*
 * Copyright 2019-2020 Wren Powell
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use crate::error::{Error, Result};
use crate::vrl::Vrl;

/// The scheme of locators in the info tree.
pub const INFO_SCHEME: &str = "info";

/// The name of the built-in node which exposes the context configuration.
pub const CONFIG_NODE_NAME: &str = "config";

/// The ID of a node in an [`InfoTree`].
///
/// IDs are never reused, so an ID of a removed node stays invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// The kind of an info node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The root of the tree. There is exactly one.
    Root,

    /// A folder which holds other nodes.
    Folder,

    /// A link to a resource elsewhere.
    Link {
        target: Vrl,
        icon: Option<String>,
    },

    /// The node which exposes the configuration of the context.
    Config,
}

impl NodeKind {
    /// A short name for this kind of node.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Folder => "folder",
            NodeKind::Link { .. } => "link",
            NodeKind::Config => "config",
        }
    }

    /// Whether nodes of this kind can have children.
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::Folder)
    }
}

/// A node in an [`InfoTree`].
#[derive(Debug, Clone)]
pub struct InfoNode {
    name: String,
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl InfoNode {
    /// The name of this node, unique among its siblings.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The kind of this node.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The parent of this node, or `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The children of this node, in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// An in-memory hierarchy of folders and links.
///
/// Nodes live in an arena and refer to each other by [`NodeId`], so a parent owns its children
/// and children only hold the ID of their parent. The tree can't contain cycles because nodes
/// are only ever attached to a parent when they are created.
#[derive(Debug, Clone)]
pub struct InfoTree {
    nodes: Vec<Option<InfoNode>>,
}

impl Default for InfoTree {
    fn default() -> Self {
        Self::new()
    }
}

impl InfoTree {
    /// Create a tree which holds only the root and the config node.
    pub fn new() -> Self {
        let mut tree = InfoTree {
            nodes: vec![Some(InfoNode {
                name: String::new(),
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            })],
        };
        tree.attach(tree.root(), CONFIG_NODE_NAME, NodeKind::Config);
        tree
    }

    /// The ID of the root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Return the node with the given `id`, or `None` if it was removed.
    pub fn get(&self, id: NodeId) -> Option<&InfoNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node(&self, id: NodeId) -> Result<&InfoNode> {
        self.get(id)
            .ok_or_else(|| Error::InvalidArgument(format!("no info node with ID {}", id.0)))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut InfoNode> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| Error::InvalidArgument(format!("no info node with ID {}", id.0)))
    }

    /// Return the child of `parent` named `name`.
    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.get(parent)?
            .children
            .iter()
            .copied()
            .find(|&child| self.get(child).map_or(false, |node| node.name == name))
    }

    /// Return the children of `parent`, or an empty slice if it doesn't exist.
    pub fn children(&self, parent: NodeId) -> &[NodeId] {
        self.get(parent).map_or(&[], |node| node.children.as_slice())
    }

    /// Return the number of live nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_some()).count()
    }

    /// Return whether the tree holds nothing but the built-in nodes.
    pub fn is_empty(&self) -> bool {
        self.len() <= 2
    }

    fn attach(&mut self, parent: NodeId, name: &str, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(InfoNode {
            name: name.to_string(),
            kind,
            parent: Some(parent),
            children: Vec::new(),
        }));
        if let Some(Some(parent)) = self.nodes.get_mut(parent.0) {
            parent.children.push(id);
        }
        id
    }

    fn check_container(&self, parent: NodeId) -> Result<()> {
        if self.node(parent)?.kind.is_container() {
            Ok(())
        } else {
            Err(Error::NotDirectory(self.locator(parent)?))
        }
    }

    /// Create a folder named `name` in `parent`, or return the existing one.
    ///
    /// # Errors
    /// - `Error::TypeMismatch`: A node named `name` exists in `parent` and is not a folder.
    /// - `Error::NotDirectory`: `parent` can't hold other nodes.
    /// - `Error::InvalidArgument`: `name` is not a valid node name.
    pub fn create_folder(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        validate_name(name)?;
        self.check_container(parent)?;

        match self.child(parent, name) {
            Some(existing) => match self.node(existing)?.kind {
                NodeKind::Folder => Ok(existing),
                ref other => Err(Error::TypeMismatch {
                    name: name.to_string(),
                    existing: other.type_name(),
                }),
            },
            None => Ok(self.attach(parent, name, NodeKind::Folder)),
        }
    }

    /// Add a link named `name` to `target` in `parent`.
    ///
    /// If a link named `name` already exists, it is pointed at `target` instead.
    ///
    /// # Errors
    /// - `Error::TypeMismatch`: A node named `name` exists in `parent` and is not a link.
    /// - `Error::NotDirectory`: `parent` can't hold other nodes.
    /// - `Error::InvalidArgument`: `name` is not a valid node name.
    pub fn add_link(
        &mut self,
        parent: NodeId,
        name: &str,
        target: Vrl,
        icon: Option<String>,
    ) -> Result<NodeId> {
        validate_name(name)?;
        self.check_container(parent)?;

        match self.child(parent, name) {
            Some(existing) => {
                let node = self.node_mut(existing)?;
                match node.kind {
                    NodeKind::Link { .. } => {
                        node.kind = NodeKind::Link { target, icon };
                        Ok(existing)
                    }
                    ref other => Err(Error::TypeMismatch {
                        name: name.to_string(),
                        existing: other.type_name(),
                    }),
                }
            }
            None => Ok(self.attach(parent, name, NodeKind::Link { target, icon })),
        }
    }

    /// Detach `id` from its parent and drop it along with everything below it.
    ///
    /// # Errors
    /// - `Error::InvalidArgument`: `id` is the root or the config node.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        let node = self.node(id)?;
        let parent = match (&node.kind, node.parent) {
            (NodeKind::Root, _) | (NodeKind::Config, _) | (_, None) => {
                return Err(Error::InvalidArgument(format!(
                    "the {} node can't be removed",
                    node.kind.type_name()
                )))
            }
            (_, Some(parent)) => parent,
        };

        self.node_mut(parent)?.children.retain(|&child| child != id);

        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.get_mut(next.0).and_then(Option::take) {
                pending.extend(node.children);
            }
        }

        Ok(())
    }

    /// Give `id` the new name `name`.
    ///
    /// # Errors
    /// - `Error::AlreadyExists`: A sibling is already named `name`.
    /// - `Error::InvalidArgument`: `id` is the root or the config node, or `name` is invalid.
    pub fn rename(&mut self, id: NodeId, name: &str) -> Result<()> {
        validate_name(name)?;
        let node = self.node(id)?;
        if matches!(node.kind, NodeKind::Root | NodeKind::Config) {
            return Err(Error::InvalidArgument(format!(
                "the {} node can't be renamed",
                node.kind.type_name()
            )));
        }
        if node.name == name {
            return Ok(());
        }

        if let Some(parent) = node.parent {
            if let Some(sibling) = self.child(parent, name) {
                return Err(Error::AlreadyExists(self.locator(sibling)?));
            }
        }

        self.node_mut(id)?.name = name.to_string();
        Ok(())
    }

    /// Return the names of the nodes from the root down to `id`, excluding the root.
    pub fn path_elements(&self, id: NodeId) -> Result<Vec<&str>> {
        let mut elements = Vec::new();
        let mut current = self.node(id)?;
        while let Some(parent) = current.parent {
            elements.push(current.name.as_str());
            current = self.node(parent)?;
        }
        elements.reverse();
        Ok(elements)
    }

    /// Return the `info:` locator of `id`.
    pub fn locator(&self, id: NodeId) -> Result<Vrl> {
        let path = format!("/{}", self.path_elements(id)?.join("/"));
        Vrl::new(INFO_SCHEME, None, None, &path)
    }

    /// Find the node whose path below the root is `elements`.
    pub fn find_elements<S: AsRef<str>>(&self, elements: &[S]) -> Option<NodeId> {
        elements
            .iter()
            .try_fold(self.root(), |node, name| self.child(node, name.as_ref()))
    }

    /// Find the node addressed by `vrl` by walking its path segments from the root.
    pub fn find(&self, vrl: &Vrl) -> Option<NodeId> {
        if vrl.scheme() != INFO_SCHEME {
            return None;
        }
        self.find_elements(&vrl.path_elements())
    }

    /// Return every node below the root in depth-first order, parents before children.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut pending = self.children(id).iter().rev().copied().collect::<Vec<_>>();
        while let Some(next) = pending.pop() {
            result.push(next);
            pending.extend(self.children(next).iter().rev().copied());
        }
        result
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        Err(Error::InvalidArgument(format!(
            "'{}' is not a valid info node name",
            name
        )))
    } else {
        Ok(())
    }
}
