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

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::tree::{InfoTree, NodeId, NodeKind};
use crate::error::{Error, Result};
use crate::vrl::Vrl;

/// The version of the persisted info tree format.
pub const FORMAT_VERSION: u32 = 1;

/// An info node as it is written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PersistedNode {
    Root {
        #[serde(default)]
        children: Vec<PersistedNode>,
    },
    Folder {
        name: String,
        #[serde(default)]
        children: Vec<PersistedNode>,
    },
    Link {
        name: String,
        target: Vrl,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        icon: Option<String>,
    },
    Config {
        name: String,
    },
}

/// The top level of the persisted info tree file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedTree {
    pub version: u32,
    pub root: PersistedNode,
}

impl PersistedTree {
    /// Capture the current state of `tree`.
    pub fn snapshot(tree: &InfoTree) -> Self {
        PersistedTree {
            version: FORMAT_VERSION,
            root: snapshot_node(tree, tree.root()),
        }
    }

    /// Render this tree as indented text.
    pub fn to_text(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|_| Error::Serialize)
    }

    /// Parse a tree previously written by [`PersistedTree::to_text`].
    pub fn from_text(text: &str) -> Result<Self> {
        let tree: PersistedTree = serde_json::from_str(text).map_err(|_| Error::Deserialize)?;
        if tree.version != FORMAT_VERSION {
            log::warn!(
                "Info tree format version {} is not {}, reading it anyway",
                tree.version,
                FORMAT_VERSION
            );
        }
        Ok(tree)
    }

    /// Merge the nodes of this tree into `tree`.
    ///
    /// Existing folders are reused and existing links are pointed at the persisted target.
    /// Nodes which conflict with an existing node of another kind are skipped with a warning.
    /// This returns the number of nodes which were merged.
    pub fn merge_into(&self, tree: &mut InfoTree) -> usize {
        match &self.root {
            PersistedNode::Root { children } => {
                let root = tree.root();
                merge_children(tree, root, children)
            }
            other => {
                log::warn!("Persisted info tree has no root node: {:?}", other);
                0
            }
        }
    }
}

fn snapshot_node(tree: &InfoTree, id: NodeId) -> PersistedNode {
    let node = match tree.get(id) {
        Some(node) => node,
        None => return PersistedNode::Root { children: Vec::new() },
    };
    let children = || -> Vec<PersistedNode> {
        node.children()
            .iter()
            .map(|&child| snapshot_node(tree, child))
            .collect()
    };

    match node.kind() {
        NodeKind::Root => PersistedNode::Root {
            children: children(),
        },
        NodeKind::Folder => PersistedNode::Folder {
            name: node.name().to_string(),
            children: children(),
        },
        NodeKind::Link { target, icon } => PersistedNode::Link {
            name: node.name().to_string(),
            target: target.clone(),
            icon: icon.clone(),
        },
        NodeKind::Config => PersistedNode::Config {
            name: node.name().to_string(),
        },
    }
}

fn merge_children(tree: &mut InfoTree, parent: NodeId, children: &[PersistedNode]) -> usize {
    let mut merged = 0;

    for child in children {
        let result = match child {
            PersistedNode::Folder { name, children } => tree
                .create_folder(parent, name)
                .map(|folder| 1 + merge_children(tree, folder, children)),
            PersistedNode::Link { name, target, icon } => tree
                .add_link(parent, name, target.clone(), icon.clone())
                .map(|_| 1),
            // The config node is built in.
            PersistedNode::Config { .. } => Ok(0),
            PersistedNode::Root { .. } => {
                log::warn!("Skipping nested root node in persisted info tree");
                Ok(0)
            }
        };

        match result {
            Ok(count) => merged += count,
            Err(error) => log::warn!("Skipping persisted info node: {}", error),
        }
    }

    merged
}

/// Read the persisted tree at `path`, or return `None` if there is no file.
pub fn read_tree(path: &Path) -> Result<Option<PersistedTree>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(error.into()),
    };
    PersistedTree::from_text(&text).map(Some)
}

/// Write `tree` to `path` atomically.
///
/// The text goes to a staging file in the same directory which is then renamed over `path`, so
/// readers never see a partially written file.
pub fn write_tree(path: &Path, tree: &PersistedTree) -> Result<()> {
    let text = tree.to_text()?;
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(directory)?;

    let mut staging_file = NamedTempFile::new_in(directory)?;
    staging_file.write_all(text.as_bytes())?;
    staging_file.as_file().sync_all()?;
    staging_file.persist(path).map_err(|error| error.error)?;

    // Make sure the rename is durable.
    if let Ok(directory) = File::open(directory) {
        let _ = directory.sync_all();
    }

    Ok(())
}
