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

use std::fmt::{self, Debug, Formatter};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::persist::{read_tree, write_tree, PersistedTree};
use super::tree::{InfoTree, NodeId, NodeKind, INFO_SCHEME};
use crate::context::{VrsConfig, VrsContext};
use crate::error::{Error, Result};
use crate::path::{Deletable, DirectoryListable, LinkTarget, Renamable, StreamReadable, VPath};
use crate::system::{ResourceSystem, ResourceSystemFactory};
use crate::vrl::Vrl;

/// The ID of the info resource system. There is one per context.
pub const INFO_RESOURCE_SYSTEM_ID: &str = "info";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

struct InfoState {
    tree: Mutex<InfoTree>,
    save_lock: Mutex<()>,
    location: Option<PathBuf>,
    autosave: bool,
    config_text: String,
}

/// The resource system for the `info` scheme.
///
/// This is a handle to an in-memory [`InfoTree`] of folders and links, optionally persisted to a
/// file in the persistence directory of the context. Cloning the handle does not clone the tree.
///
/// The tree does not load its persisted state by itself; the owner calls
/// [`load_persistent_config`] once after construction.
///
/// [`load_persistent_config`]: crate::info::InfoResourceSystem::load_persistent_config
#[derive(Clone)]
pub struct InfoResourceSystem {
    state: Arc<InfoState>,
}

impl Debug for InfoResourceSystem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InfoResourceSystem {{ location: {:?}, autosave: {} }}",
            self.state.location, self.state.autosave
        )
    }
}

impl InfoResourceSystem {
    /// Create an info tree which is persisted according to `config`.
    pub fn new(config: &VrsConfig) -> Self {
        let location = config.info_tree_location().and_then(|vrl| {
            let path = vrl.to_local_path();
            if path.is_none() {
                log::warn!("Info tree location {} is not a local path, not persisting", vrl);
            }
            path
        });

        InfoResourceSystem {
            state: Arc::new(InfoState {
                tree: Mutex::new(InfoTree::new()),
                save_lock: Mutex::new(()),
                location,
                autosave: config.info_autosave,
                config_text: config.to_properties(),
            }),
        }
    }

    fn tree(&self) -> MutexGuard<'_, InfoTree> {
        lock(&self.state.tree)
    }

    /// The file the tree is persisted to, if any.
    pub fn persistence_path(&self) -> Option<&Path> {
        self.state.location.as_deref()
    }

    fn path_for(&self, tree: &InfoTree, id: NodeId) -> Result<InfoPath> {
        let node = tree
            .get(id)
            .ok_or_else(|| Error::InvalidArgument(String::from("info node was removed")))?;
        Ok(InfoPath {
            system: self.clone(),
            id,
            vrl: tree.locator(id)?,
            kind: node.kind().clone(),
        })
    }

    fn node_for(&self, tree: &InfoTree, vrl: &Vrl) -> Result<NodeId> {
        tree.find(vrl).ok_or_else(|| Error::NotFound(vrl.clone()))
    }

    /// The root node of the tree.
    pub fn root(&self) -> Result<InfoPath> {
        let tree = self.tree();
        self.path_for(&tree, tree.root())
    }

    /// Find the node addressed by `vrl`.
    pub fn find_node(&self, vrl: &Vrl) -> Option<InfoPath> {
        let tree = self.tree();
        let id = tree.find(vrl)?;
        self.path_for(&tree, id).ok()
    }

    /// Create a folder named `name` under the root, or return the existing one.
    ///
    /// # Errors
    /// - `Error::TypeMismatch`: A node named `name` exists and is not a folder.
    pub fn create_folder(&self, name: &str) -> Result<InfoPath> {
        let path = {
            let mut tree = self.tree();
            let root = tree.root();
            let id = tree.create_folder(root, name)?;
            self.path_for(&tree, id)?
        };
        self.autosave();
        Ok(path)
    }

    /// Add a link to `target` named `name` in the folder at `folder_path`.
    ///
    /// `folder_path` is a slash-separated path below the root; missing folders are created and an
    /// empty path means the root. The tree is saved afterwards if `autosave` is set.
    ///
    /// # Errors
    /// - `Error::TypeMismatch`: A node on `folder_path` is not a folder, or a node named `name`
    ///   exists in the folder and is not a link.
    pub fn add_resource_link(
        &self,
        folder_path: &str,
        name: &str,
        target: &Vrl,
        autosave: bool,
    ) -> Result<InfoPath> {
        self.add_icon_link(folder_path, name, target, None, autosave)
    }

    /// Like [`add_resource_link`], with an `icon` hint stored on the link.
    ///
    /// [`add_resource_link`]: crate::info::InfoResourceSystem::add_resource_link
    pub fn add_icon_link(
        &self,
        folder_path: &str,
        name: &str,
        target: &Vrl,
        icon: Option<&str>,
        autosave: bool,
    ) -> Result<InfoPath> {
        let path = {
            let mut tree = self.tree();
            let mut folder = tree.root();
            for segment in folder_path.split('/').filter(|segment| !segment.is_empty()) {
                folder = tree.create_folder(folder, segment)?;
            }
            let id = tree.add_link(folder, name, target.clone(), icon.map(String::from))?;
            self.path_for(&tree, id)?
        };
        log::debug!("Added info link {} -> {}", path.vrl, target);
        if autosave {
            self.save();
        }
        Ok(path)
    }

    fn add_link_in(&self, folder: NodeId, name: &str, target: &Vrl) -> Result<InfoPath> {
        let path = {
            let mut tree = self.tree();
            let id = tree.add_link(folder, name, target.clone(), None)?;
            self.path_for(&tree, id)?
        };
        self.autosave();
        Ok(path)
    }

    /// Remove the node at `vrl` and everything below it.
    pub fn remove(&self, vrl: &Vrl) -> Result<()> {
        {
            let mut tree = self.tree();
            let id = self.node_for(&tree, vrl)?;
            tree.remove(id)?;
        }
        self.autosave();
        Ok(())
    }

    /// Rename the node at `vrl` to `name`.
    ///
    /// # Errors
    /// - `Error::AlreadyExists`: A sibling is already named `name`.
    pub fn rename(&self, vrl: &Vrl, name: &str) -> Result<InfoPath> {
        let path = {
            let mut tree = self.tree();
            let id = self.node_for(&tree, vrl)?;
            tree.rename(id, name)?;
            self.path_for(&tree, id)?
        };
        self.autosave();
        Ok(path)
    }

    /// Return the locator and kind of every node below the root, parents before children.
    pub fn entries(&self) -> Vec<(Vrl, NodeKind)> {
        let tree = self.tree();
        tree.descendants(tree.root())
            .into_iter()
            .filter_map(|id| {
                let kind = tree.get(id)?.kind().clone();
                Some((tree.locator(id).ok()?, kind))
            })
            .collect()
    }

    /// Render the whole tree in its persisted text form.
    pub fn to_text(&self) -> Result<String> {
        PersistedTree::snapshot(&self.tree()).to_text()
    }

    /// Merge the persisted tree at `path` into this one.
    ///
    /// This returns the number of nodes merged, which is zero if there is no file at `path`.
    pub fn load_from(&self, path: &Path) -> Result<usize> {
        match read_tree(path)? {
            Some(persisted) => Ok(persisted.merge_into(&mut self.tree())),
            None => {
                log::info!("No persisted info tree at {:?}", path);
                Ok(0)
            }
        }
    }

    /// Write the tree to `path` atomically.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let _guard = lock(&self.state.save_lock);
        let persisted = PersistedTree::snapshot(&self.tree());
        write_tree(path, &persisted)
    }

    /// Merge the persisted tree into this one.
    ///
    /// Failures are logged and otherwise ignored. This returns the number of nodes merged.
    pub fn load_persistent_config(&self) -> usize {
        let path = match &self.state.location {
            Some(path) => path,
            None => return 0,
        };

        match self.load_from(path) {
            Ok(count) => {
                log::debug!("Loaded {} info nodes from {:?}", count, path);
                count
            }
            Err(error) => {
                log::error!("Failed to load the info tree from {:?}: {}", path, error);
                0
            }
        }
    }

    /// Write the tree to its persistence location, if one is configured.
    ///
    /// Failures are logged and otherwise ignored.
    pub fn save(&self) {
        if let Some(path) = &self.state.location {
            if let Err(error) = self.save_to(path) {
                log::error!("Failed to save the info tree to {:?}: {}", path, error);
            }
        }
    }

    fn autosave(&self) {
        if self.state.autosave {
            self.save();
        }
    }
}

impl ResourceSystem for InfoResourceSystem {
    fn id(&self) -> &str {
        INFO_RESOURCE_SYSTEM_ID
    }

    fn resolve_path(&self, vrl: &Vrl) -> Result<Box<dyn VPath>> {
        let tree = self.tree();
        let id = self.node_for(&tree, vrl)?;
        Ok(Box::new(self.path_for(&tree, id)?))
    }
}

/// The factory for the `info` scheme.
///
/// Every context has a single info tree, so this hands out the one owned by the context.
#[derive(Debug, Default)]
pub struct InfoResourceSystemFactory;

impl InfoResourceSystemFactory {
    pub fn new() -> Self {
        InfoResourceSystemFactory
    }
}

impl ResourceSystemFactory for InfoResourceSystemFactory {
    fn schemes(&self) -> &[&'static str] {
        &[INFO_SCHEME]
    }

    fn create_resource_system_id(&self, _vrl: &Vrl) -> String {
        String::from(INFO_RESOURCE_SYSTEM_ID)
    }

    fn create_resource_system(
        &self,
        context: &VrsContext,
        _vrl: &Vrl,
    ) -> Result<Arc<dyn ResourceSystem>> {
        Ok(Arc::new(context.info_system().clone()))
    }
}

/// A node in the info tree.
///
/// The capabilities of an `InfoPath` follow from the kind of node it was created for. The root
/// and folders can be listed and hold links, links and folders can be deleted and renamed, and
/// the config node can be read.
#[derive(Debug, Clone)]
pub struct InfoPath {
    system: InfoResourceSystem,
    id: NodeId,
    vrl: Vrl,
    kind: NodeKind,
}

impl InfoPath {
    /// The ID of the node in the tree.
    pub fn node_id(&self) -> NodeId {
        self.id
    }

    /// The kind of the node.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The target of this node if it is a link.
    pub fn link_target(&self) -> Option<&Vrl> {
        match &self.kind {
            NodeKind::Link { target, .. } => Some(target),
            _ => None,
        }
    }

    fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    fn is_removable(&self) -> bool {
        matches!(self.kind, NodeKind::Folder | NodeKind::Link { .. })
    }

    fn check_live(&self, tree: &InfoTree) -> Result<()> {
        if tree.get(self.id).is_some() {
            Ok(())
        } else {
            Err(Error::NotFound(self.vrl.clone()))
        }
    }
}

impl VPath for InfoPath {
    fn vrl(&self) -> &Vrl {
        &self.vrl
    }

    fn resource_system_id(&self) -> &str {
        INFO_RESOURCE_SYSTEM_ID
    }

    fn as_readable(&self) -> Option<&dyn StreamReadable> {
        match self.kind {
            NodeKind::Config => Some(self),
            _ => None,
        }
    }

    fn as_listable(&self) -> Option<&dyn DirectoryListable> {
        if self.is_container() {
            Some(self)
        } else {
            None
        }
    }

    fn as_deletable(&self) -> Option<&dyn Deletable> {
        if self.is_removable() {
            Some(self)
        } else {
            None
        }
    }

    fn as_renamable(&self) -> Option<&dyn Renamable> {
        if self.is_removable() {
            Some(self)
        } else {
            None
        }
    }

    fn as_link_target(&self) -> Option<&dyn LinkTarget> {
        if self.is_container() {
            Some(self)
        } else {
            None
        }
    }
}

impl StreamReadable for InfoPath {
    fn open_read(&self) -> Result<Box<dyn Read>> {
        Ok(Box::new(Cursor::new(
            self.system.state.config_text.clone().into_bytes(),
        )))
    }
}

impl DirectoryListable for InfoPath {
    fn list(&self) -> Result<Vec<Box<dyn VPath>>> {
        let tree = self.system.tree();
        self.check_live(&tree)?;
        tree.children(self.id)
            .iter()
            .map(|&child| {
                self.system
                    .path_for(&tree, child)
                    .map(|path| Box::new(path) as Box<dyn VPath>)
            })
            .collect()
    }
}

impl Deletable for InfoPath {
    /// Remove this node.
    ///
    /// # Errors
    /// - `Error::NotEmpty`: This is a folder which still holds nodes.
    fn delete(&self) -> Result<()> {
        {
            let mut tree = self.system.tree();
            self.check_live(&tree)?;
            if !tree.children(self.id).is_empty() {
                return Err(Error::NotEmpty(self.vrl.clone()));
            }
            tree.remove(self.id)?;
        }
        self.system.autosave();
        Ok(())
    }
}

impl Renamable for InfoPath {
    /// Rename this node to the last segment of `target`, which must be in the same folder.
    fn rename_to(&self, target: &Vrl) -> Result<Box<dyn VPath>> {
        if target.scheme() != INFO_SCHEME || target.parent() != self.vrl.parent() {
            return Err(Error::InvalidArgument(format!(
                "info nodes can only be renamed within their folder: {}",
                target
            )));
        }

        let path = {
            let mut tree = self.system.tree();
            self.check_live(&tree)?;
            tree.rename(self.id, target.basename())?;
            self.system.path_for(&tree, self.id)?
        };
        self.system.autosave();
        Ok(Box::new(path))
    }
}

impl LinkTarget for InfoPath {
    fn create_link(&self, target: &Vrl, name: &str) -> Result<Box<dyn VPath>> {
        self.check_live(&self.system.tree())?;
        Ok(Box::new(self.system.add_link_in(self.id, name, target)?))
    }
}
