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

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Debug, Formatter};
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::context::VrsContext;
use crate::error::{Error, Result};
use crate::path::{
    Deletable, DirectoryListable, FileKind, FsPath, Renamable, StreamReadable, StreamWritable,
    VPath,
};
use crate::system::{ResourceSystem, ResourceSystemFactory};
use crate::vrl::Vrl;

/// The scheme served by a default [`MemoryFileSystemFactory`].
pub const MEMORY_SCHEME: &str = "mem";

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(index) => &path[..index],
    }
}

fn is_below(path: &str, ancestor: &str) -> bool {
    ancestor == "/" && path != "/"
        || path.len() > ancestor.len()
            && path.starts_with(ancestor)
            && path.as_bytes()[ancestor.len()] == b'/'
}

#[derive(Debug, Clone)]
struct MemoryTree {
    files: BTreeMap<String, Vec<u8>>,
    directories: BTreeSet<String>,
}

impl Default for MemoryTree {
    fn default() -> Self {
        let mut directories = BTreeSet::new();
        directories.insert(String::from("/"));
        MemoryTree {
            files: BTreeMap::new(),
            directories,
        }
    }
}

impl MemoryTree {
    fn is_dir(&self, path: &str) -> bool {
        self.directories.contains(path)
    }

    fn is_file(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn create_parents(&mut self, path: &str) {
        let mut parent = parent_of(path);
        while !self.directories.contains(parent) {
            self.directories.insert(parent.to_string());
            parent = parent_of(parent);
        }
    }

    fn children(&self, path: &str) -> Vec<String> {
        self.files
            .keys()
            .chain(self.directories.iter())
            .filter(|child| *child != "/" && parent_of(child) == path)
            .map(|child| child.rsplit('/').next().unwrap_or_default().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn rename(&mut self, from: &str, to: &str) {
        let retarget = |path: &str| format!("{}{}", to, &path[from.len()..]);

        let files = self
            .files
            .keys()
            .filter(|path| *path == from || is_below(path, from))
            .cloned()
            .collect::<Vec<_>>();
        for path in files {
            if let Some(data) = self.files.remove(&path) {
                self.files.insert(retarget(&path), data);
            }
        }

        let directories = self
            .directories
            .iter()
            .filter(|path| *path == from || is_below(path, from))
            .cloned()
            .collect::<Vec<_>>();
        for path in directories {
            self.directories.remove(&path);
            self.directories.insert(retarget(&path));
        }
    }
}

/// A factory for resource systems which hold files in memory.
///
/// Data in a memory file system is not stored persistently and is only accessible through the
/// context which created it. Each host name gets its own file system. This is useful for testing.
#[derive(Debug)]
pub struct MemoryFileSystemFactory {
    schemes: Vec<&'static str>,
    read_only: bool,
    seed: MemoryTree,
}

impl Default for MemoryFileSystemFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFileSystemFactory {
    /// Create a factory for writable memory file systems with the scheme `mem`.
    pub fn new() -> Self {
        MemoryFileSystemFactory {
            schemes: vec![MEMORY_SCHEME],
            read_only: false,
            seed: MemoryTree::default(),
        }
    }

    /// Serve `scheme` instead of `mem`.
    pub fn with_scheme(mut self, scheme: &'static str) -> Self {
        self.schemes = vec![scheme];
        self
    }

    /// Make the file systems read-only.
    ///
    /// Paths in a read-only file system can't be written, deleted or renamed.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Start every file system with a file at `path` holding `data`.
    pub fn with_file(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        let path = Vrl::local_root().with_path(path).path().to_string();
        self.seed.create_parents(&path);
        self.seed.files.insert(path, data.into());
        self
    }
}

impl ResourceSystemFactory for MemoryFileSystemFactory {
    fn schemes(&self) -> &[&'static str] {
        &self.schemes
    }

    fn create_resource_system_id(&self, vrl: &Vrl) -> String {
        format!("{}-{}", vrl.scheme(), vrl.host().unwrap_or("default"))
    }

    fn create_resource_system(
        &self,
        _context: &VrsContext,
        vrl: &Vrl,
    ) -> Result<Arc<dyn ResourceSystem>> {
        Ok(Arc::new(MemoryFileSystem {
            id: Arc::from(self.create_resource_system_id(vrl)),
            authority: vrl.with_path("/"),
            read_only: self.read_only,
            tree: Arc::new(Mutex::new(self.seed.clone())),
        }))
    }
}

/// A resource system which holds files in memory.
#[derive(Clone)]
pub struct MemoryFileSystem {
    id: Arc<str>,
    authority: Vrl,
    read_only: bool,
    tree: Arc<Mutex<MemoryTree>>,
}

impl Debug for MemoryFileSystem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MemoryFileSystem {{ id: {:?}, read_only: {} }}",
            self.id, self.read_only
        )
    }
}

impl MemoryFileSystem {
    fn tree(&self) -> MutexGuard<'_, MemoryTree> {
        match self.tree.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ResourceSystem for MemoryFileSystem {
    fn id(&self) -> &str {
        &self.id
    }

    fn resolve_path(&self, vrl: &Vrl) -> Result<Box<dyn VPath>> {
        if !self.authority.same_authority(vrl) {
            return Err(Error::InvalidArgument(format!(
                "{} is not served by {}",
                vrl, self.id
            )));
        }
        Ok(Box::new(MemoryPath {
            system: self.clone(),
            vrl: vrl.clone(),
        }))
    }
}

/// A path in a [`MemoryFileSystem`].
#[derive(Debug, Clone)]
pub struct MemoryPath {
    system: MemoryFileSystem,
    vrl: Vrl,
}

impl MemoryPath {
    fn path(&self) -> &str {
        self.vrl.path()
    }

    fn child(&self, name: &str) -> MemoryPath {
        MemoryPath {
            system: self.system.clone(),
            vrl: self.vrl.append_path(name),
        }
    }

    fn read_only_error(&self) -> Error {
        Error::ResourceSystem(anyhow::anyhow!(
            "The memory file system '{}' is read-only.",
            self.system.id
        ))
    }
}

impl VPath for MemoryPath {
    fn vrl(&self) -> &Vrl {
        &self.vrl
    }

    fn resource_system_id(&self) -> &str {
        &self.system.id
    }

    fn as_readable(&self) -> Option<&dyn StreamReadable> {
        Some(self)
    }

    fn as_writable(&self) -> Option<&dyn StreamWritable> {
        if self.system.read_only {
            None
        } else {
            Some(self)
        }
    }

    fn as_listable(&self) -> Option<&dyn DirectoryListable> {
        Some(self)
    }

    fn as_deletable(&self) -> Option<&dyn Deletable> {
        if self.system.read_only {
            None
        } else {
            Some(self)
        }
    }

    fn as_renamable(&self) -> Option<&dyn Renamable> {
        if self.system.read_only {
            None
        } else {
            Some(self)
        }
    }

    fn as_file_system(&self) -> Option<&dyn FsPath> {
        Some(self)
    }
}

impl StreamReadable for MemoryPath {
    fn open_read(&self) -> Result<Box<dyn Read>> {
        let data = self
            .system
            .tree()
            .files
            .get(self.path())
            .cloned()
            .ok_or_else(|| Error::NotFound(self.vrl.clone()))?;
        Ok(Box::new(Cursor::new(data)))
    }
}

/// Buffers written data and stores it in the tree when flushed or dropped.
struct MemoryWriter {
    tree: Arc<Mutex<MemoryTree>>,
    path: String,
    buffer: Vec<u8>,
}

impl MemoryWriter {
    fn commit(&mut self) {
        let mut tree = match self.tree.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        tree.files.insert(self.path.clone(), self.buffer.clone());
    }
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit();
        Ok(())
    }
}

impl Drop for MemoryWriter {
    fn drop(&mut self) {
        self.commit();
    }
}

impl StreamWritable for MemoryPath {
    fn open_write(&self) -> Result<Box<dyn Write>> {
        if self.system.read_only {
            return Err(self.read_only_error());
        }

        let mut tree = self.system.tree();
        if !tree.is_dir(parent_of(self.path())) {
            return Err(Error::NotFound(self.vrl.clone()));
        }
        if tree.is_dir(self.path()) {
            return Err(Error::InvalidArgument(format!(
                "cannot write to directory {}",
                self.vrl
            )));
        }
        tree.files.insert(self.path().to_string(), Vec::new());

        Ok(Box::new(MemoryWriter {
            tree: Arc::clone(&self.system.tree),
            path: self.path().to_string(),
            buffer: Vec::new(),
        }))
    }
}

impl DirectoryListable for MemoryPath {
    fn list(&self) -> Result<Vec<Box<dyn VPath>>> {
        let names = {
            let tree = self.system.tree();
            if !tree.is_dir(self.path()) {
                return Err(if tree.is_file(self.path()) {
                    Error::NotDirectory(self.vrl.clone())
                } else {
                    Error::NotFound(self.vrl.clone())
                });
            }
            tree.children(self.path())
        };

        Ok(names
            .iter()
            .map(|name| Box::new(self.child(name)) as Box<dyn VPath>)
            .collect())
    }
}

impl Deletable for MemoryPath {
    fn delete(&self) -> Result<()> {
        if self.system.read_only {
            return Err(self.read_only_error());
        }

        let mut tree = self.system.tree();
        if tree.files.remove(self.path()).is_some() {
            return Ok(());
        }
        if self.vrl.is_root() {
            return Err(Error::InvalidArgument(String::from(
                "the root directory can't be deleted",
            )));
        }
        if !tree.is_dir(self.path()) {
            return Err(Error::NotFound(self.vrl.clone()));
        }
        if !tree.children(self.path()).is_empty() {
            return Err(Error::NotEmpty(self.vrl.clone()));
        }
        tree.directories.remove(self.path());
        Ok(())
    }
}

impl Renamable for MemoryPath {
    fn rename_to(&self, target: &Vrl) -> Result<Box<dyn VPath>> {
        if self.system.read_only {
            return Err(self.read_only_error());
        }
        if !self.vrl.same_authority(target) {
            return Err(Error::InvalidArgument(format!(
                "cannot rename {} to a different resource system: {}",
                self.vrl, target
            )));
        }

        let mut tree = self.system.tree();
        let is_dir = tree.is_dir(self.path());
        if !is_dir && !tree.is_file(self.path()) {
            return Err(Error::NotFound(self.vrl.clone()));
        }
        if target.path() == self.path() {
            return Ok(Box::new(self.clone()));
        }
        if is_below(target.path(), self.path()) {
            return Err(Error::InvalidArgument(format!(
                "cannot move {} into itself: {}",
                self.vrl, target
            )));
        }
        if !tree.is_dir(parent_of(target.path())) {
            return Err(Error::NotFound(target.clone()));
        }
        // A file may replace a file, nothing else may be replaced.
        if tree.is_dir(target.path()) || (is_dir && tree.is_file(target.path())) {
            return Err(Error::AlreadyExists(target.clone()));
        }
        tree.rename(self.path(), target.path());

        Ok(Box::new(MemoryPath {
            system: self.system.clone(),
            vrl: target.clone(),
        }))
    }
}

impl FsPath for MemoryPath {
    fn exists(&self) -> Result<bool> {
        let tree = self.system.tree();
        Ok(tree.is_file(self.path()) || tree.is_dir(self.path()))
    }

    fn kind(&self) -> Result<FileKind> {
        let tree = self.system.tree();
        if tree.is_dir(self.path()) {
            Ok(FileKind::Directory)
        } else if tree.is_file(self.path()) {
            Ok(FileKind::File)
        } else {
            Err(Error::NotFound(self.vrl.clone()))
        }
    }

    fn length(&self) -> Result<u64> {
        let tree = self.system.tree();
        if let Some(data) = tree.files.get(self.path()) {
            Ok(data.len() as u64)
        } else if tree.is_dir(self.path()) {
            Ok(0)
        } else {
            Err(Error::NotFound(self.vrl.clone()))
        }
    }

    fn resolve(&self, name: &str) -> Result<Box<dyn VPath>> {
        Ok(Box::new(self.child(name)))
    }

    fn mkdir(&self, parents: bool) -> Result<()> {
        if self.system.read_only {
            return Err(self.read_only_error());
        }

        let mut tree = self.system.tree();
        if parents && tree.is_dir(self.path()) {
            return Ok(());
        }
        if tree.is_file(self.path()) || tree.is_dir(self.path()) {
            return Err(Error::AlreadyExists(self.vrl.clone()));
        }
        if !tree.is_dir(parent_of(self.path())) {
            if !parents {
                return Err(Error::NotFound(self.vrl.clone()));
            }
            tree.create_parents(self.path());
        }
        tree.directories.insert(self.path().to_string());
        Ok(())
    }
}
