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
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use crate::context::VrsContext;
use crate::error::{Error, Result};
use crate::path::{
    Deletable, DirectoryListable, FileKind, FsPath, Renamable, StreamReadable, StreamWritable,
    VPath,
};
use crate::system::{ResourceSystem, ResourceSystemFactory};
use crate::vrl::{Vrl, FILE_SCHEME};

const LOCAL_HOSTS: &[&str] = &["localhost", "127.0.0.1", "::1"];

/// The factory for the local file system, which serves the `file` scheme.
#[derive(Debug, Default)]
pub struct LocalFileSystemFactory;

impl LocalFileSystemFactory {
    /// Create a new `LocalFileSystemFactory`.
    pub fn new() -> Self {
        LocalFileSystemFactory
    }
}

impl ResourceSystemFactory for LocalFileSystemFactory {
    fn schemes(&self) -> &[&'static str] {
        &[FILE_SCHEME]
    }

    fn create_resource_system_id(&self, vrl: &Vrl) -> String {
        match vrl.host() {
            Some(host) if !LOCAL_HOSTS.contains(&host) => format!("file-{}", host),
            _ => String::from("file-local"),
        }
    }

    fn create_resource_system(
        &self,
        _context: &VrsContext,
        vrl: &Vrl,
    ) -> Result<Arc<dyn ResourceSystem>> {
        if let Some(host) = vrl.host().filter(|host| !LOCAL_HOSTS.contains(host)) {
            return Err(Error::ResourceSystem(anyhow::anyhow!(
                "The file scheme does not support remote host '{}'.",
                host
            )));
        }

        Ok(Arc::new(LocalFileSystem {
            id: Arc::from(self.create_resource_system_id(vrl)),
        }))
    }
}

/// A resource system for the local file system.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    id: Arc<str>,
}

impl ResourceSystem for LocalFileSystem {
    fn id(&self) -> &str {
        &self.id
    }

    fn resolve_path(&self, vrl: &Vrl) -> Result<Box<dyn VPath>> {
        if vrl.scheme() != FILE_SCHEME {
            return Err(Error::InvalidArgument(format!(
                "not a file locator: {}",
                vrl
            )));
        }
        Ok(Box::new(LocalPath::new(Arc::clone(&self.id), vrl.clone())))
    }
}

/// A path in the local file system.
///
/// Local paths support every capability except holding links.
#[derive(Debug, Clone)]
pub struct LocalPath {
    system_id: Arc<str>,
    vrl: Vrl,
    path: PathBuf,
}

impl LocalPath {
    fn new(system_id: Arc<str>, vrl: Vrl) -> Self {
        let path = PathBuf::from(vrl.path());
        LocalPath {
            system_id,
            vrl,
            path,
        }
    }

    /// The path of this resource in the local file system.
    pub fn local_path(&self) -> &std::path::Path {
        &self.path
    }

    /// Convert an I/O error about this path into a crate error.
    fn io_error(&self, error: io::Error) -> Error {
        match error.kind() {
            io::ErrorKind::NotFound => Error::NotFound(self.vrl.clone()),
            io::ErrorKind::AlreadyExists => Error::AlreadyExists(self.vrl.clone()),
            _ => Error::Io(error),
        }
    }

    fn child(&self, name: &str) -> LocalPath {
        LocalPath::new(Arc::clone(&self.system_id), self.vrl.append_path(name))
    }
}

impl VPath for LocalPath {
    fn vrl(&self) -> &Vrl {
        &self.vrl
    }

    fn resource_system_id(&self) -> &str {
        &self.system_id
    }

    fn as_readable(&self) -> Option<&dyn StreamReadable> {
        Some(self)
    }

    fn as_writable(&self) -> Option<&dyn StreamWritable> {
        Some(self)
    }

    fn as_listable(&self) -> Option<&dyn DirectoryListable> {
        Some(self)
    }

    fn as_deletable(&self) -> Option<&dyn Deletable> {
        Some(self)
    }

    fn as_renamable(&self) -> Option<&dyn Renamable> {
        Some(self)
    }

    fn as_file_system(&self) -> Option<&dyn FsPath> {
        Some(self)
    }
}

impl StreamReadable for LocalPath {
    fn open_read(&self) -> Result<Box<dyn Read>> {
        let file = File::open(&self.path).map_err(|error| self.io_error(error))?;
        Ok(Box::new(file))
    }
}

impl StreamWritable for LocalPath {
    fn open_write(&self) -> Result<Box<dyn Write>> {
        let file = File::create(&self.path).map_err(|error| self.io_error(error))?;
        Ok(Box::new(file))
    }
}

impl DirectoryListable for LocalPath {
    fn list(&self) -> Result<Vec<Box<dyn VPath>>> {
        log::debug!("list(): {}", self.vrl);

        if !self.is_dir()? {
            return Err(Error::NotDirectory(self.vrl.clone()));
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.path).map_err(|error| self.io_error(error))? {
            let entry = entry?;
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => log::warn!("Skipping non-UTF-8 file name {:?} in {}", name, self.vrl),
            }
        }
        names.sort();

        Ok(names
            .iter()
            .map(|name| Box::new(self.child(name)) as Box<dyn VPath>)
            .collect())
    }
}

impl Deletable for LocalPath {
    /// Delete this file or empty directory.
    ///
    /// # Errors
    /// - `Error::NotEmpty`: This is a directory which is not empty.
    fn delete(&self) -> Result<()> {
        let metadata = fs::symlink_metadata(&self.path).map_err(|error| self.io_error(error))?;

        if metadata.is_dir() {
            let mut entries = fs::read_dir(&self.path).map_err(|error| self.io_error(error))?;
            if entries.next().is_some() {
                return Err(Error::NotEmpty(self.vrl.clone()));
            }
            fs::remove_dir(&self.path).map_err(|error| self.io_error(error))
        } else {
            fs::remove_file(&self.path).map_err(|error| self.io_error(error))
        }
    }
}

impl Renamable for LocalPath {
    fn rename_to(&self, target: &Vrl) -> Result<Box<dyn VPath>> {
        if target.scheme() != FILE_SCHEME {
            return Err(Error::InvalidArgument(format!(
                "cannot rename {} to a different resource system: {}",
                self.vrl, target
            )));
        }

        let renamed = LocalPath::new(Arc::clone(&self.system_id), target.clone());
        fs::rename(&self.path, &renamed.path).map_err(|error| self.io_error(error))?;
        Ok(Box::new(renamed))
    }
}

impl FsPath for LocalPath {
    fn exists(&self) -> Result<bool> {
        Ok(self.path.exists())
    }

    fn kind(&self) -> Result<FileKind> {
        let metadata = fs::metadata(&self.path).map_err(|error| self.io_error(error))?;
        Ok(if metadata.is_dir() {
            FileKind::Directory
        } else if metadata.is_file() {
            FileKind::File
        } else {
            FileKind::Other
        })
    }

    fn length(&self) -> Result<u64> {
        let metadata = fs::metadata(&self.path).map_err(|error| self.io_error(error))?;
        Ok(metadata.len())
    }

    fn resolve(&self, name: &str) -> Result<Box<dyn VPath>> {
        Ok(Box::new(self.child(name)))
    }

    fn mkdir(&self, parents: bool) -> Result<()> {
        if parents {
            fs::create_dir_all(&self.path)
        } else {
            fs::create_dir(&self.path)
        }
        .map_err(|error| self.io_error(error))
    }
}
