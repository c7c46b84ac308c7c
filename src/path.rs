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

//! Paths and their capability facets.
//!
//! A [`VPath`] names one node in a [`ResourceSystem`]. What can be done with a path depends on
//! which facet traits its concrete type implements: [`StreamReadable`], [`StreamWritable`],
//! [`DirectoryListable`], [`Deletable`], [`Renamable`], [`FsPath`] and [`LinkTarget`]. Each
//! implementation exposes its facets through the `as_*` accessors of [`VPath`], so the set of
//! capabilities is fixed by the implementation rather than discovered by probing.
//!
//! [`ResourceSystem`]: crate::ResourceSystem

use std::fmt;
use std::io::{Read, Write};

use bitflags::bitflags;
use static_assertions::assert_obj_safe;

use crate::error::Result;
use crate::vrl::Vrl;

bitflags! {
    /// The capability facets supported by a [`VPath`].
    pub struct Capabilities: u32 {
        /// The path can be opened for reading as a byte stream.
        const STREAM_READ = 0b0000_0001;
        /// The path can be opened for writing as a byte stream.
        const STREAM_WRITE = 0b0000_0010;
        /// The children of the path can be listed.
        const LIST = 0b0000_0100;
        /// The path can be deleted.
        const DELETE = 0b0000_1000;
        /// The path can be renamed within its resource system.
        const RENAME = 0b0001_0000;
        /// The path lives in a file system and has a file kind and length.
        const FILE_SYSTEM = 0b0010_0000;
        /// Links to other locators can be created under the path.
        const LINK_TARGET = 0b0100_0000;
    }
}

/// The kind of node a file system path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    File,
    Directory,
    /// The path exists but is neither a regular file nor a directory.
    Other,
}

/// A handle to one node within a resource system.
///
/// A path holds its locator and a reference to the resource system it belongs to. Everything
/// else (existence, size, kind, children) is queried from the backend at the time of the call.
///
/// Paths have no internal locking. Using the same path from several threads for conflicting
/// operations, such as renaming it while deleting it, has unspecified results.
pub trait VPath: fmt::Debug + Send + Sync {
    /// The locator of this path.
    fn vrl(&self) -> &Vrl;

    /// The ID of the resource system this path belongs to.
    ///
    /// Two paths belong to the same resource system exactly when their IDs are equal.
    fn resource_system_id(&self) -> &str;

    /// This path as a stream-readable resource.
    fn as_readable(&self) -> Option<&dyn StreamReadable> {
        None
    }

    /// This path as a stream-writable resource.
    fn as_writable(&self) -> Option<&dyn StreamWritable> {
        None
    }

    /// This path as a directory-listable resource.
    fn as_listable(&self) -> Option<&dyn DirectoryListable> {
        None
    }

    /// This path as a deletable resource.
    fn as_deletable(&self) -> Option<&dyn Deletable> {
        None
    }

    /// This path as a resource which can be renamed in place.
    fn as_renamable(&self) -> Option<&dyn Renamable> {
        None
    }

    /// This path as a file system path.
    fn as_file_system(&self) -> Option<&dyn FsPath> {
        None
    }

    /// This path as a container for links.
    fn as_link_target(&self) -> Option<&dyn LinkTarget> {
        None
    }

    /// The set of capabilities this path supports.
    fn capabilities(&self) -> Capabilities {
        let mut capabilities = Capabilities::empty();
        capabilities.set(Capabilities::STREAM_READ, self.as_readable().is_some());
        capabilities.set(Capabilities::STREAM_WRITE, self.as_writable().is_some());
        capabilities.set(Capabilities::LIST, self.as_listable().is_some());
        capabilities.set(Capabilities::DELETE, self.as_deletable().is_some());
        capabilities.set(Capabilities::RENAME, self.as_renamable().is_some());
        capabilities.set(Capabilities::FILE_SYSTEM, self.as_file_system().is_some());
        capabilities.set(Capabilities::LINK_TARGET, self.as_link_target().is_some());
        capabilities
    }
}

assert_obj_safe!(VPath);

/// A resource whose contents can be read as a byte stream.
pub trait StreamReadable {
    /// Open a new stream which reads the contents of this resource from the start.
    fn open_read(&self) -> Result<Box<dyn Read>>;
}

/// A resource whose contents can be written as a byte stream.
pub trait StreamWritable {
    /// Open a new stream which writes to this resource.
    ///
    /// The resource is created if it does not exist and truncated if it does.
    fn open_write(&self) -> Result<Box<dyn Write>>;
}

/// A resource which has an ordered list of children.
pub trait DirectoryListable {
    /// Return the current children of this resource.
    ///
    /// The list is computed from the backend on every call.
    fn list(&self) -> Result<Vec<Box<dyn VPath>>>;
}

/// A resource which can be deleted.
pub trait Deletable {
    /// Delete this resource.
    ///
    /// Whether a non-empty directory is deleted recursively or fails with `Error::NotEmpty`
    /// depends on the implementation.
    fn delete(&self) -> Result<()>;
}

/// A resource which can be renamed within its own resource system.
pub trait Renamable {
    /// Rename this resource to `target`, which must belong to the same resource system.
    ///
    /// This returns the path of the renamed resource.
    fn rename_to(&self, target: &Vrl) -> Result<Box<dyn VPath>>;
}

/// A resource which can hold links to other locators.
pub trait LinkTarget {
    /// Create a new link named `name` which points at `target`.
    fn create_link(&self, target: &Vrl, name: &str) -> Result<Box<dyn VPath>>;
}

/// A path in a file system.
pub trait FsPath {
    /// Return whether the path currently exists.
    fn exists(&self) -> Result<bool>;

    /// Return the kind of node at this path.
    ///
    /// # Errors
    /// - `Error::NotFound`: The path does not exist.
    fn kind(&self) -> Result<FileKind>;

    /// Return the length of the file in bytes.
    fn length(&self) -> Result<u64>;

    /// Return the path of the child `name` of this path.
    ///
    /// The child does not have to exist.
    fn resolve(&self, name: &str) -> Result<Box<dyn VPath>>;

    /// Create this path as a directory.
    ///
    /// When `parents` is true, missing parent directories are created as well and an existing
    /// directory is not an error.
    fn mkdir(&self, parents: bool) -> Result<()>;

    /// Return whether this path is an existing directory.
    fn is_dir(&self) -> Result<bool> {
        Ok(self.exists()? && self.kind()? == FileKind::Directory)
    }

    /// Return whether this path is an existing regular file.
    fn is_file(&self) -> Result<bool> {
        Ok(self.exists()? && self.kind()? == FileKind::File)
    }
}
