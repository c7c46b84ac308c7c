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

//! `vrs-core` is a library for resolving, browsing and transferring resources across
//! heterogeneous storage backends.
//!
//! Every resource is named by a [`Vrl`], a locator like `sftp://me@example.com/srv/data` or
//! `file:/home/me`. A [`VrsContext`] maps the scheme of a locator to a [`ResourceSystemFactory`],
//! which creates the [`ResourceSystem`] that resolves it into a [`VPath`]. What a path can do is
//! declared through its capability facets:
//! - `StreamReadable` and `StreamWritable` paths can be read and written as byte streams.
//! - `DirectoryListable` paths have children.
//! - `Deletable` and `Renamable` paths can be removed or renamed in place.
//! - `FsPath` paths behave like files and directories in a file system.
//! - `LinkTarget` paths hold links to other resources.
//!
//! The [`TransferManager`] uses these capabilities to copy, move and link resources between
//! resource systems. The following resource systems are provided out of the box:
//! - `file` is the local file system.
//! - `mem` holds files in memory.
//! - `info` is an in-memory tree of folders and links which can be persisted.
//! - `sftp` and `ssh-ftp` are directories on SFTP servers.
//!
//! # Examples
//! ```
//! use std::io::Write;
//! use std::sync::Arc;
//! use vrs_core::{DefaultTaskMonitor, TransferManager, Vrl, VrsConfig, VrsContext};
//!
//! fn main() -> vrs_core::Result<()> {
//!     let context = Arc::new(VrsContext::new(VrsConfig::default()));
//!
//!     // Write a file to an in-memory file system.
//!     let source = Vrl::parse("mem:/data")?;
//!     context.create_output_stream(&source)?.write_all(b"Data")?;
//!
//!     // Move it within the same file system, which renames it.
//!     let manager = TransferManager::new(Arc::clone(&context));
//!     let monitor = DefaultTaskMonitor::new();
//!     let target = Vrl::parse("mem:/moved")?;
//!     let result = manager.transfer(&[source], &target, true, &monitor)?;
//!
//!     assert_eq!(result.bytes_copied, 0);
//!     assert_eq!(result.result_vrls(), vec![target]);
//!     Ok(())
//! }
//! ```
//!
//! # Features
//! Some functionality is gated behind cargo features:
//!
//! Type | Cargo Feature
//! --- | ---
//! `SftpFileSystemFactory` | `sftp`
//! the `vrs` binary | `cli`

pub use uuid;

pub use context::{
    Registry, ResourceSystemInstances, VrsConfig, VrsContext, VrsContextBuilder,
    DEFAULT_COPY_BUFFER_SIZE, INFO_TREE_FILE,
};
pub use error::{Error, Result, TransferSide};
pub use path::{
    Capabilities, Deletable, DirectoryListable, FileKind, FsPath, LinkTarget, Renamable,
    StreamReadable, StreamWritable, VPath,
};
pub use system::{ResourceSystem, ResourceSystemFactory};
pub use task::{DefaultTaskMonitor, TaskMonitor, TaskStats};
pub use transfer::{TransferManager, TransferResult};
pub use vrl::{Vrl, FILE_SCHEME};

mod context;
mod error;
pub mod fs;
pub mod info;
mod path;
mod system;
mod task;
mod transfer;
mod vrl;
