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

//! Resource systems backed by file systems.

pub use self::local::{LocalFileSystem, LocalFileSystemFactory, LocalPath};
pub use self::memory::{MemoryFileSystem, MemoryFileSystemFactory, MemoryPath, MEMORY_SCHEME};
#[cfg(feature = "sftp")]
pub use self::sftp::{SftpAuth, SftpFileSystem, SftpFileSystemFactory, SftpPath};

mod local;
mod memory;
mod sftp;
