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

use std::fs;
use std::io::{Read, Write};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rstest::*;
use tempfile::TempDir;

use vrs_core::fs::MemoryFileSystemFactory;
use vrs_core::{DefaultTaskMonitor, TransferManager, Vrl, VrsConfig, VrsContext};

use super::data::MAX_BUFFER_SIZE;

/// The scheme of the read-only memory file system registered by the `context` fixture.
pub const READ_ONLY_SCHEME: &str = "rom";

/// The file which exists in the read-only memory file system.
pub const READ_ONLY_FILE: &str = "rom:/fixed";

/// A value which is tied to the lifetime of a temporary directory.
pub struct WithTempDir<T> {
    directory: TempDir,
    value: T,
}

impl<T> WithTempDir<T> {
    /// The temporary directory.
    pub fn path(&self) -> &Path {
        self.directory.path()
    }

    /// Return a `file:` locator for `name` inside the temporary directory.
    pub fn local(&self, name: &str) -> Vrl {
        Vrl::from_local_path(self.path().join(name)).unwrap()
    }

    /// Return the local path of `name` inside the temporary directory.
    pub fn local_path(&self, name: &str) -> PathBuf {
        self.path().join(name)
    }

    /// Write `data` to the file `name` inside the temporary directory.
    pub fn write_local(&self, name: &str, data: &[u8]) -> Vrl {
        let path = self.local_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, data).unwrap();
        self.local(name)
    }
}

impl<T> Deref for WithTempDir<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

/// The config used for testing, which persists state inside `directory`.
pub fn test_config(directory: &Path) -> VrsConfig {
    let mut config = VrsConfig::default();
    config.user_name = String::from("tester");
    config.home = Vrl::from_local_path(directory).unwrap();
    config.persistent_config_location =
        Some(Vrl::from_local_path(directory.join("config")).unwrap());
    // Small enough that test buffers take more than one chunk.
    config.copy_buffer_size = MAX_BUFFER_SIZE / 4;
    config
}

/// Build a context for `config` with the default factories plus a read-only memory file system.
pub fn build_context(config: VrsConfig) -> Arc<VrsContext> {
    let read_only = MemoryFileSystemFactory::new()
        .with_scheme(READ_ONLY_SCHEME)
        .read_only()
        .with_file("/fixed", "read-only data");
    Arc::new(
        VrsContext::builder()
            .config(config)
            .factory(Arc::new(read_only))
            .build(),
    )
}

#[fixture]
pub fn context() -> WithTempDir<Arc<VrsContext>> {
    let directory = tempfile::tempdir().unwrap();
    let context = build_context(test_config(directory.path()));
    WithTempDir {
        directory,
        value: context,
    }
}

#[fixture]
pub fn monitor() -> DefaultTaskMonitor {
    DefaultTaskMonitor::new()
}

/// Return a transfer manager for `context`.
pub fn manager(context: &Arc<VrsContext>) -> TransferManager {
    TransferManager::new(Arc::clone(context))
}

/// Read the whole resource at `vrl`.
pub fn read_resource(context: &VrsContext, vrl: &Vrl) -> Vec<u8> {
    let mut data = Vec::new();
    context
        .create_input_stream(vrl)
        .unwrap()
        .read_to_end(&mut data)
        .unwrap();
    data
}

/// Write `data` to the resource at `vrl`.
pub fn write_resource(context: &VrsContext, vrl: &Vrl, data: &[u8]) {
    let mut output = context.create_output_stream(vrl).unwrap();
    output.write_all(data).unwrap();
    output.flush().unwrap();
}

/// Return whether a resource exists at `vrl`.
pub fn exists(context: &VrsContext, vrl: &Vrl) -> bool {
    context
        .open_path(vrl)
        .ok()
        .and_then(|path| path.as_file_system().map(|fs_path| fs_path.exists().unwrap()))
        .unwrap_or(false)
}

/// Return a context connected to the SFTP server in the environment and the test directory on it.
#[cfg(feature = "sftp")]
pub fn sftp_context() -> (Arc<VrsContext>, Vrl) {
    use secrecy::SecretString;
    use vrs_core::fs::{SftpAuth, SftpFileSystemFactory};

    let sftp_server: String = dotenv::var("SFTP_SERVER").unwrap();
    let sftp_path: String = dotenv::var("SFTP_PATH").unwrap();
    let sftp_username: String = dotenv::var("SFTP_USERNAME").unwrap();
    let sftp_password: String = dotenv::var("SFTP_PASSWORD").unwrap();

    let root = Vrl::parse(&format!("sftp://{}@{}{}", sftp_username, sftp_server, sftp_path))
        .unwrap();
    let factory = SftpFileSystemFactory::new().with_credential(
        root.host().unwrap(),
        SftpAuth::Password {
            username: sftp_username,
            password: SecretString::new(sftp_password),
        },
    );

    let mut config = VrsConfig::default();
    config.sftp_known_hosts = None;
    let context = VrsContext::builder()
        .config(config)
        .factory(Arc::new(factory))
        .build();
    (Arc::new(context), root)
}
