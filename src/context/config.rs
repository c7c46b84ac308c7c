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

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::vrl::Vrl;

/// The default size of the buffer used to stream data between resources.
pub const DEFAULT_COPY_BUFFER_SIZE: usize = 1024 * 1024;

/// The name of the file the info tree is persisted to, inside the persistence directory.
pub const INFO_TREE_FILE: &str = "infors.json";

/// The configuration of a [`VrsContext`].
///
/// [`VrsContext`]: crate::VrsContext
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VrsConfig {
    /// The name of the local user.
    ///
    /// This is used as the login name for remote resource systems when a locator has no user.
    pub user_name: String,

    /// The home location of the user.
    pub home: Vrl,

    /// The directory where persistent state, like the info tree, is stored.
    ///
    /// This must be a `file:` locator. When this is `None`, nothing is persisted.
    pub persistent_config_location: Option<Vrl>,

    /// Whether every change to the info tree is saved immediately.
    pub info_autosave: bool,

    /// The size of the buffer used to stream data between resources.
    pub copy_buffer_size: usize,

    /// The private key files to try for SFTP public key authentication.
    ///
    /// Relative names are looked up in `~/.ssh`.
    pub sftp_identity_files: Vec<String>,

    /// The known hosts file used to verify SFTP host keys.
    ///
    /// When this is `None`, host keys are not verified.
    pub sftp_known_hosts: Option<PathBuf>,
}

fn local_home() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

impl Default for VrsConfig {
    fn default() -> Self {
        let home = local_home();
        VrsConfig {
            user_name: env::var("USER")
                .or_else(|_| env::var("USERNAME"))
                .unwrap_or_else(|_| String::from("user")),
            home: home
                .as_ref()
                .and_then(|path| Vrl::from_local_path(path).ok())
                .unwrap_or_else(Vrl::local_root),
            persistent_config_location: None,
            info_autosave: true,
            copy_buffer_size: DEFAULT_COPY_BUFFER_SIZE,
            sftp_identity_files: vec![String::from("id_rsa"), String::from("id_ed25519")],
            sftp_known_hosts: home.map(|path| path.join(".ssh").join("known_hosts")),
        }
    }
}

impl VrsConfig {
    /// Return the default configuration overlaid with values from the environment.
    ///
    /// This reads `VRS_USER`, `VRS_HOME` and `VRS_CONFIG_DIR`. Values which can't be used are
    /// ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = VrsConfig::default();

        if let Ok(user) = env::var("VRS_USER") {
            config.user_name = user;
        }

        if let Some(home) = env::var_os("VRS_HOME") {
            match Vrl::from_local_path(PathBuf::from(&home)) {
                Ok(vrl) => config.home = vrl,
                Err(error) => log::warn!("Ignoring VRS_HOME: {}", error),
            }
        }

        if let Some(dir) = env::var_os("VRS_CONFIG_DIR") {
            match Vrl::from_local_path(PathBuf::from(&dir)) {
                Ok(vrl) => config.persistent_config_location = Some(vrl),
                Err(error) => log::warn!("Ignoring VRS_CONFIG_DIR: {}", error),
            }
        }

        config
    }

    /// The locator of the file the info tree is persisted to, if persistence is configured.
    pub fn info_tree_location(&self) -> Option<Vrl> {
        self.persistent_config_location
            .as_ref()
            .map(|dir| dir.append_path(INFO_TREE_FILE))
    }

    /// Render this configuration as `key=value` lines.
    pub fn to_properties(&self) -> String {
        let mut text = String::new();
        text.push_str(&format!("user.name={}\n", self.user_name));
        text.push_str(&format!("user.home={}\n", self.home));
        if let Some(location) = &self.persistent_config_location {
            text.push_str(&format!("vrs.config.location={}\n", location));
        }
        text.push_str(&format!("vrs.info.autosave={}\n", self.info_autosave));
        text.push_str(&format!("vrs.copy.buffer_size={}\n", self.copy_buffer_size));
        text
    }
}
