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

//! Virtual resource locators.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use relative_path::{Component, RelativePath};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// The scheme of locators which name files in the local file system.
pub const FILE_SCHEME: &str = "file";

/// A virtual resource locator.
///
/// A `Vrl` is an immutable, URI-like name for a resource: a scheme, an optional authority
/// (user info, host and port) and a slash-separated path. Paths are always absolute and
/// normalized, so `.` and `..` segments, repeated slashes and trailing slashes never survive
/// parsing.
///
/// Parsing the string form of a `Vrl` always yields an equal `Vrl`.
///
/// # Examples
/// ```
/// use vrs_core::Vrl;
///
/// let vrl: Vrl = "sftp://alice@example.com:2222/home/alice/notes.txt".parse().unwrap();
/// assert_eq!(vrl.scheme(), "sftp");
/// assert_eq!(vrl.host(), Some("example.com"));
/// assert_eq!(vrl.port(), Some(2222));
/// assert_eq!(vrl.basename(), "notes.txt");
/// assert_eq!(vrl.to_string().parse::<Vrl>().unwrap(), vrl);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vrl {
    scheme: String,
    user_info: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    path: String,
}

/// Normalize a slash-separated path into an absolute path without empty, `.` or `..` segments.
fn normalize_path(path: &str) -> String {
    let relative = RelativePath::new(path.trim_start_matches('/')).normalize();
    let mut normalized = String::with_capacity(path.len() + 1);

    for component in relative.components() {
        // A `..` which climbs above the root is dropped.
        if let Component::Normal(name) = component {
            normalized.push('/');
            normalized.push_str(name);
        }
    }

    if normalized.is_empty() {
        normalized.push('/');
    }

    normalized
}

fn valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

impl Vrl {
    /// Create a new `Vrl` from its parts.
    ///
    /// The `path` is normalized.
    ///
    /// # Errors
    /// - `Error::InvalidLocator`: The scheme is not a valid scheme name.
    pub fn new(scheme: &str, host: Option<&str>, port: Option<u16>, path: &str) -> Result<Self> {
        if !valid_scheme(scheme) {
            return Err(Error::InvalidLocator {
                text: scheme.to_string(),
                reason: "invalid scheme",
            });
        }

        Ok(Vrl {
            scheme: scheme.to_ascii_lowercase(),
            user_info: None,
            host: host.filter(|host| !host.is_empty()).map(str::to_string),
            port,
            path: normalize_path(path),
        })
    }

    /// Parse a locator of the form `scheme://[user@]host[:port]/path` or `scheme:/path`.
    ///
    /// # Errors
    /// - `Error::InvalidLocator`: The string is not a valid locator.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |reason| Error::InvalidLocator {
            text: text.to_string(),
            reason,
        };

        let (scheme, rest) = text.split_once(':').ok_or_else(|| invalid("missing scheme"))?;
        if !valid_scheme(scheme) {
            return Err(invalid("invalid scheme"));
        }

        let mut user_info = None;
        let mut host = None;
        let mut port = None;

        let path = match rest.strip_prefix("//") {
            Some(after_slashes) => {
                let (authority, path) = match after_slashes.find('/') {
                    Some(index) => after_slashes.split_at(index),
                    None => (after_slashes, "/"),
                };

                let host_port = match authority.rsplit_once('@') {
                    Some((user, host_port)) => {
                        if !user.is_empty() {
                            user_info = Some(user.to_string());
                        }
                        host_port
                    }
                    None => authority,
                };

                let host_name = match host_port.rsplit_once(':') {
                    // A bracketed IPv6 literal without a port.
                    Some((_, tail)) if tail.ends_with(']') => host_port,
                    Some((host_name, port_text)) => {
                        if !port_text.is_empty() {
                            port = Some(port_text.parse().map_err(|_| invalid("invalid port"))?);
                        }
                        host_name
                    }
                    None => host_port,
                };

                if !host_name.is_empty() {
                    host = Some(host_name.to_string());
                }

                path
            }
            None => rest,
        };

        Ok(Vrl {
            scheme: scheme.to_ascii_lowercase(),
            user_info,
            host,
            port,
            path: normalize_path(path),
        })
    }

    /// The root of the local file system, `file:/`.
    pub fn local_root() -> Self {
        Vrl {
            scheme: FILE_SCHEME.to_string(),
            user_info: None,
            host: None,
            port: None,
            path: String::from("/"),
        }
    }

    /// Return a `file:` locator for the given absolute local `path`.
    ///
    /// # Errors
    /// - `Error::InvalidArgument`: The path is relative or not valid UTF-8.
    pub fn from_local_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_absolute() {
            return Err(Error::InvalidArgument(format!(
                "local path is not absolute: {}",
                path.display()
            )));
        }
        let text = path.to_str().ok_or_else(|| {
            Error::InvalidArgument(format!("local path is not UTF-8: {}", path.display()))
        })?;
        Vrl::new(FILE_SCHEME, None, None, &text.replace('\\', "/"))
    }

    /// Return the local file system path of a `file:` locator.
    ///
    /// This returns `None` for locators with any other scheme or with a host.
    pub fn to_local_path(&self) -> Option<PathBuf> {
        if self.scheme == FILE_SCHEME && self.host.is_none() {
            Some(PathBuf::from(&self.path))
        } else {
            None
        }
    }

    /// The scheme, always lowercase.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The user part of the authority, if any.
    pub fn user_info(&self) -> Option<&str> {
        self.user_info.as_deref()
    }

    /// The host name, if any.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// The port, if one was given explicitly.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// The normalized absolute path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Return whether this locator names the root of its resource system.
    pub fn is_root(&self) -> bool {
        self.path == "/"
    }

    /// The non-empty segments of the path, from the root down.
    pub fn path_elements(&self) -> Vec<&str> {
        self.path.split('/').filter(|segment| !segment.is_empty()).collect()
    }

    /// The last segment of the path, or an empty string for the root.
    pub fn basename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("")
    }

    /// Return a copy of this locator with the given `user_info`.
    pub fn with_user_info(&self, user_info: Option<&str>) -> Vrl {
        Vrl {
            user_info: user_info.filter(|user| !user.is_empty()).map(str::to_string),
            ..self.clone()
        }
    }

    /// Return a copy of this locator with its path replaced by `path`.
    pub fn with_path(&self, path: &str) -> Vrl {
        Vrl {
            path: normalize_path(path),
            ..self.clone()
        }
    }

    /// Return the locator of the parent of this one, or `None` if this is the root.
    pub fn parent(&self) -> Option<Vrl> {
        if self.is_root() {
            return None;
        }
        let parent_path = match self.path.rfind('/') {
            Some(0) | None => "/",
            Some(index) => &self.path[..index],
        };
        Some(self.with_path(parent_path))
    }

    /// Return the locator with `segment` appended to the path.
    ///
    /// The segment may itself contain slashes; the result is normalized.
    pub fn append_path(&self, segment: &str) -> Vrl {
        self.with_path(&format!("{}/{}", self.path, segment))
    }

    /// Resolve `relative` against this locator.
    ///
    /// An argument starting with `/` replaces the path; anything else is resolved relative to
    /// this locator's path, honoring `.` and `..`.
    pub fn resolve_path(&self, relative: &str) -> Vrl {
        if relative.starts_with('/') {
            self.with_path(relative)
        } else {
            self.append_path(relative)
        }
    }

    /// Return whether this locator has the same scheme and authority as `other`.
    pub fn same_authority(&self, other: &Vrl) -> bool {
        self.scheme == other.scheme
            && self.user_info == other.user_info
            && self.host == other.host
            && self.port == other.port
    }
}

impl fmt::Display for Vrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.scheme)?;

        let has_authority = self.host.is_some() || self.user_info.is_some() || self.port.is_some();
        if has_authority {
            f.write_str("//")?;
            if let Some(user) = &self.user_info {
                write!(f, "{}@", user)?;
            }
            if let Some(host) = &self.host {
                f.write_str(host)?;
            }
            if let Some(port) = self.port {
                write!(f, ":{}", port)?;
            }
        }

        f.write_str(&self.path)
    }
}

impl FromStr for Vrl {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        Vrl::parse(text)
    }
}

impl Serialize for Vrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Vrl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Vrl::parse(&text).map_err(serde::de::Error::custom)
    }
}
