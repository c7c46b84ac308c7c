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

#![cfg(feature = "sftp")]

use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use secrecy::{ExposeSecret, SecretString};
use ssh2::{CheckResult, ErrorCode, KnownHostFileKind, RenameFlags, Session, Sftp};

use crate::context::VrsContext;
use crate::error::{Error, Result};
use crate::path::{
    Deletable, DirectoryListable, FileKind, FsPath, Renamable, StreamReadable, StreamWritable,
    VPath,
};
use crate::system::{ResourceSystem, ResourceSystemFactory};
use crate::vrl::Vrl;

/// The port used when a locator doesn't name one.
const DEFAULT_PORT: u16 = 22;

// The SFTP status code for a missing file.
const SFTP_NO_SUCH_FILE: i32 = 2;

/// How to authenticate with an SFTP server.
///
/// Secrets are held in a `SecretString` so they are never printed.
#[derive(Debug)]
pub enum SftpAuth {
    /// Authenticate with a password.
    Password {
        username: String,
        password: SecretString,
    },

    /// Authenticate with a private key file.
    KeyFile {
        username: String,
        private_key: PathBuf,
        passphrase: Option<SecretString>,
    },

    /// Authenticate using the running SSH agent.
    Agent { username: String },
}

impl SftpAuth {
    fn username(&self) -> &str {
        match self {
            SftpAuth::Password { username, .. } => username,
            SftpAuth::KeyFile { username, .. } => username,
            SftpAuth::Agent { username } => username,
        }
    }
}

/// The factory for SFTP resource systems, which serves the `sftp` and `ssh-ftp` schemes.
///
/// One resource system, and therefore one SSH session, is created per user, host and port.
///
/// The `sftp` cargo feature is required to use this.
#[derive(Debug, Default)]
pub struct SftpFileSystemFactory {
    credentials: HashMap<String, SftpAuth>,
}

impl SftpFileSystemFactory {
    /// Create a new `SftpFileSystemFactory` with no stored credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `auth` to authenticate with `host`.
    ///
    /// Hosts without credentials are tried with the SSH agent and then the identity files in the
    /// context configuration.
    pub fn with_credential(mut self, host: &str, auth: SftpAuth) -> Self {
        self.credentials.insert(host.to_lowercase(), auth);
        self
    }

    fn username<'a>(&'a self, vrl: &'a Vrl, context: Option<&'a VrsContext>) -> &'a str {
        vrl.user_info()
            .or_else(|| {
                vrl.host()
                    .and_then(|host| self.credentials.get(&host.to_lowercase()))
                    .map(SftpAuth::username)
            })
            .or_else(|| context.map(|context| context.config().user_name.as_str()))
            .unwrap_or("")
    }

    fn authenticate(&self, session: &Session, vrl: &Vrl, context: &VrsContext) -> Result<()> {
        let host = vrl.host().unwrap_or_default().to_lowercase();
        let username = self.username(vrl, Some(context));

        match self.credentials.get(&host) {
            Some(SftpAuth::Password { password, .. }) => session
                .userauth_password(username, password.expose_secret())
                .map_err(sftp_error)?,
            Some(SftpAuth::KeyFile {
                private_key,
                passphrase,
                ..
            }) => session
                .userauth_pubkey_file(
                    username,
                    None,
                    private_key,
                    passphrase.as_ref().map(|secret| secret.expose_secret().as_str()),
                )
                .map_err(sftp_error)?,
            Some(SftpAuth::Agent { .. }) => {
                session.userauth_agent(username).map_err(sftp_error)?
            }
            None => {
                if let Err(error) = session.userauth_agent(username) {
                    log::debug!("Agent authentication with {} failed: {}", host, error);
                }

                let ssh_dir = match context.config().home.to_local_path() {
                    Some(home) => home.join(".ssh"),
                    None => PathBuf::from(".ssh"),
                };
                for name in &context.config().sftp_identity_files {
                    if session.authenticated() {
                        break;
                    }
                    let key = ssh_dir.join(name);
                    if !key.exists() {
                        continue;
                    }
                    if let Err(error) = session.userauth_pubkey_file(username, None, &key, None) {
                        log::debug!("Key {:?} rejected by {}: {}", key, host, error);
                    }
                }
            }
        }

        if session.authenticated() {
            Ok(())
        } else {
            Err(Error::ResourceSystem(anyhow::anyhow!(
                "Could not authenticate as '{}' with {}.",
                username,
                host
            )))
        }
    }
}

impl ResourceSystemFactory for SftpFileSystemFactory {
    fn schemes(&self) -> &[&'static str] {
        &["sftp", "ssh-ftp"]
    }

    fn create_resource_system_id(&self, vrl: &Vrl) -> String {
        format!(
            "sftp-{}@{}-{}",
            self.username(vrl, None),
            vrl.host().unwrap_or_default(),
            vrl.port().unwrap_or(DEFAULT_PORT)
        )
    }

    fn create_resource_system(
        &self,
        context: &VrsContext,
        vrl: &Vrl,
    ) -> Result<Arc<dyn ResourceSystem>> {
        let host = vrl
            .host()
            .ok_or_else(|| Error::InvalidArgument(format!("no host in {}", vrl)))?;
        let port = vrl.port().unwrap_or(DEFAULT_PORT);

        log::info!("Connecting to {}:{}", host, port);
        let stream = TcpStream::connect((host, port))?;
        let mut session = Session::new().map_err(sftp_error)?;
        session.set_tcp_stream(stream);
        session.handshake().map_err(sftp_error)?;

        if let Some(known_hosts) = &context.config().sftp_known_hosts {
            verify_host_key(&session, host, port, known_hosts)?;
        }

        self.authenticate(&session, vrl, context)?;
        let sftp = session.sftp().map_err(sftp_error)?;

        Ok(Arc::new(SftpFileSystem {
            inner: Arc::new(SftpSession {
                id: self.create_resource_system_id(vrl),
                server: vrl.with_path("/"),
                session: Mutex::new(session),
                sftp: Mutex::new(sftp),
            }),
        }))
    }
}

fn verify_host_key(session: &Session, host: &str, port: u16, known_hosts: &Path) -> Result<()> {
    let mut hosts = session.known_hosts().map_err(sftp_error)?;
    if known_hosts.exists() {
        hosts
            .read_file(known_hosts, KnownHostFileKind::OpenSSH)
            .map_err(sftp_error)?;
    }

    let (key, _) = session
        .host_key()
        .ok_or_else(|| Error::ResourceSystem(anyhow::anyhow!("{} sent no host key.", host)))?;

    match hosts.check_port(host, port, key) {
        CheckResult::Match => Ok(()),
        CheckResult::NotFound => {
            log::warn!("Host {}:{} is not in {:?}", host, port, known_hosts);
            Ok(())
        }
        CheckResult::Mismatch => Err(Error::ResourceSystem(anyhow::anyhow!(
            "The host key of {} does not match {:?}.",
            host,
            known_hosts
        ))),
        CheckResult::Failure => Err(Error::ResourceSystem(anyhow::anyhow!(
            "Could not check the host key of {}.",
            host
        ))),
    }
}

fn sftp_error(error: ssh2::Error) -> Error {
    Error::ResourceSystem(anyhow::Error::from(error))
}

struct SftpSession {
    id: String,
    server: Vrl,
    session: Mutex<Session>,
    sftp: Mutex<Sftp>,
}

impl SftpSession {
    fn sftp(&self) -> MutexGuard<'_, Sftp> {
        match self.sftp.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// A resource system for a directory tree on an SFTP server.
///
/// Every path shares the SSH session of the resource system that resolved it.
#[derive(Clone)]
pub struct SftpFileSystem {
    inner: Arc<SftpSession>,
}

impl Debug for SftpFileSystem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "SftpFileSystem {{ id: {:?} }}", self.inner.id)
    }
}

impl ResourceSystem for SftpFileSystem {
    fn id(&self) -> &str {
        &self.inner.id
    }

    fn resolve_path(&self, vrl: &Vrl) -> Result<Box<dyn VPath>> {
        if vrl.host() != self.inner.server.host() {
            return Err(Error::InvalidArgument(format!(
                "{} is not served by {}",
                vrl, self.inner.id
            )));
        }
        Ok(Box::new(SftpPath::new(Arc::clone(&self.inner), vrl.clone())))
    }

    fn close(&self) -> Result<()> {
        log::info!("Disconnecting {}", self.inner.id);
        let session = match self.inner.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        session
            .disconnect(None, "closing", None)
            .map_err(sftp_error)
    }
}

/// A path on an SFTP server.
#[derive(Clone)]
pub struct SftpPath {
    session: Arc<SftpSession>,
    vrl: Vrl,
    path: PathBuf,
}

impl Debug for SftpPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "SftpPath {{ vrl: {} }}", self.vrl)
    }
}

impl SftpPath {
    fn new(session: Arc<SftpSession>, vrl: Vrl) -> Self {
        let path = PathBuf::from(vrl.path());
        SftpPath { session, vrl, path }
    }

    fn child(&self, name: &str) -> SftpPath {
        SftpPath::new(Arc::clone(&self.session), self.vrl.append_path(name))
    }

    fn error(&self, error: ssh2::Error) -> Error {
        if error.code() == ErrorCode::SFTP(SFTP_NO_SUCH_FILE) {
            Error::NotFound(self.vrl.clone())
        } else {
            sftp_error(error)
        }
    }

    fn stat(&self) -> Result<ssh2::FileStat> {
        self.session.sftp().stat(&self.path).map_err(|error| self.error(error))
    }
}

impl VPath for SftpPath {
    fn vrl(&self) -> &Vrl {
        &self.vrl
    }

    fn resource_system_id(&self) -> &str {
        &self.session.id
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

impl StreamReadable for SftpPath {
    fn open_read(&self) -> Result<Box<dyn Read>> {
        let file = self
            .session
            .sftp()
            .open(&self.path)
            .map_err(|error| self.error(error))?;
        Ok(Box::new(file))
    }
}

impl StreamWritable for SftpPath {
    fn open_write(&self) -> Result<Box<dyn Write>> {
        let file = self
            .session
            .sftp()
            .create(&self.path)
            .map_err(|error| self.error(error))?;
        Ok(Box::new(file))
    }
}

impl DirectoryListable for SftpPath {
    fn list(&self) -> Result<Vec<Box<dyn VPath>>> {
        if !self.stat()?.is_dir() {
            return Err(Error::NotDirectory(self.vrl.clone()));
        }

        let entries = self
            .session
            .sftp()
            .readdir(&self.path)
            .map_err(|error| self.error(error))?;
        let mut names = entries
            .iter()
            .filter_map(|(path, _)| path.file_name().and_then(|name| name.to_str()))
            .filter(|name| *name != "." && *name != "..")
            .map(String::from)
            .collect::<Vec<_>>();
        names.sort();

        Ok(names
            .iter()
            .map(|name| Box::new(self.child(name)) as Box<dyn VPath>)
            .collect())
    }
}

impl Deletable for SftpPath {
    fn delete(&self) -> Result<()> {
        if self.stat()?.is_dir() {
            let sftp = self.session.sftp();
            let entries = sftp.readdir(&self.path).map_err(|error| self.error(error))?;
            if !entries.is_empty() {
                return Err(Error::NotEmpty(self.vrl.clone()));
            }
            sftp.rmdir(&self.path).map_err(|error| self.error(error))
        } else {
            self.session
                .sftp()
                .unlink(&self.path)
                .map_err(|error| self.error(error))
        }
    }
}

impl Renamable for SftpPath {
    fn rename_to(&self, target: &Vrl) -> Result<Box<dyn VPath>> {
        if target.scheme() != self.vrl.scheme() || target.host() != self.vrl.host() {
            return Err(Error::InvalidArgument(format!(
                "cannot rename {} to a different resource system: {}",
                self.vrl, target
            )));
        }

        let renamed = SftpPath::new(Arc::clone(&self.session), target.clone());
        self.session
            .sftp()
            .rename(
                &self.path,
                &renamed.path,
                Some(RenameFlags::ATOMIC | RenameFlags::OVERWRITE),
            )
            .map_err(|error| self.error(error))?;
        Ok(Box::new(renamed))
    }
}

impl FsPath for SftpPath {
    fn exists(&self) -> Result<bool> {
        Ok(self.session.sftp().stat(&self.path).is_ok())
    }

    fn kind(&self) -> Result<FileKind> {
        let stat = self.stat()?;
        Ok(if stat.is_dir() {
            FileKind::Directory
        } else if stat.is_file() {
            FileKind::File
        } else {
            FileKind::Other
        })
    }

    fn length(&self) -> Result<u64> {
        Ok(self.stat()?.size.unwrap_or(0))
    }

    fn resolve(&self, name: &str) -> Result<Box<dyn VPath>> {
        Ok(Box::new(self.child(name)))
    }

    fn mkdir(&self, parents: bool) -> Result<()> {
        let sftp = self.session.sftp();

        if let Ok(stat) = sftp.stat(&self.path) {
            return if parents && stat.is_dir() {
                Ok(())
            } else {
                Err(Error::AlreadyExists(self.vrl.clone()))
            };
        }

        if parents {
            let mut missing = self
                .path
                .ancestors()
                .skip(1)
                .take_while(|ancestor| sftp.stat(ancestor).is_err())
                .collect::<Vec<_>>();
            missing.reverse();
            for ancestor in missing {
                sftp.mkdir(ancestor, 0o755).map_err(sftp_error)?;
            }
        }

        sftp.mkdir(&self.path, 0o755)
            .map_err(|error| self.error(error))
    }
}
