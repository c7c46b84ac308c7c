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

//! The context which ties resource system factories, live resource systems and configuration
//! together.

use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use uuid::Uuid;

pub use self::config::{VrsConfig, DEFAULT_COPY_BUFFER_SIZE, INFO_TREE_FILE};
pub use self::instances::ResourceSystemInstances;
pub use self::registry::Registry;

use crate::error::{Error, Result, TransferSide};
use crate::fs::{LocalFileSystemFactory, MemoryFileSystemFactory};
use crate::info::{InfoResourceSystem, InfoResourceSystemFactory};
use crate::path::VPath;
use crate::system::{ResourceSystem, ResourceSystemFactory};
use crate::vrl::Vrl;

mod config;
mod instances;
mod registry;

/// An explicit context for resolving locators.
///
/// A `VrsContext` owns a [`Registry`] of resource system factories, the cache of live resource
/// systems created from them and the configuration they were created with. There is no global
/// state; two contexts never share resource systems.
///
/// # Examples
/// ```
/// use vrs_core::{VrsConfig, VrsContext, Vrl};
///
/// let context = VrsContext::new(VrsConfig::default());
/// let root = context.open_path(&Vrl::parse("info:/").unwrap()).unwrap();
/// assert!(root.as_listable().is_some());
/// ```
pub struct VrsContext {
    id: Uuid,
    config: VrsConfig,
    registry: Registry,
    instances: ResourceSystemInstances,
    info: OnceCell<InfoResourceSystem>,
}

impl fmt::Debug for VrsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VrsContext")
            .field("id", &self.id)
            .field("schemes", &self.registry.schemes())
            .field("resource_systems", &self.instances.ids())
            .finish()
    }
}

impl VrsContext {
    /// Create a new context with the given `config` and the default factories registered.
    pub fn new(config: VrsConfig) -> Self {
        VrsContextBuilder::new().config(config).build()
    }

    /// Return a builder for configuring a new context.
    pub fn builder() -> VrsContextBuilder {
        VrsContextBuilder::new()
    }

    /// The unique ID of this context.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The configuration of this context.
    pub fn config(&self) -> &VrsConfig {
        &self.config
    }

    /// The registry of resource system factories.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Return the resource system which serves `vrl`, creating it if needed.
    ///
    /// # Errors
    /// - `Error::SchemeNotSupported`: No factory is registered for the scheme of `vrl`.
    /// - `Error::ResourceSystem`: The resource system could not be created.
    pub fn resource_system_for(&self, vrl: &Vrl) -> Result<Arc<dyn ResourceSystem>> {
        let factory = self
            .registry
            .factory_for(vrl.scheme())
            .ok_or_else(|| Error::SchemeNotSupported(vrl.scheme().to_string()))?;
        let id = factory.create_resource_system_id(vrl);

        self.instances.get_or_create(&id, || {
            log::info!("Creating resource system '{}' for {}", id, vrl);
            factory.create_resource_system(self, vrl)
        })
    }

    /// Resolve `vrl` into a path.
    ///
    /// # Errors
    /// - `Error::SchemeNotSupported`: No factory is registered for the scheme of `vrl`.
    /// - `Error::ResourceSystem`: The resource system could not be created.
    /// - `Error::NotFound`: The resource system only resolves existing nodes and there is none.
    pub fn open_path(&self, vrl: &Vrl) -> Result<Box<dyn VPath>> {
        log::debug!("open_path(): {}", vrl);
        self.resource_system_for(vrl)?.resolve_path(vrl)
    }

    /// Resolve `vrl` into a path which must exist.
    ///
    /// # Errors
    /// - `Error::NotFound`: There is nothing at `vrl`.
    /// - Anything [`open_path`] can return.
    ///
    /// [`open_path`]: crate::VrsContext::open_path
    pub fn open_existing_path(&self, vrl: &Vrl) -> Result<Box<dyn VPath>> {
        let path = self.open_path(vrl)?;
        if let Some(fs_path) = path.as_file_system() {
            if !fs_path.exists()? {
                return Err(Error::NotFound(vrl.clone()));
            }
        }
        Ok(path)
    }

    /// Resolve every locator in `vrls` into a path.
    pub fn open_paths(&self, vrls: &[Vrl]) -> Result<Vec<Box<dyn VPath>>> {
        vrls.iter().map(|vrl| self.open_path(vrl)).collect()
    }

    /// Open a stream which reads the resource at `vrl`.
    ///
    /// # Errors
    /// - `Error::UnsupportedTransfer`: The resource can't be read as a stream.
    pub fn create_input_stream(&self, vrl: &Vrl) -> Result<Box<dyn Read>> {
        let path = self.open_existing_path(vrl)?;
        let readable = path.as_readable().ok_or_else(|| Error::UnsupportedTransfer {
            side: TransferSide::Source,
            capability: "stream readable",
            vrl: vrl.clone(),
        })?;
        readable.open_read()
    }

    /// Open a stream which writes the resource at `vrl`, creating or truncating it.
    ///
    /// # Errors
    /// - `Error::UnsupportedTransfer`: The resource can't be written as a stream.
    pub fn create_output_stream(&self, vrl: &Vrl) -> Result<Box<dyn Write>> {
        let path = self.open_path(vrl)?;
        let writable = path.as_writable().ok_or_else(|| Error::UnsupportedTransfer {
            side: TransferSide::Destination,
            capability: "stream writable",
            vrl: vrl.clone(),
        })?;
        writable.open_write()
    }

    /// Return the info resource system of this context.
    ///
    /// There is one info tree per context. It is created on first use but does not load its
    /// persisted state until [`InfoResourceSystem::load_persistent_config`] is called.
    pub fn info_system(&self) -> &InfoResourceSystem {
        self.info.get_or_init(|| InfoResourceSystem::new(&self.config))
    }

    /// Remove the resource system with the given `id` from the cache and close it.
    ///
    /// This returns `false` if there was no live resource system with that ID.
    pub fn unregister_resource_system(&self, id: &str) -> bool {
        match self.instances.remove(id) {
            Some(system) => {
                if let Err(error) = system.close() {
                    log::warn!("Failed to close resource system '{}': {}", id, error);
                }
                true
            }
            None => false,
        }
    }

    /// The IDs of all live resource systems, in sorted order.
    pub fn resource_system_ids(&self) -> Vec<String> {
        self.instances.ids()
    }

    /// Close and remove every live resource system.
    pub fn close(&self) {
        for system in self.instances.drain() {
            log::debug!("Closing resource system '{}'", system.id());
            if let Err(error) = system.close() {
                log::warn!("Failed to close resource system '{}': {}", system.id(), error);
            }
        }
    }
}

impl Drop for VrsContext {
    fn drop(&mut self) {
        self.close();
    }
}

/// A builder for a [`VrsContext`].
///
/// By default, the builder registers factories for the `file`, `info` and `mem` schemes and, with
/// the `sftp` cargo feature, for `sftp` and `ssh-ftp`.
#[derive(Debug)]
pub struct VrsContextBuilder {
    config: VrsConfig,
    default_factories: bool,
    factories: Vec<Arc<dyn ResourceSystemFactory>>,
}

impl Default for VrsContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VrsContextBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        VrsContextBuilder {
            config: VrsConfig::default(),
            default_factories: true,
            factories: Vec::new(),
        }
    }

    /// Use the given `config` instead of `VrsConfig::default()`.
    pub fn config(&mut self, config: VrsConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Don't register the built-in factories.
    pub fn without_default_factories(&mut self) -> &mut Self {
        self.default_factories = false;
        self
    }

    /// Register an additional `factory`.
    ///
    /// Factories added here take precedence over the built-in ones for the same scheme.
    pub fn factory(&mut self, factory: Arc<dyn ResourceSystemFactory>) -> &mut Self {
        self.factories.push(factory);
        self
    }

    /// Build the context.
    pub fn build(&self) -> VrsContext {
        let mut registry = Registry::new();

        if self.default_factories {
            registry.register(Arc::new(LocalFileSystemFactory::new()));
            registry.register(Arc::new(InfoResourceSystemFactory::new()));
            registry.register(Arc::new(MemoryFileSystemFactory::new()));
            #[cfg(feature = "sftp")]
            registry.register(Arc::new(crate::fs::SftpFileSystemFactory::new()));
        }

        for factory in &self.factories {
            registry.register(Arc::clone(factory));
        }

        VrsContext {
            id: Uuid::new_v4(),
            config: self.config.clone(),
            registry,
            instances: ResourceSystemInstances::new(),
            info: OnceCell::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_scheme_is_not_supported() {
        let context = VrsContext::new(VrsConfig::default());
        let result = context.open_path(&Vrl::parse("gopher://host/x").unwrap());
        assert!(matches!(result, Err(Error::SchemeNotSupported(scheme)) if scheme == "gopher"));
    }

    #[test]
    fn contexts_do_not_share_resource_systems() {
        let first = VrsContext::new(VrsConfig::default());
        let second = VrsContext::new(VrsConfig::default());
        let vrl = Vrl::parse("file:/tmp").unwrap();

        first.resource_system_for(&vrl).unwrap();
        assert_eq!(first.resource_system_ids().len(), 1);
        assert!(second.resource_system_ids().is_empty());
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn unregister_removes_resource_system() {
        let context = VrsContext::new(VrsConfig::default());
        let system = context
            .resource_system_for(&Vrl::parse("file:/").unwrap())
            .unwrap();

        assert!(context.unregister_resource_system(system.id()));
        assert!(!context.unregister_resource_system(system.id()));
        assert!(context.resource_system_ids().is_empty());
    }
}
