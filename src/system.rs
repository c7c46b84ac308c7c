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

use std::fmt;
use std::sync::Arc;

use static_assertions::assert_obj_safe;

use crate::context::VrsContext;
use crate::error::Result;
use crate::path::VPath;
use crate::vrl::Vrl;

/// A stateful binding to one backend.
///
/// A resource system is bound to one scheme and authority (host, port and credentials) and owns
/// whatever session state the backend needs, such as an SFTP connection. Resource systems are
/// created by a [`ResourceSystemFactory`] and cached by the [`VrsContext`] under the ID the
/// factory assigns, so there is at most one live resource system per ID in a context.
///
/// [`VrsContext`]: crate::VrsContext
pub trait ResourceSystem: fmt::Debug + Send + Sync {
    /// The ID under which this resource system is cached.
    fn id(&self) -> &str;

    /// Resolve `vrl` into a path in this resource system.
    ///
    /// Whether the path must exist depends on the resource system. File systems return paths
    /// for nodes which don't exist yet, so that they can be created.
    ///
    /// # Errors
    /// - `Error::NotFound`: The resource system can only resolve existing nodes and there is no
    /// node at `vrl`.
    /// - `Error::ResourceSystem`: The backend failed.
    fn resolve_path(&self, vrl: &Vrl) -> Result<Box<dyn VPath>>;

    /// Release any session state held by this resource system.
    ///
    /// This is called when the resource system is removed from its context.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

assert_obj_safe!(ResourceSystem);

/// A plugin which creates resource systems for a set of schemes.
///
/// Factories are registered with a [`VrsContext`] when it is built. This is the seam for adding
/// new storage backends.
///
/// [`VrsContext`]: crate::VrsContext
pub trait ResourceSystemFactory: fmt::Debug + Send + Sync {
    /// The schemes this factory handles.
    fn schemes(&self) -> &[&'static str];

    /// Return the cache ID of the resource system which serves `vrl`.
    ///
    /// Locators which map to the same ID share one resource system. The ID should include
    /// everything that distinguishes one session from another, like the host, port and user.
    fn create_resource_system_id(&self, vrl: &Vrl) -> String;

    /// Create a new resource system which serves `vrl`.
    ///
    /// # Errors
    /// - `Error::ResourceSystem`: A session could not be established, for example because
    /// authentication failed or the host is unreachable.
    fn create_resource_system(
        &self,
        context: &VrsContext,
        vrl: &Vrl,
    ) -> Result<Arc<dyn ResourceSystem>>;
}

assert_obj_safe!(ResourceSystemFactory);
