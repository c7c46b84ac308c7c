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

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use once_cell::sync::OnceCell;

use crate::error::Result;
use crate::system::ResourceSystem;

type Slot = Arc<OnceCell<Arc<dyn ResourceSystem>>>;

/// The resource systems which are live in one context, keyed by resource system ID.
///
/// Creation of a resource system is serialized per ID: the first caller creates it while any
/// concurrent caller for the same ID waits and then receives the same instance. Callers for
/// other IDs are not blocked. If creation fails, the next caller tries again.
#[derive(Debug, Default)]
pub struct ResourceSystemInstances {
    slots: Mutex<HashMap<String, Slot>>,
}

impl ResourceSystemInstances {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the resource system with the given `id`, creating it with `create` if needed.
    pub fn get_or_create<F>(&self, id: &str, create: F) -> Result<Arc<dyn ResourceSystem>>
    where
        F: FnOnce() -> Result<Arc<dyn ResourceSystem>>,
    {
        let slot = Arc::clone(self.slots().entry(id.to_string()).or_default());
        let system = slot.get_or_try_init(create)?;
        Ok(Arc::clone(system))
    }

    /// Return the live resource system with the given `id`.
    pub fn get(&self, id: &str) -> Option<Arc<dyn ResourceSystem>> {
        self.slots()
            .get(id)
            .and_then(|slot| slot.get())
            .map(Arc::clone)
    }

    /// Remove the resource system with the given `id` from the cache and return it.
    pub fn remove(&self, id: &str) -> Option<Arc<dyn ResourceSystem>> {
        self.slots()
            .remove(id)
            .and_then(|slot| slot.get().map(Arc::clone))
    }

    /// Return the IDs of all live resource systems.
    pub fn ids(&self) -> Vec<String> {
        let mut ids = self
            .slots()
            .iter()
            .filter(|(_, slot)| slot.get().is_some())
            .map(|(id, _)| id.clone())
            .collect::<Vec<_>>();
        ids.sort();
        ids
    }

    /// Remove every resource system from the cache and return them.
    pub fn drain(&self) -> Vec<Arc<dyn ResourceSystem>> {
        self.slots()
            .drain()
            .filter_map(|(_, slot)| slot.get().map(Arc::clone))
            .collect()
    }
}
