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
use std::sync::Arc;

use crate::system::ResourceSystemFactory;

/// A mapping from schemes to the factories which serve them.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    factories: HashMap<String, Arc<dyn ResourceSystemFactory>>,
}

impl Registry {
    /// Create a new registry with no factories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` for every scheme it reports.
    ///
    /// A factory registered later for the same scheme replaces the earlier one.
    pub fn register(&mut self, factory: Arc<dyn ResourceSystemFactory>) {
        for scheme in factory.schemes() {
            let scheme = scheme.to_ascii_lowercase();
            if self.factories.contains_key(&scheme) {
                log::warn!("Replacing resource system factory for scheme '{}'", scheme);
            }
            self.factories.insert(scheme, Arc::clone(&factory));
        }
    }

    /// Remove the factory for `scheme` and return it.
    pub fn unregister(&mut self, scheme: &str) -> Option<Arc<dyn ResourceSystemFactory>> {
        self.factories.remove(&scheme.to_ascii_lowercase())
    }

    /// Return the factory registered for `scheme`.
    pub fn factory_for(&self, scheme: &str) -> Option<&Arc<dyn ResourceSystemFactory>> {
        self.factories.get(&scheme.to_ascii_lowercase())
    }

    /// Return whether a factory is registered for `scheme`.
    pub fn supports(&self, scheme: &str) -> bool {
        self.factory_for(scheme).is_some()
    }

    /// Return the registered schemes in sorted order.
    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes = self.factories.keys().map(String::as_str).collect::<Vec<_>>();
        schemes.sort_unstable();
        schemes
    }
}
