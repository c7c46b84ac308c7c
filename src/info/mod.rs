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

//! The `info` resource system, an in-memory tree of folders and links.
//!
//! The tree has a root, user-created folders, links to resources in other resource systems and a
//! built-in `config` node. It can be saved to and merged from a JSON file in the persistence
//! directory of the context.

pub use self::persist::{PersistedNode, PersistedTree, FORMAT_VERSION};
pub use self::system::{
    InfoPath, InfoResourceSystem, InfoResourceSystemFactory, INFO_RESOURCE_SYSTEM_ID,
};
pub use self::tree::{InfoNode, InfoTree, NodeId, NodeKind, CONFIG_NODE_NAME, INFO_SCHEME};

mod persist;
mod system;
mod tree;
