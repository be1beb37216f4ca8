// Copyright 2026 keepalive Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::code::{Key, Value};

/// Event identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// A view instance is materialized and stored for a key.
    Create,
    /// A stored view is removed because its tab is no longer open.
    Evict,
    /// A stored view is removed by manual invalidation.
    Remove,
    /// A stored view is removed because the whole store is cleared.
    Clear,
    /// A view is attached to the composition surface.
    Attach,
    /// A view is detached from the composition surface. The instance stays alive.
    Detach,
}

/// Trait for the customized event listener.
///
/// Listeners are called synchronously, after the store or the surface has applied the change.
pub trait EventListener: Send + Sync + 'static {
    /// Associated key type.
    type Key;
    /// Associated value type.
    type Value;

    /// Called when a cached view changes with the reason.
    #[expect(unused_variables)]
    fn on_event(&self, event: Event, key: &Self::Key, value: &Self::Value)
    where
        Self::Key: Key,
        Self::Value: Value,
    {
    }
}
