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

//! Utilities for testing.

use std::sync::Arc;

use keepalive_common::{
    code::{Key, Value},
    event::{Event, EventListener},
};
use parking_lot::Mutex;

/// An event listener that records all received events with their keys.
#[derive(Debug)]
pub struct RecordingListener<K, V> {
    events: Arc<Mutex<Vec<(Event, K)>>>,
    _marker: std::marker::PhantomData<fn() -> V>,
}

impl<K, V> Clone for RecordingListener<K, V> {
    fn clone(&self) -> Self {
        Self {
            events: self.events.clone(),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<K, V> Default for RecordingListener<K, V> {
    fn default() -> Self {
        Self {
            events: Default::default(),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<K, V> EventListener for RecordingListener<K, V>
where
    K: Key,
    V: Value,
{
    type Key = K;
    type Value = V;

    fn on_event(&self, event: Event, key: &Self::Key, _: &Self::Value) {
        self.events.lock().push((event, key.clone()));
    }
}

impl<K, V> RecordingListener<K, V> {
    /// Take all recorded events, leaving the record empty.
    pub fn take(&self) -> Vec<(Event, K)> {
        std::mem::take(&mut *self.events.lock())
    }
}
