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

use std::fmt::Debug;

use metrics::{counter, gauge, Counter, Gauge};

/// Counters of the view cache, the activation controller and the composition surface.
#[derive(Clone)]
pub struct Metrics {
    /* view cache store metrics */
    /// instances materialized by a factory
    pub store_create: Counter,
    /// factory failures, no entry left behind
    pub store_create_failed: Counter,
    /// lookups served by a retained instance
    pub store_hit: Counter,
    /// entries dropped because their tab closed
    pub store_evict: Counter,
    /// entries dropped by manual invalidation
    pub store_remove: Counter,
    /// entries dropped by a full clear
    pub store_clear: Counter,

    /// live entry count
    pub store_entries: Gauge,

    /* surface metrics */
    /// attachments to the composition surface
    pub surface_attach: Counter,
    /// detachments from the composition surface
    pub surface_detach: Counter,

    /* controller metrics */
    /// activations rejected for a path without an open tab
    pub activation_reject: Counter,
}

impl Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish()
    }
}

impl Metrics {
    /// Register all counters under the given instance name.
    pub fn new(name: &str) -> Self {
        let store_create = counter!("keepalive_op_total", "name" => name.to_string(), "op" => "create");
        let store_create_failed = counter!("keepalive_op_total", "name" => name.to_string(), "op" => "create_failed");
        let store_hit = counter!("keepalive_op_total", "name" => name.to_string(), "op" => "hit");
        let store_evict = counter!("keepalive_op_total", "name" => name.to_string(), "op" => "evict");
        let store_remove = counter!("keepalive_op_total", "name" => name.to_string(), "op" => "remove");
        let store_clear = counter!("keepalive_op_total", "name" => name.to_string(), "op" => "clear");

        let store_entries = gauge!("keepalive_entries", "name" => name.to_string());

        let surface_attach = counter!("keepalive_op_total", "name" => name.to_string(), "op" => "attach");
        let surface_detach = counter!("keepalive_op_total", "name" => name.to_string(), "op" => "detach");

        let activation_reject = counter!("keepalive_op_total", "name" => name.to_string(), "op" => "reject");

        Self {
            store_create,
            store_create_failed,
            store_hit,
            store_evict,
            store_remove,
            store_clear,
            store_entries,
            surface_attach,
            surface_detach,
            activation_reject,
        }
    }
}
