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

//! Shared components and utils for keepalive.

/// Key and value traits for the view cache.
pub mod code;
/// Error type shared by all keepalive crates.
pub mod error;
/// Store and surface change notifications.
pub mod event;
/// Metrics registered through the `metrics` facade.
pub mod metrics;
