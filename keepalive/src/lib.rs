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

//! A keep-alive tab and view cache.
//!
//! Every routed path that is open as a tab keeps its materialized view alive while hidden, so switching back to the
//! tab shows the exact same instance. Closing a tab destroys its view, a refresh destroys all of them.
//!
//! ```rust
//! use keepalive::{KeepAliveBuilder, Transition, View};
//!
//! struct Page(String);
//!
//! impl View for Page {}
//!
//! let mut keep_alive = KeepAliveBuilder::new("/home")
//!     .with_title("/home", "Home")
//!     .build(|path: &str| Ok::<_, anyhow::Error>(Page(path.to_string())))
//!     .unwrap();
//!
//! assert_eq!(keep_alive.path_changed("/orders").unwrap(), Transition::Created);
//! assert_eq!(keep_alive.path_changed("/home").unwrap(), Transition::Created);
//! assert_eq!(keep_alive.path_changed("/orders").unwrap(), Transition::Resumed);
//! assert_eq!(keep_alive.render_active().unwrap().0, "/orders");
//! ```

mod activation;
mod cache;
mod surface;
mod tab;
mod title;

/// Re-exports of the public types.
pub mod prelude;
pub use prelude::*;
