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

use std::{fmt::Debug, hash::Hash};

/// Key trait for the view cache.
///
/// Keys identify a cached view, usually the routed path it was rendered for.
pub trait Key: Send + Sync + 'static + Hash + Eq + Clone + Debug {}
impl<T: Send + Sync + 'static + Hash + Eq + Clone + Debug> Key for T {}

/// Value trait for the view cache.
///
/// A value is an opaque handle to a mounted view. The cache never clones it, it only shares it by reference.
pub trait Value: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Value for T {}
