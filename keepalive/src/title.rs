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

use std::collections::HashMap;

use itertools::Itertools;

/// Label used when a path yields no title at all.
pub const UNTITLED: &str = "Untitled";

/// Derives tab labels from paths.
///
/// Resolution order: an exact title of the path, then a title of its first two segments (paths with parameters such
/// as `/system/user/42`), then the capitalised last segment.
#[derive(Debug, Clone, Default)]
pub struct TitleResolver {
    titles: HashMap<String, String>,
}

impl TitleResolver {
    /// Create a resolver without known titles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the title of a path.
    pub fn with_title(mut self, path: impl Into<String>, label: impl Into<String>) -> Self {
        self.insert(path, label);
        self
    }

    /// Register the title of a path.
    pub fn insert(&mut self, path: impl Into<String>, label: impl Into<String>) {
        self.titles.insert(path.into(), label.into());
    }

    /// Resolve the label of `path`.
    pub fn resolve(&self, path: &str) -> String {
        if let Some(label) = self.titles.get(path) {
            return label.clone();
        }

        let segments = path.split('/').filter(|s| !s.is_empty()).collect_vec();
        if segments.len() >= 2 {
            let base = format!("/{}/{}", segments[0], segments[1]);
            if let Some(label) = self.titles.get(&base) {
                return label.clone();
            }
        }

        match segments.last() {
            Some(last) => capitalize(last),
            None => UNTITLED.to_string(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        let resolver = TitleResolver::new()
            .with_title("/home", "Home")
            .with_title("/system/user", "Users");

        assert_eq!(resolver.resolve("/home"), "Home");
        assert_eq!(resolver.resolve("/system/user"), "Users");
        assert_eq!(resolver.resolve("/system/user/42"), "Users");
        assert_eq!(resolver.resolve("/system/role"), "Role");
        assert_eq!(resolver.resolve("/reports"), "Reports");
        assert_eq!(resolver.resolve("/"), UNTITLED);
        assert_eq!(resolver.resolve(""), UNTITLED);
    }
}
