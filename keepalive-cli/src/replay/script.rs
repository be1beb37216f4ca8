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

use std::fmt::Display;

use crate::replay::error::{Error, Result};

/// A single script command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Nav(String),
    Close(String),
    CloseOthers(String),
    CloseRight(String),
    CloseAll,
    Select(String),
    Refresh,
    Evict(String),
    Teardown,
}

impl Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Nav(path) => write!(f, "nav {path}"),
            Step::Close(key) => write!(f, "close {key}"),
            Step::CloseOthers(key) => write!(f, "close-others {key}"),
            Step::CloseRight(key) => write!(f, "close-right {key}"),
            Step::CloseAll => write!(f, "close-all"),
            Step::Select(key) => write!(f, "select {key}"),
            Step::Refresh => write!(f, "refresh"),
            Step::Evict(path) => write!(f, "evict {path}"),
            Step::Teardown => write!(f, "teardown"),
        }
    }
}

/// Parse a script into steps tagged with their 1-based line number.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn parse(script: &str) -> Result<Vec<(usize, Step)>> {
    let mut steps = vec![];

    for (index, raw) in script.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let mut words = text.split_whitespace();
        let command = words.next().unwrap_or_default();
        let args = words.collect::<Vec<_>>();

        let arity = |expected: usize| {
            if args.len() == expected {
                Ok(())
            } else {
                Err(Error::Arity {
                    line,
                    command: command.to_string(),
                    expected,
                })
            }
        };
        let arg = || args[0].to_string();

        let step = match command {
            "nav" => arity(1).map(|_| Step::Nav(arg()))?,
            "close" => arity(1).map(|_| Step::Close(arg()))?,
            "close-others" => arity(1).map(|_| Step::CloseOthers(arg()))?,
            "close-right" => arity(1).map(|_| Step::CloseRight(arg()))?,
            "close-all" => arity(0).map(|_| Step::CloseAll)?,
            "select" => arity(1).map(|_| Step::Select(arg()))?,
            "refresh" => arity(0).map(|_| Step::Refresh)?,
            "evict" => arity(1).map(|_| Step::Evict(arg()))?,
            "teardown" => arity(0).map(|_| Step::Teardown)?,
            _ => {
                return Err(Error::UnknownCommand {
                    line,
                    command: command.to_string(),
                })
            }
        };
        steps.push((line, step));
    }

    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let script = r#"
# open two tabs
nav /a
nav /b

close-others /a
close-all
refresh
"#;
        let steps = parse(script).unwrap();
        assert_eq!(
            steps,
            vec![
                (3, Step::Nav("/a".to_string())),
                (4, Step::Nav("/b".to_string())),
                (6, Step::CloseOthers("/a".to_string())),
                (7, Step::CloseAll),
                (8, Step::Refresh),
            ]
        );
        assert_eq!(steps[2].1.to_string(), "close-others /a");
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            parse("nav /a\njump /b"),
            Err(Error::UnknownCommand { line: 2, .. })
        ));
        assert!(matches!(
            parse("close"),
            Err(Error::Arity { line: 1, expected: 1, .. })
        ));
        assert!(matches!(
            parse("refresh now"),
            Err(Error::Arity { line: 1, expected: 0, .. })
        ));
    }
}
