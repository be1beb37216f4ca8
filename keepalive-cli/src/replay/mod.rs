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

mod error;
mod script;

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::PathBuf,
    sync::atomic::{AtomicU64, Ordering},
};

use clap::Args;
use keepalive::{KeepAlive, KeepAliveBuilder, TabSnapshot, View};
use script::Step;

use crate::replay::error::Result;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Script file with one command per line.
    ///
    /// Commands: `nav P`, `close K`, `close-others K`, `close-right K`, `close-all`, `select K`, `refresh`, `evict P`,
    /// `teardown`. Lines starting with `#` are comments.
    script: PathBuf,

    /// Path of the pinned home tab.
    #[arg(long, default_value = "/home")]
    home: String,

    /// Creating the view of any path with this prefix fails.
    #[arg(long)]
    fail: Option<String>,

    /// Tab snapshot file. Loaded before the run if it exists, saved after the run.
    #[arg(long)]
    state: Option<PathBuf>,
}

/// A view that only knows its path and creation serial.
#[derive(Debug)]
struct ScriptView {
    path: String,
    serial: u64,
}

impl View for ScriptView {
    fn on_activate(&self, first: bool) {
        tracing::debug!("[replay]: activate {}#{} (first: {first})", self.path, self.serial);
    }

    fn on_deactivate(&self, last: bool) {
        tracing::debug!("[replay]: deactivate {}#{} (last: {last})", self.path, self.serial);
    }
}

impl Drop for ScriptView {
    fn drop(&mut self) {
        tracing::debug!("[replay]: destroy {}#{}", self.path, self.serial);
    }
}

pub fn run(args: ReplayArgs) -> Result<()> {
    let stdout = std::io::stdout();
    replay(&args, &mut stdout.lock())
}

fn replay(args: &ReplayArgs, out: &mut impl Write) -> Result<()> {
    let steps = script::parse(&std::fs::read_to_string(&args.script)?)?;

    let mut keep_alive = open(args)?;
    writeln!(out, "{}", describe(&keep_alive))?;

    for (line, step) in steps {
        let outcome = match apply(&mut keep_alive, &step) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("[replay]: line {line}: {step} failed: {e}");
                format!("error: {e}")
            }
        };
        writeln!(out, "{line}: {step} => {outcome}")?;
        writeln!(out, "{}", describe(&keep_alive))?;
    }

    if let Some(state) = args.state.as_ref() {
        let mut writer = BufWriter::new(File::create(state)?);
        serde_json::to_writer_pretty(&mut writer, &keep_alive.snapshot())?;
        writer.flush()?;
        tracing::info!("[replay]: tab state saved to {}", state.display());
    }

    Ok(())
}

fn open(args: &ReplayArgs) -> Result<KeepAlive<ScriptView>> {
    let mut builder = KeepAliveBuilder::<ScriptView>::new(args.home.clone()).with_name("replay");

    if let Some(state) = args.state.as_ref().filter(|state| state.exists()) {
        let snapshot: TabSnapshot = serde_json::from_reader(BufReader::new(File::open(state)?))?;
        tracing::info!("[replay]: restore {} tabs from {}", snapshot.tabs.len(), state.display());
        builder = builder.with_snapshot(snapshot);
    }

    let fail = args.fail.clone();
    let serial = AtomicU64::new(0);
    let keep_alive = builder.build(move |path: &str| {
        if let Some(prefix) = fail.as_deref() {
            if path.starts_with(prefix) {
                anyhow::bail!("view of {path} cannot be created");
            }
        }
        Ok(ScriptView {
            path: path.to_string(),
            serial: serial.fetch_add(1, Ordering::Relaxed) + 1,
        })
    })?;

    Ok(keep_alive)
}

fn apply(keep_alive: &mut KeepAlive<ScriptView>, step: &Step) -> keepalive::Result<String> {
    let closed = |removed: usize| format!("{removed} closed");

    let outcome = match step {
        Step::Nav(path) => format!("{:?}", keep_alive.path_changed(path)?),
        Step::Close(key) => closed(keep_alive.close_tab(key)?.removed.len()),
        Step::CloseOthers(key) => closed(keep_alive.close_others(key)?.removed.len()),
        Step::CloseRight(key) => closed(keep_alive.close_right(key)?.removed.len()),
        Step::CloseAll => closed(keep_alive.close_all()?.removed.len()),
        Step::Select(key) => format!("{:?}", keep_alive.select_tab(key)?),
        Step::Refresh => match keep_alive.refresh_requested()? {
            Some(view) => format!("recreated {}#{}", view.path, view.serial),
            None => "refreshed".to_string(),
        },
        Step::Evict(path) => match keep_alive.evict(path) {
            true => "evicted".to_string(),
            false => "not cached".to_string(),
        },
        Step::Teardown => {
            keep_alive.teardown();
            "torn down".to_string()
        }
    };

    Ok(outcome)
}

fn describe(keep_alive: &KeepAlive<ScriptView>) -> String {
    let registry = keep_alive.registry();
    let tabs = registry
        .tabs()
        .iter()
        .map(|tab| {
            let mut s = String::new();
            if registry.active() == Some(tab.key.as_str()) {
                s.push('*');
            }
            s.push_str(&tab.key);
            if tab.pinned {
                s.push('^');
            }
            s
        })
        .collect::<Vec<_>>()
        .join(" ");
    let view = match keep_alive.render_active() {
        Some(view) => format!("{}#{}", view.path, view.serial),
        None => "-".to_string(),
    };

    format!(
        "  tabs: [{tabs}] active: {} cached: [{}] view: {view}",
        keep_alive.active_key().unwrap_or("-"),
        keep_alive.cached_keys().join(" ")
    )
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn args(dir: &Path, script: &str) -> ReplayArgs {
        let path = dir.join("script.txt");
        std::fs::write(&path, script).unwrap();
        ReplayArgs {
            script: path,
            home: "/home".to_string(),
            fail: None,
            state: None,
        }
    }

    fn output(args: &ReplayArgs) -> Vec<String> {
        let mut out = vec![];
        replay(args, &mut out).unwrap();
        String::from_utf8(out).unwrap().lines().map(String::from).collect()
    }

    #[test]
    fn test_replay() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), "nav /a\nnav /b\nnav /a\nclose /a\nrefresh\n");

        let lines = output(&args);
        assert_eq!(lines[0], "  tabs: [/home^] active: - cached: [] view: -");
        assert_eq!(lines[1], "1: nav /a => Created");
        assert_eq!(lines[2], "  tabs: [/home^ */a] active: /a cached: [/a] view: /a#1");
        assert_eq!(lines[5], "3: nav /a => Resumed");
        assert_eq!(lines[6], "  tabs: [/home^ */a /b] active: /a cached: [/a /b] view: /a#1");
        assert_eq!(lines[7], "4: close /a => 1 closed");
        assert_eq!(lines[8], "  tabs: [/home^ */b] active: /b cached: [/b] view: /b#2");
        assert_eq!(lines[9], "5: refresh => recreated /b#3");
    }

    #[test]
    fn test_replay_creation_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path(), "nav /a\nnav /broken/1\n");
        args.fail = Some("/broken".to_string());

        let lines = output(&args);
        assert!(lines[3].starts_with("2: nav /broken/1 => error: View creation failure"));
        assert_eq!(
            lines[4],
            "  tabs: [/home^ /a */broken/1] active: /a cached: [/a] view: /a#1"
        );
    }

    #[test]
    fn test_replay_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = args(dir.path(), "nav /a\nnav /b\nselect /a\n");
        first.state = Some(dir.path().join("state.json"));
        output(&first);

        let mut second = args(dir.path(), "select /b\n");
        second.state = first.state.clone();
        let lines = output(&second);
        assert_eq!(lines[0], "  tabs: [/home^ */a /b] active: - cached: [] view: -");
        assert_eq!(lines[1], "1: select /b => Created");
    }

    #[test]
    fn test_replay_bad_script() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), "nav /a\nfly /b\n");

        let mut out = vec![];
        let e = replay(&args, &mut out).unwrap_err();
        assert_eq!(e.to_string(), "line 2: unknown command \"fly\"");
        assert!(out.is_empty());
    }
}
