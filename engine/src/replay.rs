//! Input recording and deterministic replay.
//!
//! A session is reproduced from its inputs alone: feed the same `InputLog`
//! into the same `GameLogic` and the final state matches the live run.

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{GameLogic, HeadlessRunner};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLog<I> {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub label: String,
    pub inputs: Vec<I>,
}

fn default_version() -> u32 {
    1
}

impl<I> Default for InputLog<I> {
    fn default() -> Self {
        Self {
            version: default_version(),
            label: String::new(),
            inputs: Vec::new(),
        }
    }
}

impl<I> InputLog<I> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, input: I) {
        self.inputs.push(input);
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

impl<I> InputLog<I>
where
    I: Serialize + DeserializeOwned,
{
    pub fn save_json_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = fs::File::create(path)?;
        let mut writer = io::BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writer.flush()
    }

    pub fn load_json_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = fs::File::open(path)?;
        let reader = io::BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed parsing input log {}: {e}", path.display()),
            )
        })
    }
}

/// Steps `game` through every input while appending each one to `log`.
pub fn record<G, It>(runner: &mut HeadlessRunner<G>, log: &mut InputLog<G::Input>, inputs: It)
where
    G: GameLogic,
    G::Input: Clone,
    It: IntoIterator<Item = G::Input>,
{
    for input in inputs {
        log.push(input.clone());
        runner.step(input);
    }
}

/// Replays a recorded log from the game's initial state.
pub fn replay<G>(game: G, log: &InputLog<G::Input>) -> HeadlessRunner<G>
where
    G: GameLogic,
    G::Input: Clone,
{
    let mut runner = HeadlessRunner::new(game);
    runner.run(log.inputs.iter().cloned());
    runner
}
