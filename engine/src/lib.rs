pub mod replay;

use std::{
    fs, io,
    path::Path,
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Frame-indexed state history with rewind and branch-on-record.
///
/// Recording while rewound discards every frame after the current one, so the
/// history is always a single linear timeline. An optional cap drops the
/// oldest frames once the history grows past it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeMachine<State> {
    states: Vec<State>,
    frame: usize,
    #[serde(default)]
    max_len: Option<usize>,
}

impl<State> TimeMachine<State> {
    pub fn new(initial_state: State) -> Self {
        Self {
            states: vec![initial_state],
            frame: 0,
            max_len: None,
        }
    }

    pub fn with_max_len(initial_state: State, max_len: usize) -> Self {
        Self {
            states: vec![initial_state],
            frame: 0,
            max_len: Some(max_len.max(1)),
        }
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self) -> &State {
        &self.states[self.frame]
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.states[self.frame]
    }

    pub fn state_at(&self, frame: usize) -> Option<&State> {
        self.states.get(frame)
    }

    pub fn history(&self) -> &[State] {
        &self.states
    }

    pub fn can_rewind(&self) -> bool {
        self.frame > 0
    }

    pub fn can_forward(&self) -> bool {
        self.frame + 1 < self.states.len()
    }

    pub fn rewind(&mut self, frames: usize) -> usize {
        self.frame = self.frame.saturating_sub(frames);
        self.frame
    }

    pub fn forward(&mut self, frames: usize) -> usize {
        let max_frame = self.states.len().saturating_sub(1);
        self.frame = self.frame.saturating_add(frames).min(max_frame);
        self.frame
    }

    pub fn record(&mut self, state: State) -> usize {
        if self.frame + 1 < self.states.len() {
            self.states.truncate(self.frame + 1);
        }
        self.states.push(state);
        self.frame += 1;

        if let Some(max_len) = self.max_len {
            let overflow = self.states.len().saturating_sub(max_len);
            if overflow > 0 {
                self.states.drain(..overflow);
                self.frame -= overflow;
            }
        }
        self.frame
    }
}

impl<State> TimeMachine<State>
where
    State: Serialize + DeserializeOwned,
{
    pub fn save_json_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, json)
    }

    pub fn load_json_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let tm: Self = serde_json::from_slice(&bytes).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed parsing timemachine json {}: {e}", path.display()),
            )
        })?;
        if tm.states.is_empty() || tm.frame >= tm.states.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "timemachine json {} has frame {} outside {} states",
                    path.display(),
                    tm.frame,
                    tm.states.len()
                ),
            ));
        }
        Ok(tm)
    }
}

/// Deterministic game rules: the same state and input always produce the
/// same next state.
pub trait GameLogic {
    type State;
    type Input;

    fn initial_state(&self) -> Self::State;
    fn step(&self, state: &Self::State, input: Self::Input) -> Self::State;
}

#[derive(Debug)]
pub struct HeadlessRunner<G: GameLogic> {
    game: G,
    timemachine: TimeMachine<G::State>,
}

impl<G: GameLogic> HeadlessRunner<G> {
    pub fn new(game: G) -> Self {
        let initial_state = game.initial_state();
        Self {
            game,
            timemachine: TimeMachine::new(initial_state),
        }
    }

    /// Runner whose history keeps at most `max_len` frames.
    pub fn with_history_limit(game: G, max_len: usize) -> Self {
        let initial_state = game.initial_state();
        Self {
            game,
            timemachine: TimeMachine::with_max_len(initial_state, max_len),
        }
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn frame(&self) -> usize {
        self.timemachine.frame()
    }

    pub fn state(&self) -> &G::State {
        self.timemachine.state()
    }

    pub fn history(&self) -> &[G::State] {
        self.timemachine.history()
    }

    pub fn timemachine(&self) -> &TimeMachine<G::State> {
        &self.timemachine
    }

    pub fn step(&mut self, input: G::Input) -> usize {
        let next_state = self.game.step(self.timemachine.state(), input);
        self.timemachine.record(next_state)
    }

    pub fn run<I>(&mut self, inputs: I) -> usize
    where
        I: IntoIterator<Item = G::Input>,
    {
        let mut last_frame = self.frame();
        for input in inputs {
            last_frame = self.step(input);
        }
        last_frame
    }

    pub fn rewind(&mut self, frames: usize) -> usize {
        self.timemachine.rewind(frames)
    }

    pub fn forward(&mut self, frames: usize) -> usize {
        self.timemachine.forward(frames)
    }

    pub fn reset(&mut self) {
        let initial_state = self.game.initial_state();
        self.timemachine = match self.timemachine.max_len {
            Some(max_len) => TimeMachine::with_max_len(initial_state, max_len),
            None => TimeMachine::new(initial_state),
        };
    }
}
