use std::time::Duration;

use engine::GameLogic;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, GameConfig};
use crate::controller::{Command, Controller};

/// One frame of input for the headless runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameInput {
    Tick(#[serde(with = "crate::serde_duration")] Duration),
    Command(Command),
}

impl From<Command> for GameInput {
    fn from(command: Command) -> Self {
        GameInput::Command(command)
    }
}

/// Pure step function over [`Controller`] states, for replay and rewind.
#[derive(Debug, Clone)]
pub struct BlockfallGame {
    config: GameConfig,
}

impl BlockfallGame {
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn standard(seed: u64) -> Self {
        Self {
            config: GameConfig::default().with_seed(seed),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }
}

impl GameLogic for BlockfallGame {
    type State = Controller;
    type Input = GameInput;

    fn initial_state(&self) -> Self::State {
        Controller::from_validated(self.config.clone())
    }

    /// The returned state only holds events raised by this step.
    fn step(&self, state: &Self::State, input: Self::Input) -> Self::State {
        let mut next = state.clone();
        next.take_events();
        match input {
            GameInput::Tick(elapsed) => {
                next.on_tick(elapsed);
            }
            GameInput::Command(command) => {
                next.on_command(command);
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use engine::HeadlessRunner;

    use super::*;
    use crate::events::GameEvent;

    #[test]
    fn step_leaves_previous_state_untouched() {
        let game = BlockfallGame::standard(5);
        let initial = game.initial_state();
        let next = game.step(&initial, GameInput::Command(Command::HardDrop));

        assert_eq!(initial.pieces_locked(), 0);
        assert_eq!(next.pieces_locked(), 1);
    }

    #[test]
    fn events_belong_to_the_step_that_raised_them() {
        let mut runner = HeadlessRunner::new(BlockfallGame::standard(5));
        runner.step(Command::HardDrop.into());
        let mut after_drop = runner.state().clone();
        assert!(matches!(
            after_drop.take_events().first(),
            Some(GameEvent::PieceLocked { .. })
        ));

        runner.step(GameInput::Tick(Duration::from_millis(10)));
        let mut after_tick = runner.state().clone();
        assert!(after_tick.take_events().is_empty());
    }

    #[test]
    fn rejects_invalid_config() {
        assert!(BlockfallGame::new(GameConfig::default().with_board(1, 1)).is_err());
    }

    #[test]
    fn input_serializes_ticks_as_millis() {
        let json = serde_json::to_string(&GameInput::Tick(Duration::from_millis(16)))
            .expect("serialize input");
        assert_eq!(json, r#"{"Tick":16}"#);
        let back: GameInput = serde_json::from_str(&json).expect("parse input");
        assert_eq!(back, GameInput::Tick(Duration::from_millis(16)));
    }
}
