use std::time::Duration;

use blockfall::{BlockfallGame, Command, ConfigStore, GameInput};
use engine::HeadlessRunner;
use log::{error, info};

const FRAME: Duration = Duration::from_millis(16);

fn main() {
    env_logger::init();

    let store = ConfigStore::from_env();
    let config = store.load();
    info!("config from {}", store.path().display());

    let game = match BlockfallGame::new(config) {
        Ok(game) => game,
        Err(e) => {
            error!("invalid config: {e}");
            std::process::exit(2);
        }
    };

    // Scripted session: shuffle each piece sideways, turn it, then drop.
    let script = [
        Command::MoveLeft,
        Command::RotateCw,
        Command::MoveRight,
        Command::MoveRight,
        Command::RotateCcw,
        Command::SoftDrop,
    ];
    let mut runner = HeadlessRunner::with_history_limit(game, 600);
    let mut pieces = 0usize;
    while !runner.state().is_game_over() && pieces < 40 {
        let shift = script[pieces % script.len()];
        runner.step(GameInput::Command(shift));
        runner.step(GameInput::Tick(FRAME));
        runner.step(GameInput::Command(Command::HardDrop));
        // Let the lock debounce run out before the next piece.
        for _ in 0..8 {
            runner.step(GameInput::Tick(FRAME));
        }
        pieces += 1;
    }

    let state = runner.state();
    println!("{}", state.board().to_ascii());
    println!(
        "frame {} pieces {} lines {} game_over {}",
        runner.frame(),
        state.pieces_locked(),
        state.lines_cleared(),
        state.is_game_over()
    );
}
