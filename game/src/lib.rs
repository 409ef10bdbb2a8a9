pub mod board;
pub mod config;
pub mod controller;
pub mod events;
pub mod logic;
pub mod piece;
pub mod randomizer;
pub mod serde_duration;
pub mod shapes;

pub use board::{Board, BoardError, Cell};
pub use config::{ConfigError, ConfigStore, GameConfig};
pub use controller::{Command, Controller, ControllerState, GameSnapshot, GravityStep};
pub use events::{GameEvent, GameListener};
pub use logic::{BlockfallGame, GameInput};
pub use piece::ActivePiece;
pub use randomizer::{Randomizer, RandomizerKind};
pub use shapes::{PieceKind, RotationDir, Vec2i};
