use serde::{Deserialize, Serialize};

use crate::shapes::{PieceKind, Vec2i};

/// Notifications for scoring, audio and animation collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    PieceSpawned { kind: PieceKind },
    PieceLocked { kind: PieceKind, cells: Vec<Vec2i> },
    /// Original row indices of the cleared rows, ascending.
    LinesCleared { rows: Vec<usize> },
    GameOver,
}

/// Listener hooks; every method defaults to a no-op.
pub trait GameListener {
    fn on_piece_spawned(&mut self, _kind: PieceKind) {}
    fn on_piece_locked(&mut self, _kind: PieceKind, _cells: &[Vec2i]) {}
    fn on_lines_cleared(&mut self, _rows: &[usize]) {}
    fn on_game_over(&mut self) {}
}

impl GameEvent {
    pub fn dispatch<L: GameListener + ?Sized>(&self, listener: &mut L) {
        match self {
            GameEvent::PieceSpawned { kind } => listener.on_piece_spawned(*kind),
            GameEvent::PieceLocked { kind, cells } => listener.on_piece_locked(*kind, cells),
            GameEvent::LinesCleared { rows } => listener.on_lines_cleared(rows),
            GameEvent::GameOver => listener.on_game_over(),
        }
    }
}
