use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::shapes::{PIECE_CELLS, PieceKind, RotationDir, Vec2i, next_rotation, offsets};

/// The falling piece: shape, rotation state and anchor cell.
///
/// All `try_*` operations either fully apply or leave the piece untouched.
/// The board is only read here; committing cells is the controller's job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivePiece {
    kind: PieceKind,
    rotation: u8,
    anchor: Vec2i,
}

impl ActivePiece {
    pub fn spawn(kind: PieceKind, anchor: Vec2i) -> Self {
        Self::new(kind, 0, anchor)
    }

    pub fn new(kind: PieceKind, rotation: u8, anchor: Vec2i) -> Self {
        Self {
            kind,
            rotation: rotation % 4,
            anchor,
        }
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    pub fn anchor(&self) -> Vec2i {
        self.anchor
    }

    pub fn can_place(&self, board: &Board, anchor: Vec2i, rotation: u8) -> bool {
        offsets(self.kind, rotation)
            .iter()
            .all(|&offset| !board.is_occupied(anchor + offset))
    }

    pub fn fits(&self, board: &Board) -> bool {
        self.can_place(board, self.anchor, self.rotation)
    }

    pub fn try_move(&mut self, board: &Board, dx: i32, dy: i32) -> bool {
        let candidate = self.anchor + Vec2i::new(dx, dy);
        if !self.can_place(board, candidate, self.rotation) {
            return false;
        }
        self.anchor = candidate;
        true
    }

    /// No wall kicks: a colliding rotation is simply refused.
    pub fn try_rotate(&mut self, board: &Board, dir: RotationDir) -> bool {
        let candidate = next_rotation(self.rotation, dir);
        if !self.can_place(board, self.anchor, candidate) {
            return false;
        }
        self.rotation = candidate;
        true
    }

    /// One row down. `false` means the piece has landed.
    pub fn soft_drop_step(&mut self, board: &Board) -> bool {
        self.try_move(board, Vec2i::DOWN.x, Vec2i::DOWN.y)
    }

    /// Falls until blocked and returns how many rows were travelled.
    pub fn hard_drop(&mut self, board: &Board) -> u32 {
        let mut rows_dropped = 0u32;
        while self.soft_drop_step(board) {
            rows_dropped = rows_dropped.saturating_add(1);
        }
        rows_dropped
    }

    pub fn is_grounded(&self, board: &Board) -> bool {
        !self.can_place(board, self.anchor + Vec2i::DOWN, self.rotation)
    }

    /// Anchor a hard drop would reach, or `None` when the current placement
    /// is already invalid.
    pub fn ghost(&self, board: &Board) -> Option<Vec2i> {
        if !self.fits(board) {
            return None;
        }
        let mut probe = *self;
        probe.hard_drop(board);
        Some(probe.anchor)
    }

    pub fn absolute_cells(&self) -> [Vec2i; PIECE_CELLS] {
        offsets(self.kind, self.rotation).map(|offset| self.anchor + offset)
    }
}
