use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Cells per tetromino.
pub const PIECE_CELLS: usize = 4;
pub const ROTATION_STATES: u8 = 4;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceKind {
    I,
    O,
    L,
    J,
    T,
    S,
    Z,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::L,
        PieceKind::J,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
    ];

    pub fn letter(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::L => 'L',
            PieceKind::J => 'J',
            PieceKind::T => 'T',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
        }
    }
}

/// Grid coordinate: `x` is the column, `y` the row (row 0 at the bottom).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vec2i {
    pub x: i32,
    pub y: i32,
}

impl Vec2i {
    pub const ZERO: Vec2i = Vec2i { x: 0, y: 0 };
    pub const DOWN: Vec2i = Vec2i { x: 0, y: -1 };
    pub const LEFT: Vec2i = Vec2i { x: -1, y: 0 };
    pub const RIGHT: Vec2i = Vec2i { x: 1, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2i {
    type Output = Vec2i;

    fn add(self, rhs: Vec2i) -> Self::Output {
        Vec2i::new(self.x + rhs.x, self.y + rhs.y)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RotationDir {
    Cw,
    Ccw,
}

impl RotationDir {
    /// Rotation-index delta: counter-clockwise counts up.
    pub const fn delta(self) -> i8 {
        match self {
            RotationDir::Ccw => 1,
            RotationDir::Cw => -1,
        }
    }
}

pub fn next_rotation(rotation: u8, dir: RotationDir) -> u8 {
    let states = ROTATION_STATES as i8;
    let current = (rotation % ROTATION_STATES) as i8;
    ((current + dir.delta() + states) % states) as u8
}

/// Relative cells of `kind` in rotation state `rotation` (taken modulo 4).
///
/// Offset (0, 0) is the kind's pivot cell. Every rotation-0 footprint rests on
/// the pivot row, so a freshly spawned piece never reaches below its anchor.
pub fn offsets(kind: PieceKind, rotation: u8) -> [Vec2i; PIECE_CELLS] {
    let grid = piece_grid(kind, rotation);
    let (pivot_x, pivot_y) = pivot(kind);
    let mut out = [Vec2i::ZERO; PIECE_CELLS];
    let mut n = 0;

    for gy in 0..grid.size() {
        for gx in 0..grid.size() {
            if !grid.cell(gx, gy) {
                continue;
            }
            debug_assert!(n < PIECE_CELLS, "{kind:?} grid has more than four cells");
            // Grid rows grow downward; board rows grow upward.
            out[n] = Vec2i::new(gx as i32 - pivot_x, pivot_y - gy as i32);
            n += 1;
        }
    }

    debug_assert_eq!(n, PIECE_CELLS, "{kind:?} grid must have four cells");
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PieceGrid {
    size: usize,
    cells: [bool; 16],
}

impl PieceGrid {
    pub(crate) fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn cell(&self, x: usize, y: usize) -> bool {
        debug_assert!(x < self.size && y < self.size);
        self.cells[y * self.size + x]
    }
}

const fn pivot(kind: PieceKind) -> (i32, i32) {
    match kind {
        PieceKind::O => (0, 1),
        PieceKind::I | PieceKind::L | PieceKind::J | PieceKind::T | PieceKind::S | PieceKind::Z => {
            (1, 1)
        }
    }
}

pub(crate) fn piece_grid(kind: PieceKind, rotation: u8) -> PieceGrid {
    let mut grid = base_piece_grid(kind);
    for _ in 0..rotation % ROTATION_STATES {
        grid = rotate_grid_ccw(&grid);
    }
    grid
}

fn rotate_grid_ccw(grid: &PieceGrid) -> PieceGrid {
    let size = grid.size;
    let mut rotated = PieceGrid {
        size,
        cells: [false; 16],
    };

    for y in 0..size {
        for x in 0..size {
            // (x, y) lands on (y, size - 1 - x) in the y-down grid.
            let dst_col = y;
            let dst_row = size - 1 - x;
            rotated.cells[dst_row * size + dst_col] = grid.cells[y * size + x];
        }
    }

    rotated
}

const fn grid_from_rows<const N: usize>(rows: [[u8; N]; N]) -> PieceGrid {
    let mut cells = [false; 16];
    let mut y = 0;
    while y < N {
        let mut x = 0;
        while x < N {
            cells[y * N + x] = rows[y][x] == 1;
            x += 1;
        }
        y += 1;
    }
    PieceGrid { size: N, cells }
}

fn base_piece_grid(kind: PieceKind) -> PieceGrid {
    match kind {
        PieceKind::I => grid_from_rows([
            [0, 0, 0, 0], //
            [1, 1, 1, 1], //
            [0, 0, 0, 0], //
            [0, 0, 0, 0], //
        ]),
        PieceKind::O => grid_from_rows([
            [1, 1], //
            [1, 1], //
        ]),
        PieceKind::L => grid_from_rows([
            [0, 0, 1], //
            [1, 1, 1], //
            [0, 0, 0], //
        ]),
        PieceKind::J => grid_from_rows([
            [1, 0, 0], //
            [1, 1, 1], //
            [0, 0, 0], //
        ]),
        PieceKind::T => grid_from_rows([
            [0, 1, 0], //
            [1, 1, 1], //
            [0, 0, 0], //
        ]),
        PieceKind::S => grid_from_rows([
            [0, 1, 1], //
            [1, 1, 0], //
            [0, 0, 0], //
        ]),
        PieceKind::Z => grid_from_rows([
            [1, 1, 0], //
            [0, 1, 1], //
            [0, 0, 0], //
        ]),
    }
}
