use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shapes::{PieceKind, Vec2i};

/// Settled cell content; the kind is the marker presentation colors by.
pub type Cell = Option<PieceKind>;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("cell ({}, {}) is outside the {columns}x{rows} board", .cell.x, .cell.y)]
    OutOfBounds {
        cell: Vec2i,
        columns: usize,
        rows: usize,
    },
    #[error("cell ({}, {}) is already occupied", .cell.x, .cell.y)]
    Occupied { cell: Vec2i },
}

/// Fixed-size grid of settled cells. Row 0 is the bottom row.
///
/// `row_counts[y]` always equals the number of occupied cells in row `y`;
/// every mutation goes through a method that keeps it in step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    columns: usize,
    rows: Vec<Vec<Cell>>,
    row_counts: Vec<usize>,
}

impl Board {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows: vec![vec![None; columns]; rows],
            row_counts: vec![0; rows],
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn cells(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self, y: usize) -> usize {
        self.row_counts.get(y).copied().unwrap_or(0)
    }

    pub fn cell(&self, x: i32, y: i32) -> Cell {
        let (x, y) = self.index(Vec2i::new(x, y))?;
        self.rows[y][x]
    }

    fn index(&self, cell: Vec2i) -> Option<(usize, usize)> {
        if cell.x < 0 || cell.y < 0 {
            return None;
        }
        let (x, y) = (cell.x as usize, cell.y as usize);
        if x >= self.columns || y >= self.rows.len() {
            return None;
        }
        Some((x, y))
    }

    /// Blocking test used for movement.
    ///
    /// The side walls and the floor block; anything above the top row is
    /// open so pieces can enter from above.
    pub fn is_occupied(&self, cell: Vec2i) -> bool {
        if cell.x < 0 || cell.x >= self.columns as i32 || cell.y < 0 {
            return true;
        }
        if cell.y >= self.rows.len() as i32 {
            return false;
        }
        self.rows[cell.y as usize][cell.x as usize].is_some()
    }

    /// Marks every cell occupied with `kind`.
    ///
    /// All cells are validated first; on error nothing is written.
    pub fn commit(&mut self, cells: &[Vec2i], kind: PieceKind) -> Result<(), BoardError> {
        for (i, &cell) in cells.iter().enumerate() {
            let Some((x, y)) = self.index(cell) else {
                return Err(BoardError::OutOfBounds {
                    cell,
                    columns: self.columns,
                    rows: self.rows.len(),
                });
            };
            if self.rows[y][x].is_some() || cells[..i].contains(&cell) {
                return Err(BoardError::Occupied { cell });
            }
        }

        for &cell in cells {
            let (x, y) = (cell.x as usize, cell.y as usize);
            self.rows[y][x] = Some(kind);
            self.row_counts[y] += 1;
        }
        Ok(())
    }

    /// Overwrites one cell, keeping the row count in step. Out-of-range
    /// coordinates are ignored.
    pub fn set_cell(&mut self, x: usize, y: usize, cell: Cell) {
        if y >= self.rows.len() || x >= self.columns {
            return;
        }
        match (self.rows[y][x].is_some(), cell.is_some()) {
            (false, true) => self.row_counts[y] += 1,
            (true, false) => self.row_counts[y] -= 1,
            _ => {}
        }
        self.rows[y][x] = cell;
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        self.row_count(y) == self.columns && y < self.rows.len()
    }

    /// Indices of complete rows, ascending.
    pub fn full_rows(&self) -> Vec<usize> {
        (0..self.rows.len())
            .filter(|&y| self.is_row_full(y))
            .collect()
    }

    /// Empties `y` without moving any other row.
    pub fn clear_row(&mut self, y: usize) {
        if y >= self.rows.len() {
            return;
        }
        self.rows[y].iter_mut().for_each(|cell| *cell = None);
        self.row_counts[y] = 0;
    }

    /// Drops every cleared row out of the grid in one pass.
    ///
    /// Surviving rows keep their relative order and each moves down by the
    /// number of cleared rows beneath it; the top is refilled with empty rows.
    pub fn collapse_above(&mut self, cleared: &[usize]) {
        let height = self.rows.len();
        let mut removed = vec![false; height];
        for &y in cleared {
            if y < height {
                removed[y] = true;
            }
        }
        let removed_count = removed.iter().filter(|&&r| r).count();
        if removed_count == 0 {
            return;
        }

        let mut rows = Vec::with_capacity(height);
        let mut row_counts = Vec::with_capacity(height);
        for (y, (row, count)) in self
            .rows
            .drain(..)
            .zip(self.row_counts.drain(..))
            .enumerate()
        {
            if removed[y] {
                continue;
            }
            rows.push(row);
            row_counts.push(count);
        }
        for _ in 0..removed_count {
            rows.push(vec![None; self.columns]);
            row_counts.push(0);
        }

        self.rows = rows;
        self.row_counts = row_counts;
    }

    /// Clears and collapses all complete rows, returning their original
    /// indices. Leaves the board untouched when nothing is full.
    pub fn clear_full_rows(&mut self) -> Vec<usize> {
        let full = self.full_rows();
        if full.is_empty() {
            return full;
        }
        for &y in &full {
            self.clear_row(y);
        }
        self.collapse_above(&full);
        full
    }

    pub fn occupied_cells(&self) -> Vec<Vec2i> {
        let mut out = Vec::new();
        for (y, row) in self.rows.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if cell.is_some() {
                    out.push(Vec2i::new(x as i32, y as i32));
                }
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.row_counts.iter().all(|&c| c == 0)
    }

    /// Text dump, top row first. `.` marks an empty cell.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.columns + 1) * self.rows.len());
        for row in self.rows.iter().rev() {
            for cell in row {
                out.push(cell.map(PieceKind::letter).unwrap_or('.'));
            }
            out.push('\n');
        }
        out
    }

    pub(crate) fn row_counts_consistent(&self) -> bool {
        self.rows
            .iter()
            .zip(&self.row_counts)
            .all(|(row, &count)| row.iter().filter(|c| c.is_some()).count() == count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_row(board: &mut Board, y: usize, kind: PieceKind) {
        for x in 0..board.columns() {
            board.set_cell(x, y, Some(kind));
        }
    }

    #[test]
    fn walls_and_floor_block_but_sky_is_open() {
        let board = Board::new(4, 4);
        assert!(board.is_occupied(Vec2i::new(-1, 0)));
        assert!(board.is_occupied(Vec2i::new(4, 0)));
        assert!(board.is_occupied(Vec2i::new(0, -1)));
        assert!(!board.is_occupied(Vec2i::new(0, 4)));
        assert!(!board.is_occupied(Vec2i::new(3, 100)));
        assert!(board.is_occupied(Vec2i::new(-1, 100)));
    }

    #[test]
    fn commit_updates_cells_and_row_counts() {
        let mut board = Board::new(4, 4);
        let cells = [
            Vec2i::new(0, 0),
            Vec2i::new(1, 0),
            Vec2i::new(1, 1),
            Vec2i::new(2, 1),
        ];
        board.commit(&cells, PieceKind::S).expect("cells are free");

        assert_eq!(board.row_count(0), 2);
        assert_eq!(board.row_count(1), 2);
        assert_eq!(board.cell(1, 1), Some(PieceKind::S));
        assert!(board.is_occupied(Vec2i::new(2, 1)));
        assert!(board.row_counts_consistent());
    }

    #[test]
    fn commit_rejects_without_partial_writes() {
        let mut board = Board::new(4, 4);
        board.set_cell(3, 0, Some(PieceKind::O));
        let before = board.clone();

        let err = board
            .commit(&[Vec2i::new(0, 0), Vec2i::new(3, 0)], PieceKind::T)
            .expect_err("overlaps occupied cell");
        assert_eq!(err, BoardError::Occupied { cell: Vec2i::new(3, 0) });
        assert_eq!(board, before);

        let err = board
            .commit(&[Vec2i::new(0, 0), Vec2i::new(0, 4)], PieceKind::T)
            .expect_err("above the top");
        assert!(matches!(err, BoardError::OutOfBounds { .. }));
        assert_eq!(board, before);

        let err = board
            .commit(&[Vec2i::new(1, 1), Vec2i::new(1, 1)], PieceKind::T)
            .expect_err("duplicate cell");
        assert_eq!(err, BoardError::Occupied { cell: Vec2i::new(1, 1) });
        assert_eq!(board, before);
    }

    #[test]
    fn full_rows_are_ascending() {
        let mut board = Board::new(3, 5);
        fill_row(&mut board, 3, PieceKind::I);
        fill_row(&mut board, 1, PieceKind::J);
        board.set_cell(0, 2, Some(PieceKind::T));
        assert_eq!(board.full_rows(), vec![1, 3]);
    }

    #[test]
    fn clear_row_does_not_shift() {
        let mut board = Board::new(3, 3);
        fill_row(&mut board, 0, PieceKind::I);
        board.set_cell(1, 1, Some(PieceKind::O));
        board.clear_row(0);
        assert_eq!(board.row_count(0), 0);
        assert_eq!(board.cell(1, 1), Some(PieceKind::O));
    }

    #[test]
    fn collapse_handles_adjacent_rows_cumulatively() {
        let mut board = Board::new(2, 6);
        fill_row(&mut board, 1, PieceKind::I);
        fill_row(&mut board, 2, PieceKind::I);
        board.set_cell(0, 0, Some(PieceKind::L));
        board.set_cell(1, 3, Some(PieceKind::S));
        board.set_cell(0, 4, Some(PieceKind::Z));

        let cleared = board.clear_full_rows();
        assert_eq!(cleared, vec![1, 2]);
        assert_eq!(board.cell(0, 0), Some(PieceKind::L));
        assert_eq!(board.cell(1, 1), Some(PieceKind::S));
        assert_eq!(board.cell(0, 2), Some(PieceKind::Z));
        assert_eq!(board.row_count(3), 0);
        assert_eq!(board.row_count(4), 0);
        assert_eq!(board.row_count(5), 0);
        assert_eq!(board.rows(), 6);
        assert!(board.row_counts_consistent());
    }

    #[test]
    fn collapse_ignores_duplicates_and_out_of_range() {
        let mut board = Board::new(2, 3);
        board.set_cell(0, 1, Some(PieceKind::T));
        board.collapse_above(&[0, 0, 7]);
        assert_eq!(board.cell(0, 0), Some(PieceKind::T));
        assert_eq!(board.rows(), 3);
        assert!(board.row_counts_consistent());
    }

    #[test]
    fn to_ascii_prints_top_row_first() {
        let mut board = Board::new(3, 2);
        board.set_cell(0, 0, Some(PieceKind::J));
        board.set_cell(2, 1, Some(PieceKind::Z));
        assert_eq!(board.to_ascii(), "..Z\nJ..\n");
    }
}
