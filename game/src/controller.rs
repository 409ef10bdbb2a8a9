use std::time::Duration;

use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::board::{Board, Cell};
use crate::config::{ConfigError, GameConfig};
use crate::events::{GameEvent, GameListener};
use crate::piece::ActivePiece;
use crate::randomizer::Randomizer;
use crate::shapes::{PieceKind, RotationDir, Vec2i};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerState {
    Spawning,
    Falling,
    Locking,
    ClearingLines,
    GameOver,
}

/// Discrete player commands, already translated from raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    MoveLeft,
    MoveRight,
    RotateCw,
    RotateCcw,
    SoftDrop,
    HardDrop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GravityStep {
    /// No gravity step was due.
    Idle,
    Moved,
    /// Landed, but the lock is waiting out the debounce window.
    LockPending,
    Locked,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum LockCause {
    Landed,
    HardDrop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePieceView {
    pub kind: PieceKind,
    pub rotation: u8,
    pub anchor: Vec2i,
    pub cells: Vec<Vec2i>,
}

/// Read-only view handed to presentation. `board[0]` is the bottom row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub columns: usize,
    pub rows: usize,
    pub board: Vec<Vec<Cell>>,
    pub active: Option<ActivePieceView>,
    pub ghost_anchor: Option<Vec2i>,
    pub preview: Vec<PieceKind>,
    pub state: ControllerState,
    pub lock_pending: bool,
    pub row_clear_in_progress: bool,
    pub lines_cleared: u32,
    pub pieces_locked: u32,
}

/// Owns the board and drives spawn, gravity, lock, line clear and respawn.
///
/// Single-owner and non-reentrant: each tick or command is applied in full
/// before the next one is looked at.
#[derive(Debug, Clone)]
pub struct Controller {
    config: GameConfig,
    board: Board,
    active: Option<ActivePiece>,
    state: ControllerState,
    randomizer: Randomizer,
    lock_pending: Option<LockCause>,
    descended_since_spawn: bool,
    gravity_elapsed: Duration,
    since_last_lock: Option<Duration>,
    lines_cleared: u32,
    pieces_locked: u32,
    events: Vec<GameEvent>,
}

impl Controller {
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    pub(crate) fn from_validated(config: GameConfig) -> Self {
        let mut controller = Self {
            board: Board::new(config.columns, config.rows),
            randomizer: Randomizer::new(config.randomizer, config.seed, config.preview_len),
            config,
            active: None,
            state: ControllerState::Spawning,
            lock_pending: None,
            descended_since_spawn: false,
            gravity_elapsed: Duration::ZERO,
            since_last_lock: None,
            lines_cleared: 0,
            pieces_locked: 0,
            events: Vec::new(),
        };
        controller.spawn();
        controller
    }

    /// Starts over with the same configuration and seed.
    pub fn reset(&mut self) {
        *self = Self::from_validated(self.config.clone());
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active_piece(&self) -> Option<&ActivePiece> {
        self.active.as_ref()
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_game_over(&self) -> bool {
        self.state == ControllerState::GameOver
    }

    pub fn is_lock_pending(&self) -> bool {
        self.lock_pending.is_some()
    }

    pub fn gravity_elapsed(&self) -> Duration {
        self.gravity_elapsed
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }

    pub fn pieces_locked(&self) -> u32 {
        self.pieces_locked
    }

    pub fn preview(&self) -> Vec<PieceKind> {
        self.randomizer.preview().collect()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            columns: self.board.columns(),
            rows: self.board.rows(),
            board: self.board.cells().to_vec(),
            active: self.active.map(|piece| ActivePieceView {
                kind: piece.kind(),
                rotation: piece.rotation(),
                anchor: piece.anchor(),
                cells: piece.absolute_cells().to_vec(),
            }),
            ghost_anchor: self.active.and_then(|piece| piece.ghost(&self.board)),
            preview: self.preview(),
            state: self.state,
            lock_pending: self.lock_pending.is_some(),
            row_clear_in_progress: self.state == ControllerState::ClearingLines,
            lines_cleared: self.lines_cleared,
            pieces_locked: self.pieces_locked,
        }
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn dispatch_events<L: GameListener + ?Sized>(&mut self, listener: &mut L) {
        for event in self.take_events() {
            event.dispatch(listener);
        }
    }

    /// Advances the gravity and debounce clocks, applying one downward step
    /// per elapsed gravity interval. Returns the outcome of the last step.
    pub fn on_tick(&mut self, elapsed: Duration) -> GravityStep {
        if self.state != ControllerState::Falling {
            return GravityStep::Idle;
        }

        if let Some(since) = self.since_last_lock.as_mut() {
            *since = since.saturating_add(elapsed);
        }

        let mut last = GravityStep::Idle;
        if self.lock_pending.is_some() {
            last = self.retry_pending_lock();
            if matches!(last, GravityStep::Locked | GravityStep::GameOver) {
                return last;
            }
            if self.lock_pending == Some(LockCause::HardDrop) {
                self.gravity_elapsed = Duration::ZERO;
                return last;
            }
        }

        self.gravity_elapsed = self.gravity_elapsed.saturating_add(elapsed);
        while self.gravity_elapsed >= self.config.gravity_interval
            && self.state == ControllerState::Falling
        {
            self.gravity_elapsed -= self.config.gravity_interval;
            last = self.gravity_step();
        }
        last
    }

    /// Applies one command. Returns whether the piece or game changed;
    /// blocked moves are a normal `false`.
    pub fn on_command(&mut self, command: Command) -> bool {
        if self.state != ControllerState::Falling {
            return false;
        }
        if self.lock_pending == Some(LockCause::HardDrop) {
            return false;
        }
        let Some(piece) = self.active.as_mut() else {
            return false;
        };

        let changed = match command {
            Command::MoveLeft => piece.try_move(&self.board, -1, 0),
            Command::MoveRight => piece.try_move(&self.board, 1, 0),
            Command::RotateCw => piece.try_rotate(&self.board, RotationDir::Cw),
            Command::RotateCcw => piece.try_rotate(&self.board, RotationDir::Ccw),
            Command::SoftDrop => {
                let moved = piece.soft_drop_step(&self.board);
                if moved {
                    self.descended_since_spawn = true;
                }
                moved
            }
            Command::HardDrop => {
                let rows = piece.hard_drop(&self.board);
                if rows > 0 {
                    self.descended_since_spawn = true;
                }
                debug!("hard drop {:?} by {rows} rows", piece.kind());
                self.gravity_elapsed = Duration::ZERO;
                self.request_lock(LockCause::HardDrop);
                return true;
            }
        };

        if changed && self.lock_pending == Some(LockCause::Landed) {
            let grounded = self
                .active
                .is_some_and(|piece| piece.is_grounded(&self.board));
            if !grounded {
                debug!("piece slid off its landing spot; pending lock dropped");
                self.lock_pending = None;
            }
        }
        changed
    }

    /// Overwrites a settled cell. Intended for tests and scripted setups.
    pub fn set_cell(&mut self, x: usize, y: usize, cell: Cell) {
        self.board.set_cell(x, y, cell);
    }

    /// Replaces the falling piece. Intended for tests and scripted setups.
    pub fn set_active_piece_for_test(&mut self, piece: ActivePiece) {
        self.active = Some(piece);
        self.state = ControllerState::Falling;
        self.lock_pending = None;
        self.descended_since_spawn = true;
        self.gravity_elapsed = Duration::ZERO;
    }

    fn gravity_step(&mut self) -> GravityStep {
        let Some(piece) = self.active.as_mut() else {
            return GravityStep::Idle;
        };
        if piece.soft_drop_step(&self.board) {
            self.descended_since_spawn = true;
            self.lock_pending = None;
            return GravityStep::Moved;
        }
        self.request_lock(LockCause::Landed)
    }

    fn lock_ready(&self) -> bool {
        self.since_last_lock
            .is_none_or(|since| since >= self.config.lock_debounce)
    }

    fn request_lock(&mut self, cause: LockCause) -> GravityStep {
        if !self.descended_since_spawn {
            info!("piece could not enter the board");
            self.enter_game_over();
            return GravityStep::GameOver;
        }
        if !self.lock_ready() {
            debug!("lock deferred by debounce ({cause:?})");
            self.lock_pending = Some(cause);
            return GravityStep::LockPending;
        }
        self.lock()
    }

    fn retry_pending_lock(&mut self) -> GravityStep {
        let Some(cause) = self.lock_pending else {
            return GravityStep::Idle;
        };
        if cause == LockCause::Landed {
            let grounded = self
                .active
                .is_some_and(|piece| piece.is_grounded(&self.board));
            if !grounded {
                self.lock_pending = None;
                return GravityStep::Idle;
            }
        }
        if !self.lock_ready() {
            return GravityStep::LockPending;
        }
        self.lock()
    }

    fn lock(&mut self) -> GravityStep {
        let Some(piece) = self.active.take() else {
            return GravityStep::Idle;
        };
        self.state = ControllerState::Locking;
        self.lock_pending = None;

        let cells = piece.absolute_cells();
        if let Err(e) = self.board.commit(&cells, piece.kind()) {
            error!("lock of {:?} broke a board invariant: {e}", piece.kind());
            debug_assert!(false, "lock of {:?} failed: {e}", piece.kind());
            self.enter_game_over();
            return GravityStep::GameOver;
        }
        self.pieces_locked = self.pieces_locked.saturating_add(1);
        self.since_last_lock = Some(Duration::ZERO);
        debug!("locked {:?} at {:?}", piece.kind(), piece.anchor());
        self.events.push(GameEvent::PieceLocked {
            kind: piece.kind(),
            cells: cells.to_vec(),
        });

        self.state = ControllerState::ClearingLines;
        self.clear_lines();

        self.state = ControllerState::Spawning;
        if self.spawn() {
            GravityStep::Locked
        } else {
            GravityStep::GameOver
        }
    }

    fn clear_lines(&mut self) {
        let rows = self.board.full_rows();
        if rows.is_empty() {
            return;
        }
        for &y in &rows {
            self.board.clear_row(y);
        }
        self.board.collapse_above(&rows);
        debug_assert!(self.board.row_counts_consistent());

        self.lines_cleared = self.lines_cleared.saturating_add(rows.len() as u32);
        info!("cleared rows {rows:?} ({} total)", self.lines_cleared);
        self.events.push(GameEvent::LinesCleared { rows });
    }

    fn spawn(&mut self) -> bool {
        let kind = self.randomizer.next_kind();
        let piece = ActivePiece::spawn(kind, self.config.spawn_anchor());
        self.lock_pending = None;
        self.gravity_elapsed = Duration::ZERO;
        self.descended_since_spawn = false;

        if !piece.fits(&self.board) {
            info!("spawn of {kind:?} blocked at {:?}", piece.anchor());
            self.enter_game_over();
            return false;
        }

        debug!("spawned {kind:?} at {:?}", piece.anchor());
        self.active = Some(piece);
        self.state = ControllerState::Falling;
        self.events.push(GameEvent::PieceSpawned { kind });
        true
    }

    fn enter_game_over(&mut self) {
        if self.state == ControllerState::GameOver {
            return;
        }
        self.active = None;
        self.lock_pending = None;
        self.state = ControllerState::GameOver;
        info!(
            "game over after {} pieces, {} lines",
            self.pieces_locked, self.lines_cleared
        );
        self.events.push(GameEvent::GameOver);
    }
}
