use std::time::Duration;

use blockfall::{
    ActivePiece, Command, Controller, ControllerState, GameConfig, GameEvent, GameListener,
    GravityStep, PieceKind, Vec2i,
};

fn instant_lock_config() -> GameConfig {
    GameConfig {
        lock_debounce: Duration::ZERO,
        gravity_interval: Duration::from_millis(100),
        ..GameConfig::default()
    }
}

fn controller() -> Controller {
    Controller::new(instant_lock_config()).expect("valid config")
}

fn fill_row_except(c: &mut Controller, y: usize, skip: &[usize], kind: PieceKind) {
    for x in 0..c.board().columns() {
        if !skip.contains(&x) {
            c.set_cell(x, y, Some(kind));
        }
    }
}

#[derive(Default)]
struct Recorder {
    spawned: Vec<PieceKind>,
    locked: usize,
    cleared: Vec<Vec<usize>>,
    game_over: bool,
}

impl GameListener for Recorder {
    fn on_piece_spawned(&mut self, kind: PieceKind) {
        self.spawned.push(kind);
    }

    fn on_piece_locked(&mut self, _kind: PieceKind, cells: &[Vec2i]) {
        assert_eq!(cells.len(), 4);
        self.locked += 1;
    }

    fn on_lines_cleared(&mut self, rows: &[usize]) {
        self.cleared.push(rows.to_vec());
    }

    fn on_game_over(&mut self) {
        self.game_over = true;
    }
}

#[test]
fn move_left_against_wall_is_refused() {
    let mut c = controller();
    c.set_active_piece_for_test(ActivePiece::spawn(PieceKind::O, Vec2i::new(0, 10)));

    assert!(!c.on_command(Command::MoveLeft));
    assert_eq!(c.active_piece().map(|p| p.anchor()), Some(Vec2i::new(0, 10)));
    assert!(c.on_command(Command::MoveRight));
    assert_eq!(c.active_piece().map(|p| p.anchor()), Some(Vec2i::new(1, 10)));
}

#[test]
fn ghost_of_fresh_spawn_sits_on_the_floor() {
    let c = controller();
    let snapshot = c.snapshot();
    let active = snapshot.active.expect("active piece");
    assert_eq!(active.anchor, Vec2i::new(5, 19));
    assert_eq!(snapshot.ghost_anchor, Some(Vec2i::new(5, 0)));
}

#[test]
fn spawn_row_offset_shortens_the_drop() {
    let config = GameConfig {
        spawn_row: 3,
        ..instant_lock_config()
    };
    let c = Controller::new(config).expect("valid config");
    let piece = c.active_piece().copied().expect("active piece");
    let mut probe = piece;
    assert_eq!(probe.hard_drop(c.board()), 16);
}

#[test]
fn flat_i_completes_bottom_row() {
    let mut c = controller();
    fill_row_except(&mut c, 0, &[8, 9, 10, 11], PieceKind::L);
    c.set_cell(3, 1, Some(PieceKind::T));
    c.set_active_piece_for_test(ActivePiece::spawn(PieceKind::I, Vec2i::new(9, 8)));
    c.take_events();

    assert!(c.on_command(Command::HardDrop));

    assert_eq!(c.lines_cleared(), 1);
    assert_eq!(c.board().cell(3, 0), Some(PieceKind::T));
    assert_eq!(c.board().row_count(0), 1);
    assert_eq!(c.board().row_count(1), 0);
    assert_eq!(c.board().occupied_cells(), vec![Vec2i::new(3, 0)]);

    let events = c.take_events();
    assert!(events.contains(&GameEvent::LinesCleared { rows: vec![0] }));
    assert_eq!(c.state(), ControllerState::Falling);
}

#[test]
fn vertical_i_clears_two_separated_rows() {
    let mut c = controller();
    fill_row_except(&mut c, 0, &[11], PieceKind::J);
    fill_row_except(&mut c, 2, &[11], PieceKind::J);
    c.set_cell(0, 1, Some(PieceKind::S));
    c.set_cell(5, 3, Some(PieceKind::Z));
    c.set_active_piece_for_test(ActivePiece::new(PieceKind::I, 1, Vec2i::new(11, 10)));

    assert!(c.on_command(Command::HardDrop));

    assert_eq!(c.lines_cleared(), 2);
    let board = c.board();
    assert_eq!(board.cell(0, 0), Some(PieceKind::S));
    assert_eq!(board.cell(11, 0), Some(PieceKind::I));
    assert_eq!(board.cell(5, 1), Some(PieceKind::Z));
    assert_eq!(board.cell(11, 1), Some(PieceKind::I));
    assert_eq!(board.row_count(0), 2);
    assert_eq!(board.row_count(1), 2);
    for y in 2..board.rows() {
        assert_eq!(board.row_count(y), 0, "row {y}");
    }
}

#[test]
fn blocked_spawn_ends_the_game() {
    let mut c = controller();
    for x in 3..9 {
        c.set_cell(x, 19, Some(PieceKind::Z));
    }
    c.set_active_piece_for_test(ActivePiece::spawn(PieceKind::O, Vec2i::new(0, 5)));
    c.take_events();

    assert!(c.on_command(Command::HardDrop));

    assert!(c.is_game_over());
    assert_eq!(c.pieces_locked(), 1);
    assert!(c.active_piece().is_none());
    let events = c.take_events();
    assert!(matches!(events.first(), Some(GameEvent::PieceLocked { .. })));
    assert_eq!(events.last(), Some(&GameEvent::GameOver));

    for command in [Command::MoveLeft, Command::RotateCw, Command::HardDrop] {
        assert!(!c.on_command(command));
    }
    assert_eq!(c.on_tick(Duration::from_secs(3)), GravityStep::Idle);
    assert_eq!(c.snapshot().state, ControllerState::GameOver);
}

#[test]
fn sliding_off_a_ledge_cancels_pending_lock() {
    let mut c = Controller::new(GameConfig {
        lock_debounce: Duration::from_millis(500),
        gravity_interval: Duration::from_millis(100),
        ..GameConfig::default()
    })
    .expect("valid config");
    // First lock starts the debounce clock.
    assert!(c.on_command(Command::HardDrop));
    assert_eq!(c.pieces_locked(), 1);

    c.set_cell(0, 0, Some(PieceKind::L));
    c.set_active_piece_for_test(ActivePiece::spawn(PieceKind::O, Vec2i::new(0, 1)));

    assert_eq!(c.on_tick(Duration::from_millis(100)), GravityStep::LockPending);
    assert!(c.is_lock_pending());
    assert!(c.snapshot().lock_pending);

    assert!(c.on_command(Command::MoveRight));
    assert!(!c.is_lock_pending());
    assert_eq!(c.on_tick(Duration::from_millis(100)), GravityStep::Moved);
    assert_eq!(c.active_piece().map(|p| p.anchor()), Some(Vec2i::new(1, 0)));
}

#[test]
fn pending_lock_fires_once_debounce_expires() {
    let mut c = Controller::new(GameConfig {
        lock_debounce: Duration::from_millis(300),
        gravity_interval: Duration::from_millis(100),
        ..GameConfig::default()
    })
    .expect("valid config");
    assert!(c.on_command(Command::HardDrop));
    c.set_active_piece_for_test(ActivePiece::spawn(PieceKind::O, Vec2i::new(0, 0)));

    assert_eq!(c.on_tick(Duration::from_millis(100)), GravityStep::LockPending);
    assert_eq!(c.on_tick(Duration::from_millis(100)), GravityStep::LockPending);
    assert_eq!(c.pieces_locked(), 1);
    assert_eq!(c.on_tick(Duration::from_millis(100)), GravityStep::Locked);
    assert_eq!(c.pieces_locked(), 2);
    assert_eq!(c.board().cell(0, 0), Some(PieceKind::O));
}

#[test]
fn listener_sees_events_in_order() {
    let mut c = controller();
    fill_row_except(&mut c, 0, &[8, 9, 10, 11], PieceKind::L);
    c.set_active_piece_for_test(ActivePiece::spawn(PieceKind::I, Vec2i::new(9, 8)));
    c.on_command(Command::HardDrop);

    let mut recorder = Recorder::default();
    c.dispatch_events(&mut recorder);
    assert_eq!(recorder.spawned.len(), 2);
    assert_eq!(recorder.locked, 1);
    assert_eq!(recorder.cleared, vec![vec![0]]);
    assert!(!recorder.game_over);
    assert!(c.take_events().is_empty());
}

#[test]
fn reset_replays_the_same_opening() {
    let mut c = Controller::new(instant_lock_config().with_seed(31)).expect("valid config");
    let opening = c.snapshot();
    for _ in 0..5 {
        c.on_command(Command::HardDrop);
    }
    assert_eq!(c.pieces_locked(), 5);

    c.reset();
    assert_eq!(c.snapshot(), opening);
}

#[test]
fn snapshot_serializes_to_json() {
    let mut c = controller();
    c.on_command(Command::HardDrop);
    let snapshot = c.snapshot();
    assert_eq!(snapshot.board.len(), 20);
    assert_eq!(snapshot.board[0].len(), 12);
    assert_eq!(snapshot.preview.len(), 1);
    assert!(!snapshot.row_clear_in_progress);

    let json = serde_json::to_value(&snapshot).expect("serialize snapshot");
    assert_eq!(json["pieces_locked"], 1);
    assert_eq!(json["state"], "Falling");
}
