//! Laws the searcher and evaluator must satisfy: undo round trips, move
//! ordering, evaluation symmetry and score bounds.

use strum::IntoEnumIterator;
use tarrasch::game::evaluate::{evaluate, piece_value, MAX_EVAL, MIN_EVAL};
use tarrasch::game::search::{maximize, minimize};
use tarrasch::{Board, EngineColor, GameController, MoveGen, PieceKind, Side};

#[test]
fn snapshot_restore_round_trips_every_opening_move() {
    let mut movegen = MoveGen::new();
    let mut board = Board::new(EngineColor::White);

    movegen.generate(&board, true);
    for board_move in movegen.sorted_moves() {
        let before_position = board.position;
        let before_occupied = board.occupied_squares;
        let before_turn = board.engine_to_move;

        let snapshot = board.snapshot();
        board.apply_move(&board_move, true);
        board.restore(&snapshot);

        assert_eq!(board.position, before_position, "{:?}", board_move);
        assert_eq!(board.occupied_squares, before_occupied);
        assert_eq!(board.engine_to_move, before_turn);
    }
}

#[test]
fn captures_sort_before_quiet_moves() {
    let mut controller = GameController::new(EngineColor::White);
    let mut board = Board::empty(EngineColor::White);
    board.place(7, PieceKind::EngineKing);
    board.place(62, PieceKind::PlayerKing);
    // a pawn that can take a knight, and a queen that can take a pawn
    board.place(17, PieceKind::EnginePawn);
    board.place(26, PieceKind::PlayerKnight);
    board.place(0, PieceKind::EngineQueen);
    board.place(16, PieceKind::PlayerPawn);
    board.set_engine_to_move(true);
    controller.board = board;

    let moves = controller.legal_moves_for(Side::Engine);

    // pawn takes knight is the cheapest attacker on the biggest victim
    assert_eq!(moves[0].from, 17);
    assert_eq!(moves[0].to, 26);
    assert_eq!(moves[0].captured, Some(PieceKind::PlayerKnight));

    assert_eq!(moves[1].from, 0);
    assert_eq!(moves[1].to, 16);
    assert_eq!(moves[1].captured, Some(PieceKind::PlayerPawn));

    let first_quiet = moves
        .iter()
        .position(|board_move| board_move.captured.is_none())
        .expect("there are quiet moves");
    assert!(
        moves[first_quiet..]
            .iter()
            .all(|board_move| board_move.captured.is_none()),
        "a capture sorted after a quiet move"
    );
}

#[test]
fn evaluation_is_zero_at_the_start() {
    let board = Board::new(EngineColor::White);
    assert_eq!(evaluate(&board.position), 0);
}

#[test]
fn evaluation_negates_under_mirror() {
    // a lopsided position, rebuilt with the sides swapped and the board
    // flipped top to bottom
    let mut board = Board::empty(EngineColor::White);
    board.place(3, PieceKind::EngineKing);
    board.place(59, PieceKind::PlayerKing);
    board.place(27, PieceKind::EnginePawn);
    board.place(28, PieceKind::EnginePawn);
    board.place(18, PieceKind::EngineKnight);
    board.place(44, PieceKind::PlayerBishop);
    board.place(51, PieceKind::PlayerPawn);
    board.place(33, PieceKind::PlayerQueen);

    let mut mirrored = Board::empty(EngineColor::White);
    for kind in PieceKind::iter() {
        let flipped = board.position.pieces[kind as usize].swap_bytes();
        let swapped_kind = match kind.side() {
            Side::Engine => PieceKind::from_repr(kind as usize - 6).unwrap(),
            Side::Player => PieceKind::from_repr(kind as usize + 6).unwrap(),
        };
        mirrored.position.pieces[swapped_kind as usize] = flipped;
    }
    mirrored.update();

    assert_eq!(
        evaluate(&mirrored.position),
        -evaluate(&board.position),
        "mirroring the position must negate the score"
    );
}

#[test]
fn piece_values_are_side_symmetric() {
    for kind in PieceKind::iter() {
        let twin = match kind.side() {
            Side::Engine => PieceKind::from_repr(kind as usize - 6).unwrap(),
            Side::Player => PieceKind::from_repr(kind as usize + 6).unwrap(),
        };
        assert_eq!(piece_value(kind), piece_value(twin));
    }
}

#[test]
fn search_scores_stay_inside_the_eval_window() {
    let mut board = Board::new(EngineColor::White);
    let mut movegen = MoveGen::new();

    // a shallow probe from the opening in both directions
    let engine_score = maximize(&mut board, &mut movegen, 4, MIN_EVAL, MAX_EVAL);
    assert!(engine_score > MIN_EVAL && engine_score < MAX_EVAL);

    board.set_engine_to_move(false);
    let player_score = minimize(&mut board, &mut movegen, 4, MIN_EVAL, MAX_EVAL);
    assert!(player_score > MIN_EVAL && player_score < MAX_EVAL);
}

#[test]
fn engine_prefers_winning_material() {
    // a queen hangs; a five-ply search has no trouble taking it
    let mut controller = GameController::new(EngineColor::White);
    let mut board = Board::empty(EngineColor::White);
    board.place(0, PieceKind::EngineKing);
    board.place(63, PieceKind::PlayerKing);
    board.place(36, PieceKind::EngineRook);
    board.place(44, PieceKind::PlayerQueen);
    board.place(53, PieceKind::PlayerPawn);
    board.set_engine_to_move(true);
    controller.board = board;

    let chosen = controller.choose_best_move().expect("moves exist");
    assert_eq!(chosen.to, 44);
    assert_eq!(chosen.captured, Some(PieceKind::PlayerQueen));
}
