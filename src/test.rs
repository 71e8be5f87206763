use crate::game::board::MoveKind;
use crate::game::pieces::{EngineColor, PieceKind, Side};
use crate::{Board, GameController};

#[test]
fn opening_move_count() {
    let mut controller = GameController::new(EngineColor::White);
    let moves = controller.legal_moves_for(Side::Engine);

    assert_eq!(moves.len(), 20);

    let pawn_moves = moves
        .iter()
        .filter(|board_move| board_move.moving == PieceKind::EnginePawn)
        .count();
    let knight_moves = moves
        .iter()
        .filter(|board_move| board_move.moving == PieceKind::EngineKnight)
        .count();
    assert_eq!(pawn_moves, 16);
    assert_eq!(knight_moves, 4);
}

#[test]
fn perft_opening_shallow() {
    perft_expect(&[(1, 20), (2, 400), (3, 8_902)]);
}

#[test]
fn perft_opening_depth_4() {
    perft_expect(&[(4, 197_281)]);
}

#[test]
#[ignore = "slow; run with --ignored for the full oracle"]
fn perft_opening_depth_5() {
    perft_expect(&[(5, 4_865_609)]);
}

/// Both engine colors must agree on every count; the board is mirrored, the
/// game tree is not different.
#[test]
fn perft_is_color_independent() {
    let mut white = GameController::new(EngineColor::White);
    let mut black = GameController::new(EngineColor::Black);

    for depth in 1..=3 {
        assert_eq!(white.perft(depth), black.perft(depth), "depth {}", depth);
    }
}

fn perft_expect(expectations: &[(usize, u64)]) {
    let mut controller = GameController::new(EngineColor::White);
    let mut failures = Vec::new();

    for &(depth, expected) in expectations {
        let nodes = controller.perft(depth);
        if nodes != expected {
            failures.push(format!(
                "depth {}: got {} nodes, expected {}",
                depth, nodes, expected
            ));
        }
    }

    if !failures.is_empty() {
        panic!("perft failed:\n  {}", failures.join("\n  "));
    }
}

#[test]
fn perft_divide_sums_to_perft() {
    let mut controller = GameController::new(EngineColor::White);
    let divided: u64 = controller
        .perft_divide(3)
        .into_iter()
        .map(|(_, nodes)| nodes)
        .sum();
    assert_eq!(divided, controller.perft(3));
}

#[test]
fn king_move_forfeits_castling() {
    let mut board = Board::new(EngineColor::White);
    let king_forward = crate::Move {
        kind: MoveKind::Normal,
        from: 3,
        to: 11,
        moving: PieceKind::EngineKing,
        captured: None,
    };

    // clear the square in front of the king first
    board.position.pieces[PieceKind::EnginePawn as usize] &= !(1u64 << 11);
    board.update();
    board.apply_move(&king_forward, true);

    assert!(!board.position.engine_castle_kingside);
    assert!(!board.position.engine_castle_queenside);
    assert!(board.position.player_castle_kingside);
    assert!(board.position.player_castle_queenside);
}

#[test]
fn rook_move_forfeits_one_side() {
    let mut board = Board::new(EngineColor::White);
    // lift the kingside rook's pawn out of the way, then shuffle the rook
    board.position.pieces[PieceKind::EnginePawn as usize] &= !(1u64 << 8);
    board.update();

    let rook_up = crate::Move {
        kind: MoveKind::Normal,
        from: 0,
        to: 16,
        moving: PieceKind::EngineRook,
        captured: None,
    };
    board.apply_move(&rook_up, true);

    assert!(!board.position.engine_castle_kingside);
    assert!(board.position.engine_castle_queenside);
}

#[test]
fn capturing_a_home_rook_revokes_the_right() {
    // an engine rook takes the player's kingside rook on its home corner
    let mut board = Board::empty(EngineColor::White);
    board.place(3, PieceKind::EngineKing);
    board.place(59, PieceKind::PlayerKing);
    board.place(32, PieceKind::EngineRook);
    board.place(56, PieceKind::PlayerRook);
    board.set_castling_rights(Side::Player, true, true);
    board.set_engine_to_move(true);

    let capture = crate::Move {
        kind: MoveKind::Normal,
        from: 32,
        to: 56,
        moving: PieceKind::EngineRook,
        captured: Some(PieceKind::PlayerRook),
    };
    board.apply_move(&capture, true);

    assert!(!board.position.player_castle_kingside);
    assert!(board.position.player_castle_queenside);
}

#[test]
fn derived_masks_stay_in_sync() {
    let mut controller = GameController::new(EngineColor::White);

    for (side, from, to) in [
        (Side::Engine, 11, 27),
        (Side::Player, 52, 36),
        (Side::Engine, 6, 21),
        (Side::Player, 57, 40),
    ] {
        let board_move = controller
            .legal_moves_for(side)
            .into_iter()
            .find(|candidate| candidate.from == from && candidate.to == to)
            .expect("scripted move must be legal");
        controller.apply_move(&board_move);

        let board = &controller.board;
        let player = board.position.pieces[..6]
            .iter()
            .fold(0u64, |acc, pieces| acc | pieces);
        let engine = board.position.pieces[6..]
            .iter()
            .fold(0u64, |acc, pieces| acc | pieces);

        assert_eq!(board.player_pieces, player);
        assert_eq!(board.engine_pieces, engine);
        assert_eq!(board.occupied_squares, player | engine);
        assert_eq!(board.empty_squares, !(player | engine));
        assert_eq!(board.player_or_empty, player | !(player | engine));
        assert_eq!(board.engine_or_empty, engine | !(player | engine));

        // disjoint piece boards and one king per side
        let bits: u32 = board
            .position
            .pieces
            .iter()
            .map(|pieces| pieces.count_ones())
            .sum();
        assert_eq!(bits, board.occupied_squares.count_ones());
        assert_eq!(
            board.position.pieces[PieceKind::EngineKing as usize].count_ones(),
            1
        );
        assert_eq!(
            board.position.pieces[PieceKind::PlayerKing as usize].count_ones(),
            1
        );
    }
}

#[test]
fn notation_follows_the_host_scheme() {
    let mut controller = GameController::new(EngineColor::White);

    let knight = controller
        .legal_moves_for(Side::Engine)
        .into_iter()
        .find(|candidate| candidate.from == 6 && candidate.to == 21)
        .expect("knight move");
    assert_eq!(controller.notation(&knight), "nc3");

    let pawn = controller
        .legal_moves_for(Side::Engine)
        .into_iter()
        .find(|candidate| candidate.from == 11 && candidate.to == 19)
        .expect("pawn push");
    assert_eq!(controller.notation(&pawn), "e3");

    let castle = crate::Move {
        kind: MoveKind::Normal,
        from: 3,
        to: 1,
        moving: PieceKind::EngineKing,
        captured: None,
    };
    assert_eq!(controller.notation(&castle), "castle");

    let promotion = crate::Move {
        kind: MoveKind::QueenPromotion,
        from: 9,
        to: 1,
        moving: PieceKind::PlayerPawn,
        captured: Some(PieceKind::EngineKnight),
    };
    assert_eq!(controller.notation(&promotion), "xg1=q");
}

#[test]
fn double_push_marks_en_passant_only_with_a_neighbor() {
    let mut controller = GameController::new(EngineColor::White);

    // no enemy pawn anywhere near the landing square
    let push = controller
        .legal_moves_for(Side::Engine)
        .into_iter()
        .find(|candidate| candidate.from == 11 && candidate.to == 27)
        .expect("the double push must be generated");
    controller.apply_move(&push);

    assert_eq!(controller.board.position.en_passant_capture, 0);
}
